//! Closed symbol sets used by the server configuration.
//!
//! Each enumerated configuration field maps to one of these enums. Values
//! are resolved from configuration text with [`Symbol::resolve`]; text that
//! matches nothing falls back to the field's default.

use std::fmt;

use serde::{Serialize, Serializer};

/// A closed set of textual symbols.
pub trait Symbol: Sized + Copy + Default + 'static {
    /// Every member of the set.
    const ALL: &'static [Self];

    /// The configuration spelling of this member.
    fn as_str(&self) -> &'static str;

    /// Resolves configuration text to a member.
    ///
    /// An exact (case-insensitive, trimmed) match wins. Otherwise the longest
    /// member spelling contained in the text is chosen, so padded or
    /// annotated values like `" 1080i5000 "` still resolve. Returns `None`
    /// when nothing matches.
    fn resolve(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();

        if let Some(exact) = Self::ALL
            .iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(&text))
        {
            return Some(*exact);
        }

        Self::ALL
            .iter()
            .filter(|s| text.contains(&s.as_str().to_ascii_lowercase()))
            .max_by_key(|s| s.as_str().len())
            .copied()
    }

    /// Resolves configuration text, falling back to the default member.
    fn resolve_or_default(text: &str) -> Self {
        Self::resolve(text).unwrap_or_default()
    }
}

macro_rules! symbols {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl Symbol for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

symbols! {
    /// Server log verbosity.
    LogLevel {
        Trace => "trace",
        Debug => "debug",
        Info => "info",
        Warning => "warning",
        Error => "error",
    }
    default Trace
}

symbols! {
    /// Channel video format.
    VideoMode {
        Pal => "PAL",
        Ntsc => "NTSC",
        X576p2500 => "576p2500",
        X720p2398 => "720p2398",
        X720p2400 => "720p2400",
        X720p2500 => "720p2500",
        X720p5000 => "720p5000",
        X720p2997 => "720p2997",
        X720p5994 => "720p5994",
        X720p3000 => "720p3000",
        X720p6000 => "720p6000",
        X1080p2398 => "1080p2398",
        X1080p2400 => "1080p2400",
        X1080i5000 => "1080i5000",
        X1080i5994 => "1080i5994",
        X1080i6000 => "1080i6000",
        X1080p2500 => "1080p2500",
        X1080p2997 => "1080p2997",
        X1080p3000 => "1080p3000",
        X1080p5000 => "1080p5000",
        X1080p5994 => "1080p5994",
        X1080p6000 => "1080p6000",
        X1556p2398 => "1556p2398",
        X1556p2400 => "1556p2400",
        X1556p2500 => "1556p2500",
        Dci1080p2398 => "dci1080p2398",
        Dci1080p2400 => "dci1080p2400",
        Dci1080p2500 => "dci1080p2500",
        X2160p2398 => "2160p2398",
        X2160p2400 => "2160p2400",
        X2160p2500 => "2160p2500",
        X2160p2997 => "2160p2997",
        X2160p3000 => "2160p3000",
        Dci2160p2398 => "dci2160p2398",
        Dci2160p2400 => "dci2160p2400",
        Dci2160p2500 => "dci2160p2500",
    }
    default Pal
}

symbols! {
    /// Audio channel layout of a channel or consumer.
    ChannelLayout {
        Mono => "mono",
        Stereo => "stereo",
        Dts => "dts",
        DolbyE => "dolbye",
        DolbyDigital => "dolbydigital",
        Smpte => "smpte",
        Passthru => "passthru",
    }
    default Stereo
}

symbols! {
    /// Decklink output latency.
    Latency {
        Normal => "normal",
        Low => "low",
        Default => "default",
    }
    default Normal
}

symbols! {
    /// Decklink keyer mode.
    Keyer {
        External => "external",
        ExternalSeparateDevice => "external_separate_device",
        Internal => "internal",
        Default => "default",
    }
    default External
}

symbols! {
    /// Screen consumer aspect ratio.
    AspectRatio {
        Default => "default",
        Standard => "4:3",
        Widescreen => "16:9",
    }
    default Default
}

symbols! {
    /// Screen consumer scaling mode.
    Stretch {
        None => "none",
        Fill => "fill",
        Uniform => "uniform",
        UniformToFill => "uniform_to_fill",
    }
    default Fill
}

symbols! {
    /// File consumer video codec.
    VideoCodec {
        Libx264 => "libx264",
        Qtrle => "qtrle",
    }
    default Libx264
}

symbols! {
    /// Protocol spoken by a TCP controller.
    ControllerProtocol {
        Amcp => "AMCP",
        Log => "LOG",
    }
    default Amcp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        assert_eq!(VideoMode::resolve("pal"), Some(VideoMode::Pal));
        assert_eq!(LogLevel::resolve(" INFO "), Some(LogLevel::Info));
    }

    #[test]
    fn longest_contained_symbol_wins() {
        assert_eq!(
            VideoMode::resolve("dci1080p2398 "),
            Some(VideoMode::Dci1080p2398)
        );
        assert_eq!(
            Keyer::resolve("external_separate_device"),
            Some(Keyer::ExternalSeparateDevice)
        );
        assert_eq!(
            Stretch::resolve("mode: uniform_to_fill"),
            Some(Stretch::UniformToFill)
        );
    }

    #[test]
    fn unknown_text_falls_back_to_default() {
        assert_eq!(VideoMode::resolve("8k-hdr"), None);
        assert_eq!(VideoMode::resolve_or_default("8k-hdr"), VideoMode::Pal);
        assert_eq!(ChannelLayout::resolve_or_default(""), ChannelLayout::Stereo);
        assert_eq!(VideoCodec::resolve_or_default("prores"), VideoCodec::Libx264);
    }

    #[test]
    fn serializes_as_configuration_spelling() {
        let json = serde_json::to_string(&AspectRatio::Widescreen).unwrap();
        assert_eq!(json, "\"16:9\"");
    }
}
