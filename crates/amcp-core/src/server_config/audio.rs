//! Audio channel layouts and mix rules.

use indexmap::IndexMap;
use serde::Serialize;

/// A named arrangement of audio channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioChannelLayout {
    pub name: String,
    /// Layout family, e.g. `5.1`.
    pub layout_type: String,
    pub num_channels: u32,
    /// Space separated channel names; absent for pass-through layouts.
    pub channels: Option<String>,
}

impl AudioChannelLayout {
    pub fn new(
        name: impl Into<String>,
        layout_type: impl Into<String>,
        num_channels: u32,
        channels: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            layout_type: layout_type.into(),
            num_channels,
            channels: channels.map(str::to_string),
        }
    }
}

/// A rule for mixing one layout family into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioMixConfig {
    pub from: String,
    pub to: String,
    /// Mix strategy, `add` or `average`.
    pub mix: String,
    /// `source destination gain` triples, in order.
    pub mappings: Vec<String>,
}

impl AudioMixConfig {
    pub fn new(from: &str, to: &str, mix: &str, mappings: &[&str]) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            mix: mix.to_string(),
            mappings: mappings.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// The audio section of the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AudioConfig {
    pub channel_layouts: IndexMap<String, AudioChannelLayout>,
    pub mix_configs: Vec<AudioMixConfig>,
}

impl AudioConfig {
    /// An audio section with no layouts and no mix rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The layouts and mix rules the server uses when none are configured.
    pub fn builtin() -> Self {
        let layouts = [
            AudioChannelLayout::new("mono", "1.0", 1, Some("C")),
            AudioChannelLayout::new("stereo", "2.0", 2, Some("L R")),
            AudioChannelLayout::new("dts", "5.1", 6, Some("C L R Ls Rs LFE")),
            AudioChannelLayout::new("dolbye", "5.1+stereomix", 8, Some("L R C LFE Ls Rs Lmix Rmix")),
            AudioChannelLayout::new("dolbydigital", "5.1", 6, Some("L C R Ls Rs LFE")),
            AudioChannelLayout::new("smpte", "5.1", 6, Some("L R C LFE Ls Rs")),
            AudioChannelLayout::new("passthru", "16ch", 16, None),
        ];

        let mix_configs = vec![
            AudioMixConfig::new("1.0", "2.0", "add", &["C L 1.0", "C R 1.0"]),
            AudioMixConfig::new("1.0", "5.1", "add", &["C L 1.0", "C R 1.0"]),
            AudioMixConfig::new(
                "1.0",
                "5.1+stereomix",
                "add",
                &["C L 1.0", "C R 1.0", "C Lmix 1.0", "C Rmix 1.0"],
            ),
            AudioMixConfig::new("2.0", "1.0", "add", &["L C 1.0", "R C 1.0"]),
            AudioMixConfig::new("2.0", "5.1", "add", &["L L 1.0", "R R 1.0"]),
            AudioMixConfig::new(
                "2.0",
                "5.1+stereomix",
                "add",
                &["L L 1.0", "R R 1.0", "R RMix 1.0"],
            ),
            AudioMixConfig::new(
                "5.1",
                "1.0",
                "average",
                &["L C 1.0", "R C 1.0", "C C 0.707", "Ls C 0.707", "Rs C 0.707"],
            ),
            AudioMixConfig::new(
                "5.1",
                "2.0",
                "average",
                &[
                    "L L 1.0",
                    "R R 1.0",
                    "C L 0.707",
                    "C R 0.707",
                    "L Lmix 1.0",
                    "Ls L 0.707",
                    "Rs R 0.707",
                ],
            ),
            AudioMixConfig::new(
                "5.1",
                "5.1+stereomix",
                "average",
                &[
                    "L L 1.0",
                    "R R 1.0",
                    "C C 1.0",
                    "Ls Ls 1.0",
                    "Rs Rs 1.0",
                    "LFE LFE 1.0",
                    "L Lmix 1.0",
                    "R Rmix 1.0",
                    "C Lmix 0.707",
                    "C Rmix 0.707",
                    "Ls Lmix 0.707",
                    "Rs Rmix 0.707",
                ],
            ),
            AudioMixConfig::new("5.1+stereomix", "1.0", "add", &["Lmix C 1.0", "Rmix C 1.0"]),
            AudioMixConfig::new("5.1+stereomix", "2.0", "add", &["Lmix L 1.0", "Rmix R 1.0"]),
            AudioMixConfig::new(
                "5.1+stereomix",
                "5.1",
                "add",
                &[
                    "L L 1.0",
                    "R R 1.0",
                    "C C 1.0",
                    "Ls Ls 1.0",
                    "Rs Rs 1.0",
                    "LFE LFE 1.0",
                ],
            ),
        ];

        Self {
            channel_layouts: layouts
                .into_iter()
                .map(|layout| (layout.name.clone(), layout))
                .collect(),
            mix_configs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layouts() {
        let audio = AudioConfig::builtin();
        assert_eq!(audio.channel_layouts.len(), 7);
        assert_eq!(audio.channel_layouts["dts"].num_channels, 6);
        assert_eq!(audio.channel_layouts["passthru"].channels, None);
        assert_eq!(audio.mix_configs.len(), 12);
        assert_eq!(audio.mix_configs[0].from, "1.0");
        assert_eq!(audio.mix_configs[0].to, "2.0");
    }

    #[test]
    fn empty_has_nothing() {
        let audio = AudioConfig::empty();
        assert!(audio.channel_layouts.is_empty());
        assert!(audio.mix_configs.is_empty());
    }
}
