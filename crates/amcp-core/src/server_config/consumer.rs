//! Channel output consumers.

use serde::Serialize;

use super::symbols::{AspectRatio, ChannelLayout, Keyer, Latency, Stretch, VideoCodec};

/// An output sink attached to a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Consumer {
    Decklink(DecklinkConsumer),
    Bluefish(BluefishConsumer),
    SystemAudio,
    Screen(ScreenConsumer),
    NewtekIvga(NewtekIvgaConsumer),
    File(FileConsumer),
    Stream(StreamConsumer),
}

impl Consumer {
    /// The element name used for this consumer in the configuration.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Decklink(_) => "decklink",
            Self::Bluefish(_) => "bluefish",
            Self::SystemAudio => "system-audio",
            Self::Screen(_) => "screen",
            Self::NewtekIvga(_) => "newtek-ivga",
            Self::File(_) => "file",
            Self::Stream(_) => "stream",
        }
    }
}

/// A Blackmagic Decklink card output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecklinkConsumer {
    pub device: u32,
    pub key_device: u32,
    pub embedded_audio: bool,
    pub channel_layout: ChannelLayout,
    pub latency: Latency,
    pub keyer: Keyer,
    pub key_only: bool,
    pub buffer_depth: u32,
    pub custom_allocator: bool,
}

impl Default for DecklinkConsumer {
    fn default() -> Self {
        Self {
            device: 1,
            key_device: 2,
            embedded_audio: false,
            channel_layout: ChannelLayout::Stereo,
            latency: Latency::Normal,
            keyer: Keyer::External,
            key_only: false,
            buffer_depth: 3,
            custom_allocator: true,
        }
    }
}

/// A Bluefish card output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BluefishConsumer {
    pub device: u32,
    pub embedded_audio: bool,
    pub channel_layout: ChannelLayout,
    pub key_only: bool,
}

impl Default for BluefishConsumer {
    fn default() -> Self {
        Self {
            device: 1,
            embedded_audio: false,
            channel_layout: ChannelLayout::Stereo,
            key_only: false,
        }
    }
}

/// An on-screen preview window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenConsumer {
    pub device: u32,
    pub aspect_ratio: AspectRatio,
    pub stretch: Stretch,
    pub windowed: bool,
    pub key_only: bool,
    pub auto_deinterlace: bool,
    pub vsync: bool,
    pub name: String,
    pub borderless: bool,
}

impl Default for ScreenConsumer {
    fn default() -> Self {
        Self {
            device: 0,
            aspect_ratio: AspectRatio::Default,
            stretch: Stretch::Fill,
            windowed: false,
            key_only: false,
            auto_deinterlace: true,
            vsync: false,
            name: "Screen Consumer".to_string(),
            borderless: false,
        }
    }
}

/// A NewTek iVGA network output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewtekIvgaConsumer {
    pub channel_layout: ChannelLayout,
    pub provide_sync: bool,
}

impl Default for NewtekIvgaConsumer {
    fn default() -> Self {
        Self {
            channel_layout: ChannelLayout::Stereo,
            provide_sync: true,
        }
    }
}

/// A file recorder.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FileConsumer {
    pub path: String,
    pub vcodec: VideoCodec,
    pub separate_key: bool,
}

/// A network stream output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StreamConsumer {
    pub path: String,
    pub args: String,
}
