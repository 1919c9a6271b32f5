//! Server configuration snapshot.
//!
//! [`ServerConfig`] mirrors the configuration file the server reports for
//! `INFO CONFIG`. Every field starts at the server's documented default, so
//! a snapshot built from a sparse document is still complete. The snapshot
//! is read-only and is not kept in sync with the running server.

mod audio;
mod consumer;
mod symbols;

use serde::Serialize;

pub use audio::{AudioChannelLayout, AudioConfig, AudioMixConfig};
pub use consumer::{
    BluefishConsumer, Consumer, DecklinkConsumer, FileConsumer, NewtekIvgaConsumer,
    ScreenConsumer, StreamConsumer,
};
pub use symbols::{
    AspectRatio, ChannelLayout, ControllerProtocol, Keyer, Latency, LogLevel, Stretch, Symbol,
    VideoCodec, VideoMode,
};

/// Default OSC port.
pub const DEFAULT_OSC_PORT: u16 = 6250;

/// Default port of an OSC predefined client.
pub const DEFAULT_OSC_CLIENT_PORT: u16 = 5253;

/// Default AMCP controller port.
pub const DEFAULT_CONTROLLER_PORT: u16 = 5250;

/// The complete configuration of a server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub log_level: LogLevel,
    pub channel_grid: bool,
    pub mixer: MixerConfig,
    pub auto_deinterlace: bool,
    pub auto_transcode: bool,
    pub pipeline_tokens: u32,
    pub template_hosts: Vec<TemplateHost>,
    pub flash: FlashConfig,
    pub thumbnails: ThumbnailConfig,
    pub channels: Vec<Channel>,
    pub controllers: Vec<TcpController>,
    pub osc: Option<OscConfig>,
    pub audio: AudioConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Trace,
            channel_grid: false,
            mixer: MixerConfig::default(),
            auto_deinterlace: true,
            auto_transcode: true,
            pipeline_tokens: 2,
            template_hosts: Vec::new(),
            flash: FlashConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            channels: Vec::new(),
            controllers: Vec::new(),
            osc: None,
            audio: AudioConfig::builtin(),
        }
    }
}

/// Mixer feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MixerConfig {
    pub blend_modes: bool,
    pub straight_alpha: bool,
    pub chroma_key: bool,
    pub mipmapping_default_on: bool,
}

/// A template host used for a given video mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TemplateHost {
    pub video_mode: VideoMode,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Flash producer buffer depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferDepth {
    #[default]
    Auto,
    Frames(u32),
}

/// Flash producer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlashConfig {
    pub buffer_depth: BufferDepth,
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbnailConfig {
    pub generate_thumbnails: bool,
    pub width: u32,
    pub height: u32,
    pub video_grid: u32,
    pub scan_interval_millis: u64,
    pub generate_delay_millis: u64,
    pub video_mode: VideoMode,
    pub mipmap: bool,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            generate_thumbnails: true,
            width: 256,
            height: 144,
            video_grid: 2,
            scan_interval_millis: 5000,
            generate_delay_millis: 2000,
            video_mode: VideoMode::X720p2500,
            mipmap: false,
        }
    }
}

/// A video channel and its outputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Channel {
    pub video_mode: VideoMode,
    pub channel_layout: ChannelLayout,
    pub straight_alpha_output: bool,
    pub consumers: Vec<Consumer>,
}

impl Channel {
    /// Appends a consumer to the channel's output list.
    pub fn add_consumer(&mut self, consumer: Consumer) {
        self.consumers.push(consumer);
    }
}

/// A TCP control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TcpController {
    pub protocol: ControllerProtocol,
    pub port: u16,
}

impl Default for TcpController {
    fn default() -> Self {
        Self {
            protocol: ControllerProtocol::Amcp,
            port: DEFAULT_CONTROLLER_PORT,
        }
    }
}

/// OSC output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OscConfig {
    pub default_port: u16,
    pub predefined_clients: Vec<OscClient>,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_OSC_PORT,
            predefined_clients: Vec::new(),
        }
    }
}

/// An OSC receiver that always gets events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OscClient {
    pub address: String,
    pub port: u16,
}

impl Default for OscClient {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: DEFAULT_OSC_CLIENT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_documentation() {
        let config = ServerConfig::default();
        assert_eq!(config.log_level, LogLevel::Trace);
        assert!(!config.channel_grid);
        assert!(config.auto_deinterlace);
        assert!(config.auto_transcode);
        assert_eq!(config.pipeline_tokens, 2);
        assert_eq!(config.flash.buffer_depth, BufferDepth::Auto);
        assert_eq!(config.thumbnails.video_mode, VideoMode::X720p2500);
        assert_eq!(config.audio, AudioConfig::builtin());
        assert!(config.osc.is_none());
    }

    #[test]
    fn channel_collects_consumers_in_order() {
        let mut channel = Channel::default();
        channel.add_consumer(Consumer::Screen(ScreenConsumer::default()));
        channel.add_consumer(Consumer::SystemAudio);

        let names: Vec<_> = channel.consumers.iter().map(Consumer::element_name).collect();
        assert_eq!(names, vec!["screen", "system-audio"]);
        assert_eq!(channel.video_mode, VideoMode::Pal);
        assert_eq!(channel.channel_layout, ChannelLayout::Stereo);
    }
}
