//! `INFO CONFIG` reader.
//!
//! Values in the server's configuration file are often padded or followed
//! by a hint (`<pipeline-tokens> 2 [1..] </pipeline-tokens>`), so values are
//! read leniently: numbers from their first token, booleans and symbols by
//! substring. A value that still cannot be read is logged and replaced by
//! the field's default.

use std::fmt::Display;
use std::str::FromStr;

use amcp_core::server_config::{
    AudioChannelLayout, AudioConfig, AudioMixConfig, BluefishConsumer, BufferDepth, Channel,
    Consumer, DecklinkConsumer, FileConsumer, FlashConfig, MixerConfig, NewtekIvgaConsumer,
    OscClient, OscConfig, ScreenConsumer, ServerConfig, StreamConsumer, Symbol, TcpController,
    TemplateHost, ThumbnailConfig,
};
use tracing::{debug, warn};

use super::{Element, parse_rooted};
use crate::error::AmcpResult;

/// Builds a [`ServerConfig`] from an `INFO CONFIG` payload.
///
/// Sections and fields that are absent keep their defaults. When the
/// document has no `<audio>` section the server's built-in audio layouts
/// apply.
///
/// # Errors
///
/// Returns `MalformedFrame` if the payload is not XML or its root is not
/// `<configuration>`.
pub fn parse_server_config(lines: &[String]) -> AmcpResult<ServerConfig> {
    let root = parse_rooted(lines, "configuration")?;
    let defaults = ServerConfig::default();

    let config = ServerConfig {
        log_level: symbol(&root, "log-level"),
        channel_grid: flag(&root, "channel-grid", defaults.channel_grid),
        mixer: root.child("mixer").map(read_mixer).unwrap_or_default(),
        auto_deinterlace: flag(&root, "auto-deinterlace", defaults.auto_deinterlace),
        auto_transcode: flag(&root, "auto-transcode", defaults.auto_transcode),
        pipeline_tokens: number(&root, "pipeline-tokens", defaults.pipeline_tokens),
        template_hosts: root
            .child("template-hosts")
            .map(|hosts| hosts.children_named("template-host").map(read_template_host).collect())
            .unwrap_or_default(),
        flash: root.child("flash").map(read_flash).unwrap_or_default(),
        thumbnails: root.child("thumbnails").map(read_thumbnails).unwrap_or_default(),
        channels: root
            .child("channels")
            .map(|channels| channels.children_named("channel").map(read_channel).collect())
            .unwrap_or_default(),
        controllers: root
            .child("controllers")
            .map(|controllers| controllers.children_named("tcp").map(read_controller).collect())
            .unwrap_or_default(),
        osc: root.child("osc").map(read_osc),
        audio: root.child("audio").map(read_audio).unwrap_or(defaults.audio),
    };

    debug!(
        channels = config.channels.len(),
        controllers = config.controllers.len(),
        "parsed server configuration"
    );
    Ok(config)
}

/// Non-blank text of a child element, falling back to an attribute of the
/// same name.
fn text<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.child_text(name).or_else(|| {
        element
            .attr(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    })
}

fn string(element: &Element, name: &str) -> Option<String> {
    text(element, name).map(str::to_string)
}

/// Drops a trailing `[a|b|c]` hint from a value.
fn without_hint(raw: &str) -> &str {
    match raw.split_once('[') {
        Some((value, _)) if !value.trim().is_empty() => value.trim(),
        _ => raw,
    }
}

/// A false-default flag is set by `true`; a true-default flag is cleared by
/// `false`. A value mentioning neither keeps the default.
fn flag(element: &Element, name: &str, default: bool) -> bool {
    let Some(raw) = text(element, name) else {
        return default;
    };
    let value = without_hint(raw).to_ascii_lowercase();
    let (set, cleared) = (value.contains("true"), value.contains("false"));
    if !set && !cleared {
        warn!(
            section = %element.name,
            field = name,
            value = raw,
            default,
            "configuration value is not a boolean, using default"
        );
        return default;
    }
    if default { !cleared } else { set }
}

fn number<T: FromStr + Display + Copy>(element: &Element, name: &str, default: T) -> T {
    let Some(raw) = text(element, name) else {
        return default;
    };
    let token = without_hint(raw).split_whitespace().next().unwrap_or(raw);
    match token.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                section = %element.name,
                field = name,
                value = raw,
                default = %default,
                "configuration value is not a number, using default"
            );
            default
        }
    }
}

fn symbol<S: Symbol>(element: &Element, name: &str) -> S {
    symbol_or(element, name, S::default())
}

fn symbol_or<S: Symbol>(element: &Element, name: &str, default: S) -> S {
    let Some(raw) = text(element, name) else {
        return default;
    };
    S::resolve(without_hint(raw)).unwrap_or_else(|| {
        warn!(
            section = %element.name,
            field = name,
            value = raw,
            default = default.as_str(),
            "unrecognised configuration value, using default"
        );
        default
    })
}

fn read_mixer(element: &Element) -> MixerConfig {
    MixerConfig {
        blend_modes: flag(element, "blend-modes", false),
        straight_alpha: flag(element, "straight-alpha", false),
        chroma_key: flag(element, "chroma-key", false),
        mipmapping_default_on: flag(element, "mipmapping-default-on", false)
            || flag(element, "mipmapping_default_on", false),
    }
}

fn read_template_host(element: &Element) -> TemplateHost {
    TemplateHost {
        video_mode: symbol(element, "video-mode"),
        filename: string(element, "filename").unwrap_or_default(),
        width: number(element, "width", 0),
        height: number(element, "height", 0),
    }
}

fn read_flash(element: &Element) -> FlashConfig {
    let buffer_depth = match text(element, "buffer-depth") {
        None => BufferDepth::Auto,
        Some(raw) if raw.to_ascii_lowercase().contains("auto") => BufferDepth::Auto,
        Some(_) => match number::<u32>(element, "buffer-depth", 0) {
            0 => BufferDepth::Auto,
            frames => BufferDepth::Frames(frames),
        },
    };
    FlashConfig { buffer_depth }
}

fn read_thumbnails(element: &Element) -> ThumbnailConfig {
    let d = ThumbnailConfig::default();
    ThumbnailConfig {
        generate_thumbnails: flag(element, "generate-thumbnails", d.generate_thumbnails),
        width: number(element, "width", d.width),
        height: number(element, "height", d.height),
        video_grid: number(element, "video-grid", d.video_grid),
        scan_interval_millis: number(element, "scan-interval-millis", d.scan_interval_millis),
        generate_delay_millis: number(element, "generate-delay-millis", d.generate_delay_millis),
        video_mode: symbol_or(element, "video-mode", d.video_mode),
        mipmap: flag(element, "mipmap", d.mipmap),
    }
}

fn read_channel(element: &Element) -> Channel {
    let mut channel = Channel {
        video_mode: symbol(element, "video-mode"),
        channel_layout: symbol(element, "channel-layout"),
        straight_alpha_output: flag(element, "straight-alpha-output", false),
        consumers: Vec::new(),
    };

    if let Some(consumers) = element.child("consumers") {
        for consumer in &consumers.children {
            match read_consumer(consumer) {
                Some(consumer) => channel.add_consumer(consumer),
                None => warn!(consumer = %consumer.name, "skipping unknown consumer type"),
            }
        }
    }

    channel
}

fn read_consumer(element: &Element) -> Option<Consumer> {
    let consumer = match element.name.as_str() {
        "decklink" => {
            let d = DecklinkConsumer::default();
            Consumer::Decklink(DecklinkConsumer {
                device: number(element, "device", d.device),
                key_device: number(element, "key-device", d.key_device),
                embedded_audio: flag(element, "embedded-audio", d.embedded_audio),
                channel_layout: symbol(element, "channel-layout"),
                latency: symbol(element, "latency"),
                keyer: symbol(element, "keyer"),
                key_only: flag(element, "key-only", d.key_only),
                buffer_depth: number(element, "buffer-depth", d.buffer_depth),
                custom_allocator: flag(element, "custom-allocator", d.custom_allocator),
            })
        }
        "bluefish" => {
            let d = BluefishConsumer::default();
            Consumer::Bluefish(BluefishConsumer {
                device: number(element, "device", d.device),
                embedded_audio: flag(element, "embedded-audio", d.embedded_audio),
                channel_layout: symbol(element, "channel-layout"),
                key_only: flag(element, "key-only", d.key_only),
            })
        }
        "system-audio" => Consumer::SystemAudio,
        "screen" => {
            let d = ScreenConsumer::default();
            Consumer::Screen(ScreenConsumer {
                device: number(element, "device", d.device),
                aspect_ratio: symbol(element, "aspect-ratio"),
                stretch: symbol(element, "stretch"),
                windowed: flag(element, "windowed", d.windowed),
                key_only: flag(element, "key-only", d.key_only),
                auto_deinterlace: flag(element, "auto-deinterlace", d.auto_deinterlace),
                vsync: flag(element, "vsync", d.vsync),
                name: string(element, "name").unwrap_or(d.name),
                borderless: flag(element, "borderless", d.borderless),
            })
        }
        "newtek-ivga" => {
            let d = NewtekIvgaConsumer::default();
            Consumer::NewtekIvga(NewtekIvgaConsumer {
                channel_layout: symbol(element, "channel-layout"),
                provide_sync: flag(element, "provide-sync", d.provide_sync),
            })
        }
        "file" => Consumer::File(FileConsumer {
            path: string(element, "path").unwrap_or_default(),
            vcodec: symbol(element, "vcodec"),
            separate_key: flag(element, "separate-key", false),
        }),
        "stream" => Consumer::Stream(StreamConsumer {
            path: string(element, "path").unwrap_or_default(),
            args: string(element, "args").unwrap_or_default(),
        }),
        _ => return None,
    };
    Some(consumer)
}

fn read_controller(element: &Element) -> TcpController {
    let d = TcpController::default();
    TcpController {
        protocol: symbol(element, "protocol"),
        port: number(element, "port", d.port),
    }
}

fn read_osc(element: &Element) -> OscConfig {
    let d = OscConfig::default();
    let predefined_clients = element
        .child("predefined-clients")
        .map(|clients| {
            clients
                .children_named("predefined-client")
                .map(|client| {
                    let d = OscClient::default();
                    OscClient {
                        address: string(client, "address").unwrap_or(d.address),
                        port: number(client, "port", d.port),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    OscConfig {
        default_port: number(element, "default-port", d.default_port),
        predefined_clients,
    }
}

fn read_audio(element: &Element) -> AudioConfig {
    let mut audio = AudioConfig::empty();

    if let Some(layouts) = element.child("channel-layouts") {
        for layout in layouts.children_named("channel-layout") {
            let Some(name) = string(layout, "name") else {
                warn!("skipping audio channel layout without a name");
                continue;
            };
            let layout = AudioChannelLayout {
                name: name.clone(),
                layout_type: string(layout, "type").unwrap_or_default(),
                num_channels: number(layout, "num-channels", 0),
                channels: string(layout, "channels"),
            };
            audio.channel_layouts.insert(name, layout);
        }
    }

    if let Some(mixes) = element.child("mix-configs") {
        for mix in mixes.children_named("mix-config") {
            let mappings = mix
                .child("mappings")
                .map(|mappings| {
                    mappings
                        .children_named("mapping")
                        .map(|m| m.text().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            audio.mix_configs.push(AudioMixConfig {
                from: string(mix, "from").unwrap_or_default(),
                to: string(mix, "to").unwrap_or_default(),
                mix: string(mix, "mix").unwrap_or_default(),
                mappings,
            });
        }
    }

    audio
}
