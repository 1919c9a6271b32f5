//! `INFO PATHS`, `INFO SYSTEM` and `TLS` readers.

use amcp_core::{ComponentVersions, FfmpegVersions, OsInfo, ServerPaths, SystemInfo};
use tracing::debug;

use super::{Element, parse_document, parse_rooted};
use crate::error::AmcpResult;

/// Builds [`ServerPaths`] from an `INFO PATHS` payload.
///
/// Every `<kind-path>` element anywhere in the document contributes an
/// entry under `kind`.
///
/// # Errors
///
/// Returns `MalformedFrame` if the payload is not XML.
pub fn parse_server_paths(lines: &[String]) -> AmcpResult<ServerPaths> {
    let root = parse_document(lines)?;
    let mut paths = ServerPaths::new();

    for element in root.descendants() {
        let Some(kind) = element.name.strip_suffix("-path") else {
            continue;
        };
        if element.text().is_empty() {
            debug!(kind, "skipping empty path");
            continue;
        }
        paths.insert(kind, element.text());
    }

    Ok(paths)
}

/// Builds [`SystemInfo`] from an `INFO SYSTEM` payload.
///
/// # Errors
///
/// Returns `MalformedFrame` if the payload is not XML or its root is not
/// `<system>`.
pub fn parse_system_info(lines: &[String]) -> AmcpResult<SystemInfo> {
    let root = parse_rooted(lines, "system")?;

    let os = root
        .child("windows")
        .or_else(|| root.child("os"))
        .map(|os| OsInfo {
            name: owned(os.child_text("name")),
            service_pack: owned(os.child_text("service-pack")),
        })
        .unwrap_or_default();

    let components = root.child("caspar").map(read_versions).unwrap_or_default();

    Ok(SystemInfo {
        name: owned(root.child_text("name")),
        os,
        cpu: owned(root.child_text("cpu")),
        components,
    })
}

fn read_versions(caspar: &Element) -> ComponentVersions {
    let ffmpeg = caspar
        .find("ffmpeg")
        .map(|ffmpeg| FfmpegVersions {
            avcodec: owned(ffmpeg.child_text("avcodec")),
            avformat: owned(ffmpeg.child_text("avformat")),
            avfilter: owned(ffmpeg.child_text("avfilter")),
            avutil: owned(ffmpeg.child_text("avutil")),
            swscale: owned(ffmpeg.child_text("swscale")),
        })
        .unwrap_or_default();

    ComponentVersions {
        flash: owned(caspar.child_text("flash")),
        template_host: owned(caspar.child_text("template-host")),
        free_image: owned(caspar.child_text("free-image")),
        ffmpeg,
    }
}

fn owned(text: Option<&str>) -> Option<String> {
    text.map(str::to_string)
}

/// Extracts template names from a `TLS` listing.
///
/// Lines look like `"FOLDER/NAME" SIZE TIMESTAMP`. The listing ends at the
/// first line that is not quoted. A listing whose first line is unquoted
/// (`FOLDER/NAME SIZE TIMESTAMP`, as newer servers send it) is read by
/// taking the first token of every line instead.
pub fn parse_template_listing(lines: &[String]) -> Vec<String> {
    let quoted = lines.first().is_some_and(|line| line.starts_with('"'));

    if quoted {
        lines
            .iter()
            .map_while(|line| {
                let rest = line.strip_prefix('"')?;
                Some(rest.split('"').next().unwrap_or(rest).to_string())
            })
            .collect()
    } else {
        lines
            .iter()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}
