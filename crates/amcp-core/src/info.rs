//! Server path and system information.

use indexmap::IndexMap;
use serde::Serialize;

/// Folders configured on the server, keyed by kind (`media`, `template`, ...).
///
/// All paths are relative to the server's install folder except `initial`,
/// which is that folder itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ServerPaths {
    paths: IndexMap<String, String>,
}

impl ServerPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<String>, path: impl Into<String>) {
        self.paths.insert(kind.into(), path.into());
    }

    pub fn get(&self, kind: &str) -> Option<&str> {
        self.paths.get(kind).map(String::as_str)
    }

    /// Returns the template folder joined onto the install folder.
    pub fn template_root(&self) -> Option<String> {
        let template = self.get("template")?;
        match self.get("initial") {
            Some(initial) if !initial.is_empty() => {
                let sep = if initial.ends_with(['/', '\\']) { "" } else { "/" };
                Some(format!("{initial}{sep}{template}"))
            }
            _ => Some(template.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Operating system details.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OsInfo {
    pub name: Option<String>,
    pub service_pack: Option<String>,
}

/// Versions of the ffmpeg libraries the server links against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FfmpegVersions {
    pub avcodec: Option<String>,
    pub avformat: Option<String>,
    pub avfilter: Option<String>,
    pub avutil: Option<String>,
    pub swscale: Option<String>,
}

/// Versions of the server's components.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComponentVersions {
    pub flash: Option<String>,
    pub template_host: Option<String>,
    pub free_image: Option<String>,
    pub ffmpeg: FfmpegVersions,
}

/// System details reported by `INFO SYSTEM`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SystemInfo {
    pub name: Option<String>,
    pub os: OsInfo,
    pub cpu: Option<String>,
    pub components: ComponentVersions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_root_joins_initial_path() {
        let mut paths = ServerPaths::new();
        paths.insert("initial", "C:\\caspar\\");
        paths.insert("template", "templates/");
        assert_eq!(paths.template_root().as_deref(), Some("C:\\caspar\\templates/"));

        let mut relative = ServerPaths::new();
        relative.insert("template", "templates/");
        assert_eq!(relative.template_root().as_deref(), Some("templates/"));
    }

    #[test]
    fn template_root_inserts_separator() {
        let mut paths = ServerPaths::new();
        paths.insert("initial", "/opt/caspar");
        paths.insert("template", "templates/");
        assert_eq!(paths.template_root().as_deref(), Some("/opt/caspar/templates/"));
    }
}
