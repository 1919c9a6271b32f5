//! Core types: typed values, templates, server configuration, tracing

pub mod info;
pub mod server_config;
pub mod template;
pub mod tracing;
pub mod typed_map;
pub mod value;

pub use info::{ComponentVersions, FfmpegVersions, OsInfo, ServerPaths, SystemInfo};
pub use server_config::{ServerConfig, Symbol};
pub use template::{
    Component, ComponentProperty, Template, TemplateData, TemplateParameter, TemplateWarning,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use typed_map::{Slot, TypedMap, UpdatingMap};
pub use value::{Value, ValueError, ValueType};
