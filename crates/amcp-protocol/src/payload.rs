//! Data arguments for `CG ADD`, `CG UPDATE` and `DATA STORE`.

use std::io::Cursor;

use amcp_core::TemplateData;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::{AmcpError, AmcpResult};

/// The data sent along with a template or stored on the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Instance values, sent as an inline `<templateData>` document.
    TemplateData(TemplateData),
    /// A JSON document, sent as a string.
    Json(serde_json::Value),
    /// Text sent verbatim as a string.
    Text(String),
    /// A dataset previously stored with `DATA STORE`, referenced by name.
    Dataset(String),
}

impl Payload {
    /// Renders the payload as a single command argument.
    ///
    /// Everything except a dataset reference becomes a double-quoted string
    /// with quotes, backslashes and control characters escaped.
    pub fn to_argument(&self) -> AmcpResult<String> {
        match self {
            Self::TemplateData(data) => quote(&template_data_xml(data)?),
            Self::Json(value) => quote(&value.to_string()),
            Self::Text(text) => quote(text),
            Self::Dataset(name) => {
                if name.is_empty() || name.chars().any(char::is_whitespace) {
                    return Err(AmcpError::invalid_argument(format!(
                        "dataset name {name:?} must be a single non-empty token"
                    )));
                }
                Ok(name.clone())
            }
        }
    }
}

impl From<TemplateData> for Payload {
    fn from(data: TemplateData) -> Self {
        Self::TemplateData(data)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Quotes a string as a JSON string literal.
pub(crate) fn quote(text: &str) -> AmcpResult<String> {
    serde_json::to_string(text).map_err(payload_error)
}

/// Renders template data in the server's `templateData` format:
///
/// ```xml
/// <templateData>
///   <componentData id="f0"><data id="text" value="Hello"/></componentData>
/// </templateData>
/// ```
pub fn template_data_xml(data: &TemplateData) -> AmcpResult<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Start(BytesStart::new("templateData")))
        .map_err(payload_error)?;

    for (instance, properties) in data.iter() {
        let mut component = BytesStart::new("componentData");
        component.push_attribute(("id", instance));
        writer.write_event(Event::Start(component)).map_err(payload_error)?;

        for (property, value) in properties {
            let value = value.to_string();
            let mut field = BytesStart::new("data");
            field.push_attribute(("id", property.as_str()));
            field.push_attribute(("value", value.as_str()));
            writer.write_event(Event::Empty(field)).map_err(payload_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("componentData")))
            .map_err(payload_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("templateData")))
        .map_err(payload_error)?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(payload_error)
}

fn payload_error(e: impl std::fmt::Display) -> AmcpError {
    AmcpError::Payload(e.to_string())
}
