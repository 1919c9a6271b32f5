//! `INFO TEMPLATE` reader.

use std::str::FromStr;

use amcp_core::{Component, ComponentProperty, Template, TemplateParameter};
use tracing::{debug, warn};

use super::{Element, parse_rooted};
use crate::error::AmcpResult;

/// Builds a [`Template`] from an `INFO TEMPLATE` payload.
///
/// Entries that cannot be used (a property without a name, an unknown
/// value type, an instance of an undefined component) are skipped and
/// recorded in [`Template::warnings`].
///
/// # Errors
///
/// Returns `MalformedFrame` if the payload is not XML or its root is not
/// `<template>`.
pub fn parse_template(file_name: &str, lines: &[String]) -> AmcpResult<Template> {
    let root = parse_rooted(lines, "template")?;
    let mut template = Template::new(file_name);

    template.version = root.attr("version").map(str::to_string);
    template.author_name = root.attr("authorName").map(str::to_string);
    template.author_email = root.attr("authorEmail").map(str::to_string);
    template.template_info = root.attr("templateInfo").map(str::to_string);
    template.original_width = numeric_attr(&root, "originalWidth");
    template.original_height = numeric_attr(&root, "originalHeight");
    template.original_frame_rate = numeric_attr(&root, "originalFrameRate");

    if let Some(components) = root.child("components") {
        for element in components.children_named("component") {
            read_component(&mut template, element);
        }
    }

    if let Some(keyframes) = root.child("keyframes") {
        for keyframe in keyframes.children_named("keyframe") {
            match keyframe.attr("name") {
                Some(name) => template.keyframes.push(name.to_string()),
                None => template.record_invalid("keyframe", "missing name attribute"),
            }
        }
    }

    if let Some(instances) = root.child("instances") {
        for instance in instances.children_named("instance") {
            match (instance.attr("name"), instance.attr("type")) {
                (Some(name), Some(component)) => template.add_instance(name, component),
                _ => template.record_invalid("instance", "missing name or type attribute"),
            }
        }
    }

    if let Some(parameters) = root.child("parameters") {
        for element in parameters.children_named("parameter") {
            read_parameter(&mut template, element);
        }
    }

    debug!(
        template = %template.file_name,
        components = template.components.len(),
        instances = template.instances.len(),
        parameters = template.parameters.len(),
        warnings = template.warnings.len(),
        "parsed template"
    );
    Ok(template)
}

fn read_component(template: &mut Template, element: &Element) {
    let Some(name) = element.attr("name") else {
        template.record_invalid("component", "missing name attribute");
        return;
    };

    let mut component = Component::new();
    for property in element.children_named("property") {
        let (Some(id), Some(value_type)) = (property.attr("name"), property.attr("type")) else {
            template.record_invalid(
                format!("component {name} property"),
                "missing name or type attribute",
            );
            continue;
        };
        let info = property.attr("info").unwrap_or_default();

        match ComponentProperty::with_declared_type(id, value_type, info) {
            Ok(prop) => {
                component.insert(id, prop);
            }
            Err(e) => template.record_invalid(format!("component {name} property {id}"), e.to_string()),
        }
    }

    template.components.insert(name, component);
}

fn read_parameter(template: &mut Template, element: &Element) {
    let (Some(id), Some(value_type)) = (element.attr("id"), element.attr("type")) else {
        template.record_invalid("parameter", "missing id or type attribute");
        return;
    };
    let info = element.attr("info").unwrap_or_default();

    let result = TemplateParameter::with_declared_type(id, value_type, info)
        .and_then(|param| template.parameters.insert(id, param));
    if let Err(e) = result {
        template.record_invalid(format!("parameter {id}"), e.to_string());
    }
}

fn numeric_attr<T: FromStr>(element: &Element, name: &str) -> Option<T> {
    let raw = element.attr(name)?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(attribute = name, value = raw, "ignoring non-numeric template attribute");
            None
        }
    }
}
