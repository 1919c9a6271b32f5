//! Template descriptors.
//!
//! A [`Template`] is what the server reports for `INFO TEMPLATE`: authoring
//! metadata, the components the template is built from (each a named set of
//! typed properties), its keyframes, the component instances placed on its
//! stage and the parameters it accepts.
//!
//! [`TemplateData`] is the other direction: the values a client sends with
//! `CG ADD` / `CG UPDATE`, keyed by instance and property.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::typed_map::{Slot, TypedMap, UpdatingMap};
use crate::value::{Value, ValueError, ValueType};

/// A property of a template component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentProperty {
    pub id: String,
    value_type: ValueType,
    pub info: String,
    value: Option<Value>,
}

impl ComponentProperty {
    pub fn new(id: impl Into<String>, value_type: ValueType, info: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value_type,
            info: info.into(),
            value: None,
        }
    }

    /// Creates a property from the type name used in template descriptors.
    pub fn with_declared_type(
        id: impl Into<String>,
        type_name: &str,
        info: impl Into<String>,
    ) -> Result<Self, ValueError> {
        Ok(Self::new(id, type_name.parse()?, info))
    }
}

impl Slot for ComponentProperty {
    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Value) -> Result<(), ValueError> {
        value.expect_type(self.value_type)?;
        self.value = Some(value);
        Ok(())
    }
}

/// A parameter accepted by a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateParameter {
    pub id: String,
    value_type: ValueType,
    pub info: String,
    value: Option<Value>,
}

impl TemplateParameter {
    pub fn new(id: impl Into<String>, value_type: ValueType, info: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value_type,
            info: info.into(),
            value: None,
        }
    }

    /// Creates a parameter from the type name used in template descriptors.
    pub fn with_declared_type(
        id: impl Into<String>,
        type_name: &str,
        info: impl Into<String>,
    ) -> Result<Self, ValueError> {
        Ok(Self::new(id, type_name.parse()?, info))
    }

    /// Returns the parameter with `value` assigned.
    pub fn with_value(mut self, value: impl Into<Value>) -> Result<Self, ValueError> {
        self.set_value(value.into())?;
        Ok(self)
    }
}

impl Slot for TemplateParameter {
    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Value) -> Result<(), ValueError> {
        value.expect_type(self.value_type)?;
        self.value = Some(value);
        Ok(())
    }
}

/// A component is a named collection of properties.
pub type Component = TypedMap<ComponentProperty>;

/// A non-fatal inconsistency found while building a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateWarning {
    /// An instance refers to a component type the template does not define.
    DanglingInstance { instance: String, component: String },
    /// An element of the descriptor could not be used.
    InvalidEntry { element: String, reason: String },
}

/// Metadata about a template file on the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Template {
    /// Path relative to the server's template folder.
    pub file_name: String,
    pub version: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub template_info: Option<String>,
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    pub original_frame_rate: Option<f64>,
    pub components: TypedMap<Component>,
    pub keyframes: Vec<String>,
    /// Instance name to component type name.
    pub instances: IndexMap<String, String>,
    pub parameters: UpdatingMap<TemplateParameter>,
    pub warnings: Vec<TemplateWarning>,
}

impl Template {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    /// Places an instance of `component` on the template.
    ///
    /// The component must already be defined. A dangling reference is not
    /// added to [`Template::instances`]; it is recorded as a warning instead.
    pub fn add_instance(&mut self, name: impl Into<String>, component: impl Into<String>) {
        let name = name.into();
        let component = component.into();

        if self.components.contains_key(&component) {
            self.instances.insert(name, component);
        } else {
            warn!(
                template = %self.file_name,
                instance = %name,
                component = %component,
                "instance refers to an undefined component"
            );
            self.warnings.push(TemplateWarning::DanglingInstance {
                instance: name,
                component,
            });
        }
    }

    /// Records a descriptor element that had to be skipped.
    pub fn record_invalid(&mut self, element: impl Into<String>, reason: impl Into<String>) {
        let element = element.into();
        let reason = reason.into();
        warn!(template = %self.file_name, element = %element, reason = %reason, "skipping template entry");
        self.warnings.push(TemplateWarning::InvalidEntry { element, reason });
    }

    /// Returns the component definition behind an instance.
    pub fn instance_component(&self, instance: &str) -> Option<&Component> {
        self.instances
            .get(instance)
            .and_then(|component| self.components.get(component))
    }

    /// Returns true when every instance reference resolved.
    pub fn is_consistent(&self) -> bool {
        !self
            .warnings
            .iter()
            .any(|w| matches!(w, TemplateWarning::DanglingInstance { .. }))
    }

    /// Checks data against the template's instances and their property types.
    pub fn check_data(&self, data: &TemplateData) -> Result<(), ValueError> {
        for (instance, properties) in data.iter() {
            let component = self
                .instance_component(instance)
                .ok_or_else(|| ValueError::UnknownEntry(instance.to_string()))?;

            for (property, value) in properties {
                let declared = component
                    .get(property)
                    .ok_or_else(|| ValueError::UnknownEntry(format!("{instance}.{property}")))?;
                value.expect_type(declared.value_type)?;
            }
        }
        Ok(())
    }
}

/// Values sent to a template, keyed by instance id then property id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct TemplateData {
    fields: IndexMap<String, IndexMap<String, Value>>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property value on an instance.
    pub fn set(
        &mut self,
        instance: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.fields
            .entry(instance.into())
            .or_default()
            .insert(property.into(), value.into());
        self
    }

    /// Sets the `text` property of an instance, the common case for text fields.
    #[must_use]
    pub fn with_text(mut self, instance: impl Into<String>, text: impl Into<String>) -> Self {
        self.set(instance, "text", Value::String(text.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, Value>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field_template() -> Template {
        let mut template = Template::new("lower-third");
        let mut component = Component::new();
        component.insert(
            "text",
            ComponentProperty::new("text", ValueType::String, "string data"),
        );
        template.components.insert("CasparTextField", component);
        template
    }

    #[test]
    fn stored_value_always_matches_declared_type() {
        let mut param = TemplateParameter::new("duration", ValueType::Integer, "");
        param.set_value(Value::Integer(5)).unwrap();

        assert!(param.set_value(Value::String("5".into())).is_err());
        assert_eq!(param.value_type(), ValueType::Integer);
        assert_eq!(param.value(), Some(&Value::Integer(5)));

        let mut prop = ComponentProperty::new("text", ValueType::String, "");
        assert!(prop.set_value(Value::Boolean(true)).is_err());
        assert_eq!(prop.value_type(), ValueType::String);
        assert_eq!(prop.value(), None);
    }

    #[test]
    fn add_instance_with_known_component() {
        let mut template = text_field_template();
        template.add_instance("f1", "CasparTextField");

        assert_eq!(template.instances["f1"], "CasparTextField");
        assert!(template.is_consistent());
        assert!(template.instance_component("f1").unwrap().contains_key("text"));
    }

    #[test]
    fn add_instance_with_missing_component_warns() {
        let mut template = text_field_template();
        template.add_instance("img", "CasparImage");

        assert!(!template.instances.contains_key("img"));
        assert!(!template.is_consistent());
        assert_eq!(
            template.warnings,
            vec![TemplateWarning::DanglingInstance {
                instance: "img".to_string(),
                component: "CasparImage".to_string(),
            }]
        );
    }

    #[test]
    fn parameter_value_must_match_declared_type() {
        let param = TemplateParameter::with_declared_type("time", "int", "countdown").unwrap();
        assert!(param.clone().with_value(10_i64).is_ok());
        assert!(matches!(
            param.with_value("ten"),
            Err(ValueError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn parameter_rejects_unknown_declared_type() {
        let result = ComponentProperty::with_declared_type("x", "matrix", "");
        assert_eq!(result, Err(ValueError::UnknownValueType("matrix".to_string())));
    }

    #[test]
    fn check_data_validates_instances_and_types() {
        let mut template = text_field_template();
        template.add_instance("f0", "CasparTextField");

        let good = TemplateData::new().with_text("f0", "Hello");
        assert!(template.check_data(&good).is_ok());

        let unknown = TemplateData::new().with_text("f9", "Hello");
        assert_eq!(
            template.check_data(&unknown),
            Err(ValueError::UnknownEntry("f9".to_string()))
        );

        let mut wrong_type = TemplateData::new();
        wrong_type.set("f0", "text", 12_i64);
        assert!(matches!(
            template.check_data(&wrong_type),
            Err(ValueError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn template_data_keeps_instance_order() {
        let data = TemplateData::new()
            .with_text("f1", "second")
            .with_text("f0", "first");
        let order: Vec<_> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["f1", "f0"]);
    }
}
