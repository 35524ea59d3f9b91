use serde_yaml::Value;
use std::collections::HashMap;
use tera::{Context, Tera};
use tracing::warn;

use super::error::ConvertError;
use super::kind::ComponentKind;

/// The template slots registered under one template name, one per component
/// kind. A slot is only present when the bundle body held a string that
/// parsed as a template; anything else leaves the slot empty (see
/// [`TemplateBundle::parse`]).
#[derive(Debug)]
pub(crate) struct TemplateBundle {
    slots: HashMap<ComponentKind, Tera>,
}

impl TemplateBundle {
    /// Parses the body registered under `name` in the `templates` section.
    ///
    /// A slot whose body is missing, is not a string, or fails to parse as a
    /// template is left empty rather than failing the conversion; the two
    /// latter cases emit a warning. Referencing an empty slot later fails at
    /// render time.
    fn parse(name: &str, body: &Value) -> Result<Self, ConvertError> {
        let body = body
            .as_mapping()
            .ok_or_else(|| ConvertError::TemplateBundleNotAMap(name.to_string()))?;

        let mut slots = HashMap::new();
        for kind in ComponentKind::ALL {
            let Some(raw) = body.get(kind.as_str()) else {
                continue;
            };
            let Some(text) = raw.as_str() else {
                warn!(template = name, kind = %kind, "template body is not a string, slot left empty");
                continue;
            };
            let mut tera = Tera::default();
            match tera.add_raw_template(kind.as_str(), text) {
                Ok(()) => {
                    slots.insert(kind, tera);
                }
                Err(err) => {
                    warn!(template = name, kind = %kind, %err, "failed to parse template, slot left empty");
                }
            }
        }

        Ok(Self { slots })
    }

    /// Renders the slot for `kind` against `parameters` and parses the output
    /// as a mapping of component key to component config. An empty slot
    /// renders the empty string, which never parses as a mapping.
    pub(crate) fn render(
        &self,
        kind: ComponentKind,
        parameters: &Value,
    ) -> Result<HashMap<String, Value>, ConvertError> {
        let rendered = match self.slots.get(&kind) {
            Some(tera) => {
                let context = render_context(parameters).map_err(ConvertError::Render)?;
                tera.render(kind.as_str(), &context)
                    .map_err(ConvertError::Render)?
            }
            None => String::new(),
        };

        serde_yaml::from_str(&rendered).map_err(ConvertError::Malformed)
    }
}

/// Builds the render context from the parameter tree sitting under the
/// templated key. A null tree renders against an empty context.
fn render_context(parameters: &Value) -> Result<Context, tera::Error> {
    match parameters {
        Value::Null => Ok(Context::new()),
        other => Context::from_serialize(other),
    }
}

/// The parsed `templates` section: template type name to bundle.
#[derive(Debug, Default)]
pub(crate) struct TemplateRegistry {
    templates: HashMap<String, TemplateBundle>,
}

impl TemplateRegistry {
    /// Builds the registry from the document. An absent `templates` section
    /// yields an empty registry.
    pub(crate) fn parse(cfg: &HashMap<String, Value>) -> Result<Self, ConvertError> {
        let Some(section) = cfg.get("templates") else {
            return Ok(Self::default());
        };
        let section = section.as_mapping().ok_or(ConvertError::TemplatesNotAMap)?;

        let mut templates = HashMap::with_capacity(section.len());
        for (name, body) in section {
            let Some(name) = name.as_str() else {
                warn!("ignoring template with non-string name");
                continue;
            };
            templates.insert(name.to_string(), TemplateBundle::parse(name, body)?);
        }

        Ok(Self { templates })
    }

    /// Looks up the bundle registered for `template_type`.
    pub(crate) fn get(&self, template_type: &str) -> Result<&TemplateBundle, ConvertError> {
        self.templates
            .get(template_type)
            .ok_or_else(|| ConvertError::TemplateTypeNotFound(template_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tracing_test::traced_test;

    fn registry_from(raw: &str) -> Result<TemplateRegistry, ConvertError> {
        let cfg: HashMap<String, Value> = serde_yaml::from_str(raw).unwrap();
        TemplateRegistry::parse(&cfg)
    }

    #[test]
    fn absent_templates_section_yields_empty_registry() {
        let registry = registry_from("receivers: {otlp: {}}").unwrap();

        let err = registry.get("anything").unwrap_err();
        assert_eq!("template type \"anything\" not found", err.to_string());
    }

    #[test]
    fn templates_section_must_be_a_map() {
        let err = registry_from("templates: [a, b]").unwrap_err();

        assert_matches!(err, ConvertError::TemplatesNotAMap);
        assert_eq!("'templates' must be a map", err.to_string());
    }

    #[test]
    fn template_bundle_must_be_a_map() {
        let err = registry_from("templates: {broken: just a string}").unwrap_err();

        let name = assert_matches!(err, ConvertError::TemplateBundleNotAMap(name) => name);
        assert_eq!("broken", name);
    }

    #[test]
    fn render_substitutes_nested_fields() {
        let registry = registry_from(
            r#"
templates:
  scraper:
    receivers: |
      prometheus/{{ scrape.name }}:
        endpoint: {{ scrape.endpoint }}
"#,
        )
        .unwrap();
        let parameters: Value =
            serde_yaml::from_str("scrape: {name: main, endpoint: localhost:9090}").unwrap();

        let rendered = registry
            .get("scraper")
            .unwrap()
            .render(ComponentKind::Receivers, &parameters)
            .unwrap();

        let component = rendered.get("prometheus/main").unwrap();
        assert_eq!(
            Some("localhost:9090"),
            component.get("endpoint").and_then(Value::as_str)
        );
    }

    #[test]
    fn render_iterates_sequences() {
        let registry = registry_from(
            r#"
templates:
  multi:
    receivers: |
      {% for port in ports %}otlp/{{ port }}:
        endpoint: 0.0.0.0:{{ port }}
      {% endfor %}
"#,
        )
        .unwrap();
        let parameters: Value = serde_yaml::from_str("ports: [4317, 4318]").unwrap();

        let rendered = registry
            .get("multi")
            .unwrap()
            .render(ComponentKind::Receivers, &parameters)
            .unwrap();

        let mut keys: Vec<&String> = rendered.keys().collect();
        keys.sort();
        assert_eq!(vec!["otlp/4317", "otlp/4318"], keys);
    }

    #[test]
    fn render_with_null_parameters_uses_empty_context() {
        let registry = registry_from(
            r#"
templates:
  fixed:
    exporters: |
      debug:
        verbosity: detailed
"#,
        )
        .unwrap();

        let rendered = registry
            .get("fixed")
            .unwrap()
            .render(ComponentKind::Exporters, &Value::Null)
            .unwrap();

        assert!(rendered.contains_key("debug"));
    }

    #[test]
    fn render_fails_on_undefined_variable() {
        let registry = registry_from(
            r#"
templates:
  needy:
    receivers: |
      otlp:
        endpoint: {{ endpoint }}
"#,
        )
        .unwrap();

        let err = registry
            .get("needy")
            .unwrap()
            .render(ComponentKind::Receivers, &Value::Null)
            .unwrap_err();

        assert_matches!(err, ConvertError::Render(_));
        assert!(err.to_string().starts_with("render: "));
    }

    #[test]
    fn empty_slot_renders_to_malformed_output() {
        let registry = registry_from(
            r#"
templates:
  receivers_only:
    receivers: |
      otlp:
        protocols: {grpc: {}}
"#,
        )
        .unwrap();

        let err = registry
            .get("receivers_only")
            .unwrap()
            .render(ComponentKind::Exporters, &Value::Null)
            .unwrap_err();

        assert_matches!(err, ConvertError::Malformed(_));
        assert!(err.to_string().starts_with("malformed: "));
    }

    #[test]
    fn rendered_output_must_be_a_mapping() {
        let registry = registry_from(
            r#"
templates:
  scalar:
    receivers: |
      just a scalar
"#,
        )
        .unwrap();

        let err = registry
            .get("scalar")
            .unwrap()
            .render(ComponentKind::Receivers, &Value::Null)
            .unwrap_err();

        assert_matches!(err, ConvertError::Malformed(_));
    }

    #[traced_test]
    #[test]
    fn unparseable_slot_is_left_empty_with_a_warning() {
        let registry = registry_from(
            r#"
templates:
  broken_slot:
    receivers: |
      otlp:
        endpoint: {{ unclosed
"#,
        )
        .unwrap();

        assert!(logs_contain("failed to parse template"));
        // the failure surfaces once the slot is actually referenced
        let err = registry
            .get("broken_slot")
            .unwrap()
            .render(ComponentKind::Receivers, &Value::Null)
            .unwrap_err();
        assert_matches!(err, ConvertError::Malformed(_));
    }

    #[traced_test]
    #[test]
    fn non_string_slot_is_left_empty_with_a_warning() {
        let registry = registry_from(
            r#"
templates:
  typed_wrong:
    receivers:
      otlp:
        protocols: {grpc: {}}
"#,
        )
        .unwrap();

        assert!(logs_contain("template body is not a string"));
        let err = registry
            .get("typed_wrong")
            .unwrap()
            .render(ComponentKind::Receivers, &Value::Null)
            .unwrap_err();
        assert_matches!(err, ConvertError::Malformed(_));
    }
}
