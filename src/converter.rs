//! Single-pass converter that expands `template/<type>[/<name>]` references.
//!
//! Template bodies are [Tera](https://keats.github.io/tera/) programs and the
//! parameter tree under the templated key becomes the render context:
//! `{{ endpoint }}` reads a top-level parameter, `{{ scrape.interval }}` a
//! nested field, and `{% for t in targets %}` iterates a sequence. The
//! rendered text must parse as a YAML mapping of component key to component
//! config.
//!
//! Pipelines are expanded before the component sections so that a pipeline a
//! template introduces can itself be patched with the produced component
//! keys. That ordering is a contract.

pub mod error;
pub mod instance_id;
pub mod kind;
mod registry;

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::config::Config;
use error::ConvertError;
use instance_id::{InstanceId, TEMPLATE_PREFIX};
use kind::ComponentKind;
use registry::TemplateRegistry;

/// Rewrites a loaded configuration document in place. Converters run after
/// the loader and before validation and unmarshalling.
pub trait Converter {
    fn convert(&self, config: &mut Config) -> Result<(), ConvertError>;
}

/// Expands the `templates` section of a document into concrete receivers,
/// processors, exporters and pipelines, patching every pipeline reference to
/// a templated key, and strips the `templates` section from the result.
///
/// Expansion is single pass: keys a rendered template re-introduces with the
/// `template/` prefix are left in place.
#[derive(Debug, Default)]
pub struct TemplateConverter;

impl TemplateConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for TemplateConverter {
    /// The caller's document is only replaced on success, so no partial
    /// rewrite is observable on error.
    fn convert(&self, config: &mut Config) -> Result<(), ConvertError> {
        let mut cfg: HashMap<String, Value> = config.clone().into();
        let registry = TemplateRegistry::parse(&cfg)?;

        expand_pipelines(&registry, &mut cfg)?;
        for kind in ComponentKind::COMPONENT_SECTIONS {
            expand_components(&registry, &mut cfg, kind)?;
        }
        cfg.remove("templates");

        *config = Config::from(cfg);
        Ok(())
    }
}

/// Replaces templated keys under `service.pipelines` with the pipelines their
/// bundle renders. On key collision the rendered pipeline wins. A document
/// without a `service.pipelines` mapping is left untouched.
fn expand_pipelines(
    registry: &TemplateRegistry,
    cfg: &mut HashMap<String, Value>,
) -> Result<(), ConvertError> {
    let Some(pipelines) = service_pipelines_mut(cfg) else {
        return Ok(());
    };
    for (key, parameters) in snapshot_templated(pipelines) {
        let id = InstanceId::try_from(key.as_str())?;
        let rendered = registry
            .get(id.template_type())?
            .render(ComponentKind::Pipelines, &parameters)?;
        debug!(%key, pipelines = rendered.len(), "expanding templated pipeline");

        pipelines.remove(key.as_str());
        for (pipeline_key, pipeline_cfg) in rendered {
            pipelines.insert(Value::String(pipeline_key), pipeline_cfg);
        }
    }
    Ok(())
}

/// Replaces templated keys in the `kind` section with the components their
/// bundle renders, then patches every pipeline that referenced them. A
/// section that is absent or not a mapping is left for the unmarshaler to
/// report.
fn expand_components(
    registry: &TemplateRegistry,
    cfg: &mut HashMap<String, Value>,
    kind: ComponentKind,
) -> Result<(), ConvertError> {
    let templated = match cfg.get(kind.as_str()).and_then(Value::as_mapping) {
        Some(section) => snapshot_templated(section),
        None => return Ok(()),
    };

    for (key, parameters) in templated {
        let id = InstanceId::try_from(key.as_str())?;
        let rendered = registry
            .get(id.template_type())?
            .render(kind, &parameters)?;
        debug!(%key, %kind, components = rendered.len(), "expanding templated components");

        let Some(section) = cfg.get_mut(kind.as_str()).and_then(Value::as_mapping_mut) else {
            return Ok(());
        };
        section.remove(key.as_str());
        let mut inserted = Vec::with_capacity(rendered.len());
        for (component_key, component_cfg) in rendered {
            section.insert(Value::String(component_key.clone()), component_cfg);
            inserted.push(component_key);
        }

        rewrite_pipeline_references(cfg, kind, &key, &inserted);
    }
    Ok(())
}

/// Drops `removed_key` from every pipeline list of the given kind and appends
/// the produced component keys instead. Only lists that actually referenced
/// the template are touched; those are re-sorted for determinism, while every
/// other list keeps its user-authored order verbatim.
fn rewrite_pipeline_references(
    cfg: &mut HashMap<String, Value>,
    kind: ComponentKind,
    removed_key: &str,
    inserted: &[String],
) {
    let Some(pipelines) = service_pipelines_mut(cfg) else {
        return;
    };
    for (_, pipeline) in pipelines.iter_mut() {
        let Some(list) = pipeline.get_mut(kind.as_str()).and_then(Value::as_sequence_mut) else {
            continue;
        };
        let mut patched: Vec<Value> = list
            .iter()
            .filter(|v| v.as_str() != Some(removed_key))
            .cloned()
            .collect();
        if patched.len() == list.len() {
            // this pipeline did not reference the template
            continue;
        }

        patched.extend(inserted.iter().cloned().map(Value::String));
        patched.sort_by(|a, b| {
            a.as_str()
                .unwrap_or_default()
                .cmp(b.as_str().unwrap_or_default())
        });
        *list = patched;
    }
}

/// Typed handle on the `service.pipelines` mapping, if the document has one.
fn service_pipelines_mut(cfg: &mut HashMap<String, Value>) -> Option<&mut Mapping> {
    cfg.get_mut("service")?
        .get_mut("pipelines")?
        .as_mapping_mut()
}

/// Snapshot of the templated entries of a section. Expansion inserts rendered
/// keys into the section it iterates, so it works off a copy of the entries.
fn snapshot_templated(section: &Mapping) -> Vec<(String, Value)> {
    section
        .iter()
        .filter_map(|(key, parameters)| key.as_str().map(|key| (key, parameters)))
        .filter(|(key, _)| key.starts_with(TEMPLATE_PREFIX))
        .map(|(key, parameters)| (key.to_string(), parameters.clone()))
        .collect()
}
