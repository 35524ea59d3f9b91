use thiserror::Error;

/// The different error types returned while expanding templates. The message
/// text is user-visible and part of the converter's contract.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("'template' must be followed by type")]
    MissingTemplateType,
    #[error("template type {0:?} not found")]
    TemplateTypeNotFound(String),
    #[error("'templates' must be a map")]
    TemplatesNotAMap,
    #[error("'templates::{0}::' must be a map")]
    TemplateBundleNotAMap(String),
    #[error("render: {0}")]
    Render(#[source] tera::Error),
    #[error("malformed: {0}")]
    Malformed(#[source] serde_yaml::Error),
}
