//! # Template converter
//!
//! This library expands user-defined templates inside collector pipeline
//! configurations. A configuration may declare parameterized fragments under
//! a top-level `templates` section and reference them from the `receivers`,
//! `processors`, `exporters` and `service.pipelines` sections with keys of
//! the form `template/<type>[/<name>]`. After conversion the document is
//! equivalent to one written without templates.

pub mod config;
pub mod converter;
