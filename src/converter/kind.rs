use std::fmt::{Display, Formatter};

/// The four component kinds a template bundle may provide a slot for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Receivers,
    Processors,
    Exporters,
    Pipelines,
}

impl ComponentKind {
    /// All slot kinds, in the order they are parsed from a bundle.
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Receivers,
        ComponentKind::Processors,
        ComponentKind::Exporters,
        ComponentKind::Pipelines,
    ];

    /// The top-level component sections, in expansion order.
    pub const COMPONENT_SECTIONS: [ComponentKind; 3] = [
        ComponentKind::Receivers,
        ComponentKind::Processors,
        ComponentKind::Exporters,
    ];

    /// The section/slot key this kind is stored under.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Receivers => "receivers",
            ComponentKind::Processors => "processors",
            ComponentKind::Exporters => "exporters",
            ComponentKind::Pipelines => "pipelines",
        }
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
