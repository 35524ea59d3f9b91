use super::error::ConvertError;

/// Prefix marking a component key as a template reference.
pub const TEMPLATE_PREFIX: &str = "template";

/// The `(type, optional name)` pair parsed from a templated component key
/// such as `template/my_type` or `template/my_type/instance_a`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InstanceId {
    template_type: String,
    instance_name: Option<String>,
}

impl InstanceId {
    /// The template type this key refers to.
    pub fn template_type(&self) -> &str {
        &self.template_type
    }

    /// The instance name, when the key carried one.
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// Reassembles the key form under the given prefix.
    pub fn with_prefix(&self, prefix: &str) -> String {
        match &self.instance_name {
            Some(name) => format!("{prefix}/{}/{name}", self.template_type),
            None => format!("{prefix}/{}", self.template_type),
        }
    }
}

impl TryFrom<&str> for InstanceId {
    type Error = ConvertError;

    /// Parses a key into at most three `/`-separated parts; additional
    /// slashes stay inside the instance name. Callers only hand over keys
    /// already known to start with [`TEMPLATE_PREFIX`], so the prefix part
    /// itself is not validated here.
    fn try_from(id: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = id.splitn(3, '/').collect();
        match parts.as_slice() {
            [_, template_type] if !template_type.is_empty() => Ok(InstanceId {
                template_type: template_type.to_string(),
                instance_name: None,
            }),
            [_, template_type, name] if !template_type.is_empty() => Ok(InstanceId {
                template_type: template_type.to_string(),
                instance_name: (!name.is_empty()).then(|| name.to_string()),
            }),
            _ => Err(ConvertError::MissingTemplateType),
        }
    }
}
