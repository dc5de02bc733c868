use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("compile error: call to unknown routine '{name}'")]
    UnknownRoutine { name: String },

    #[error("compile error: parameter '{param}' of routine '{routine}' is not bound")]
    UnboundParameter { routine: String, param: String },

    #[error("compile error: routine '{routine}' has no parameter '{param}'")]
    UnknownParameter { routine: String, param: String },

    /// A value was written to something that is neither a slot nor a member
    #[error("compile error: '{target}' is not writable")]
    NotWritable { target: String },

    /// The scope resolver never saw this name and it is not a constant
    #[error("compile error: variable '{name}' is not registered in routine '{routine}'")]
    UnregisteredVariable { routine: String, name: String },

    #[error("compile error: label '{name}' defined twice in routine '{routine}'")]
    DuplicateLabel { routine: String, name: String },

    #[error("compile error: routine '{name}' defined twice")]
    DuplicateRoutine { name: String },

    #[error("compile error: constant '{name}' defined twice")]
    DuplicateConstant { name: String },

    #[error("compile error: jump to undefined label '{name}' in routine '{routine}'")]
    UndefinedLabel { routine: String, name: String },

    #[error("compile error: call to undefined routine '{name}'")]
    UndefinedRoutine { name: String },

    /// A `{...}` embed in a debug template that cannot be generated
    #[error("compile error: bad embed in debug template '{template}': {reason}")]
    BadTemplate { template: String, reason: String },

    /// A node that's valid but appeared in an invalid position
    #[error("{}", describe_position(node_type, name.as_deref(), reason, hint.as_deref()))]
    InvalidPosition {
        node_type: String,
        name: Option<String>,
        reason: String,
        hint: Option<String>,
    },

    /// Internal compiler error (shouldn't happen in normal use)
    #[error("compile error: internal error: {0}")]
    Internal(String),
}

impl CompileError {
    /// Create an error for a node in the wrong position, without a hint
    pub fn invalid_position(node_type: &str, name: Option<&str>, reason: &str) -> Self {
        CompileError::InvalidPosition {
            node_type: node_type.to_string(),
            name: name.map(str::to_string),
            reason: reason.to_string(),
            hint: None,
        }
    }

    /// Create an error for a definition (`rout`, `seq`, `use`) inside a body
    pub fn definition_in_body(node_type: &str, name: &str) -> Self {
        CompileError::InvalidPosition {
            node_type: node_type.to_string(),
            name: Some(name.to_string()),
            reason: "definitions cannot appear inside a routine body".to_string(),
            hint: Some("move the definition to the top level of the file".to_string()),
        }
    }

    pub fn bad_template(template: &str, reason: impl Into<String>) -> Self {
        CompileError::BadTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }
}

fn describe_position(
    node_type: &str,
    name: Option<&str>,
    reason: &str,
    hint: Option<&str>,
) -> String {
    let mut msg = match name {
        Some(n) => format!("compile error: {} '{}': {}", node_type, n, reason),
        None => format!("compile error: {}: {}", node_type, reason),
    };
    if let Some(h) = hint {
        msg.push_str("\n  hint: ");
        msg.push_str(h);
    }
    msg
}
