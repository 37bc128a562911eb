//! Page rendering port.

use serde_json::Value;

/// Renders a named page template against a JSON context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Failed to compile template {name}: {reason}")]
    Compile { name: String, reason: String },

    #[error("Failed to render template {name}: {reason}")]
    Render { name: String, reason: String },
}
