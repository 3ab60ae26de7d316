// refdq-core/src/application/ports/renderer.rs

use crate::error::RefdqError;

/// Renders the gateway's own statements (type check, impact, merged view, writes).
/// A variable missing from `context` must be an error.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, RefdqError>;
}
