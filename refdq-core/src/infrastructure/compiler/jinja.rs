// refdq-core/src/infrastructure/compiler/jinja.rs

// Renders the built-in statement templates. User check SQL does not go through
// here: it uses `{name}` placeholders and the domain SqlTemplate.

use minijinja::{Environment, UndefinedBehavior};

use crate::application::ports::TemplateEngine;
use crate::domain::compiler::quoter::{Quoter, cast_expression};
use crate::error::RefdqError;
use crate::infrastructure::error::InfrastructureError;

pub struct JinjaRenderer<'a> {
    env: Environment<'a>,
}

impl<'a> JinjaRenderer<'a> {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        // {{ col | ident }} -> "COL"
        env.add_filter("ident", |value: &str| Quoter::ident(value));
        // {{ name | literal }} -> 'name'
        env.add_filter("literal", |value: &str| Quoter::literal(value));
        // {{ expr | cast(data_type) }} -> CAST / TRY_CAST by type
        env.add_filter("cast", |value: &str, data_type: &str| {
            cast_expression(value, data_type)
        });

        Self { env }
    }
}

impl<'a> Default for JinjaRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TemplateEngine for JinjaRenderer<'a> {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, RefdqError> {
        self.env
            .render_str(template, context)
            .map(|sql| sql.trim().to_string())
            .map_err(|e| RefdqError::Infrastructure(InfrastructureError::TemplateError(e)))
    }
}
