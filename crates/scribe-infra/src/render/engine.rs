//! Liquid template renderer with the page templates compiled into the binary.

use std::collections::HashMap;

use liquid::model::Value as LiquidValue;
use liquid::{Parser, ParserBuilder, Template};
use serde_json::Value;

use scribe_core::ports::{RenderError, TemplateRenderer};

/// Wraps every page; receives the page's own context plus `body`.
const LAYOUT: &str = "layout.html";

const TEMPLATES: &[(&str, &str)] = &[
    (LAYOUT, include_str!("../../templates/layout.html.liquid")),
    ("blog/home.html", include_str!("../../templates/blog/home.html.liquid")),
    (
        "blog/post_detail.html",
        include_str!("../../templates/blog/post_detail.html.liquid"),
    ),
    (
        "blog/post_form.html",
        include_str!("../../templates/blog/post_form.html.liquid"),
    ),
    (
        "blog/post_confirm_delete.html",
        include_str!("../../templates/blog/post_confirm_delete.html.liquid"),
    ),
    ("blog/about.html", include_str!("../../templates/blog/about.html.liquid")),
    ("users/login.html", include_str!("../../templates/users/login.html.liquid")),
    (
        "users/register.html",
        include_str!("../../templates/users/register.html.liquid"),
    ),
];

pub struct LiquidRenderer {
    templates: HashMap<&'static str, Template>,
}

impl LiquidRenderer {
    /// Compile all templates up front so a broken template fails at startup.
    pub fn new() -> Result<Self, RenderError> {
        let parser = ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| RenderError::Compile {
                name: "<parser>".to_string(),
                reason: e.to_string(),
            })?;

        let mut templates = HashMap::with_capacity(TEMPLATES.len());
        for (name, source) in TEMPLATES {
            templates.insert(*name, compile(&parser, name, source)?);
        }

        tracing::debug!(count = templates.len(), "Templates compiled");
        Ok(Self { templates })
    }

    fn template(&self, name: &str) -> Result<&Template, RenderError> {
        self.templates
            .get(name)
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))
    }
}

fn compile(parser: &Parser, name: &str, source: &str) -> Result<Template, RenderError> {
    parser.parse(source).map_err(|e| RenderError::Compile {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

impl TemplateRenderer for LiquidRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        let page = self.template(template)?;
        let render_error = |name: &str, e: liquid::Error| RenderError::Render {
            name: name.to_string(),
            reason: e.to_string(),
        };

        let mut globals =
            liquid::model::to_object(context).map_err(|e| render_error(template, e))?;
        let body = page.render(&globals).map_err(|e| render_error(template, e))?;

        globals.insert("body".into(), LiquidValue::scalar(body));
        self.template(LAYOUT)?
            .render(&globals)
            .map_err(|e| render_error(LAYOUT, e))
    }
}
