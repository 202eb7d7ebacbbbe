//! HTML template environment shared by all page modules.
//!
//! Modules embed their `templates/` directory with `rust-embed` and add it
//! during `init`. The environment always carries the built-in layout
//! (`base.html`) and the error pages (`403.html`, `404.html`, `500.html`).
//!
//! Available in every template:
//! - `url(name, *args)`: reverse a named route, fails on unknown names;
//! - `name is route`: whether a route with that name is registered.

use minijinja::value::{Rest, Value};
use minijinja::{Environment, ErrorKind};
use parking_lot::RwLock;
use rust_embed::RustEmbed;
use std::sync::Arc;

use crate::urls::UrlRegistry;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Builtin;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Engine(#[from] minijinja::Error),

    #[error("template '{0}' is not valid UTF-8")]
    Encoding(String),
}

pub struct Templates {
    env: RwLock<Environment<'static>>,
}

impl Templates {
    pub fn new(urls: Arc<UrlRegistry>) -> Self {
        let mut env = Environment::new();

        let reverse = urls.clone();
        env.add_function(
            "url",
            move |name: String, args: Rest<Value>| -> Result<Value, minijinja::Error> {
                let args: Vec<String> = args.iter().map(|v| v.to_string()).collect();
                let refs: Vec<&str> = args.iter().map(String::as_str).collect();
                reverse
                    .reverse(&name, &refs)
                    .map(Value::from_safe_string)
                    .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()))
            },
        );
        env.add_test("route", move |name: String| urls.pattern(&name).is_some());

        let templates = Self {
            env: RwLock::new(env),
        };
        if let Err(e) = templates.add_embedded::<Builtin>() {
            tracing::error!(error = %e, "failed to load built-in templates");
        }
        templates
    }

    pub fn add_template(&self, name: &str, source: String) -> Result<(), TemplateError> {
        self.env
            .write()
            .add_template_owned(name.to_string(), source)?;
        Ok(())
    }

    /// Add every file of an embedded folder, named by its relative path.
    pub fn add_embedded<E: RustEmbed>(&self) -> Result<usize, TemplateError> {
        let mut count = 0;
        for name in E::iter() {
            let Some(file) = E::get(&name) else {
                continue;
            };
            let source = String::from_utf8(file.data.into_owned())
                .map_err(|_| TemplateError::Encoding(name.to_string()))?;
            self.add_template(&name, source)?;
            count += 1;
        }
        tracing::debug!(count, "templates loaded");
        Ok(count)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.env.read().get_template(name).is_ok()
    }

    pub fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, TemplateError> {
        let env = self.env.read();
        let tmpl = env.get_template(name)?;
        Ok(tmpl.render(context)?)
    }
}
