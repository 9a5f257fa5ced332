//! Template variables for data-driven stage definitions.
//!
//! Stage paths and tool arguments are handlebars templates. Rendering is
//! strict: an unknown variable is a configuration error, never an empty string.

use crate::bundler::error::{Error, Result};
use handlebars::Handlebars;
use std::collections::BTreeMap;

/// Named list variables that `each` argument templates can expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListVar {
    /// `<staged dir><sep><dest>` pairs for the packager's data-inclusion flag.
    DataRules,
    /// Module names the packager cannot discover by itself.
    HiddenImports,
}

/// Scalar and list variables for one pipeline run.
pub struct TemplateVars {
    registry: Handlebars<'static>,
    scalars: BTreeMap<String, String>,
    lists: BTreeMap<ListVar, Vec<String>>,
}

impl std::fmt::Debug for TemplateVars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateVars")
            .field("scalars", &self.scalars)
            .field("lists", &self.lists)
            .finish()
    }
}

impl Default for TemplateVars {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        Self {
            registry,
            scalars: BTreeMap::new(),
            lists: BTreeMap::new(),
        }
    }
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar variable.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.scalars.insert(key.to_string(), value.into());
        self
    }

    /// Sets a list variable.
    pub fn set_list(&mut self, var: ListVar, values: Vec<String>) -> &mut Self {
        self.lists.insert(var, values);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.scalars.get(key).map(String::as_str)
    }

    pub fn list(&self, var: ListVar) -> &[String] {
        self.lists.get(&var).map(Vec::as_slice).unwrap_or_default()
    }

    /// Renders `template` against the scalar variables.
    pub fn render(&self, template: &str) -> Result<String> {
        self.render_with(template, &self.scalars)
    }

    /// Renders `template` once per element of `var`, exposing it as `{{item}}`.
    pub fn render_each(&self, var: ListVar, template: &str) -> Result<Vec<String>> {
        self.list(var)
            .iter()
            .map(|item| {
                let mut data = self.scalars.clone();
                data.insert("item".to_string(), item.clone());
                self.render_with(template, &data)
            })
            .collect()
    }

    fn render_with(&self, template: &str, data: &BTreeMap<String, String>) -> Result<String> {
        self.registry
            .render_template(template, data)
            .map_err(|e| Error::Config(format!("cannot render template `{template}`: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_variables() {
        let mut vars = TemplateVars::new();
        vars.set("dist_dir", "/out/dist").set("exe_name", "WebShell");
        assert_eq!(
            vars.render("{{dist_dir}}/{{exe_name}}").unwrap(),
            "/out/dist/WebShell"
        );
    }

    #[test]
    fn unknown_variable_is_config_error() {
        let vars = TemplateVars::new();
        let err = vars.render("{{nope}}").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn each_expands_items_in_order() {
        let mut vars = TemplateVars::new();
        vars.set("data_sep", ":");
        vars.set_list(ListVar::HiddenImports, vec!["a.b".into(), "c".into()]);
        assert_eq!(
            vars.render_each(ListVar::HiddenImports, "{{item}}").unwrap(),
            ["a.b", "c"]
        );
        assert!(vars.render_each(ListVar::DataRules, "{{item}}").unwrap().is_empty());
    }

    #[test]
    fn no_html_escaping() {
        let mut vars = TemplateVars::new();
        vars.set("name", "Tom & Jerry's <app>");
        assert_eq!(vars.render("{{name}}").unwrap(), "Tom & Jerry's <app>");
    }
}
