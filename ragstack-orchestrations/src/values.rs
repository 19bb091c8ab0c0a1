//! Chart values overrides rendered from Tera templates
//!
//! Templates see:
//! - `namespace`: target namespace
//! - `release`: the component's release name
//! - `services`: map of component name to in-cluster base URL, for every
//!   component that declares a `servicePort`

use std::collections::BTreeMap;

use ragstack_models::{Component, ComponentKind};
use tera::{Context as TeraContext, Tera};

use crate::error::ConfigurationError;

/// Rendered values document handed to the chart backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesOverride(pub String);

impl ValuesOverride {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn template_of(component: &Component) -> Option<&str> {
    match &component.kind {
        ComponentKind::Chart(chart) => chart.values_template.as_deref(),
        ComponentKind::Manifest(_) => None,
    }
}

fn template_error(component: &Component, err: impl std::fmt::Display) -> ConfigurationError {
    ConfigurationError::Template {
        component: component.name.clone(),
        message: err.to_string(),
    }
}

/// Check that a component's values template parses
pub fn validate(component: &Component) -> Result<(), ConfigurationError> {
    if let Some(template) = template_of(component) {
        let mut tera = Tera::default();
        tera.add_raw_template(&component.name, template)
            .map_err(|e| template_error(component, e))?;
    }
    Ok(())
}

/// Render the values override for `component`, if it has a template
pub fn render<'a>(
    component: &Component,
    stack: impl IntoIterator<Item = &'a Component>,
) -> Result<Option<ValuesOverride>, ConfigurationError> {
    let Some(template) = template_of(component) else {
        return Ok(None);
    };

    let mut tera = Tera::default();
    tera.add_raw_template(&component.name, template)
        .map_err(|e| template_error(component, e))?;

    let services: BTreeMap<String, String> = stack
        .into_iter()
        .filter_map(|c| c.service_url().map(|url| (c.name.clone(), url)))
        .collect();

    let mut ctx = TeraContext::new();
    ctx.insert("namespace", &component.namespace);
    ctx.insert("release", component.release_name());
    ctx.insert("services", &services);

    let rendered = tera
        .render(&component.name, &ctx)
        .map_err(|e| template_error(component, e))?;

    // Helm would reject it later anyway; fail before touching the cluster
    serde_yaml::from_str::<serde_yaml::Value>(&rendered)
        .map_err(|e| template_error(component, e))?;

    Ok(Some(ValuesOverride(rendered)))
}
