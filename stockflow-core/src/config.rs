//! Passive descriptors consumed by a presentation layer, and parameter
//! overrides loaded from TOML.
//!
//! Nothing in this module has behavior beyond construction: plots and
//! editable-parameter records are plain data that a UI (not part of this
//! workspace) reads to decide what to draw and which params to expose.

use crate::errors::{StockflowError, StockflowResult};
use crate::state::NamedState;
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Descriptor of a time-series plot over solution series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub title: String,
    /// Names of the `var`/`aux_var` series to draw together.
    pub vars: Vec<String>,
    /// Optional commentary rendered alongside the plot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ymin: Option<FloatValue>,
}

impl PlotSpec {
    pub fn new<I, S>(title: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.to_string(),
            vars: vars.into_iter().map(Into::into).collect(),
            markdown: None,
            ymin: None,
        }
    }

    pub fn with_markdown(mut self, markdown: &str) -> Self {
        self.markdown = Some(markdown.to_string());
        self
    }

    pub fn with_ymin(mut self, ymin: FloatValue) -> Self {
        self.ymin = Some(ymin);
        self
    }
}

/// Descriptor of a shape-function plot: the named `fn` sampled over
/// `xlims`, optionally annotated with the aux var it is usually fed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnPlotSpec {
    pub fn_key: String,
    pub xlims: (FloatValue, FloatValue),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ymin: Option<FloatValue>,
}

impl FnPlotSpec {
    pub fn new(fn_key: &str, xlims: (FloatValue, FloatValue)) -> Self {
        Self {
            fn_key: fn_key.to_string(),
            xlims,
            var: None,
            ymin: None,
        }
    }

    pub fn with_var(mut self, var: &str) -> Self {
        self.var = Some(var.to_string());
        self
    }

    pub fn with_ymin(mut self, ymin: FloatValue) -> Self {
        self.ymin = Some(ymin);
        self
    }
}

/// Descriptor of a parameter the presentation layer may edit between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub key: String,
    pub max: FloatValue,
    #[serde(default)]
    pub min: FloatValue,
}

impl ParamSpec {
    pub fn new(key: &str, max: FloatValue) -> Self {
        Self {
            key: key.to_string(),
            max,
            min: 0.0,
        }
    }

    pub fn with_min(mut self, min: FloatValue) -> Self {
        self.min = min;
        self
    }
}

/// Parse a flat TOML table of numeric parameter overrides.
pub fn parse_param_overrides(text: &str) -> StockflowResult<HashMap<String, FloatValue>> {
    toml::from_str(text).map_err(|e| StockflowError::Error(format!("parsing overrides: {}", e)))
}

/// Apply overrides onto an existing `param` container.
///
/// Overriding a parameter the model never declared is an error; overrides
/// adjust a model, they do not extend it.
pub fn apply_param_overrides(
    param: &mut NamedState,
    overrides: &HashMap<String, FloatValue>,
) -> StockflowResult<()> {
    for (key, value) in overrides {
        if !param.contains(key) {
            return Err(StockflowError::UndeclaredKey {
                role: param.role().to_string(),
                key: key.clone(),
            });
        }
        param.set(key, *value);
    }
    Ok(())
}

/// Load a TOML file of parameter overrides and apply it to `param`.
pub fn load_params(param: &mut NamedState, path: &Path) -> StockflowResult<()> {
    let text = fs::read_to_string(path)
        .map_err(|e| StockflowError::Error(format!("reading {}: {}", path.display(), e)))?;
    let overrides = parse_param_overrides(&text)?;
    apply_param_overrides(param, &overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_spec_roundtrips_through_json() {
        let spec = PlotSpec::new("ecology", ["predator", "prey"])
            .with_markdown("Oscillating populations.")
            .with_ymin(0.0);

        let json = serde_json::to_string(&spec).unwrap();
        let back: PlotSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }

    #[test]
    fn param_spec_min_defaults_to_zero() {
        let spec: ParamSpec = serde_json::from_str(r#"{"key": "time", "max": 100.0}"#).unwrap();
        assert_eq!(spec.min, 0.0);

        let spec = ParamSpec::new("init_x", 5.0).with_min(-5.0);
        assert_eq!(spec.min, -5.0);
    }

    #[test]
    fn overrides_apply_to_declared_params() {
        let mut param = NamedState::new("param");
        param.set("time", 100.0);
        param.set("birth_rate", 0.01);

        let overrides = parse_param_overrides("time = 50\nbirth_rate = 0.02\n").unwrap();
        apply_param_overrides(&mut param, &overrides).unwrap();

        assert_eq!(param.get("time").unwrap(), 50.0);
        assert_eq!(param.get("birth_rate").unwrap(), 0.02);
    }

    #[test]
    fn overriding_unknown_param_is_an_error() {
        let mut param = NamedState::new("param");
        param.set("time", 100.0);

        let overrides = parse_param_overrides("growth = 0.5\n").unwrap();
        let result = apply_param_overrides(&mut param, &overrides);
        assert!(matches!(
            result,
            Err(StockflowError::UndeclaredKey { .. })
        ));
    }
}
