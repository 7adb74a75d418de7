//! Elastic spring model
//!
//! The cleanest dynamical model of an oscillating periodic cycle: the
//! second-order equation of motion rewritten as two first-order equations
//! over position and velocity.

use std::f64::consts::PI;
use stockflow_core::config::{ParamSpec, PlotSpec};
use stockflow_core::errors::StockflowResult;
use stockflow_core::model::{Dynamics, ModelState};
use stockflow_core::timeseries::Time;

/// Harmonic oscillator with a configurable period.
#[derive(Debug)]
pub struct Spring;

impl Dynamics for Spring {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("period", 1.0);
        state.param.set("time", 5.0);
        state.param.set("dt", 0.01);
        state.param.set("init_x", 1.0);
        state.param.set("init_v", 0.0);

        state.plots.push(
            PlotSpec::new("spring", ["x", "v"]).with_markdown(
                "A simple transformation of the second-order spring equation \
                 gives the essential predator-prey cycle without the \
                 intrinsic growth factors.",
            ),
        );
        state.editable_params = vec![
            ParamSpec::new("init_x", 5.0).with_min(-5.0),
            ParamSpec::new("init_v", 5.0).with_min(-5.0),
        ];
        state.extract_editable_params()
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.var.set("x", state.param.get("init_x")?);
        state.var.set("v", state.param.get("init_v")?);
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let period = state.param.get("period")?;
        state.dvar.set("x", state.var.get("v")?);
        state.dvar.set(
            "v",
            -4.0 * PI * PI / (period * period) * state.var.get("x")?,
        );
        Ok(())
    }
}
