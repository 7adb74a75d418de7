#![allow(dead_code)]

//! Minimal models used by the core tests.

use crate::errors::StockflowResult;
use crate::flows::Flow;
use crate::model::{Dynamics, ModelState};
use crate::timeseries::Time;

/// One variable decaying at a constant relative rate: `dx/dt = rate * x`.
#[derive(Debug)]
pub(crate) struct ExponentialDecay;

impl Dynamics for ExponentialDecay {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("x0", 100.0);
        state.param.set("rate", -0.1);
        state.param.set("time", 10.0);
        state.param.set("dt", 1.0);
        Ok(())
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.var.set("x", state.param.get("x0")?);
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        state
            .dvar
            .set("x", state.param.get("rate")? * state.var.get("x")?);
        Ok(())
    }
}

/// Two compartments joined by a single constant flow: whatever leaves `a`
/// arrives in `b`.
#[derive(Debug)]
pub(crate) struct TwoCompartment;

impl Dynamics for TwoCompartment {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("transfer", 5.0);
        state.param.set("time", 10.0);
        state.param.set("dt", 1.0);
        state.aux_var_flows.push(Flow::new("a", "b", "rate"));
        Ok(())
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.var.set("a", 100.0);
        state.var.set("b", 0.0);
        Ok(())
    }

    fn calc_aux_vars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        state.aux_var.set("rate", state.param.get("transfer")?);
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        state.add_flows_to_dvars()
    }
}
