//! Turchin demographic-state model
//!
//! A population grows against a carrying capacity that the state itself
//! raises by spending tax revenue; when population presses the capacity,
//! surplus vanishes, revenue collapses, and capacity falls back — the
//! secular boom-bust cycle of agrarian states.

use stockflow_core::config::{FnPlotSpec, ParamSpec, PlotSpec};
use stockflow_core::errors::StockflowResult;
use stockflow_core::model::{Dynamics, ModelState};
use stockflow_core::timeseries::Time;

/// Population density coupled to accumulated state revenue.
///
/// The carrying-capacity response is rebuilt from the current parameters on
/// every run, so editing `carry_capacity_diff` or `state_at_half_capacity`
/// between runs takes effect without reconstructing the model.
#[derive(Debug)]
pub struct TurchinState;

impl Dynamics for TurchinState {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("time", 500.0);
        state.param.set("max_surplus", 1.0);
        state.param.set("tax_on_surplus", 1.0);
        state.param.set("growth", 0.02);
        state.param.set("expenditure_per_capita", 0.25);
        state.param.set("state_at_half_capacity", 10.0);
        state.param.set("carry_capacity_diff", 3.0);

        state.plots.push(
            PlotSpec::new("people", ["population_density", "carrying_capacity"]).with_ymin(0.0),
        );
        state.plots.push(PlotSpec::new("surplus", ["surplus"]));
        state
            .plots
            .push(PlotSpec::new("state revenue", ["state_revenue"]));
        state
            .fn_plots
            .push(FnPlotSpec::new("carrying_capacity_fn", (0.0, 100.0)).with_ymin(0.0));

        state.editable_params = vec![
            ParamSpec::new("time", 1000.0),
            ParamSpec::new("max_surplus", 2.0),
            ParamSpec::new("tax_on_surplus", 2.0),
            ParamSpec::new("growth", 0.1),
        ];
        Ok(())
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        let diff = state.param.get("carry_capacity_diff")?;
        let half = state.param.get("state_at_half_capacity")?;
        state.fns.set(
            "carrying_capacity_fn",
            Box::new(move |revenue| {
                if revenue < 0.0 {
                    return 1.0;
                }
                1.0 + diff * (revenue / (half + revenue))
            }),
        );

        state.var.set("population_density", 0.2);
        state.var.set("state_revenue", 0.0);
        Ok(())
    }

    fn calc_aux_vars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let capacity = state
            .fns
            .call("carrying_capacity_fn", state.var.get("state_revenue")?)?;
        state.aux_var.set("carrying_capacity", capacity);
        state.aux_var.set(
            "surplus",
            state.param.get("max_surplus")?
                * (1.0 - state.var.get("population_density")? / capacity),
        );
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let density = state.var.get("population_density")?;
        let surplus = state.aux_var.get("surplus")?;

        state.dvar.set(
            "population_density",
            state.param.get("growth")? * density * surplus,
        );
        state.dvar.set(
            "state_revenue",
            state.param.get("tax_on_surplus")? * density * surplus
                - state.param.get("expenditure_per_capita")? * density,
        );
        Ok(())
    }
}
