//! Goodwin business cycle model
//!
//! One of the earliest fully dynamical models of the economy: workers get
//! paid for labor, capitalists employ workers with capital and reinvest all
//! profit, and the relative incomes of the two cycle endlessly.
//!
//! The macro relationships are
//!
//! $$ output = labor \cdot productivity $$
//! $$ capital = output \cdot accelerator $$
//! $$ wages = labor \cdot wage $$
//!
//! and near full employment workers demand wage rises through a clamped
//! inverse-square response to the labor fraction, which squeezes profit,
//! cuts investment, and starts the next downturn.

use stockflow_core::config::{FnPlotSpec, ParamSpec, PlotSpec};
use stockflow_core::errors::StockflowResult;
use stockflow_core::functions;
use stockflow_core::model::{Dynamics, ModelState};
use stockflow_core::timeseries::Time;

#[derive(Debug)]
pub struct GoodwinCycle;

impl Dynamics for GoodwinCycle {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("time", 100.0);
        state.param.set("dt", 0.1);
        state.param.set("accelerator", 3.0);
        state.param.set("depreciation", 0.01);
        state.param.set("productivity_rate", 0.02);
        state.param.set("birth_rate", 0.01);

        // asymptote at labor_fraction = 1, clamped just below it
        state.fns.set(
            "wage_change",
            functions::cutoff(
                functions::inverse_square(0.000_064_1, 1.0, 1.0, 0.040_064_1),
                0.9999,
            ),
        );

        state.plots.push(
            PlotSpec::new("share", ["wage_share", "profit_share"]).with_markdown(
                "The model generates the evolution of the relative incomes of \
                 labor and capital from purely self-interacting dynamics.",
            ),
        );
        state
            .plots
            .push(PlotSpec::new("output", ["output", "wages", "capital"]));
        state
            .plots
            .push(PlotSpec::new("people", ["population", "labor"]));
        state.fn_plots.push(
            FnPlotSpec::new("wage_change", (0.8, 0.995)).with_var("labor_fraction"),
        );

        state.editable_params = vec![
            ParamSpec::new("time", 500.0),
            ParamSpec::new("birth_rate", 0.1),
            ParamSpec::new("accelerator", 5.0),
            ParamSpec::new("depreciation", 0.1),
            ParamSpec::new("productivity_rate", 0.1),
        ];
        Ok(())
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.var.set("wage", 0.95);
        state.var.set("productivity", 1.0);
        state.var.set("population", 50.0);
        let labor_fraction = 0.9;
        state
            .var
            .set("labor", labor_fraction * state.var.get("population")?);
        Ok(())
    }

    fn calc_aux_vars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let labor = state.var.get("labor")?;
        let output = labor * state.var.get("productivity")?;
        let wages = labor * state.var.get("wage")?;

        state
            .aux_var
            .set("labor_fraction", labor / state.var.get("population")?);
        state.aux_var.set("output", output);
        state
            .aux_var
            .set("capital", output * state.param.get("accelerator")?);
        state.aux_var.set("wages", wages);
        state.aux_var.set("wage_share", wages / output);
        state.aux_var.set("profit_share", 1.0 - wages / output);
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let wage = state.var.get("wage")?;
        let productivity = state.var.get("productivity")?;

        state.dvar.set(
            "labor",
            state.var.get("labor")?
                * ((1.0 - wage / productivity) / state.param.get("accelerator")?
                    - state.param.get("depreciation")?
                    - state.param.get("productivity_rate")?),
        );
        state.dvar.set(
            "wage",
            state
                .fns
                .call("wage_change", state.aux_var.get("labor_fraction")?)?
                * wage,
        );
        state.dvar.set(
            "productivity",
            state.param.get("productivity_rate")? * productivity,
        );
        state.dvar.set(
            "population",
            state.param.get("birth_rate")? * state.var.get("population")?,
        );
        Ok(())
    }
}
