//! Keen debt-cycle model
//!
//! Steve Keen's extension of the Goodwin cycle: capitalists finance
//! investment beyond profit by borrowing, so private debt becomes a third
//! claimant on output alongside wages and profit. Wage and investment
//! behavior are smooth exponential responses rather than the Goodwin
//! inverse-square curve.

use stockflow_core::config::{FnPlotSpec, ParamSpec, PlotSpec};
use stockflow_core::errors::StockflowResult;
use stockflow_core::functions;
use stockflow_core::model::{Dynamics, ModelState};
use stockflow_core::timeseries::Time;

/// Goodwin cycle plus private debt.
///
/// Investment responds to the profit rate; the gap between investment and
/// profit is financed by debt, and interest on that debt feeds back into
/// the profit calculation:
///
/// $$ \frac{d(debt)}{dt} = invest\\_change(profit\\_rate) \cdot output - profit $$
#[derive(Debug)]
pub struct KeenCycle;

impl Dynamics for KeenCycle {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("time", 100.0);
        state.param.set("dt", 0.1);
        state.param.set("birth_rate", 0.01);
        state.param.set("accelerator", 3.0);
        state.param.set("depreciation", 0.01);
        state.param.set("productivity_rate", 0.02);
        state.param.set("interest_multiplier", 0.04);
        state.param.set("interest", 0.04);

        state
            .fns
            .set("wage_change", functions::exponential(0.95, 0.0, 0.5, -0.01));
        state.fns.set(
            "invest_change",
            functions::exponential(0.05, 0.05, 1.75, 0.0),
        );

        state.plots.push(PlotSpec::new(
            "share of output",
            ["bank_share", "wage_share", "profit_share"],
        ));
        state
            .plots
            .push(PlotSpec::new("people", ["population", "labor"]));
        state.plots.push(PlotSpec::new(
            "output",
            ["output", "wages", "debt", "profit", "bank"],
        ));
        state
            .fn_plots
            .push(FnPlotSpec::new("wage_change", (0.8, 1.1)));
        state
            .fn_plots
            .push(FnPlotSpec::new("invest_change", (-0.5, 0.3)));

        state.editable_params = vec![
            ParamSpec::new("time", 500.0),
            ParamSpec::new("birth_rate", 0.1),
            ParamSpec::new("accelerator", 5.0),
            ParamSpec::new("depreciation", 0.1),
            ParamSpec::new("productivity_rate", 0.1),
            ParamSpec::new("interest_multiplier", 0.5),
            ParamSpec::new("interest", 0.2),
        ];
        Ok(())
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.var.set("wage", 0.95);
        state.var.set("productivity", 1.0);
        state.var.set("population", 50.0);
        state.var.set(
            "output",
            0.9 * state.var.get("population")? * state.var.get("productivity")?,
        );
        state.var.set("debt", 0.0);
        Ok(())
    }

    fn calc_aux_vars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let output = state.var.get("output")?;
        let labor = output / state.var.get("productivity")?;
        let wages = state.var.get("wage")? * labor;
        let debt_ratio = state.var.get("debt")? / output;
        let interest_rate = state.param.get("interest")?
            + state.param.get("interest_multiplier")? * debt_ratio;
        let bank = interest_rate * state.var.get("debt")?;
        let profit = output - wages - bank;
        let capital = output * state.param.get("accelerator")?;
        let profit_rate = profit / capital;

        state.aux_var.set("labor", labor);
        state
            .aux_var
            .set("labor_fraction", labor / state.var.get("population")?);
        state.aux_var.set("wages", wages);
        state.aux_var.set("debt_ratio", debt_ratio);
        state.aux_var.set("interest_rate", interest_rate);
        state.aux_var.set("bank", bank);
        state.aux_var.set("profit", profit);
        state.aux_var.set("wage_share", wages / output);
        state.aux_var.set("bank_share", bank / output);
        state
            .aux_var
            .set("profit_share", 1.0 - wages / output - bank / output);
        state.aux_var.set("capital", capital);
        state.aux_var.set("profit_rate", profit_rate);
        state
            .aux_var
            .set("investment_change", state.fns.call("invest_change", profit_rate)?);
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let output = state.var.get("output")?;
        let investment_change = state.aux_var.get("investment_change")?;

        state.dvar.set(
            "output",
            output
                * (investment_change / state.param.get("accelerator")?
                    - state.param.get("depreciation")?),
        );
        state.dvar.set(
            "wage",
            state
                .fns
                .call("wage_change", state.aux_var.get("labor_fraction")?)?
                * state.var.get("wage")?,
        );
        state.dvar.set(
            "productivity",
            state.param.get("productivity_rate")? * state.var.get("productivity")?,
        );
        state.dvar.set(
            "population",
            state.param.get("birth_rate")? * state.var.get("population")?,
        );
        state.dvar.set(
            "debt",
            investment_change * output - state.aux_var.get("profit")?,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use stockflow_core::model::Model;

    fn short_run() -> Model {
        let mut model = Model::new(KeenCycle).unwrap();
        model.state_mut().param.set("time", 50.0);
        model
    }

    #[test]
    fn output_claims_sum_to_one() {
        let mut model = short_run();
        model.run().unwrap();

        let wage_share = model.solution().get("wage_share").unwrap();
        let bank_share = model.solution().get("bank_share").unwrap();
        let profit_share = model.solution().get("profit_share").unwrap();
        for i in 0..wage_share.len() {
            assert!(is_close!(
                wage_share[i] + bank_share[i] + profit_share[i],
                1.0
            ));
        }
    }

    #[test]
    fn borrowing_finances_the_investment_gap() {
        let mut model = short_run();
        model.run().unwrap();

        let debt = model.solution().get("debt").unwrap();
        assert_eq!(debt[0], 0.0);
        assert!(debt.iter().all(|&d| d.is_finite()));
        // investment starts below profit at these defaults, so early
        // "borrowing" is actually repayment and debt goes negative
        assert!(debt[debt.len() - 1] != 0.0);
    }

    #[test]
    fn population_grows_exponentially() {
        let mut model = short_run();
        model.run().unwrap();

        let population = model.solution().get("population").unwrap();
        assert!(is_close!(
            population[population.len() - 1],
            50.0 * (0.01f64 * 50.0).exp(),
            rel_tol = 1e-4
        ));
    }
}
