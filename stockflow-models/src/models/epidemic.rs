//! SIR epidemiology model
//!
//! The standard three-compartment model of a transmissible disease.
//! Both transitions are conserved flows: infection moves people from
//! `susceptible` to `infectious` at the force of infection, and recovery
//! moves them from `infectious` to `recovered` at the recovery rate, so
//! the total population is invariant by construction.

use stockflow_core::config::{ParamSpec, PlotSpec};
use stockflow_core::errors::StockflowResult;
use stockflow_core::flows::Flow;
use stockflow_core::model::{Dynamics, ModelState};
use stockflow_core::timeseries::Time;

/// Susceptible-infectious-recovered compartmental model.
///
/// The force of infection is
///
/// $$ rate\\_force = contact\\_rate \cdot \frac{infectious}{population} \cdot susceptible $$
///
/// with $contact\\_rate = reproduction\\_number / infectious\\_period$. The
/// recovery rate is the reciprocal of the infectious period; both derived
/// parameters are recomputed from their inputs on every run.
#[derive(Debug)]
pub struct Sir;

impl Dynamics for Sir {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("time", 300.0);
        state.param.set("initial_population", 50000.0);
        state.param.set("initial_prevalence", 3000.0);
        state.param.set("recover_rate", 0.1);
        state.param.set("reproduction_number", 1.5);
        state.param.set("infectious_period", 10.0);

        state
            .aux_var_flows
            .push(Flow::new("susceptible", "infectious", "rate_force"));
        state
            .param_flows
            .push(Flow::new("infectious", "recovered", "recover_rate"));

        state.plots.push(
            PlotSpec::new(
                "populations",
                ["susceptible", "infectious", "recovered"],
            )
            .with_markdown(
                "The SIR model is the most basic epidemiological model of a \
                 transmissible disease: the decline of one compartment is the \
                 growth of another.",
            ),
        );
        state
            .plots
            .push(PlotSpec::new("effective reproduction number", ["rn"]));

        state.editable_params = vec![
            ParamSpec::new("time", 1000.0),
            ParamSpec::new("infectious_period", 100.0),
            ParamSpec::new("reproduction_number", 15.0),
            ParamSpec::new("initial_prevalence", 100000.0),
            ParamSpec::new("initial_population", 100000.0),
        ];
        Ok(())
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        let recover_rate = 1.0 / state.param.get("infectious_period")?;
        state.param.set("recover_rate", recover_rate);
        state.param.set(
            "contact_rate",
            state.param.get("reproduction_number")? * recover_rate,
        );

        let population = state.param.get("initial_population")?;
        let prevalence = state.param.get("initial_prevalence")?;
        state.var.set("infectious", prevalence);
        state.var.set("susceptible", population - prevalence);
        state.var.set("recovered", 0.0);
        Ok(())
    }

    fn calc_aux_vars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let population: f64 = state.var.iter().map(|(_, v)| v).sum();
        let infectious = state.var.get("infectious")?;
        let susceptible = state.var.get("susceptible")?;

        state.aux_var.set("population", population);
        state.aux_var.set(
            "rate_force",
            (state.param.get("contact_rate")? / population) * infectious * susceptible,
        );
        state.aux_var.set(
            "rn",
            (susceptible / population) * state.param.get("reproduction_number")?,
        );
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        state.add_flows_to_dvars()
    }
}
