//! Lotka-Volterra predator-prey model
//!
//! The classic two-population ecology model: prey grow at an intrinsic
//! birth rate and are eaten at a predation rate, predators grow by
//! digesting prey and die by natural attrition.

use stockflow_core::config::{ParamSpec, PlotSpec};
use stockflow_core::errors::StockflowResult;
use stockflow_core::model::{Dynamics, ModelState};
use stockflow_core::timeseries::Time;

/// Predator-prey model with oscillating populations.
///
/// The governing equations are:
///
/// $$ \frac{d(prey)}{dt} = b \cdot prey - p \cdot prey \cdot predator $$
/// $$ \frac{d(predator)}{dt} = g \cdot prey \cdot predator - d \cdot predator $$
///
/// where $b$ is the prey birth rate, $p$ the predation rate, $g$ the
/// digestion rate, and $d$ the predator death rate.
#[derive(Debug)]
pub struct LotkaVolterra;

impl Dynamics for LotkaVolterra {
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
        state.param.set("time", 200.0);
        state.param.set("dt", 0.2);
        state.param.set("initial_prey", 10.0);
        state.param.set("initial_predator", 5.0);
        state.param.set("prey_birth_rate", 0.2);
        state.param.set("predation_rate", 0.1);
        state.param.set("digestion_rate", 0.1);
        state.param.set("predator_death_rate", 0.2);

        state.plots.push(
            PlotSpec::new("ecology", ["predator", "prey"]).with_markdown(
                "The first successful population model (1925) reproduced the \
                 oscillating populations of a predator-prey ecology over time.",
            ),
        );

        state.editable_params = vec![
            ParamSpec::new("time", 300.0),
            ParamSpec::new("initial_prey", 20.0),
            ParamSpec::new("initial_predator", 20.0),
            ParamSpec::new("prey_birth_rate", 2.0),
            ParamSpec::new("predation_rate", 2.0),
            ParamSpec::new("predator_death_rate", 2.0),
            ParamSpec::new("digestion_rate", 2.0),
        ];
        state.extract_editable_params()
    }

    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
        state
            .var
            .set("predator", state.param.get("initial_predator")?);
        state.var.set("prey", state.param.get("initial_prey")?);
        Ok(())
    }

    fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
        let prey = state.var.get("prey")?;
        let predator = state.var.get("predator")?;

        state.dvar.set(
            "prey",
            prey * state.param.get("prey_birth_rate")?
                - state.param.get("predation_rate")? * prey * predator,
        );
        state.dvar.set(
            "predator",
            state.param.get("digestion_rate")? * prey * predator
                - predator * state.param.get("predator_death_rate")?,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_core::model::Model;

    #[test]
    fn populations_oscillate_and_stay_positive() {
        let mut model = Model::new(LotkaVolterra).unwrap();
        model.run().unwrap();

        let prey = model.solution().get("prey").unwrap();
        let predator = model.solution().get("predator").unwrap();
        assert_eq!(prey.len(), model.solution().times().len());

        assert!(prey.iter().all(|&x| x.is_finite() && x > 0.0));
        assert!(predator.iter().all(|&x| x.is_finite() && x > 0.0));

        // predation dominates at the initial point, so prey fall while
        // predators climb before the cycle turns over
        assert!(prey.iter().cloned().fold(f64::INFINITY, f64::min) < 10.0);
        assert!(predator.iter().cloned().fold(f64::NEG_INFINITY, f64::max) > 5.0);
    }

    #[test]
    fn every_param_gets_an_editable_spec() {
        let model = Model::new(LotkaVolterra).unwrap();
        let state = model.state();
        for (key, _) in state.param.iter() {
            if key == "dt" {
                continue;
            }
            assert!(
                state.editable_params.iter().any(|p| p.key == key),
                "param {} has no editable spec",
                key
            );
        }
    }
}
