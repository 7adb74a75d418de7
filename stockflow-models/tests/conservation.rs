//! Conservation tests for the bundled models.
//!
//! These tests verify invariants the dynamics should hold exactly or up to
//! integrator tolerance:
//! - total population in compartmental models driven purely by flows
//! - the Lotka-Volterra cycle invariant
//! - income-share identities in the economic models

use approx::assert_relative_eq;
use stockflow_core::model::Model;
use stockflow_models::models::{KeenCycle, LotkaVolterra, Sir};

mod sir_conservation {
    use super::*;

    /// Both SIR transitions are conserved flows, so the sum of the three
    /// compartments must match the initial population at every output time.
    #[test]
    fn test_total_population_is_invariant() {
        let mut model = Model::new(Sir).unwrap();
        model.run().unwrap();

        let susceptible = model.solution().get("susceptible").unwrap();
        let infectious = model.solution().get("infectious").unwrap();
        let recovered = model.solution().get("recovered").unwrap();

        for i in 0..model.solution().times().len() {
            let total = susceptible[i] + infectious[i] + recovered[i];
            assert_relative_eq!(total, 50000.0, max_relative = 1e-6);
        }
    }

    /// The reconstructed `population` aux series is the same sum.
    #[test]
    fn test_population_series_matches_compartment_sum() {
        let mut model = Model::new(Sir).unwrap();
        model.run().unwrap();

        let population = model.solution().get("population").unwrap();
        for &value in population.iter() {
            assert_relative_eq!(value, 50000.0, max_relative = 1e-6);
        }
    }
}

mod lotka_volterra_invariant {
    use super::*;

    /// The Lotka-Volterra system conserves
    /// `V = g*prey - d*ln(prey) + p*predator - b*ln(predator)`
    /// along every trajectory.
    #[test]
    fn test_cycle_invariant_is_preserved() {
        let mut model = Model::new(LotkaVolterra).unwrap();
        model.run().unwrap();

        let b = 0.2;
        let p = 0.1;
        let g = 0.1;
        let d = 0.2;
        let prey = model.solution().get("prey").unwrap();
        let predator = model.solution().get("predator").unwrap();

        let invariant =
            |x: f64, y: f64| g * x - d * x.ln() + p * y - b * y.ln();
        let v0 = invariant(prey[0], predator[0]);
        for i in 0..prey.len() {
            assert_relative_eq!(invariant(prey[i], predator[i]), v0, max_relative = 0.01);
        }
    }
}

mod keen_share_identity {
    use super::*;

    /// Wages, bank interest, and profit are the only claims on output.
    #[test]
    fn test_claims_on_output_are_exhaustive() {
        let mut model = Model::new(KeenCycle).unwrap();
        model.state_mut().param.set("time", 50.0);
        model.run().unwrap();

        let wage_share = model.solution().get("wage_share").unwrap();
        let bank_share = model.solution().get("bank_share").unwrap();
        let profit_share = model.solution().get("profit_share").unwrap();

        for i in 0..wage_share.len() {
            assert_relative_eq!(
                wage_share[i] + bank_share[i] + profit_share[i],
                1.0,
                max_relative = 1e-9
            );
        }
    }
}
