//! Model definition and run orchestration.
//!
//! A model supplies four hooks over a shared bundle of named containers:
//! `setup` declares parameters and descriptors, `init_vars` the initial
//! variable values, and `calc_aux_vars`/`calc_dvars` the per-evaluation
//! state. The orchestration here owns everything else: consistency
//! checking, the output time grid, handing the vector-valued problem to the
//! integrator, and reshaping the raw output back into named time series.
//!
//! Between runs only `param` persists (the presentation layer may mutate it
//! and run again); every run re-executes `init_vars` and rebuilds the
//! solution from scratch.

use crate::config::{FnPlotSpec, ParamSpec, PlotSpec};
use crate::errors::{StockflowError, StockflowResult};
use crate::flows::{self, Flow};
use crate::ivp::{self, Method};
use crate::state::{FnMap, NamedState};
use crate::timeseries::{FloatValue, Solution, Time};
use log::{debug, info};
use std::sync::Arc;

/// The four operations a concrete model supplies.
///
/// Implementations are stateless: everything a hook reads or writes lives
/// in the [`ModelState`] it is handed. `calc_aux_vars` must be a pure
/// function of `var`/`param`/`fns` that writes only `aux_var`; the runner
/// relies on this to reconstruct aux series after integration by replaying
/// it at each output time.
pub trait Dynamics: std::fmt::Debug {
    /// Declare parameters, flows, and plot/editable-parameter descriptors.
    /// Called once at model construction.
    fn setup(&self, state: &mut ModelState) -> StockflowResult<()>;

    /// Set the initial value of every integrated variable (and rebuild any
    /// parameter-dependent shape functions). The keys declared here are
    /// authoritative for the run.
    fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()>;

    /// Compute diagnostic values from the current `var`/`param`/`fns`.
    fn calc_aux_vars(&self, _t: Time, _state: &mut ModelState) -> StockflowResult<()> {
        Ok(())
    }

    /// Compute the derivative of every integrated variable. `dvar` arrives
    /// zeroed for all `var` keys, so flow contributions and direct terms
    /// can be summed in any order.
    fn calc_dvars(&self, t: Time, state: &mut ModelState) -> StockflowResult<()>;
}

/// The bundle of containers every hook operates on.
#[derive(Debug)]
pub struct ModelState {
    /// Named state variables integrated over time.
    pub var: NamedState,
    /// First time-derivatives of `var`, recomputed every evaluation.
    pub dvar: NamedState,
    /// Intermediate values derived from `var`/`param`, not integrated.
    pub aux_var: NamedState,
    /// Named constants for a run, adjustable between runs.
    pub param: NamedState,
    /// Named shape functions.
    pub fns: FnMap,
    /// Flows whose rate is resolved in `aux_var` (falling back to `var`).
    pub aux_var_flows: Vec<Flow>,
    /// Flows whose rate is resolved in `param`.
    pub param_flows: Vec<Flow>,
    pub plots: Vec<PlotSpec>,
    pub fn_plots: Vec<FnPlotSpec>,
    pub editable_params: Vec<ParamSpec>,
}

impl ModelState {
    pub fn new() -> Self {
        let mut param = NamedState::new("param");
        param.set("time", 100.0);
        param.set("dt", 1.0);
        Self {
            var: NamedState::new("var"),
            dvar: NamedState::new("dvar"),
            aux_var: NamedState::new("aux_var"),
            param,
            fns: FnMap::new(),
            aux_var_flows: Vec::new(),
            param_flows: Vec::new(),
            plots: Vec::new(),
            fn_plots: Vec::new(),
            editable_params: Vec::new(),
        }
    }

    /// Apply both flow lists to `dvar`.
    ///
    /// Typically the whole body of `calc_dvars` for compartmental models.
    pub fn add_flows_to_dvars(&mut self) -> StockflowResult<()> {
        flows::apply_flows(
            &self.aux_var_flows,
            &self.aux_var,
            Some(&self.var),
            &mut self.dvar,
        )?;
        flows::apply_flows(&self.param_flows, &self.param, None, &mut self.dvar)
    }

    /// Derive a [`ParamSpec`] for every parameter that does not have one,
    /// skipping `dt`: the slider maximum is five times a positive value and
    /// one for a zero value. Negative parameters have no sensible automatic
    /// range and are an error.
    pub fn extract_editable_params(&mut self) -> StockflowResult<()> {
        let mut extracted = Vec::new();
        for (key, value) in self.param.iter() {
            if key == "dt" {
                continue;
            }
            if self.editable_params.iter().any(|p| p.key == key) {
                continue;
            }
            let max = if value > 0.0 {
                5.0 * value
            } else if value == 0.0 {
                1.0
            } else {
                return Err(StockflowError::NegativeParamRange {
                    key: key.to_string(),
                });
            };
            extracted.push(ParamSpec::new(key, max));
        }
        self.editable_params.extend(extracted);
        Ok(())
    }
}

impl Default for ModelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the fixed output grid `[0, dt, 2dt, ..., time]`.
///
/// The endpoint is always included; `time == 0` yields the single point
/// `0`. A grid that cannot be built (negative or non-finite `time`,
/// non-positive `dt`) is an error.
pub fn output_times(time: Time, dt: Time) -> StockflowResult<Vec<Time>> {
    if !time.is_finite() || !dt.is_finite() || time < 0.0 || (time > 0.0 && dt <= 0.0) {
        return Err(StockflowError::InvalidTimeGrid { time, dt });
    }
    let mut times = vec![0.0];
    if time == 0.0 {
        return Ok(times);
    }
    let mut i: usize = 1;
    loop {
        let t = i as Time * dt;
        if t >= time - dt * 1e-9 {
            break;
        }
        times.push(t);
        i += 1;
    }
    times.push(time);
    Ok(times)
}

/// A runnable model: a [`Dynamics`] implementation plus the state and
/// solution that belong to it.
///
/// Constructing the model runs `setup`; each [`run`](Model::run) call then
/// re-initializes the variables, integrates, and replaces the solution.
/// Runs are synchronous and single-threaded; a `Model` is not meant to be
/// shared across threads mid-run.
#[derive(Debug)]
pub struct Model {
    dynamics: Arc<dyn Dynamics>,
    state: ModelState,
    /// Authoritative `var` key order of the current run.
    keys: Vec<String>,
    method: Method,
    solution: Solution,
}

impl Model {
    /// Construct a model and run its `setup` hook.
    pub fn new(dynamics: impl Dynamics + 'static) -> StockflowResult<Self> {
        let mut state = ModelState::new();
        dynamics.setup(&mut state)?;
        Ok(Self {
            dynamics: Arc::new(dynamics),
            state,
            keys: Vec::new(),
            method: Method::default(),
            solution: Solution::new(),
        })
    }

    /// Select a different integration scheme.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Mutable access for the presentation layer: edit `param` values here,
    /// then call [`run`](Model::run) again.
    pub fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    /// The named time series of the most recent completed run. Unchanged by
    /// a failed run.
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// Initialize, integrate, and rebuild the solution.
    ///
    /// The previous solution is only replaced on success; on any failure it
    /// is left exactly as it was.
    pub fn run(&mut self) -> StockflowResult<()> {
        self.state.var.clear();
        self.state.aux_var.clear();
        self.dynamics.init_vars(&mut self.state)?;
        self.keys = self.state.var.keys().map(str::to_string).collect();
        self.check_consistency()?;

        let time = self.state.param.get("time")?;
        let dt = self.state.param.get("dt")?;
        let times = output_times(time, dt)?;
        info!(
            "running model: {} vars, {} output times",
            self.keys.len(),
            times.len()
        );

        let (times, rows) = ivp::integrate(
            self.dynamics.as_ref(),
            &mut self.state,
            &self.keys,
            &times,
            &self.method,
        )?;

        let mut solution = Solution::with_times(times.clone());
        for (i, key) in self.keys.iter().enumerate() {
            solution.insert(key, rows.iter().map(|row| row[i]).collect());
        }

        // aux vars are not part of the integrated state; rebuild their
        // series by replaying calc_aux_vars over the solved var rows
        let mut aux_series: Vec<(String, Vec<FloatValue>)> = Vec::new();
        for (row, t) in rows.iter().zip(&times) {
            self.state.var.from_vector(&self.keys, row)?;
            self.dynamics.calc_aux_vars(*t, &mut self.state)?;
            for (key, value) in self.state.aux_var.iter() {
                match aux_series.iter_mut().find(|(name, _)| name == key) {
                    Some((_, values)) => values.push(value),
                    None => aux_series.push((key.to_string(), vec![value])),
                }
            }
        }
        for (key, values) in aux_series {
            solution.insert(&key, values);
        }

        debug!("solution holds {} series", solution.len());
        self.solution = solution;
        Ok(())
    }

    /// Probe the hooks once at `t = 0` and verify that the model's pieces
    /// agree with each other: every derivative matches a declared var, aux
    /// vars do not shadow vars, and every plot, editable param, and flow
    /// references something that exists.
    ///
    /// Called by [`run`](Model::run) after `init_vars`; failing fast here
    /// turns a silent modeling bug into a loud one.
    pub fn check_consistency(&mut self) -> StockflowResult<()> {
        self.dynamics.calc_aux_vars(0.0, &mut self.state)?;
        self.state.dvar.zero_all(&self.keys);
        self.dynamics.calc_dvars(0.0, &mut self.state)?;

        for key in self.state.dvar.keys() {
            if !self.state.var.contains(key) {
                return Err(StockflowError::UnmatchedDerivative {
                    key: key.to_string(),
                });
            }
        }
        for key in self.state.aux_var.keys() {
            if self.state.var.contains(key) {
                return Err(StockflowError::ShadowedVariable {
                    key: key.to_string(),
                });
            }
        }
        for plot in &self.state.plots {
            for key in &plot.vars {
                if !self.state.var.contains(key) && !self.state.aux_var.contains(key) {
                    return Err(StockflowError::UnknownPlotVariable {
                        title: plot.title.clone(),
                        key: key.clone(),
                    });
                }
            }
        }
        for fn_plot in &self.state.fn_plots {
            if !self.state.fns.contains(&fn_plot.fn_key) {
                return Err(StockflowError::UnknownPlotFunction {
                    key: fn_plot.fn_key.clone(),
                });
            }
        }
        for param_spec in &self.state.editable_params {
            if !self.state.param.contains(&param_spec.key) {
                return Err(StockflowError::UnknownEditableParam {
                    key: param_spec.key.clone(),
                });
            }
        }
        for flow in &self.state.aux_var_flows {
            self.check_flow_endpoints(flow)?;
            if !self.state.aux_var.contains(&flow.rate) && !self.state.var.contains(&flow.rate) {
                return Err(StockflowError::UnknownFlowRate {
                    key: flow.rate.clone(),
                });
            }
        }
        for flow in &self.state.param_flows {
            self.check_flow_endpoints(flow)?;
            if !self.state.param.contains(&flow.rate) {
                return Err(StockflowError::UnknownFlowRate {
                    key: flow.rate.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_flow_endpoints(&self, flow: &Flow) -> StockflowResult<()> {
        for key in [&flow.from, &flow.to] {
            if !self.state.var.contains(key) {
                return Err(StockflowError::UnknownFlowEndpoint { key: key.clone() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_models::{ExponentialDecay, TwoCompartment};
    use is_close::is_close;

    #[test]
    fn output_times_includes_endpoint() {
        let times = output_times(10.0, 1.0).unwrap();
        assert_eq!(times.len(), 11);
        assert_eq!(times[0], 0.0);
        assert_eq!(*times.last().unwrap(), 10.0);
    }

    #[test]
    fn output_times_with_partial_final_step() {
        let times = output_times(1.0, 0.3).unwrap();
        assert_eq!(times.len(), 5);
        assert!(is_close!(times[3], 0.9));
        assert_eq!(*times.last().unwrap(), 1.0);
    }

    #[test]
    fn output_times_zero_is_a_single_point() {
        assert_eq!(output_times(0.0, 1.0).unwrap(), vec![0.0]);
    }

    #[test]
    fn output_times_rejects_bad_grids() {
        assert!(output_times(-1.0, 1.0).is_err());
        assert!(output_times(10.0, 0.0).is_err());
        assert!(output_times(FloatValue::NAN, 1.0).is_err());
    }

    #[test]
    fn exponential_decay_end_to_end() {
        let mut model = Model::new(ExponentialDecay).unwrap();
        model.run().unwrap();

        let x = model.solution().get("x").unwrap();
        assert_eq!(model.solution().times().len(), 11);
        assert_eq!(x[0], 100.0);
        assert!(is_close!(x[10], 100.0 * (-1.0f64).exp(), rel_tol = 1e-5));
    }

    #[test]
    fn euler_method_can_be_selected() {
        let mut model = Model::new(ExponentialDecay)
            .unwrap()
            .with_method(Method::Euler);
        model.run().unwrap();

        let x = model.solution().get("x").unwrap();
        assert!(is_close!(x[10], 100.0 * 0.9f64.powi(10)));
    }

    #[test]
    fn two_compartment_flow_conserves_total() {
        let mut model = Model::new(TwoCompartment).unwrap();
        model.run().unwrap();

        let a = model.solution().get("a").unwrap();
        let b = model.solution().get("b").unwrap();
        for i in 0..model.solution().times().len() {
            assert!(is_close!(a[i] + b[i], 100.0, rel_tol = 1e-9));
        }
        assert!(is_close!(a[a.len() - 1], 50.0, rel_tol = 1e-6));
    }

    #[test]
    fn aux_vars_are_reconstructed_into_the_solution() {
        let mut model = Model::new(TwoCompartment).unwrap();
        model.run().unwrap();

        let rate = model.solution().get("rate").unwrap();
        assert_eq!(rate.len(), model.solution().times().len());
        assert!(rate.iter().all(|&r| r == 5.0));
    }

    #[test]
    fn zero_time_yields_initial_values() {
        let mut model = Model::new(ExponentialDecay).unwrap();
        model.state_mut().param.set("time", 0.0);
        model.run().unwrap();

        assert_eq!(model.solution().times(), &[0.0]);
        assert_eq!(model.solution().get("x").unwrap()[0], 100.0);
    }

    #[test]
    fn rerunning_an_unmodified_model_is_identical() {
        let mut model = Model::new(ExponentialDecay).unwrap();
        model.run().unwrap();
        let first = model.solution().clone();
        model.run().unwrap();
        assert_eq!(&first, model.solution());
    }

    #[test]
    fn editing_a_param_changes_the_rerun() {
        let mut model = Model::new(ExponentialDecay).unwrap();
        model.run().unwrap();
        let first = model.solution().clone();

        model.state_mut().param.set("rate", -0.2);
        model.run().unwrap();
        assert_ne!(&first, model.solution());
    }

    #[test]
    fn failed_run_keeps_previous_solution() {
        let mut model = Model::new(ExponentialDecay).unwrap();
        model.run().unwrap();
        let before = model.solution().clone();

        model.state_mut().param.set("time", -1.0);
        assert!(model.run().is_err());
        assert_eq!(&before, model.solution());
    }

    #[derive(Debug)]
    struct StrayDerivative;

    impl Dynamics for StrayDerivative {
        fn setup(&self, _state: &mut ModelState) -> StockflowResult<()> {
            Ok(())
        }

        fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
            state.var.set("x", 1.0);
            Ok(())
        }

        fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
            state.dvar.set("x", 0.0);
            state.dvar.set("y", 1.0);
            Ok(())
        }
    }

    #[test]
    fn derivative_without_var_is_rejected() {
        let mut model = Model::new(StrayDerivative).unwrap();
        assert!(matches!(
            model.run(),
            Err(StockflowError::UnmatchedDerivative { .. })
        ));
    }

    #[derive(Debug)]
    struct ShadowingAux;

    impl Dynamics for ShadowingAux {
        fn setup(&self, _state: &mut ModelState) -> StockflowResult<()> {
            Ok(())
        }

        fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
            state.var.set("x", 1.0);
            Ok(())
        }

        fn calc_aux_vars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
            state.aux_var.set("x", 2.0);
            Ok(())
        }

        fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
            state.dvar.set("x", 0.0);
            Ok(())
        }
    }

    #[test]
    fn shadowing_aux_var_is_rejected() {
        let mut model = Model::new(ShadowingAux).unwrap();
        assert!(matches!(
            model.run(),
            Err(StockflowError::ShadowedVariable { .. })
        ));
    }

    #[derive(Debug)]
    struct BadPlot;

    impl Dynamics for BadPlot {
        fn setup(&self, state: &mut ModelState) -> StockflowResult<()> {
            state.plots.push(PlotSpec::new("missing", ["ghost"]));
            Ok(())
        }

        fn init_vars(&self, state: &mut ModelState) -> StockflowResult<()> {
            state.var.set("x", 1.0);
            Ok(())
        }

        fn calc_dvars(&self, _t: Time, state: &mut ModelState) -> StockflowResult<()> {
            state.dvar.set("x", 0.0);
            Ok(())
        }
    }

    #[test]
    fn plot_of_unknown_variable_is_rejected() {
        let mut model = Model::new(BadPlot).unwrap();
        assert!(matches!(
            model.run(),
            Err(StockflowError::UnknownPlotVariable { .. })
        ));
    }

    #[test]
    fn extract_editable_params_ranges() {
        let mut state = ModelState::new();
        state.param.set("growth", 0.02);
        state.param.set("offset", 0.0);
        state.editable_params.push(ParamSpec::new("time", 500.0));
        state.extract_editable_params().unwrap();

        // the explicit spec is untouched, dt is skipped
        assert!(state
            .editable_params
            .iter()
            .any(|p| p.key == "time" && p.max == 500.0));
        assert!(!state.editable_params.iter().any(|p| p.key == "dt"));
        assert!(state
            .editable_params
            .iter()
            .any(|p| p.key == "growth" && is_close!(p.max, 0.1)));
        assert!(state
            .editable_params
            .iter()
            .any(|p| p.key == "offset" && p.max == 1.0));
    }

    #[test]
    fn extract_editable_params_rejects_negative() {
        let mut state = ModelState::new();
        state.param.set("rate", -0.1);
        assert!(matches!(
            state.extract_editable_params(),
            Err(StockflowError::NegativeParamRange { .. })
        ));
    }
}
