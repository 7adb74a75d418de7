//! Bridge from named-variable state to the vector form required by the
//! external integrator.
//!
//! The integrator sees a plain initial-value problem over a runtime-sized
//! vector: each evaluation unpacks the vector into `var`, runs the model's
//! hooks, and repacks `dvar`. The solver controls step count and substeps,
//! so the evaluation function is called repeatedly, reentrantly, and with
//! time values outside the eventual output order; it keeps no state of its
//! own beyond the containers it overwrites.

use crate::errors::{StockflowError, StockflowResult};
use crate::model::{Dynamics, ModelState};
use crate::timeseries::{FloatValue, Time};
use log::debug;
use nalgebra::DVector;
use num::Float;
use ode_solvers::dop_shared::{IntegrationError, Stats};
use ode_solvers::{Dopri5, Rk4, System};
use std::cell::RefCell;

type State = DVector<FloatValue>;

/// Integration scheme used by [`Model::run`](crate::model::Model::run).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// Fixed-step forward Euler over the output grid. Cheap and transparent,
    /// but first-order; useful for sanity checks against the adaptive
    /// methods.
    Euler,
    /// Classic fixed-step 4th-order Runge-Kutta method.
    Rk4,
    /// Adaptive Dormand-Prince 5(4) Runge-Kutta method with dense output on
    /// the fixed time grid. The solver adjusts its internal step size to
    /// keep the local error within `abs_tol`/`rel_tol`.
    Dopri5 {
        abs_tol: FloatValue,
        rel_tol: FloatValue,
    },
}

impl Default for Method {
    fn default() -> Self {
        Method::Dopri5 {
            abs_tol: 1e-8,
            rel_tol: 1e-6,
        }
    }
}

/// The vector-valued derivative function handed to the solver.
///
/// Hook failures cannot propagate through the solver's `system` callback,
/// so the first error is latched, the derivative vector is poisoned with
/// NaN, and `solout` stops the integration at the next opportunity.
struct OdeSystem<'a> {
    dynamics: &'a dyn Dynamics,
    state: RefCell<&'a mut ModelState>,
    keys: &'a [String],
    failure: &'a RefCell<Option<StockflowError>>,
}

impl OdeSystem<'_> {
    fn derivative(&self, t: Time, y: &State, dy: &mut State) -> StockflowResult<()> {
        let mut state = self.state.borrow_mut();
        let state = &mut **state;

        state.var.from_vector(self.keys, y.as_slice())?;
        self.dynamics.calc_aux_vars(t, state)?;
        state.dvar.zero_all(self.keys);
        self.dynamics.calc_dvars(t, state)?;

        for (i, key) in self.keys.iter().enumerate() {
            let value = state.dvar.get(key)?;
            if !value.is_finite() {
                return Err(StockflowError::NonFiniteDerivative {
                    key: key.clone(),
                    time: t,
                });
            }
            dy[i] = value;
        }
        Ok(())
    }
}

impl System<Time, State> for OdeSystem<'_> {
    fn system(&self, t: Time, y: &State, dy: &mut State) {
        if let Err(err) = self.derivative(t, y, dy) {
            dy.fill(FloatValue::nan());
            self.failure.borrow_mut().get_or_insert(err);
        }
    }

    fn solout(&mut self, _t: Time, _y: &State, _dy: &State) -> bool {
        self.failure.borrow().is_some()
    }
}

/// Integrate the model's variables over the given output times.
///
/// Returns the actual output times together with one state row per output
/// time; row `0` is the initial state. A single-point grid short-circuits
/// without calling the solver.
pub fn integrate(
    dynamics: &dyn Dynamics,
    state: &mut ModelState,
    keys: &[String],
    times: &[Time],
    method: &Method,
) -> StockflowResult<(Vec<Time>, Vec<Vec<FloatValue>>)> {
    let y0 = DVector::from_vec(state.var.to_vector(keys)?);
    if times.len() < 2 {
        return Ok((times.to_vec(), vec![y0.as_slice().to_vec()]));
    }

    let t_end = *times.last().unwrap();
    let dt = times[1] - times[0];
    let failure = RefCell::new(None);
    let system = OdeSystem {
        dynamics,
        state: RefCell::new(state),
        keys,
        failure: &failure,
    };

    match method {
        Method::Euler => euler(&system, times, y0),
        Method::Rk4 => {
            let mut stepper = Rk4::new(system, times[0], y0, t_end, dt);
            let result = stepper.integrate();
            let (x_out, y_out) = stepper.results().get();
            finish(result, &failure, x_out, y_out)
        }
        Method::Dopri5 { abs_tol, rel_tol } => {
            let mut stepper = Dopri5::new(system, times[0], t_end, dt, y0, *rel_tol, *abs_tol);
            let result = stepper.integrate();
            let (x_out, y_out) = stepper.results().get();
            finish(result, &failure, x_out, y_out)
        }
    }
}

fn euler(
    system: &OdeSystem<'_>,
    times: &[Time],
    y0: State,
) -> StockflowResult<(Vec<Time>, Vec<Vec<FloatValue>>)> {
    let mut y = y0;
    let mut dy = State::from_element(y.len(), 0.0);
    let mut rows = Vec::with_capacity(times.len());

    for (i, &t) in times.iter().enumerate() {
        rows.push(y.as_slice().to_vec());
        if i + 1 == times.len() {
            break;
        }
        system.derivative(t, &y, &mut dy)?;
        let h = times[i + 1] - t;
        y += &dy * h;
    }
    Ok((times.to_vec(), rows))
}

fn finish(
    result: Result<Stats, IntegrationError>,
    failure: &RefCell<Option<StockflowError>>,
    x_out: &[Time],
    y_out: &[State],
) -> StockflowResult<(Vec<Time>, Vec<Vec<FloatValue>>)> {
    // A latched hook error takes precedence: the solver only ever saw its
    // NaN poisoning.
    if let Some(err) = failure.borrow_mut().take() {
        return Err(err);
    }
    let stats = result.map_err(|e| StockflowError::Integration(e.to_string()))?;
    debug!(
        "integration done: {} evaluations, {} accepted / {} rejected steps",
        stats.num_eval, stats.accepted_steps, stats.rejected_steps
    );
    let rows = y_out.iter().map(|row| row.as_slice().to_vec()).collect();
    Ok((x_out.to_vec(), rows))
}
