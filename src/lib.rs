//! Define dynamical-systems models over named variables and hand them to an
//! ODE solver.
//!
//! This crate re-exports the two workspace members: `stockflow-core` (the
//! containers, flow helper, and run orchestration) and `stockflow-models`
//! (ready-made models).
//!
//! ```
//! use stockflow::model::Model;
//! use stockflow::models::LotkaVolterra;
//!
//! let mut model = Model::new(LotkaVolterra).unwrap();
//! model.run().unwrap();
//!
//! let prey = model.solution().get("prey").unwrap();
//! assert_eq!(prey.len(), model.solution().times().len());
//! ```

pub use stockflow_core::{config, errors, flows, functions, ivp, model, state, timeseries};
pub use stockflow_models::models;
