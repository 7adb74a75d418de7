//! Ready-made dynamical-systems models built on stockflow-core.
//!
//! Each model is a [`Dynamics`](stockflow_core::model::Dynamics)
//! implementation declaring its parameters, initial state, equations, and
//! presentation descriptors. Construct one with
//! [`Model::new`](stockflow_core::model::Model::new) and call `run`.

pub mod models;
