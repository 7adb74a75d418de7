pub mod config;
mod example_models;
pub mod flows;
pub mod functions;
pub mod ivp;
pub mod model;
pub mod state;
pub mod timeseries;

pub mod errors;
