use crate::timeseries::Time;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum StockflowError {
    #[error("{0}")]
    Error(String),
    #[error("no value named {key:?} declared in {role}")]
    UndeclaredKey { role: String, key: String },
    #[error("expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("derivative {key:?} has no matching var")]
    UnmatchedDerivative { key: String },
    #[error("aux var {key:?} shadows an integrated var")]
    ShadowedVariable { key: String },
    #[error("plot {title:?} references {key:?}, which is neither a var nor an aux var")]
    UnknownPlotVariable { title: String, key: String },
    #[error("fn plot references {key:?}, which is not a registered fn")]
    UnknownPlotFunction { key: String },
    #[error("editable param {key:?} is not a declared param")]
    UnknownEditableParam { key: String },
    #[error("flow endpoint {key:?} is not a declared var")]
    UnknownFlowEndpoint { key: String },
    #[error("flow rate {key:?} cannot be resolved")]
    UnknownFlowRate { key: String },
    #[error("derivative of {key:?} is not finite at t = {time}")]
    NonFiniteDerivative { key: String, time: Time },
    #[error("integration failed: {0}")]
    Integration(String),
    #[error("time grid with time = {time} and dt = {dt} is not usable")]
    InvalidTimeGrid { time: Time, dt: Time },
    #[error("param {key:?} is negative and cannot be auto-ranged")]
    NegativeParamRange { key: String },
}

/// Convenience type for `Result<T, StockflowError>`.
pub type StockflowResult<T> = Result<T, StockflowError>;
