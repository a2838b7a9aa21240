use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid placement: {field} = {value}")]
    InvalidPlacement { field: &'static str, value: f64 },

    #[error("Invalid time step: {dt}")]
    InvalidTimeStep { dt: f64 },

    #[error("Operation '{op}' not supported by the {model} model")]
    UnsupportedByModel { op: &'static str, model: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
