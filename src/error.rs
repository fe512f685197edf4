use thiserror::Error;

use crate::build::BuildError;
use crate::eval::EvalError;
use crate::event_bus::EventError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, ScenarioError>;

impl ScenarioError {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        ScenarioError::Internal(message.into())
    }
}
