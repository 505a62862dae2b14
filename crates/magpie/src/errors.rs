use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("unknown tool {0}")]
    ToolNotFound(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("tool execution failed: {0}")]
    ExecutionError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
