use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("executor failed: {0}")]
    Executor(#[from] super::ExecutorError),
    #[error("capability backend failed: {0}")]
    Capability(#[from] CapabilityError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Failures of a single call to the generative backend. All variants are
/// retryable inside the bounded attempt loop.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend returned an empty response")]
    EmptyResponse,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("no capability provider available")]
    NoProviderAvailable,
    #[error("provider '{0}' is not available")]
    Unavailable(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("worker protocol error: {0}")]
    Protocol(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
