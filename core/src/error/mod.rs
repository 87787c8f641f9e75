#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod generate;

pub use error::{CapabilityError, CliError, LlmError};
pub use executor::ExecutorError;
pub use generate::GenerateError;
