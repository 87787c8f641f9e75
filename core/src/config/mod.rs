pub mod load;
pub mod types;

pub use load::{get_data_dir, load_default, load_from};
pub use types::{
    AppConfig, AutomationConfig, EventsConfig, ExecutorConfig, LlmConfig, LoggingConfig,
    ModelEndpoint, SuccessPolicyConfig,
};
