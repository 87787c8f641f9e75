pub mod types;
pub mod writer;

pub use crate::config::EventsConfig;
pub use types::{EventKind, ProgressEvent};
pub use writer::{start_event_writer, EventTx};
