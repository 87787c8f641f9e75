//! Stage-one and stage-two generators. Each owns a prompt, feeds the
//! shared retry framework, and enforces its output type's business rules
//! before anything reaches the capability backend.

pub mod click;
pub mod decompose;
pub mod file;
pub mod prompts;
pub mod triage;
pub mod typing;

pub use click::ClickGenerator;
pub use decompose::TaskDecomposer;
pub use file::FileGenerator;
pub use triage::{MessageIntent, MessageTriage};
pub use typing::TypeGenerator;
