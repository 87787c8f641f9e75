pub mod backend;
pub mod factory;
pub mod llm;
