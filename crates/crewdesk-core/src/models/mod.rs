pub mod llm_provider;
pub mod workflow;
pub mod workflow_model;

pub use llm_provider::*;
pub use workflow::*;
pub use workflow_model::*;
