pub mod json_file;
pub mod llm_provider_store;
pub mod workflow_model_store;
pub mod workflow_store;

pub use json_file::JsonFile;
pub use llm_provider_store::LlmProviderStore;
pub use workflow_model_store::WorkflowModelStore;
pub use workflow_store::WorkflowStore;
