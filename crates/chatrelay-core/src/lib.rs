pub mod error;
pub mod llm_types;
pub mod text;
