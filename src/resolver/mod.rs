pub mod error;
pub mod prompts;
pub mod resolver;
