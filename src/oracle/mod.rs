pub mod backend;
pub mod conversation;
pub mod error;
pub mod parse;
