pub mod backend;
pub(crate) mod error_shapes;
pub mod mapping;
pub mod openai_chat;
