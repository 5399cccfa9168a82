// Public API - what other modules can use
pub use handlers::{
    create_message, get_message, list_messages, mark_answered, react_to_message,
    remove_reaction,
};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
