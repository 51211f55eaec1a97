//! Conversation UI components for the chat surface

pub mod composer;
pub mod history;
pub mod manager;
pub mod typing;

pub use composer::ConversationComposer;
pub use history::{ConversationHistory, Message};
pub use manager::ChatBot;
pub use typing::TypingIndicator;
