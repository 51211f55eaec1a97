pub mod conversation;
pub mod markdown;
