use crate::api::ApiError;
use strum::Display;

/// Internal events delivered from request tasks back to the UI loop
#[derive(Debug)]
pub enum ChatEvent {
    /// The endpoint answered with a reply
    Reply { content: String },

    /// The request failed at any stage
    Failed { error: ApiError },
}

/// Author of a message in the conversation; displays as its header label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Role {
    #[strum(serialize = "You")]
    User,
    #[strum(serialize = "Bot")]
    Bot,
}
