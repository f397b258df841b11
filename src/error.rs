use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Failed to load config file '{path}': {source}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {message}")]
    ConfigValidation { message: String },

    // Verification errors
    #[error("Member {user_id} can no longer be reached")]
    MemberUnreachable { user_id: String },

    #[error("Verification record is missing '{field}'")]
    IncompleteRecord { field: &'static str },

    #[error("A verification session is already running for {user_id}")]
    SessionActive { user_id: String },

    #[error("Approval could not be obtained: {message}")]
    ApprovalUnavailable { message: String },

    // Discord errors
    #[error("Discord API error: {message}")]
    Discord { message: String },

    #[error("Channel not found: {name}")]
    ChannelNotFound { name: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Discord {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

use poise::serenity_prelude as serenity;
