use thiserror::Error;

#[derive(Error, Debug)]
pub enum LegalChatError {
    #[error("Failed to parse file {name}: {details}")]
    FileParse { name: String, details: String },

    #[error("API Key error: {0}. Ensure API key is correct and has permissions.")]
    AuthFailed(String),

    #[error("Gemini API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Gemini API error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LegalChatError>;
