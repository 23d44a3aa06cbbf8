//! Client-side core of a legal AI chat assistant.
//!
//! The crate keeps multi-session chat state on disk, ingests attached
//! documents (PDF, images, text, Word) into model-ready content, assembles
//! multi-turn Gemini prompts with either search grounding or a fixed system
//! instruction, and normalizes every provider outcome into displayable chat
//! text.
//!
//! The [`LegalAssistant`] facade ties the pieces together; the underlying
//! modules ([`session`], [`ingestion`], [`llm`], [`store`]) are public for
//! embedders that need finer control.

pub mod assistant;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod session;
pub mod store;
pub mod types;

pub use assistant::LegalAssistant;
pub use error::{LegalChatError, Result};
pub use ingestion::{AttachmentTray, FileIngestor, PdfPageRenderer, SelectedFile};
pub use llm::{GeminiClient, GEMINI_TEXT_MODEL};
pub use session::SessionManager;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{
    AiReply, AiResponseMessage, ChatMessage, ChatSession, Citation, FileInfo, FileStatus,
    LegalTask, ProcessedFile, QueryPayload, ServiceArea, SystemMessage, UserQueryMessage,
};
