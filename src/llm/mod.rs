//! Gemini integration: wire types, prompt assembly, the HTTP client and
//! response normalization.

pub mod client;
pub mod prompt;
pub mod prompts;
pub mod response;
pub mod types;

pub use client::{GeminiClient, GEMINI_BASE_URL, GEMINI_TEXT_MODEL};
pub use prompt::{build_chat_contents, request_config, system_instruction, AnalysisTarget};
pub use response::interpret_response;
pub use types::{Content, GenerateContentResponse, Part, RequestConfig};
