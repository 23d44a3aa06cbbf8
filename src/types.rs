//! Domain model for the chat client: context tags, messages, sessions and
//! transient attachment records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Practice-area tag attached to every user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceArea {
    #[serde(rename = "Venture Capital & Startup Advisory")]
    VentureCapital,
    #[serde(rename = "Mergers & Acquisitions (M&A)")]
    MergersAcquisitions,
    #[serde(rename = "Regulatory Guidance")]
    RegulatoryGuidance,
    #[serde(rename = "Intellectual Property, Media & Technology")]
    IntellectualProperty,
    #[serde(rename = "Virtual General Counsel Services")]
    VirtualGeneralCounsel,
    #[serde(rename = "Legal Tech Solutions")]
    LegalTechSolutions,
    #[serde(rename = "Case Law & Judgment Analysis")]
    CaseLawAnalysis,
}

impl ServiceArea {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceArea::VentureCapital => "Venture Capital & Startup Advisory",
            ServiceArea::MergersAcquisitions => "Mergers & Acquisitions (M&A)",
            ServiceArea::RegulatoryGuidance => "Regulatory Guidance",
            ServiceArea::IntellectualProperty => "Intellectual Property, Media & Technology",
            ServiceArea::VirtualGeneralCounsel => "Virtual General Counsel Services",
            ServiceArea::LegalTechSolutions => "Legal Tech Solutions",
            ServiceArea::CaseLawAnalysis => "Case Law & Judgment Analysis",
        }
    }
}

impl Default for ServiceArea {
    fn default() -> Self {
        ServiceArea::VentureCapital
    }
}

impl fmt::Display for ServiceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task tag attached to every user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalTask {
    #[serde(rename = "General Legal Q&A")]
    GeneralQuery,
    #[serde(rename = "Draft Document / Clause")]
    DraftDocument,
    #[serde(rename = "Summarize Legal Concept")]
    SummarizeLegalConcept,
    #[serde(rename = "Legal Research & Updates")]
    LegalResearch,
    #[serde(rename = "Compliance Checklist/Guidance")]
    ComplianceChecklist,
    #[serde(rename = "Analyze Contract for Risks & Issues")]
    AnalyzeContractRisks,
    #[serde(rename = "Review Document for Compliance")]
    ReviewCompliance,
    #[serde(rename = "Summarize Uploaded Document (Key Points)")]
    SummarizeUploadedDocument,
    #[serde(rename = "Extract Definitions & Obligations from Document")]
    ExtractDefinitionsObligations,
}

impl LegalTask {
    pub fn label(&self) -> &'static str {
        match self {
            LegalTask::GeneralQuery => "General Legal Q&A",
            LegalTask::DraftDocument => "Draft Document / Clause",
            LegalTask::SummarizeLegalConcept => "Summarize Legal Concept",
            LegalTask::LegalResearch => "Legal Research & Updates",
            LegalTask::ComplianceChecklist => "Compliance Checklist/Guidance",
            LegalTask::AnalyzeContractRisks => "Analyze Contract for Risks & Issues",
            LegalTask::ReviewCompliance => "Review Document for Compliance",
            LegalTask::SummarizeUploadedDocument => "Summarize Uploaded Document (Key Points)",
            LegalTask::ExtractDefinitionsObligations => {
                "Extract Definitions & Obligations from Document"
            }
        }
    }
}

impl Default for LegalTask {
    fn default() -> Self {
        LegalTask::GeneralQuery
    }
}

impl fmt::Display for LegalTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptor of an attached file as remembered in chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// A web source reported by the provider as grounding for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQueryMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub service_area: ServiceArea,
    pub legal_task: LegalTask,
    pub query_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_info: Vec<FileInfo>,
}

impl UserQueryMessage {
    pub fn new(
        service_area: ServiceArea,
        legal_task: LegalTask,
        query_text: impl Into<String>,
        files_info: Vec<FileInfo>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            service_area,
            legal_task,
            query_text: query_text.into(),
            files_info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponseMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl AiResponseMessage {
    pub fn new(text: impl Into<String>, sources: Vec<Citation>, file_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            text: text.into(),
            sources,
            file_name,
        }
    }
}

/// UI-only annotation (context changes); never sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl SystemMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            text: text.into(),
        }
    }
}

/// One entry in a session's history. Exactly one role per message; the role
/// determines which fields exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    User(UserQueryMessage),
    Ai(AiResponseMessage),
    System(SystemMessage),
}

impl ChatMessage {
    pub fn id(&self) -> &str {
        match self {
            ChatMessage::User(m) => &m.id,
            ChatMessage::Ai(m) => &m.id,
            ChatMessage::System(m) => &m.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatMessage::User(m) => m.timestamp,
            ChatMessage::Ai(m) => m.timestamp,
            ChatMessage::System(m) => m.timestamp,
        }
    }
}

/// One persisted conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_service_area: Option<ServiceArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_legal_task: Option<LegalTask>,
}

/// Raster page produced by ingestion (rendered PDF page or uploaded image).
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Processing,
    Processed,
    Error,
}

/// Transient per-attachment processing record. Lives only between file
/// selection and submission; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub status: FileStatus,
    pub extracted_text: Option<String>,
    pub raw_document: Option<Vec<u8>>,
    pub page_images: Vec<PageImage>,
    pub error_message: Option<String>,
}

impl ProcessedFile {
    pub fn processing(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            status: FileStatus::Processing,
            extracted_text: None,
            raw_document: None,
            page_images: Vec::new(),
            error_message: None,
        }
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
        }
    }

    pub fn has_content(&self) -> bool {
        self.extracted_text.is_some() || self.raw_document.is_some() || !self.page_images.is_empty()
    }
}

/// Everything needed for one request to the model. Built fresh per
/// submission; the first processed file contributes the document content,
/// all attachment names are joined into `file_name`.
#[derive(Debug, Clone, Default)]
pub struct QueryPayload {
    pub service_area: ServiceArea,
    pub legal_task: LegalTask,
    pub user_query: String,
    pub file_name: Option<String>,
    pub extracted_text: Option<String>,
    pub raw_document: Option<Vec<u8>>,
    pub page_images: Vec<PageImage>,
    pub mime_type: Option<String>,
    pub enable_web_search: bool,
}

impl QueryPayload {
    pub fn from_files(
        service_area: ServiceArea,
        legal_task: LegalTask,
        user_query: impl Into<String>,
        files: &[ProcessedFile],
        enable_web_search: bool,
    ) -> Self {
        let primary = files.first();
        let joined_names = files
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            service_area,
            legal_task,
            user_query: user_query.into(),
            file_name: (!joined_names.is_empty()).then_some(joined_names),
            extracted_text: primary.and_then(|f| f.extracted_text.clone()),
            raw_document: primary.and_then(|f| f.raw_document.clone()),
            page_images: primary.map(|f| f.page_images.clone()).unwrap_or_default(),
            mime_type: primary.map(|f| f.mime_type.clone()),
            enable_web_search,
        }
    }

    pub fn has_document(&self) -> bool {
        self.file_name.is_some()
            && (self.extracted_text.is_some()
                || self.raw_document.is_some()
                || !self.page_images.is_empty())
    }
}

/// Normalized provider reply: either model text or an explanatory notice
/// (block, interruption, empty response) in its place.
#[derive(Debug, Clone, PartialEq)]
pub struct AiReply {
    pub text: String,
    pub sources: Vec<Citation>,
}
