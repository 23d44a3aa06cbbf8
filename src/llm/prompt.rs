//! Multi-turn prompt assembly: turns stored chat history plus the current
//! query payload into the `contents` array sent to the model.

use std::fmt;

use log::debug;

use crate::llm::prompts::{BASE_SYSTEM_INSTRUCTION, CASE_LAW_FOCUS};
use crate::llm::types::{Content, Part, RequestConfig};
use crate::types::{ChatMessage, LegalTask, QueryPayload, ServiceArea};

/// How the attached document reaches the model, named in the analysis
/// instruction so the model knows what it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTarget {
    TextContent,
    ImagePages,
    Base64Document,
    MixedContent,
    UploadedImageFile,
}

impl fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalysisTarget::TextContent => "text content",
            AnalysisTarget::ImagePages => "image pages",
            AnalysisTarget::Base64Document => "base64 document",
            AnalysisTarget::MixedContent => "mixed content",
            AnalysisTarget::UploadedImageFile => "uploaded image file",
        })
    }
}

impl AnalysisTarget {
    pub fn classify(payload: &QueryPayload) -> Self {
        let is_image = payload
            .mime_type
            .as_deref()
            .map(|m| m.starts_with("image/"))
            .unwrap_or(false);
        let has_text = payload.extracted_text.is_some();
        let has_pages = !payload.page_images.is_empty();

        if payload.raw_document.is_some() {
            AnalysisTarget::Base64Document
        } else if is_image && has_pages {
            AnalysisTarget::UploadedImageFile
        } else if has_text && !has_pages {
            AnalysisTarget::TextContent
        } else if !has_text && has_pages {
            AnalysisTarget::ImagePages
        } else {
            AnalysisTarget::MixedContent
        }
    }
}

/// System instruction for the instructed (non-search) mode: the base role
/// prompt plus the query's current context tags.
pub fn system_instruction(service_area: ServiceArea, legal_task: LegalTask) -> String {
    format!(
        "{}\nCurrent Service Area (for this specific query): {}.\nCurrent LegalTask (for this specific query): {}.",
        BASE_SYSTEM_INSTRUCTION, service_area, legal_task
    )
}

/// Picks the request shape for a submission. Search grounding and the
/// instructed parameter set never mix.
pub fn request_config(payload: &QueryPayload) -> RequestConfig {
    if payload.enable_web_search {
        RequestConfig::SearchGrounded
    } else {
        RequestConfig::Instructed {
            system_instruction: system_instruction(payload.service_area, payload.legal_task),
        }
    }
}

/// Builds the full `contents` array: prior turns first (system messages
/// excluded), then the current user turn with any attached document parts.
pub fn build_chat_contents(history: &[ChatMessage], payload: &QueryPayload) -> Vec<Content> {
    let mut contents: Vec<Content> = history.iter().filter_map(history_turn).collect();
    contents.push(Content::user(current_turn_parts(payload)));
    debug!(
        "Assembled {} content turn(s) for query ({} history message(s) considered)",
        contents.len(),
        history.len()
    );
    contents
}

/// Renders one stored message as a history turn, or `None` for messages the
/// model never sees.
fn history_turn(message: &ChatMessage) -> Option<Content> {
    match message {
        ChatMessage::User(user) => {
            let mut text = format!(
                "Context: Service Area was \"{}\", Legal Task was \"{}\".\nQuery: {}",
                user.service_area, user.legal_task, user.query_text
            );
            if !user.files_info.is_empty() {
                let names = user
                    .files_info
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                text.push_str(&format!("\n(User had attached files: {})", names));
            }
            Some(Content::user(vec![Part::text(text)]))
        }
        ChatMessage::Ai(ai) => {
            let mut text = ai.text.clone();
            // Restate the citations the model produced last turn so it can
            // keep referring to them.
            if !ai.sources.is_empty() {
                let sources = ai
                    .sources
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let label = if s.title.is_empty() { &s.uri } else { &s.title };
                        format!("{}. {} ({})", i + 1, label, s.uri)
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                text.push_str(&format!(
                    "\n\nWeb Search Sources Provided in Previous Turn:\n{}",
                    sources
                ));
            }
            Some(Content::model(vec![Part::text(text)]))
        }
        ChatMessage::System(_) => None,
    }
}

fn current_turn_parts(payload: &QueryPayload) -> Vec<Part> {
    let mut query_text = format!(
        "Considering the ongoing conversation, and for the current context of Service Area: \"{}\" and Legal Task: \"{}\". My query is: \"{}\"",
        payload.service_area, payload.legal_task, payload.user_query
    );

    if !payload.has_document() {
        return vec![Part::text(query_text)];
    }

    let file_name = payload.file_name.as_deref().unwrap_or_default();
    let target = AnalysisTarget::classify(payload);
    debug!(
        "Attachment {:?} presented as {} (MIME: {:?})",
        file_name, target, payload.mime_type
    );

    let case_law_focus = if payload.service_area == ServiceArea::CaseLawAnalysis {
        CASE_LAW_FOCUS
    } else {
        ""
    };
    query_text.push_str(&format!(
        "\n\nPlease analyze the attached file(s) named \"{}\" (provided as {}) in relation to my query. Focus on:\n1. Overview of the document/image.\n2. Relevance to my query, the current service area, and task.\n3. Key findings or insights.\n{}\n---\n",
        file_name, target, case_law_focus
    ));

    let mut parts = vec![Part::text(query_text)];

    if let Some(raw) = &payload.raw_document {
        let mime = payload
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        parts.push(Part::inline(mime, raw));
    } else if let Some(text) = &payload.extracted_text {
        parts.push(Part::text(format!(
            "\n--- Start of Uploaded Document Text ({name}) ---\n{text}\n--- End of Uploaded Document Text ({name}) ---",
            name = file_name,
            text = text
        )));
    }

    if !payload.page_images.is_empty() {
        parts.push(Part::text(format!(
            "\n--- Start of Uploaded Document Images/Pages ({}) ---",
            file_name
        )));
        for (index, page) in payload.page_images.iter().enumerate() {
            let label = if target == AnalysisTarget::UploadedImageFile {
                "Uploaded Image:".to_string()
            } else {
                format!("Image Page {}:", index + 1)
            };
            parts.push(Part::text(label));
            parts.push(Part::inline(&page.mime_type, &page.data));
        }
        parts.push(Part::text(format!(
            "\n--- End of Uploaded Document Images/Pages ({}) ---",
            file_name
        )));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AiResponseMessage, Citation, FileInfo, PageImage, SystemMessage, UserQueryMessage,
    };

    fn payload(query: &str) -> QueryPayload {
        QueryPayload {
            service_area: ServiceArea::RegulatoryGuidance,
            legal_task: LegalTask::GeneralQuery,
            user_query: query.to_string(),
            ..Default::default()
        }
    }

    fn png_page() -> PageImage {
        PageImage {
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_classify_all_targets() {
        let mut p = payload("q");
        p.extracted_text = Some("t".into());
        assert_eq!(AnalysisTarget::classify(&p), AnalysisTarget::TextContent);

        let mut p = payload("q");
        p.page_images = vec![png_page()];
        p.mime_type = Some("application/pdf".into());
        assert_eq!(AnalysisTarget::classify(&p), AnalysisTarget::ImagePages);

        let mut p = payload("q");
        p.raw_document = Some(vec![0]);
        p.mime_type = Some(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
        );
        assert_eq!(AnalysisTarget::classify(&p), AnalysisTarget::Base64Document);

        let mut p = payload("q");
        p.extracted_text = Some("t".into());
        p.page_images = vec![png_page()];
        p.mime_type = Some("application/pdf".into());
        assert_eq!(AnalysisTarget::classify(&p), AnalysisTarget::MixedContent);

        let mut p = payload("q");
        p.page_images = vec![png_page()];
        p.mime_type = Some("image/jpeg".into());
        assert_eq!(
            AnalysisTarget::classify(&p),
            AnalysisTarget::UploadedImageFile
        );
    }

    #[test]
    fn test_history_excludes_system_messages() {
        let history = vec![
            ChatMessage::User(UserQueryMessage::new(
                ServiceArea::VentureCapital,
                LegalTask::GeneralQuery,
                "What is an ESOP pool?",
                vec![],
            )),
            ChatMessage::System(SystemMessage::new("Service Area updated to \"X\".")),
            ChatMessage::Ai(AiResponseMessage::new("An ESOP pool is...", vec![], None)),
        ];

        let contents = build_chat_contents(&history, &payload("follow-up"));
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
    }

    #[test]
    fn test_user_history_turn_format() {
        let history = vec![ChatMessage::User(UserQueryMessage::new(
            ServiceArea::CaseLawAnalysis,
            LegalTask::SummarizeUploadedDocument,
            "Summarize this judgment",
            vec![FileInfo {
                name: "judgment.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size: 100,
            }],
        ))];

        let contents = build_chat_contents(&history, &payload("next"));
        let text = contents[0].parts[0].as_text().unwrap();
        assert_eq!(
            text,
            "Context: Service Area was \"Case Law & Judgment Analysis\", Legal Task was \"Summarize Uploaded Document (Key Points)\".\nQuery: Summarize this judgment\n(User had attached files: judgment.pdf)"
        );
    }

    #[test]
    fn test_ai_history_turn_restates_sources() {
        let history = vec![ChatMessage::Ai(AiResponseMessage::new(
            "See recent guidance.",
            vec![
                Citation {
                    uri: "https://example.com/a".to_string(),
                    title: "Guidance A".to_string(),
                },
                Citation {
                    uri: "https://example.com/b".to_string(),
                    title: String::new(),
                },
            ],
            None,
        ))];

        let contents = build_chat_contents(&history, &payload("next"));
        let text = contents[0].parts[0].as_text().unwrap();
        assert!(text.starts_with("See recent guidance."));
        assert!(text.contains("Web Search Sources Provided in Previous Turn:"));
        assert!(text.contains("1. Guidance A (https://example.com/a)"));
        // Untitled sources fall back to the URI as the label.
        assert!(text.contains("2. https://example.com/b (https://example.com/b)"));
    }

    #[test]
    fn test_current_turn_without_document() {
        let contents = build_chat_contents(&[], &payload("Is a privacy policy mandatory?"));
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].parts.len(), 1);
        assert_eq!(
            contents[0].parts[0].as_text().unwrap(),
            "Considering the ongoing conversation, and for the current context of Service Area: \"Regulatory Guidance\" and Legal Task: \"General Legal Q&A\". My query is: \"Is a privacy policy mandatory?\""
        );
    }

    #[test]
    fn test_document_text_is_delimited() {
        let mut p = payload("Review this");
        p.file_name = Some("nda.txt".to_string());
        p.extracted_text = Some("Confidential terms.".to_string());
        p.mime_type = Some("text/plain".to_string());

        let contents = build_chat_contents(&[], &p);
        let parts = &contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(parts[0]
            .as_text()
            .unwrap()
            .contains("named \"nda.txt\" (provided as text content)"));
        assert_eq!(
            parts[1].as_text().unwrap(),
            "\n--- Start of Uploaded Document Text (nda.txt) ---\nConfidential terms.\n--- End of Uploaded Document Text (nda.txt) ---"
        );
    }

    #[test]
    fn test_case_law_adds_judgment_focus() {
        let mut p = payload("Analyze");
        p.service_area = ServiceArea::CaseLawAnalysis;
        p.file_name = Some("order.pdf".to_string());
        p.extracted_text = Some("text".to_string());
        p.mime_type = Some("application/pdf".to_string());

        let contents = build_chat_contents(&[], &p);
        let text = contents[0].parts[0].as_text().unwrap();
        assert!(text.contains(
            "4. For judgments: Factual Matrix, Issues, Reasoning, Ratio Decidendi, Final Order."
        ));
    }

    #[test]
    fn test_judgment_focus_absent_outside_case_law() {
        let mut p = payload("Analyze");
        p.file_name = Some("contract.txt".to_string());
        p.extracted_text = Some("text".to_string());

        let contents = build_chat_contents(&[], &p);
        let text = contents[0].parts[0].as_text().unwrap();
        assert!(!text.contains("For judgments"));
        assert!(text.contains("3. Key findings or insights.\n\n---\n"));
    }

    #[test]
    fn test_rendered_pages_labeled_and_wrapped() {
        let mut p = payload("What does it say?");
        p.file_name = Some("scan.pdf".to_string());
        p.page_images = vec![png_page(), png_page()];
        p.mime_type = Some("application/pdf".to_string());

        let contents = build_chat_contents(&[], &p);
        let parts = &contents[0].parts;
        // query text, start marker, (label, image) x2, end marker
        assert_eq!(parts.len(), 7);
        assert_eq!(
            parts[1].as_text().unwrap(),
            "\n--- Start of Uploaded Document Images/Pages (scan.pdf) ---"
        );
        assert_eq!(parts[2].as_text().unwrap(), "Image Page 1:");
        assert!(parts[3].as_text().is_none());
        assert_eq!(parts[4].as_text().unwrap(), "Image Page 2:");
        assert_eq!(
            parts[6].as_text().unwrap(),
            "\n--- End of Uploaded Document Images/Pages (scan.pdf) ---"
        );
    }

    #[test]
    fn test_uploaded_image_label() {
        let mut p = payload("What is in this photo?");
        p.file_name = Some("evidence.jpg".to_string());
        p.page_images = vec![PageImage {
            mime_type: "image/jpeg".to_string(),
            data: vec![9],
        }];
        p.mime_type = Some("image/jpeg".to_string());

        let contents = build_chat_contents(&[], &p);
        let parts = &contents[0].parts;
        assert!(parts[0]
            .as_text()
            .unwrap()
            .contains("(provided as uploaded image file)"));
        assert_eq!(parts[2].as_text().unwrap(), "Uploaded Image:");
    }

    #[test]
    fn test_word_document_sent_inline() {
        let mut p = payload("Summarize");
        p.file_name = Some("agreement.docx".to_string());
        p.raw_document = Some(vec![0x50, 0x4B]);
        p.mime_type = Some(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
        );

        let contents = build_chat_contents(&[], &p);
        let parts = &contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(parts[0]
            .as_text()
            .unwrap()
            .contains("(provided as base64 document)"));
        assert!(parts[1].as_text().is_none());
    }

    #[test]
    fn test_search_and_instructed_configs() {
        let mut p = payload("q");
        p.enable_web_search = true;
        assert!(matches!(request_config(&p), RequestConfig::SearchGrounded));

        p.enable_web_search = false;
        match request_config(&p) {
            RequestConfig::Instructed { system_instruction } => {
                assert!(system_instruction.starts_with("You are the Boolean Legal AI Assistant"));
                assert!(system_instruction.contains(
                    "Current Service Area (for this specific query): Regulatory Guidance."
                ));
                assert!(system_instruction
                    .contains("Current LegalTask (for this specific query): General Legal Q&A."));
            }
            other => panic!("expected instructed config, got {:?}", other),
        }
    }
}
