//! Normalizes raw provider responses into a displayable reply. Every
//! outcome, including blocks and empty answers, becomes chat text so the
//! conversation never dead-ends.

use log::warn;

use crate::llm::types::{Candidate, GenerateContentResponse};
use crate::types::{AiReply, Citation};

/// Finish reasons that indicate a normally completed answer.
const NORMAL_FINISH: [&str; 2] = ["STOP", "MAX_TOKENS"];

/// Interprets a decoded response. Checked in order: prompt block, abnormal
/// candidate finish, missing candidates, then the text itself.
pub fn interpret_response(response: &GenerateContentResponse) -> AiReply {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        warn!("Prompt blocked by provider: {}", reason);
        return AiReply {
            text: format!(
                "AI response was blocked. Reason: {}. Please revise your query or uploaded content.",
                reason
            ),
            sources: vec![],
        };
    }

    let candidates = response.candidates.as_deref().unwrap_or_default();
    match candidates.first() {
        Some(candidate) => {
            if let Some(reason) = candidate.finish_reason.as_deref() {
                if !NORMAL_FINISH.contains(&reason) {
                    warn!("Candidate finished abnormally: {}", reason);
                    return AiReply {
                        text: interruption_message(reason, candidate),
                        sources: vec![],
                    };
                }
            }
        }
        None => {
            warn!("Provider returned no candidates and no block reason");
            return AiReply {
                text: "AI returned no actionable response or candidates. Please try rephrasing or check the uploaded content and API logs.".to_string(),
                sources: vec![],
            };
        }
    }

    let sources = extract_citations(candidates.first());
    match response.text() {
        Some(text) if !text.trim().is_empty() => AiReply { text, sources },
        _ => AiReply {
            text: "AI returned a response, but the content is empty.".to_string(),
            sources,
        },
    }
}

fn interruption_message(reason: &str, candidate: &Candidate) -> String {
    let detail = if reason == "SAFETY" {
        match candidate.safety_ratings.as_deref() {
            Some(ratings) if !ratings.is_empty() => {
                let listed = ratings
                    .iter()
                    .map(|r| format!("{} - {}", r.category, r.probability))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Safety details: {}", listed)
            }
            _ => "No specific safety details provided.".to_string(),
        }
    } else {
        "Please review your input.".to_string()
    };
    format!(
        "AI response generation was interrupted or flagged. Reason: {}. {}",
        reason, detail
    )
}

/// Web grounding chunks become citations; chunks without a URI are dropped.
fn extract_citations(candidate: Option<&Candidate>) -> Vec<Citation> {
    let Some(metadata) = candidate.and_then(|c| c.grounding_metadata.as_ref()) else {
        return vec![];
    };
    metadata
        .grounding_chunks
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let uri = web.uri.clone()?;
            Some(Citation {
                title: web.title.clone().unwrap_or_else(|| uri.clone()),
                uri,
            })
        })
        .collect()
}
