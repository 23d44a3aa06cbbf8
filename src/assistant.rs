//! Top-level facade: wires session state, prompt assembly and the Gemini
//! client into one submission flow.

use log::{debug, error};

use crate::error::Result;
use crate::llm::{build_chat_contents, interpret_response, request_config, GeminiClient};
use crate::llm::client::GEMINI_TEXT_MODEL;
use crate::session::SessionManager;
use crate::store::SessionStore;
use crate::types::{
    AiResponseMessage, ChatMessage, LegalTask, ProcessedFile, QueryPayload, ServiceArea,
    UserQueryMessage,
};

pub struct LegalAssistant {
    sessions: SessionManager,
    client: GeminiClient,
    model: String,
}

impl LegalAssistant {
    pub fn new(client: GeminiClient, store: Box<dyn SessionStore>) -> Result<Self> {
        Ok(Self {
            sessions: SessionManager::new(store)?,
            client,
            model: GEMINI_TEXT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    /// Submits one user query with optional attachments. The user message is
    /// recorded first (opening a session if none is active), then the model
    /// is called with the history as it stood before this turn. Provider
    /// failures are recorded in the session as an error reply before the
    /// error propagates.
    pub async fn submit_query(
        &mut self,
        query_text: impl Into<String>,
        files: Vec<ProcessedFile>,
        enable_web_search: bool,
    ) -> Result<AiResponseMessage> {
        let query_text = query_text.into();
        let (service_area, legal_task) = self.sessions.current_context();

        let files_info = files.iter().map(|f| f.info()).collect();
        let user_message =
            UserQueryMessage::new(service_area, legal_task, query_text.clone(), files_info);

        // History for the prompt excludes the message being submitted; the
        // current turn carries it in its own format.
        let history: Vec<ChatMessage> = self
            .sessions
            .active_session()
            .map(|s| s.messages.clone())
            .unwrap_or_default();

        let session_id = match self.sessions.active_session_id() {
            Some(id) => {
                let id = id.to_string();
                self.sessions
                    .append_message(&id, ChatMessage::User(user_message))?;
                id
            }
            None => self.sessions.start_session(user_message)?,
        };

        let payload = QueryPayload::from_files(
            service_area,
            legal_task,
            query_text,
            &files,
            enable_web_search,
        );
        let file_name = payload.file_name.clone();
        let contents = build_chat_contents(&history, &payload);
        let config = request_config(&payload);
        debug!(
            "Submitting query to model {} (web search: {})",
            self.model, enable_web_search
        );

        let response = match self
            .client
            .generate_content(&self.model, contents, config)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Model call failed: {}", e);
                let notice = AiResponseMessage::new(
                    format!("Error: Failed to get AI response: {}", e),
                    vec![],
                    file_name,
                );
                self.sessions
                    .append_message(&session_id, ChatMessage::Ai(notice))?;
                return Err(e);
            }
        };

        let reply = interpret_response(&response);
        let ai_message = AiResponseMessage::new(reply.text, reply.sources, file_name);
        self.sessions
            .append_message(&session_id, ChatMessage::Ai(ai_message.clone()))?;
        Ok(ai_message)
    }

    pub fn set_context(
        &mut self,
        service_area: Option<ServiceArea>,
        legal_task: Option<LegalTask>,
    ) -> Result<()> {
        self.sessions.set_context(service_area, legal_task)
    }
}
