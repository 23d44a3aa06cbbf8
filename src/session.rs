//! In-memory session list and the single mutation entry point for chat
//! state. Every mutation persists the affected session through the
//! [`SessionStore`] before the list is re-sorted.

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::store::SessionStore;
use crate::types::{
    ChatMessage, ChatSession, LegalTask, ServiceArea, SystemMessage, UserQueryMessage,
};

const TITLE_MAX_CHARS: usize = 40;

pub struct SessionManager {
    store: Box<dyn SessionStore>,
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
    current_service_area: ServiceArea,
    current_legal_task: LegalTask,
}

impl SessionManager {
    /// Loads all persisted sessions and sorts them for display
    /// (most recently updated first).
    pub fn new(store: Box<dyn SessionStore>) -> Result<Self> {
        let mut sessions = store.get_all()?;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        info!("Loaded {} chat session(s) from store", sessions.len());
        Ok(Self {
            store,
            sessions,
            active_id: None,
            current_service_area: ServiceArea::default(),
            current_legal_task: LegalTask::default(),
        })
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        let id = self.active_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn current_context(&self) -> (ServiceArea, LegalTask) {
        (self.current_service_area, self.current_legal_task)
    }

    /// Starts a new session seeded with its first user message and makes it
    /// the active session. The title is derived from the opening query.
    pub fn start_session(&mut self, message: UserQueryMessage) -> Result<String> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            title: derive_title(&message.query_text),
            created_at: now,
            updated_at: now,
            initial_service_area: Some(message.service_area),
            initial_legal_task: Some(message.legal_task),
            messages: vec![ChatMessage::User(message)],
        };
        let id = session.id.clone();
        self.store.save(&session)?;
        self.sessions.insert(0, session);
        self.active_id = Some(id.clone());
        debug!("Started new session {}", id);
        Ok(id)
    }

    /// Appends a message to an existing session. An unknown id is a no-op
    /// with a diagnostic; state is left unchanged.
    pub fn append_message(&mut self, session_id: &str, message: ChatMessage) -> Result<()> {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            warn!("append_message: session {} not found", session_id);
            return Ok(());
        };

        // The first user message fixes the session's context tags so a
        // later reload can restore them.
        if session.messages.is_empty() {
            if let ChatMessage::User(user) = &message {
                session.initial_service_area = Some(user.service_area);
                session.initial_legal_task = Some(user.legal_task);
            }
        }

        session.messages.push(message);
        session.updated_at = Utc::now().max(session.updated_at);
        let saved = session.clone();
        self.store.save(&saved)?;
        self.resort();
        Ok(())
    }

    /// Renames a session; unknown id is a no-op.
    pub fn rename_session(&mut self, session_id: &str, title: impl Into<String>) -> Result<()> {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return Ok(());
        };
        session.title = title.into();
        session.updated_at = Utc::now().max(session.updated_at);
        let saved = session.clone();
        self.store.save(&saved)?;
        self.resort();
        Ok(())
    }

    /// Removes a session from the list and the store. Deleting the active
    /// session clears the active selection.
    pub fn delete_session(&mut self, session_id: &str) -> Result<()> {
        self.store.delete(session_id)?;
        self.sessions.retain(|s| s.id != session_id);
        if self.active_id.as_deref() == Some(session_id) {
            self.active_id = None;
        }
        Ok(())
    }

    /// Switches the active session and restores its remembered context tags
    /// as the current selection. Unknown id is a no-op.
    pub fn set_active_session(&mut self, session_id: &str) {
        let Some(session) = self.sessions.iter().find(|s| s.id == session_id) else {
            warn!("set_active_session: session {} not found", session_id);
            return;
        };
        self.current_service_area = session.initial_service_area.unwrap_or_default();
        self.current_legal_task = session.initial_legal_task.unwrap_or_default();
        self.active_id = Some(session_id.to_string());
    }

    /// Clears the active selection so the next submission opens a fresh
    /// session.
    pub fn start_new_chat(&mut self) {
        self.active_id = None;
    }

    /// Updates the current context tags. If anything actually changed while
    /// a session is active, a system message describing the change is
    /// appended to it.
    pub fn set_context(
        &mut self,
        service_area: Option<ServiceArea>,
        legal_task: Option<LegalTask>,
    ) -> Result<()> {
        let mut notice = String::new();
        if let Some(area) = service_area {
            if area != self.current_service_area {
                self.current_service_area = area;
                notice.push_str(&format!("Service Area updated to \"{}\". ", area));
            }
        }
        if let Some(task) = legal_task {
            if task != self.current_legal_task {
                self.current_legal_task = task;
                notice.push_str(&format!("Legal Task updated to \"{}\".", task));
            }
        }

        if !notice.is_empty() {
            if let Some(active) = self.active_id.clone() {
                self.append_message(
                    &active,
                    ChatMessage::System(SystemMessage::new(notice.trim())),
                )?;
            }
        }
        Ok(())
    }

    fn resort(&mut self) {
        self.sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

/// First ~40 characters of the opening query, with an ellipsis when cut.
fn derive_title(query: &str) -> String {
    let mut title: String = query.chars().take(TITLE_MAX_CHARS).collect();
    if query.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use crate::types::AiResponseMessage;

    fn manager() -> SessionManager {
        SessionManager::new(Box::new(MemorySessionStore::new())).unwrap()
    }

    fn user_msg(text: &str) -> UserQueryMessage {
        UserQueryMessage::new(
            ServiceArea::CaseLawAnalysis,
            LegalTask::SummarizeUploadedDocument,
            text,
            vec![],
        )
    }

    #[test]
    fn test_append_order_and_monotonic_updated_at() {
        let mut mgr = manager();
        let id = mgr.start_session(user_msg("first question")).unwrap();
        let after_create = mgr.active_session().unwrap().updated_at;

        mgr.append_message(
            &id,
            ChatMessage::Ai(AiResponseMessage::new("answer one", vec![], None)),
        )
        .unwrap();
        mgr.append_message(&id, ChatMessage::User(user_msg("second question")))
            .unwrap();

        let session = mgr.active_session().unwrap();
        assert_eq!(session.messages.len(), 3);
        assert!(matches!(session.messages[0], ChatMessage::User(_)));
        assert!(matches!(session.messages[1], ChatMessage::Ai(_)));
        assert!(matches!(session.messages[2], ChatMessage::User(_)));
        assert!(session.updated_at >= after_create);
    }

    #[test]
    fn test_title_truncation() {
        assert_eq!(derive_title("short"), "short");
        let long = "a".repeat(50);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 43);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_initial_tags_captured_and_restored() {
        let mut mgr = manager();
        let id = mgr.start_session(user_msg("judgment analysis")).unwrap();

        mgr.start_new_chat();
        mgr.set_context(Some(ServiceArea::VentureCapital), Some(LegalTask::GeneralQuery))
            .unwrap();

        mgr.set_active_session(&id);
        let (area, task) = mgr.current_context();
        assert_eq!(area, ServiceArea::CaseLawAnalysis);
        assert_eq!(task, LegalTask::SummarizeUploadedDocument);
    }

    #[test]
    fn test_delete_clears_active_and_store() {
        let store = Box::new(MemorySessionStore::new());
        let mut mgr = SessionManager::new(store).unwrap();
        let id = mgr.start_session(user_msg("to delete")).unwrap();

        mgr.delete_session(&id).unwrap();
        assert!(mgr.active_session().is_none());
        assert!(mgr.sessions().is_empty());

        // Reloading from the same kind of store would show nothing; verify
        // through the manager's own view since the store moved in.
        assert!(mgr.active_session_id().is_none());
    }

    #[test]
    fn test_rename_absent_id_is_noop() {
        let mut mgr = manager();
        mgr.start_session(user_msg("keep me")).unwrap();
        let before: Vec<_> = mgr.sessions().to_vec();
        mgr.rename_session("does-not-exist", "new title").unwrap();
        assert_eq!(mgr.sessions(), &before[..]);
    }

    #[test]
    fn test_append_absent_id_is_noop() {
        let mut mgr = manager();
        mgr.append_message(
            "missing",
            ChatMessage::Ai(AiResponseMessage::new("hi", vec![], None)),
        )
        .unwrap();
        assert!(mgr.sessions().is_empty());
    }

    #[test]
    fn test_context_change_appends_system_message_only_when_active() {
        let mut mgr = manager();

        // No active session: no message anywhere.
        mgr.set_context(Some(ServiceArea::RegulatoryGuidance), None)
            .unwrap();
        assert!(mgr.sessions().is_empty());

        let id = mgr.start_session(user_msg("q")).unwrap();
        mgr.set_context(None, Some(LegalTask::DraftDocument)).unwrap();

        let session = mgr.sessions().iter().find(|s| s.id == id).unwrap();
        let last = session.messages.last().unwrap();
        match last {
            ChatMessage::System(sys) => {
                assert!(sys.text.contains("Legal Task updated to"));
                assert!(sys.text.contains("Draft Document / Clause"));
            }
            other => panic!("expected system message, got {:?}", other),
        }
    }

    #[test]
    fn test_context_change_without_actual_change_is_silent() {
        let mut mgr = manager();
        let id = mgr.start_session(user_msg("q")).unwrap();
        let len = mgr.active_session().unwrap().messages.len();

        // Same values as captured by start_session's restore path.
        mgr.set_active_session(&id);
        let (area, task) = mgr.current_context();
        mgr.set_context(Some(area), Some(task)).unwrap();
        assert_eq!(mgr.active_session().unwrap().messages.len(), len);
    }

    #[test]
    fn test_sessions_sorted_by_recency() {
        let mut mgr = manager();
        let first = mgr.start_session(user_msg("older")).unwrap();
        mgr.start_new_chat();
        let second = mgr.start_session(user_msg("newer")).unwrap();
        assert_eq!(mgr.sessions()[0].id, second);

        // Touching the older session moves it back to the head.
        mgr.append_message(
            &first,
            ChatMessage::Ai(AiResponseMessage::new("reply", vec![], None)),
        )
        .unwrap();
        assert_eq!(mgr.sessions()[0].id, first);
    }
}
