#[cfg(test)]
mod tests {
    use crate::attachment::Attachment;
    use crate::error::{AuraError, Result};
    use crate::session::repository::{InMemoryStateRepository, PersistedState, StateRepository};
    use crate::session::store::{EMPTY_REPLY_FALLBACK, ERROR_REPLY, SessionStore};
    use crate::session::{ChatSession, DEFAULT_SESSION_TITLE, Message, SHARED_SESSION_TITLE};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    // Mock StateRepository that counts saves and can be switched to fail
    struct MockStateRepository {
        inner: InMemoryStateRepository,
        saves: AtomicUsize,
        fail_saves: AtomicBool,
    }

    impl MockStateRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryStateRepository::new(),
                saves: AtomicUsize::new(0),
                fail_saves: AtomicBool::new(false),
            }
        }

        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    impl StateRepository for MockStateRepository {
        fn load(&self) -> Result<PersistedState> {
            self.inner.load()
        }

        fn save(&self, state: &PersistedState) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(AuraError::storage("disk full"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(state)
        }
    }

    fn store_with_session() -> (SessionStore, Arc<MockStateRepository>, String) {
        let repository = Arc::new(MockStateRepository::new());
        let mut store = SessionStore::new(repository.clone());
        let session = store.create_session().unwrap();
        (store, repository, session.id)
    }

    fn text_attachment() -> Attachment {
        Attachment::encode("notes.txt", "text/plain", b"remember the milk")
    }

    #[test]
    fn test_create_session_prepends_and_selects() {
        let (mut store, repository, first) = store_with_session();
        let second = store.create_session().unwrap();

        assert_eq!(store.sessions().len(), 2);
        assert_eq!(store.sessions()[0].id, second.id);
        assert_eq!(store.sessions()[1].id, first);
        assert_eq!(store.current_session_id(), Some(second.id.as_str()));
        assert_eq!(second.messages.len(), 1);
        assert_eq!(repository.saves(), 2);
    }

    #[test]
    fn test_select_unknown_session_is_silent() {
        let (mut store, repository, id) = store_with_session();
        let saves = repository.saves();

        assert!(!store.select_session("missing").unwrap());
        assert_eq!(store.current_session_id(), Some(id.as_str()));
        assert_eq!(repository.saves(), saves);
    }

    #[test]
    fn test_first_user_message_derives_title() {
        let (mut store, _, id) = store_with_session();
        store
            .append_user_message(&id, "Explain quantum tunneling in simple terms please", Vec::new())
            .unwrap()
            .unwrap();

        assert_eq!(
            store.session(&id).unwrap().title,
            "Explain quantum tunneling in s..."
        );
    }

    #[test]
    fn test_short_first_message_title_unchanged() {
        let (mut store, _, id) = store_with_session();
        store.append_user_message(&id, "Hi", Vec::new()).unwrap();
        assert_eq!(store.session(&id).unwrap().title, "Hi");
    }

    #[test]
    fn test_second_user_message_keeps_title() {
        let (mut store, _, id) = store_with_session();
        store.append_user_message(&id, "Hi", Vec::new()).unwrap();
        store.append_assistant_message(&id, "Hello").unwrap();
        store.append_user_message(&id, "Another topic", Vec::new()).unwrap();
        assert_eq!(store.session(&id).unwrap().title, "Hi");
    }

    #[test]
    fn test_attachment_only_message_keeps_placeholder_title() {
        let (mut store, _, id) = store_with_session();
        let message = store
            .append_user_message(&id, "   ", vec![text_attachment()])
            .unwrap()
            .unwrap();

        assert_eq!(message.attachments().len(), 1);
        assert_eq!(store.session(&id).unwrap().title, DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn test_blank_send_is_noop() {
        let (mut store, repository, id) = store_with_session();
        let saves = repository.saves();

        assert!(store.append_user_message(&id, "", Vec::new()).unwrap().is_none());
        assert!(store.append_user_message(&id, " \n\t", Vec::new()).unwrap().is_none());
        assert_eq!(store.session(&id).unwrap().messages.len(), 1);
        assert!(!store.is_busy(&id));
        assert_eq!(repository.saves(), saves);
    }

    #[test]
    fn test_send_to_non_current_session_is_rejected() {
        let (mut store, _, first) = store_with_session();
        store.create_session().unwrap();

        assert!(store.append_user_message(&first, "hello", Vec::new()).unwrap().is_none());
        assert_eq!(store.session(&first).unwrap().messages.len(), 1);
    }

    #[test]
    fn test_single_in_flight_guard() {
        let (mut store, _, id) = store_with_session();

        assert!(store.append_user_message(&id, "first", Vec::new()).unwrap().is_some());
        assert!(store.is_busy(&id));
        assert!(store.append_user_message(&id, "second", Vec::new()).unwrap().is_none());
        assert_eq!(store.session(&id).unwrap().messages.len(), 2);

        store.append_assistant_message(&id, "reply").unwrap();
        assert!(!store.is_busy(&id));
        assert!(store.append_user_message(&id, "second", Vec::new()).unwrap().is_some());
        assert_eq!(store.session(&id).unwrap().messages.len(), 4);
    }

    #[test]
    fn test_busy_guard_is_per_session() {
        let (mut store, _, first) = store_with_session();
        store.append_user_message(&first, "first", Vec::new()).unwrap();

        let second = store.create_session().unwrap();
        assert!(store.append_user_message(&second.id, "other", Vec::new()).unwrap().is_some());
        assert!(store.is_busy(&first));
        assert!(store.is_busy(&second.id));
    }

    #[test]
    fn test_append_only_history() {
        let (mut store, _, id) = store_with_session();
        let mut observed: Vec<Message> = store.session(&id).unwrap().messages.clone();

        for turn in 0..3 {
            store.append_user_message(&id, &format!("q{turn}"), Vec::new()).unwrap();
            store.append_assistant_message(&id, &format!("a{turn}")).unwrap();

            let messages = &store.session(&id).unwrap().messages;
            assert!(messages.len() >= observed.len());
            assert_eq!(&messages[..observed.len()], observed.as_slice());
            observed = messages.clone();
        }
        assert_eq!(observed.len(), 7);
    }

    #[test]
    fn test_updated_at_refreshed_on_append() {
        let (mut store, _, id) = store_with_session();
        let before = store.session(&id).unwrap().updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.append_user_message(&id, "hello", Vec::new()).unwrap();
        assert!(store.session(&id).unwrap().updated_at > before);
    }

    #[test]
    fn test_empty_reply_uses_fallback() {
        let (mut store, _, id) = store_with_session();
        store.append_user_message(&id, "hello", Vec::new()).unwrap();
        let reply = store.append_assistant_message(&id, "").unwrap().unwrap();
        assert_eq!(reply.content, EMPTY_REPLY_FALLBACK);
    }

    #[test]
    fn test_whitespace_reply_is_kept_verbatim() {
        let (mut store, _, id) = store_with_session();
        store.append_user_message(&id, "hello", Vec::new()).unwrap();
        let reply = store.append_assistant_message(&id, "   ").unwrap().unwrap();
        assert_eq!(reply.content, "   ");
    }

    #[test]
    fn test_error_reply_clears_busy() {
        let (mut store, _, id) = store_with_session();
        store.append_user_message(&id, "hello", Vec::new()).unwrap();
        let reply = store.append_error_message(&id).unwrap().unwrap();

        assert_eq!(reply.content, ERROR_REPLY);
        assert!(!store.is_busy(&id));
    }

    #[test]
    fn test_reply_lands_in_addressed_session_after_switch() {
        let (mut store, _, first) = store_with_session();
        store.append_user_message(&first, "question", Vec::new()).unwrap();
        let second = store.create_session().unwrap();

        store.append_assistant_message(&first, "answer").unwrap();

        assert_eq!(store.current_session_id(), Some(second.id.as_str()));
        let messages = &store.session(&first).unwrap().messages;
        assert_eq!(messages.last().unwrap().content, "answer");
        assert_eq!(store.session(&second.id).unwrap().messages.len(), 1);
    }

    #[test]
    fn test_reply_for_deleted_session_is_discarded() {
        let (mut store, _, first) = store_with_session();
        store.append_user_message(&first, "question", Vec::new()).unwrap();
        store.create_session().unwrap();
        store.delete_session(&first).unwrap();

        assert!(store.append_assistant_message(&first, "late").unwrap().is_none());
        assert!(!store.is_busy(&first));
    }

    #[test]
    fn test_delete_current_selects_first_remaining() {
        let repository = Arc::new(MockStateRepository::new());
        let mut store = SessionStore::new(repository);
        let c = store.create_session().unwrap();
        let b = store.create_session().unwrap();
        let a = store.create_session().unwrap();
        // Order is now [A, B, C]
        store.select_session(&b.id).unwrap();

        assert!(store.delete_session(&b.id).unwrap());

        assert_eq!(store.sessions().len(), 2);
        assert_eq!(store.current_session_id(), Some(a.id.as_str()));
        assert_eq!(store.sessions()[1].id, c.id);
    }

    #[test]
    fn test_delete_non_current_keeps_selection() {
        let (mut store, _, first) = store_with_session();
        let second = store.create_session().unwrap();

        store.delete_session(&first).unwrap();
        assert_eq!(store.current_session_id(), Some(second.id.as_str()));
    }

    #[test]
    fn test_delete_last_session_clears_current() {
        let (mut store, _, id) = store_with_session();
        store.delete_session(&id).unwrap();

        assert!(store.sessions().is_empty());
        assert_eq!(store.current_session_id(), None);
        assert!(!store.delete_session(&id).unwrap());
    }

    #[test]
    fn test_clear_all_leaves_one_fresh_session() {
        let (mut store, _, _) = store_with_session();
        store.create_session().unwrap();
        store.create_session().unwrap();

        let fresh = store.clear_all().unwrap();

        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].messages.len(), 1);
        assert_eq!(store.current_session_id(), Some(fresh.id.as_str()));
    }

    #[test]
    fn test_import_session_is_current_and_verbatim() {
        let (mut store, _, _) = store_with_session();
        let messages = vec![
            Message::user("shared question", Vec::new()),
            Message::assistant("shared answer"),
        ];

        let imported = store.import_session(messages.clone()).unwrap();

        assert_eq!(imported.title, SHARED_SESSION_TITLE);
        assert_eq!(imported.messages, messages);
        assert_eq!(store.sessions()[0].id, imported.id);
        assert_eq!(store.current_session_id(), Some(imported.id.as_str()));
    }

    #[test]
    fn test_imported_session_title_is_fixed() {
        let (mut store, _, _) = store_with_session();
        let imported = store
            .import_session(vec![Message::assistant("only the bot spoke")])
            .unwrap();

        store.append_user_message(&imported.id, "Hi", Vec::new()).unwrap();
        assert_eq!(store.session(&imported.id).unwrap().title, SHARED_SESSION_TITLE);
    }

    #[test]
    fn test_import_empty_list_is_seeded() {
        let (mut store, _, _) = store_with_session();
        let imported = store.import_session(Vec::new()).unwrap();
        assert_eq!(imported.messages.len(), 1);
    }

    #[test]
    fn test_reload_is_identical() {
        let (mut store, repository, id) = store_with_session();
        store
            .append_user_message(&id, "hello", vec![text_attachment()])
            .unwrap();
        store.append_assistant_message(&id, "hi there").unwrap();
        store.create_session().unwrap();
        store.select_session(&id).unwrap();

        let reloaded = SessionStore::load(repository).unwrap();

        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_load_repairs_dangling_current_id() {
        let session = ChatSession::new();
        let repository = Arc::new(InMemoryStateRepository::with_state(PersistedState {
            sessions: vec![session.clone()],
            current_session_id: Some("gone".to_string()),
        }));

        let store = SessionStore::load(repository).unwrap();
        assert_eq!(store.current_session_id(), Some(session.id.as_str()));
    }

    #[test]
    fn test_load_empty_has_no_current() {
        let repository = Arc::new(InMemoryStateRepository::with_state(PersistedState {
            sessions: Vec::new(),
            current_session_id: Some("stale".to_string()),
        }));

        let store = SessionStore::load(repository).unwrap();
        assert!(store.sessions().is_empty());
        assert_eq!(store.current_session_id(), None);
    }

    #[test]
    fn test_storage_failure_is_reported_and_not_busy() {
        let (mut store, repository, id) = store_with_session();
        repository.fail_saves.store(true, Ordering::SeqCst);

        let err = store.append_user_message(&id, "hello", Vec::new()).unwrap_err();

        assert!(err.is_storage());
        assert!(!store.is_busy(&id));
        // The in-memory state keeps the change
        assert_eq!(store.session(&id).unwrap().messages.len(), 2);
    }
}
