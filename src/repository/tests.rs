//! Repository Integration Tests
//!
//! Local backend against an in-memory SQLite database, with two clients
//! standing in for two signed-in users.

#[cfg(test)]
mod tests {
    use crate::domain::{ConnectionStatus, DomainError, MemberRole, Session, TaskId, TaskPatch};
    use crate::realtime::{ChangeEvent, ChangeEventSource};
    use crate::repository::{
        AuthGateway, ConnectionRepository, ListRepository, LocalBackend, MembershipRepository, ProfileRepository,
        TaskRepository,
    };

    async fn setup_test_db() -> (LocalBackend, Session) {
        let backend = LocalBackend::in_memory().expect("Failed to init test DB");
        let session = backend
            .sign_up("alice@example.com", "secret1", "alice")
            .await
            .expect("Failed to sign up");
        (backend, session)
    }

    async fn second_user(backend: &LocalBackend, name: &str) -> (LocalBackend, Session) {
        let client = backend.client();
        let session = client
            .sign_up(&format!("{}@example.com", name), "secret1", name)
            .await
            .expect("Failed to sign up");
        (client, session)
    }

    async fn connect(a: &LocalBackend, a_session: &Session, b: &LocalBackend, b_session: &Session) {
        let request = a
            .request_connection(&a_session.user_id, &b_session.user_id)
            .await
            .expect("Request failed");
        b.set_connection_status(&request.id, ConnectionStatus::Accepted)
            .await
            .expect("Accept failed");
    }

    #[tokio::test]
    async fn test_create_list_adds_owner_membership() {
        let (backend, alice) = setup_test_db().await;

        let list = backend.create_list(&alice.user_id, "Groceries").await.expect("Failed to create");
        assert_eq!(list.title, "Groceries");
        assert!(list.is_owned_by(&alice.user_id));

        let members = backend.members(&list.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, MemberRole::Owner);
        assert_eq!(members[0].username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_visible_lists_newest_first() {
        let (backend, alice) = setup_test_db().await;
        backend.create_list(&alice.user_id, "First").await.unwrap();
        backend.create_list(&alice.user_id, "Second").await.unwrap();

        let lists = backend.visible_lists().await.unwrap();
        let titles: Vec<_> = lists.iter().map(|l| l.list.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert_eq!(lists[0].members.len(), 1);
    }

    #[tokio::test]
    async fn test_task_crud() {
        let (backend, alice) = setup_test_db().await;
        let list = backend.create_list(&alice.user_id, "Chores").await.unwrap();

        let first = backend.create_task(&list.id, "Dishes").await.expect("Failed to create");
        let second = backend.create_task(&list.id, "Laundry").await.unwrap();
        assert!(!first.is_done);
        assert_eq!(first.created_by, alice.user_id);

        backend.update_task(&first.id, &TaskPatch::completion(true)).await.expect("Update failed");
        backend.delete_task(&second.id).await.expect("Delete failed");

        let tasks = backend.list_tasks(&list.id).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, first.id);
        assert!(tasks[0].is_done);
        assert!(tasks[0].updated_at >= tasks[0].created_at);
    }

    #[tokio::test]
    async fn test_tasks_ordered_by_creation() {
        let (backend, alice) = setup_test_db().await;
        let list = backend.create_list(&alice.user_id, "Order").await.unwrap();
        for title in ["a", "b", "c", "d"] {
            backend.create_task(&list.id, title).await.unwrap();
        }

        let titles: Vec<_> = backend
            .list_tasks(&list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found() {
        let (backend, _) = setup_test_db().await;
        let missing = TaskId::from("nope");

        let result = backend.update_task(&missing, &TaskPatch::completion(true)).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert!(matches!(backend.delete_task(&missing).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_member_cannot_touch_tasks() {
        let (alice_client, alice) = setup_test_db().await;
        let (bob_client, _) = second_user(&alice_client, "bob").await;
        let list = alice_client.create_list(&alice.user_id, "Private").await.unwrap();
        let task = alice_client.create_task(&list.id, "Secret").await.unwrap();

        assert!(matches!(bob_client.list_tasks(&list.id).await, Err(DomainError::Unauthorized(_))));
        assert!(matches!(
            bob_client.create_task(&list.id, "Sneaky").await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(bob_client.delete_task(&task.id).await, Err(DomainError::Unauthorized(_))));
        assert!(bob_client.find_list(&list.id).await.unwrap().is_none());
        assert!(bob_client.visible_lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_client_is_rejected() {
        let (backend, alice) = setup_test_db().await;
        let list = backend.create_list(&alice.user_id, "Mine").await.unwrap();
        backend.sign_out().await.unwrap();

        assert!(backend.current_session().await.is_none());
        assert!(matches!(backend.list_tasks(&list.id).await, Err(DomainError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_share_requires_accepted_connection() {
        let (alice_client, alice) = setup_test_db().await;
        let (bob_client, bob) = second_user(&alice_client, "bob").await;
        let list = alice_client.create_list(&alice.user_id, "Shared").await.unwrap();

        let denied = alice_client.add_member(&list.id, &bob.user_id, MemberRole::Editor).await;
        assert!(matches!(denied, Err(DomainError::Unauthorized(_))));

        connect(&alice_client, &alice, &bob_client, &bob).await;
        let membership = alice_client
            .add_member(&list.id, &bob.user_id, MemberRole::Editor)
            .await
            .expect("Share failed");
        assert_eq!(membership.role, MemberRole::Editor);

        let again = alice_client.add_member(&list.id, &bob.user_id, MemberRole::Editor).await;
        assert!(matches!(again, Err(DomainError::Conflict(_))));

        // bob now sees the list and can edit it
        assert_eq!(bob_client.visible_lists().await.unwrap().len(), 1);
        bob_client.create_task(&list.id, "From bob").await.expect("Editor create failed");
        assert!(matches!(bob_client.delete_list(&list.id).await, Err(DomainError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_delete_list_cascades() {
        let (backend, alice) = setup_test_db().await;
        let list = backend.create_list(&alice.user_id, "Temp").await.unwrap();
        backend.create_task(&list.id, "one").await.unwrap();

        backend.delete_list(&list.id).await.expect("Delete failed");

        assert!(backend.find_list(&list.id).await.unwrap().is_none());
        assert!(matches!(backend.list_tasks(&list.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_connection_rules() {
        let (alice_client, alice) = setup_test_db().await;
        let (bob_client, bob) = second_user(&alice_client, "bob").await;

        let own = alice_client.request_connection(&alice.user_id, &alice.user_id).await;
        assert!(matches!(own, Err(DomainError::InvalidInput(_))));

        let request = alice_client.request_connection(&alice.user_id, &bob.user_id).await.unwrap();
        assert_eq!(request.status, ConnectionStatus::Pending);

        let reverse = bob_client.request_connection(&bob.user_id, &alice.user_id).await;
        assert!(matches!(reverse, Err(DomainError::Conflict(_))));

        // only the addressee may answer
        let by_requester = alice_client.set_connection_status(&request.id, ConnectionStatus::Accepted).await;
        assert!(matches!(by_requester, Err(DomainError::Unauthorized(_))));

        let incoming = bob_client.incoming_requests(&bob.user_id).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].requester.username, "alice");

        bob_client.set_connection_status(&request.id, ConnectionStatus::Accepted).await.unwrap();
        assert!(bob_client.incoming_requests(&bob.user_id).await.unwrap().is_empty());

        let accepted = alice_client.accepted_connections(&alice.user_id).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].other_party(&alice.user_id).username, "bob");
        let accepted = bob_client.accepted_connections(&bob.user_id).await.unwrap();
        assert_eq!(accepted[0].other_party(&bob.user_id).username, "alice");
    }

    #[tokio::test]
    async fn test_search_profiles() {
        let (backend, alice) = setup_test_db().await;
        second_user(&backend, "bob").await;
        second_user(&backend, "bobby").await;
        second_user(&backend, "carol").await;

        let found = backend.search_profiles("BOB", &alice.user_id, 10).await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "bobby"]);

        let limited = backend.search_profiles("o", &alice.user_id, 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let excluded = backend.search_profiles("alice", &alice.user_id, 10).await.unwrap();
        assert!(excluded.is_empty());

        let literal = backend.search_profiles("%", &alice.user_id, 10).await.unwrap();
        assert!(literal.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_and_password_change() {
        let (backend, alice) = setup_test_db().await;
        backend.sign_out().await.unwrap();

        let wrong = backend.sign_in("alice@example.com", "wrong-pass").await;
        assert_eq!(wrong, Err(DomainError::Unauthorized("Invalid login credentials".to_string())));

        let session = backend.sign_in("Alice@Example.com ", "secret1").await.expect("Sign in failed");
        assert_eq!(session.user_id, alice.user_id);

        assert!(matches!(backend.update_password("short").await, Err(DomainError::InvalidInput(_))));
        backend.update_password("better-secret").await.unwrap();
        backend.sign_out().await.unwrap();
        assert!(backend.sign_in("alice@example.com", "secret1").await.is_err());
        assert!(backend.sign_in("alice@example.com", "better-secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let (backend, _) = setup_test_db().await;
        let client = backend.client();

        let same_email = client.sign_up("alice@example.com", "secret1", "other").await;
        assert!(matches!(same_email, Err(DomainError::Conflict(_))));
        let same_name = client.sign_up("new@example.com", "secret1", "alice").await;
        assert!(matches!(same_name, Err(DomainError::Conflict(_))));
        assert!(matches!(
            client.sign_up("not-an-email", "secret1", "x").await,
            Err(DomainError::InvalidInput(_))
        ));

        let profile = backend.find_profile(&backend.current_session().await.unwrap().user_id).await.unwrap();
        assert_eq!(profile.map(|p| p.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_writes_publish_change_events() {
        let (backend, alice) = setup_test_db().await;
        let list = backend.create_list(&alice.user_id, "Live").await.unwrap();
        let other = backend.create_list(&alice.user_id, "Quiet").await.unwrap();
        let mut subscription = backend.subscribe(&list.id).unwrap();
        let mut quiet = backend.subscribe(&other.id).unwrap();

        let task = backend.create_task(&list.id, "Watch me").await.unwrap();
        backend.update_task(&task.id, &TaskPatch::completion(true)).await.unwrap();
        backend.delete_task(&task.id).await.unwrap();

        let inserted = ChangeEvent::from_payload(&subscription.try_recv().unwrap()).unwrap();
        assert_eq!(inserted, ChangeEvent::Inserted(task.clone()));

        match ChangeEvent::from_payload(&subscription.try_recv().unwrap()).unwrap() {
            ChangeEvent::Updated(updated) => assert!(updated.is_done),
            other => panic!("expected update, got {:?}", other),
        }

        let deleted = ChangeEvent::from_payload(&subscription.try_recv().unwrap()).unwrap();
        assert_eq!(deleted, ChangeEvent::Deleted(task.id.clone()));
        assert!(subscription.try_recv().is_none());
        assert!(quiet.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_list_delete_publishes_task_deletes() {
        let (backend, alice) = setup_test_db().await;
        let list = backend.create_list(&alice.user_id, "Going away").await.unwrap();
        let task = backend.create_task(&list.id, "orphan").await.unwrap();
        let mut subscription = backend.subscribe(&list.id).unwrap();

        backend.delete_list(&list.id).await.unwrap();

        let event = ChangeEvent::from_payload(&subscription.try_recv().unwrap()).unwrap();
        assert_eq!(event, ChangeEvent::Deleted(task.id));
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("todos.db");

        let user = {
            let backend = LocalBackend::open(&path).expect("Open failed");
            let session = backend.sign_up("dana@example.com", "secret1", "dana").await.unwrap();
            backend.create_list(&session.user_id, "Kept").await.unwrap();
            session.user_id
        };

        let reopened = LocalBackend::open(&path).expect("Reopen failed");
        let session = reopened.sign_in("dana@example.com", "secret1").await.unwrap();
        assert_eq!(session.user_id, user);
        assert_eq!(reopened.visible_lists().await.unwrap()[0].list.title, "Kept");
    }
}
