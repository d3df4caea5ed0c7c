use std::sync::Arc;
use std::time::Duration;

use diagen_context::{ContextBuilder, Role, SessionConfig, SessionMessage, SessionRegistry};

#[tokio::test]
async fn test_keeps_last_twenty_messages() {
    let registry = SessionRegistry::new(SessionConfig::default());
    for i in 1..=21 {
        registry
            .append("s", SessionMessage::user(format!("#{i}")))
            .await;
    }

    let session = registry.get("s").await;
    let contents: Vec<String> = session.messages().map(|m| m.content.clone()).collect();
    let expected: Vec<String> = (2..=21).map(|i| format!("#{i}")).collect();
    assert_eq!(contents, expected);
}

#[tokio::test]
async fn test_eviction_is_fifo_not_lru() {
    let registry = SessionRegistry::new(SessionConfig {
        max_messages: 20,
        max_sessions: 3,
    });
    for id in ["a", "b", "c"] {
        registry.append(id, SessionMessage::user("hi")).await;
    }
    // Touching "a" does not protect it.
    registry.append("a", SessionMessage::user("again")).await;
    registry.append("d", SessionMessage::user("hi")).await;

    assert_eq!(registry.len().await, 3);
    assert!(!registry.contains("a").await);
    assert!(registry.contains("b").await);
    assert!(registry.contains("d").await);
}

#[tokio::test]
async fn test_size_never_exceeds_capacity() {
    let registry = SessionRegistry::new(SessionConfig {
        max_messages: 2,
        max_sessions: 5,
    });
    for i in 0..50 {
        registry.get(&format!("s{i}")).await;
        assert!(registry.len().await <= 5);
    }
    assert!(registry.contains("s49").await);
    assert!(!registry.contains("s44").await);
}

#[tokio::test]
async fn test_lock_serializes_same_session() {
    let registry = Arc::new(SessionRegistry::default());
    let guard = registry.lock_session("s").await;

    let r = registry.clone();
    let waiter = tokio::spawn(async move {
        let _guard = r.lock_session("s").await;
        r.append("s", SessionMessage::user("second")).await;
    });

    // Another session is not blocked.
    let other = tokio::time::timeout(Duration::from_millis(200), registry.lock_session("t")).await;
    assert!(other.is_ok());

    tokio::time::sleep(Duration::from_millis(50)).await;
    registry.append("s", SessionMessage::user("first")).await;
    drop(guard);
    waiter.await.unwrap();

    let roles_and_text: Vec<(Role, String)> = registry
        .get("s")
        .await
        .messages()
        .map(|m| (m.role, m.content.clone()))
        .collect();
    assert_eq!(
        roles_and_text,
        vec![(Role::User, "first".to_string()), (Role::User, "second".to_string())]
    );
}

#[tokio::test]
async fn test_context_from_history() {
    let registry = SessionRegistry::default();
    registry.append("s", SessionMessage::user("draw a queue")).await;
    registry.append("s", SessionMessage::assistant("```xml\n<mxGraphModel/>\n```")).await;
    registry.append("s", SessionMessage::user("add a worker")).await;

    let session = registry.get("s").await;
    let window = ContextBuilder::new().build(session.messages(), Some("<mxGraphModel/>"));
    let messages = window.into_messages();

    let roles: Vec<&str> = messages.iter().map(|m| m.role()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(messages[3].content().to_text(), "add a worker");
}

#[test]
fn test_message_wire_format() {
    let msg = SessionMessage::assistant("ok");
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["role"], "assistant");
    assert!(json.get("createdAt").is_some());
}

#[tokio::test]
async fn test_lock_table_bounded_when_held_across_eviction() {
    let registry = SessionRegistry::new(SessionConfig {
        max_messages: 20,
        max_sessions: 2,
    });
    for i in 0..50 {
        let id = format!("held-{i}");
        let guard = registry.lock_session(&id).await;
        registry.append(&id, SessionMessage::user("hi")).await;
        // Evicts the held session while its lock is taken.
        registry.get(&format!("x-{i}")).await;
        registry.get(&format!("y-{i}")).await;
        assert_eq!(registry.active_locks(), 1);
        drop(guard);
        assert_eq!(registry.active_locks(), 0);
    }
    assert_eq!(registry.len().await, 2);
    assert_eq!(registry.active_locks(), 0);
}

#[tokio::test]
async fn test_cancelled_waiter_leaves_no_lock_entry() {
    let registry = SessionRegistry::default();
    let guard = registry.lock_session("s").await;
    let waited = tokio::time::timeout(Duration::from_millis(20), registry.lock_session("s")).await;
    assert!(waited.is_err());
    assert_eq!(registry.active_locks(), 1);
    drop(guard);
    assert_eq!(registry.active_locks(), 0);
}
