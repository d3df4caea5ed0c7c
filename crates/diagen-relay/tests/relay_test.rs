use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use diagen_context::{Role, SessionConfig, SessionRegistry};
use diagen_llm::{ChatClient, ChatRequest, EventStream, StreamEvent};
use diagen_persist::{
    AutosaveConfig, AutosaveCoordinator, DocumentStore, InMemoryStore, NewDocument, VersionStore,
};
use diagen_relay::{Relay, RelayConfig, RelayEvent, RelayInput};
use tokio::sync::mpsc;

const DIAGRAM: &str = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel>"#;

#[derive(Clone)]
enum Step {
    Chunk(String),
    Fail(String),
    Stall,
}

/// Plays back a fixed script and records the last request.
struct ScriptedClient {
    script: Vec<Step>,
    fail_to_connect: bool,
    dropped: Arc<AtomicBool>,
    last_request: std::sync::Mutex<Option<ChatRequest>>,
}

impl ScriptedClient {
    fn chunks(chunks: &[&str]) -> Self {
        Self::new(chunks.iter().map(|c| Step::Chunk(c.to_string())).collect())
    }

    fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            fail_to_connect: false,
            dropped: Arc::new(AtomicBool::new(false)),
            last_request: std::sync::Mutex::new(None),
        }
    }
}

/// Flags when the upstream stream is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        *self.last_request.lock().unwrap() = Some(request);
        if self.fail_to_connect {
            return Err(anyhow!("OpenAI API error (500): boom"));
        }

        let script = self.script.clone();
        let flag = DropFlag(self.dropped.clone());
        let stream = async_stream::stream! {
            let _flag = flag;
            for step in script {
                match step {
                    Step::Chunk(content) => yield Ok(StreamEvent::Message { content }),
                    Step::Fail(message) => {
                        yield Err(anyhow!(message));
                        return;
                    }
                    Step::Stall => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                }
            }
            yield Ok(StreamEvent::Done { finish_reason: Some("stop".to_string()) });
        };
        Ok(Box::pin(stream))
    }
}

async fn collect(mut rx: mpsc::Receiver<RelayEvent>) -> Vec<RelayEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn relay_with(client: ScriptedClient) -> (Relay, Arc<ScriptedClient>) {
    let client = Arc::new(client);
    let relay = Relay::builder().client(client.clone()).build().unwrap();
    (relay, client)
}

fn shown(events: &[RelayEvent]) -> String {
    match events
        .iter()
        .rev()
        .find(|e| matches!(e, RelayEvent::Content { .. }))
    {
        Some(RelayEvent::Content { full_so_far, .. }) => full_so_far.clone(),
        _ => String::new(),
    }
}

fn assert_framing(events: &[RelayEvent]) {
    assert!(matches!(events.first(), Some(RelayEvent::Connected {})));
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "{events:?}");
    assert!(events.last().is_some_and(RelayEvent::is_terminal));
}

#[tokio::test]
async fn test_plain_answer_streams_and_completes() {
    let (relay, _) = relay_with(ScriptedClient::chunks(&["Queues ", "decouple ", "services."]));
    let events = collect(relay.spawn_run(RelayInput::new("what is a queue?", "u1").with_session("s1"))).await;

    assert_framing(&events);
    assert_eq!(shown(&events), "Queues decouple services.");
    match events.last() {
        Some(RelayEvent::Done { session_id, document_id, .. }) => {
            assert_eq!(session_id, "s1");
            assert!(document_id.is_none());
        }
        other => panic!("expected done, got {other:?}"),
    }

    let session = relay.sessions().get("s1").await;
    let roles: Vec<Role> = session.messages().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_markup_is_never_shown_and_artifact_is_autosaved() {
    tokio::time::pause();
    let store = Arc::new(InMemoryStore::new());
    let doc = store
        .create_document(NewDocument::new("Flow", "u1"))
        .await
        .unwrap();
    let autosave = AutosaveCoordinator::new(store.clone(), AutosaveConfig::default());

    let fenced = format!("```xml\n{DIAGRAM}\n```\n");
    let client = Arc::new(ScriptedClient::chunks(&[
        "Here is your diagram:\n",
        &fenced[..12],
        &fenced[12..],
        "Done.",
    ]));
    let relay = Relay::builder()
        .client(client.clone())
        .autosave(autosave.clone())
        .build()
        .unwrap();

    let input = RelayInput::new("draw it", "u1").with_document(doc.id.clone());
    let events = collect(relay.spawn_run(input)).await;

    assert_framing(&events);
    for event in &events {
        if let RelayEvent::Content { delta, .. } = event {
            assert!(!delta.contains('<'), "markup leaked: {delta:?}");
            assert!(!delta.contains("```"), "fence leaked: {delta:?}");
        }
    }
    assert_eq!(shown(&events), "Here is your diagram:\n");
    assert!(matches!(
        events.last(),
        Some(RelayEvent::Done { document_id: Some(id), .. }) if *id == doc.id
    ));

    assert!(autosave.status(&doc.id).await.dirty);
    tokio::time::sleep(Duration::from_secs(3)).await;

    let current = store.get_current_version(&doc.id).await.unwrap();
    assert_eq!(current.content, DIAGRAM);
    assert_eq!(current.version_number.to_string(), "2.0");
    assert_eq!(current.change_summary, "AI generated update");
}

#[tokio::test]
async fn test_unclosed_artifact_reports_notice_and_saves_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let doc = store.create_document(NewDocument::new("Flow", "u1")).await.unwrap();
    let autosave = AutosaveCoordinator::new(store.clone(), AutosaveConfig::default());

    let client = Arc::new(ScriptedClient::chunks(&["Sure:\n```xml\n<mxGraphModel><root>"]));
    let relay = Relay::builder()
        .client(client)
        .autosave(autosave.clone())
        .build()
        .unwrap();

    let events = collect(relay.spawn_run(RelayInput::new("draw", "u1").with_document(doc.id.clone()))).await;

    assert_framing(&events);
    assert!(matches!(events.last(), Some(RelayEvent::Done { .. })));
    assert!(shown(&events).contains("could not be used"));
    assert!(!autosave.status(&doc.id).await.dirty);
    assert_eq!(store.get_versions(&doc.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upstream_failure_mid_stream_is_single_error() {
    let (relay, _) = relay_with(ScriptedClient::new(vec![
        Step::Chunk("partial ".into()),
        Step::Fail("connection reset".into()),
    ]));
    let events = collect(relay.spawn_run(RelayInput::new("hi", "u1"))).await;

    assert_framing(&events);
    match events.last() {
        Some(RelayEvent::Error { message }) => assert!(message.contains("connection reset")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_failure_is_error_event() {
    let mut client = ScriptedClient::chunks(&[]);
    client.fail_to_connect = true;
    let (relay, _) = relay_with(client);

    let events = collect(relay.spawn_run(RelayInput::new("hi", "u1"))).await;
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[1], RelayEvent::Error { message } if message.contains("500")));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_upstream_times_out() {
    let client = Arc::new(ScriptedClient::new(vec![Step::Chunk("thinking".into()), Step::Stall]));
    let relay = Relay::builder()
        .client(client.clone())
        .config(RelayConfig::default().with_idle_timeout(Duration::from_secs(5)))
        .build()
        .unwrap();

    let events = collect(relay.spawn_run(RelayInput::new("hi", "u1"))).await;
    assert_framing(&events);
    assert!(matches!(events.last(), Some(RelayEvent::Error { message }) if message.contains("stalled")));
    assert!(client.dropped.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_drops_upstream() {
    let client = Arc::new(ScriptedClient::new(vec![Step::Chunk("a".into()), Step::Stall]));
    let relay = Relay::builder().client(client.clone()).build().unwrap();

    let mut rx = relay.spawn_run(RelayInput::new("hi", "u1").with_session("gone"));
    assert!(matches!(rx.recv().await, Some(RelayEvent::Connected {})));
    assert!(matches!(rx.recv().await, Some(RelayEvent::Content { .. })));
    drop(rx);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(client.dropped.load(Ordering::SeqCst));

    // No assistant reply was recorded for the aborted run.
    let session = relay.sessions().get("gone").await;
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn test_request_carries_history_and_artifact_context() {
    let sessions = Arc::new(SessionRegistry::new(SessionConfig::default()));
    let client = Arc::new(ScriptedClient::chunks(&["ok"]));
    let relay = Relay::builder()
        .client(client.clone())
        .sessions(sessions.clone())
        .build()
        .unwrap();

    let first = RelayInput::new("draw a cache", "u1").with_session("s");
    collect(relay.spawn_run(first)).await;
    let second = RelayInput::new("add a db", "u1")
        .with_session("s")
        .with_artifact_context(DIAGRAM);
    collect(relay.spawn_run(second)).await;

    let request = client.last_request.lock().unwrap().clone().unwrap();
    let roles: Vec<&str> = request.messages.iter().map(|m| m.role()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert!(request.messages[0].content().to_text().contains(DIAGRAM));
    assert_eq!(request.max_tokens, Some(8192));
    assert_eq!(sessions.get("s").await.len(), 4);
}

#[tokio::test]
async fn test_same_session_runs_one_after_another() {
    let client = Arc::new(ScriptedClient::chunks(&["reply"]));
    let relay = Relay::builder().client(client).build().unwrap();

    let a = relay.spawn_run(RelayInput::new("one", "u1").with_session("s"));
    let b = relay.spawn_run(RelayInput::new("two", "u1").with_session("s"));
    let (a, b) = tokio::join!(collect(a), collect(b));
    assert_framing(&a);
    assert_framing(&b);

    let session = relay.sessions().get("s").await;
    let roles: Vec<Role> = session.messages().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test(start_paused = true)]
async fn test_caller_gone_while_queued_leaves_no_history() {
    let client = Arc::new(ScriptedClient::chunks(&["reply"]));
    let sessions = Arc::new(SessionRegistry::new(SessionConfig::default()));
    let relay = Relay::builder()
        .client(client)
        .sessions(sessions.clone())
        .build()
        .unwrap();

    // Another request is mid-generation on the same session.
    let busy = sessions.lock_session("s").await;

    let mut rx = relay.spawn_run(RelayInput::new("never mind", "u1").with_session("s"));
    assert!(matches!(rx.recv().await, Some(RelayEvent::Connected {})));
    drop(rx);
    tokio::time::sleep(Duration::from_millis(10)).await;

    drop(busy);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(sessions.get("s").await.is_empty());
    assert_eq!(sessions.active_locks(), 0);
}
