use std::sync::Arc;

use async_trait::async_trait;
use diagen::prelude::*;
use diagen::{EventStream, StreamEvent};

const DIAGRAM: &str = r#"<mxfile><diagram><mxGraphModel><root><mxCell id="0"/></root></mxGraphModel></diagram></mxfile>"#;

struct CannedClient(String);

#[async_trait]
impl ChatClient for CannedClient {
    async fn chat_stream(&self, _request: diagen::ChatRequest) -> anyhow::Result<EventStream> {
        let reply = self.0.clone();
        Ok(Box::pin(async_stream::stream! {
            for piece in reply.split_inclusive('\n') {
                yield Ok(StreamEvent::Message { content: piece.to_string() });
            }
        }))
    }
}

#[tokio::test]
async fn test_generated_diagram_becomes_next_major_version() {
    let stores = Stores::in_memory();
    let doc = stores
        .documents
        .create_document(NewDocument::new("Architecture", "u1"))
        .await
        .unwrap();
    let autosave = AutosaveCoordinator::new(stores.versions.clone(), AutosaveConfig::default());

    let reply = format!("Added the gateway.\n```xml\n{DIAGRAM}\n```\nAnything else?");
    let relay = Relay::builder()
        .client(Arc::new(CannedClient(reply)))
        .autosave(autosave.clone())
        .build()
        .unwrap();

    let mut events = relay.spawn_run(RelayInput::new("add a gateway", "u1").with_document(doc.id.clone()));
    let mut text = String::new();
    while let Some(event) = events.recv().await {
        if let RelayEvent::Content { delta, .. } = event {
            text.push_str(&delta);
        }
    }
    assert!(text.starts_with("Added the gateway."));
    assert!(!text.contains("mxfile"));

    let saved = autosave.flush(&doc.id).await.unwrap().unwrap();
    assert_eq!(saved.version_number.to_string(), "2.0");
    assert_eq!(saved.content, DIAGRAM);

    let current = stores.versions.get_current_version(&doc.id).await.unwrap();
    assert_eq!(current.id, saved.id);
}
