use diagen_persist::{
    ChangeType, DocumentStatus, DocumentStore, DocumentUpdate, InMemoryStore, NewDocument,
    NewVersion, PersistError, VersionNumber, VersionStore,
};

async fn store_with_doc(content: &str) -> (InMemoryStore, String) {
    let store = InMemoryStore::new();
    let doc = store
        .create_document(NewDocument::new("Flow", "user-1").with_content(content))
        .await
        .unwrap();
    (store, doc.id)
}

async fn push(store: &InMemoryStore, id: &str, change: ChangeType) -> diagen_persist::Version {
    store
        .create_version(id, NewVersion::new(format!("<{change:?}/>"), change))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_new_document_starts_at_1_0() {
    let (store, id) = store_with_doc("<mxGraphModel/>").await;

    let current = store.get_current_version(&id).await.unwrap();
    assert_eq!(current.version_number, VersionNumber::new(1, 0));
    assert_eq!(current.change_type, ChangeType::Major);
    assert!(current.parent_version_id.is_none());
    assert_eq!(current.content, "<mxGraphModel/>");
    assert_eq!(current.created_by, "user-1");

    let doc = store.get_document(&id).await.unwrap();
    assert_eq!(doc.current_version_id, current.id);
    assert_eq!(doc.status, DocumentStatus::Draft);
}

#[tokio::test]
async fn test_numbering_from_2_3() {
    let (store, id) = store_with_doc("").await;
    push(&store, &id, ChangeType::Major).await;
    for _ in 0..3 {
        push(&store, &id, ChangeType::Minor).await;
    }
    assert_eq!(
        store.get_current_version(&id).await.unwrap().version_number,
        VersionNumber::new(2, 3)
    );

    let patch = push(&store, &id, ChangeType::Patch).await;
    assert_eq!(patch.version_number, VersionNumber::new(2, 3));
    let minor = push(&store, &id, ChangeType::Minor).await;
    assert_eq!(minor.version_number, VersionNumber::new(2, 4));
    let major = push(&store, &id, ChangeType::Major).await;
    assert_eq!(major.version_number, VersionNumber::new(3, 0));
}

#[tokio::test]
async fn test_lineage_and_pointer_swap() {
    let (store, id) = store_with_doc("<a/>").await;
    let first = store.get_current_version(&id).await.unwrap();
    let second = push(&store, &id, ChangeType::Minor).await;
    let third = push(&store, &id, ChangeType::Patch).await;

    assert_eq!(second.parent_version_id.as_deref(), Some(first.id.as_str()));
    assert_eq!(third.parent_version_id.as_deref(), Some(second.id.as_str()));
    assert_eq!(store.get_document(&id).await.unwrap().current_version_id, third.id);
}

#[tokio::test]
async fn test_get_versions_newest_first() {
    let (store, id) = store_with_doc("").await;
    let a = push(&store, &id, ChangeType::Minor).await;
    let b = push(&store, &id, ChangeType::Patch).await;

    let versions = store.get_versions(&id).await.unwrap();
    let ids: Vec<&str> = versions.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], b.id);
    assert_eq!(ids[1], a.id);
    assert!(versions[2].parent_version_id.is_none());
}

#[tokio::test]
async fn test_create_version_missing_document() {
    let store = InMemoryStore::new();
    let err = store
        .create_version("nope", NewVersion::new("x", ChangeType::Minor))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::DocumentNotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_stale_base_is_a_conflict() {
    let (store, id) = store_with_doc("").await;
    let base = store.get_current_version(&id).await.unwrap();
    push(&store, &id, ChangeType::Minor).await;

    let err = store
        .create_version(&id, NewVersion::new("late", ChangeType::Minor).based_on(&base.id))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::Conflict { .. }));
    assert_eq!(store.get_versions(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_restore_moves_pointer_without_new_version() {
    let (store, id) = store_with_doc("<old/>").await;
    let first = store.get_current_version(&id).await.unwrap();
    push(&store, &id, ChangeType::Major).await;

    let doc = store.restore_version(&id, &first.id).await.unwrap();
    assert_eq!(doc.current_version_id, first.id);
    assert_eq!(store.get_versions(&id).await.unwrap().len(), 2);

    // Next version branches from the restored one.
    let next = push(&store, &id, ChangeType::Minor).await;
    assert_eq!(next.parent_version_id.as_deref(), Some(first.id.as_str()));
    assert_eq!(next.version_number, VersionNumber::new(1, 1));
}

#[tokio::test]
async fn test_delete_cascades_to_versions() {
    let (store, id) = store_with_doc("").await;
    let v = push(&store, &id, ChangeType::Minor).await;

    store.delete_document(&id).await.unwrap();

    assert!(matches!(
        store.get_document(&id).await.unwrap_err(),
        PersistError::DocumentNotFound(_)
    ));
    assert!(store.get_version(&id, &v.id).await.is_err());
    assert!(matches!(
        store.delete_document(&id).await.unwrap_err(),
        PersistError::DocumentNotFound(_)
    ));
}

#[tokio::test]
async fn test_metadata_and_counters() {
    let (store, id) = store_with_doc("").await;
    let updated = store
        .update_document(
            &id,
            DocumentUpdate {
                name: Some("Renamed".into()),
                status: Some(DocumentStatus::Active),
                tags: Some(vec!["infra".into(), "aws".into(), "infra".into()]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.tags, vec!["aws".to_string(), "infra".to_string()]);

    store.record_view(&id).await.unwrap();
    let viewed = store.record_view(&id).await.unwrap();
    assert_eq!(viewed.counters.views, 2);
    assert_eq!(viewed.counters.edits, 0);

    push(&store, &id, ChangeType::Minor).await;
    assert_eq!(store.get_document(&id).await.unwrap().counters.edits, 1);
}

#[tokio::test]
async fn test_list_filters_by_owner() {
    let store = InMemoryStore::new();
    store.create_document(NewDocument::new("a", "alice")).await.unwrap();
    store.create_document(NewDocument::new("b", "alice")).await.unwrap();
    store.create_document(NewDocument::new("c", "bob")).await.unwrap();

    assert_eq!(store.list_documents("alice").await.unwrap().len(), 2);
    assert_eq!(store.list_documents("bob").await.unwrap().len(), 1);
    assert!(store.list_documents("carol").await.unwrap().is_empty());
}
