use chrono::Utc;
use ragbot_core::traits::{ChunkStore, DocumentStore, SessionLog};
use ragbot_core::types::{
    ChatMessage, Chunk, ChunkMetadata, Document, DocumentStatus, FileType, Role,
};
use ragbot_core::Error;
use ragbot_vector::{rank_by_similarity, LanceStore, MemoryStore};
use tempfile::TempDir;

fn chunk(id: &str, bot: &str, index: usize, embedding: Option<Vec<f32>>) -> Chunk {
    Chunk {
        id: id.to_string(),
        document_id: "doc-1".to_string(),
        bot_id: bot.to_string(),
        chunk_index: index,
        content: format!("content of {id}"),
        token_count: 3,
        term_frequencies: [("content".to_string(), 1u32)].into_iter().collect(),
        embedding,
        metadata: ChunkMetadata::for_index(index),
    }
}

#[test]
fn chunks_without_matching_embeddings_are_left_out() {
    let chunks = vec![
        chunk("a", "bot", 0, Some(vec![1.0, 0.0])),
        chunk("b", "bot", 1, None),
        chunk("c", "bot", 2, Some(vec![0.0, 1.0])),
        chunk("d", "bot", 3, Some(vec![1.0, 0.0, 0.0])),
        chunk("e", "bot", 4, Some(vec![0.7, 0.7])),
    ];
    let ranked = rank_by_similarity(&[1.0, 0.1], &chunks);
    let ids: Vec<&str> = ranked.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec!["a", "e", "c"]);
}

#[tokio::test]
async fn memory_store_scopes_chunks_by_bot() {
    let store = MemoryStore::new();
    store.put_chunk(chunk("a", "bot-1", 0, None)).await.unwrap();
    store.put_chunk(chunk("b", "bot-2", 0, None)).await.unwrap();
    store.put_chunk(chunk("c", "bot-1", 1, None)).await.unwrap();
    let got = store.get_chunks("bot-1").await.unwrap();
    assert_eq!(got.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
    assert!(store.get_chunks("nobody").await.unwrap().is_empty());
    assert!(store.put_chunk(chunk("a", "bot-1", 2, None)).await.is_err());
}

#[tokio::test]
async fn memory_store_sessions_are_reused_per_token() {
    let store = MemoryStore::new();
    let first = store.find_or_create_session("bot", "session_1").await.unwrap();
    let again = store.find_or_create_session("bot", "session_1").await.unwrap();
    let other_bot = store.find_or_create_session("bot-2", "session_1").await.unwrap();
    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other_bot.id);

    let message = ChatMessage {
        session_id: first.id.clone(),
        bot_id: "bot".into(),
        role: Role::User,
        content: "hi".into(),
        citations: vec![],
        response_time_ms: 0,
        created_at: Utc::now(),
    };
    store.append_messages(vec![message]).await.unwrap();
    store.touch_session(&first.id).await.unwrap();
    assert_eq!(store.messages(&first.id).await.len(), 1);
    assert!(matches!(store.touch_session("missing").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn lance_store_round_trips_chunks_and_documents() {
    let tmp = TempDir::new().expect("tmp");
    let store = LanceStore::open(tmp.path(), "chunks", "documents").await.expect("open");

    assert!(store.get_chunks("bot-1").await.unwrap().is_empty());
    store.put_chunk(chunk("c2", "bot-1", 6, None)).await.unwrap();
    store.put_chunk(chunk("c1", "bot-1", 0, Some(vec![0.25, -0.5, 1.0]))).await.unwrap();
    store.put_chunk(chunk("x", "bot'2", 0, None)).await.unwrap();

    let chunks = store.get_chunks("bot-1").await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, "c1");
    assert_eq!(chunks[0].embedding, Some(vec![0.25, -0.5, 1.0]));
    assert_eq!(chunks[1].embedding, None);
    assert_eq!(chunks[1].metadata.citation(), "Page 2");
    assert_eq!(store.get_chunks("bot'2").await.unwrap().len(), 1);

    let mut doc = Document::new("doc-1", "bot-1", "faq.md", FileType::Md);
    store.put_document(doc.clone()).await.unwrap();
    doc.status = DocumentStatus::Completed;
    doc.total_chunks = 2;
    doc.processed_at = Some(Utc::now());
    store.update_document(&doc).await.unwrap();

    let loaded = store.get_document("doc-1").await.unwrap();
    assert_eq!(loaded.status, DocumentStatus::Completed);
    assert_eq!(loaded.total_chunks, 2);
    assert_eq!(loaded.file_type, FileType::Md);
    assert!(loaded.processed_at.is_some());
    assert!(matches!(store.get_document("nope").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn lance_store_reopens_existing_tables() {
    let tmp = TempDir::new().expect("tmp");
    {
        let store = LanceStore::open(tmp.path(), "chunks", "documents").await.unwrap();
        store.put_chunk(chunk("c1", "bot", 0, None)).await.unwrap();
    }
    let store = LanceStore::open(tmp.path(), "chunks", "documents").await.unwrap();
    assert_eq!(store.get_chunks("bot").await.unwrap().len(), 1);
}
