//! Semantic indexing tests: chunk persistence, idempotent re-index, and
//! embedding failure handling.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use studysmith::chunking::ChunkingOptions;
use studysmith::stores::{ChunkStore, MemoryStore};
use studysmith::{ContentPipeline, PipelineConfig, PipelineError};

use common::{FnCompletion, VocabEmbedder, long_text, seed_material, stock_reply};

const DIM: usize = 32;

fn small_chunk_config() -> PipelineConfig {
    PipelineConfig::default().with_chunking(ChunkingOptions::new(80, 16))
}

fn indexing_pipeline(
    embedding: Arc<VocabEmbedder>,
    store: Arc<MemoryStore>,
) -> ContentPipeline {
    ContentPipeline::from_store(
        FnCompletion::new(stock_reply),
        embedding,
        store,
        small_chunk_config(),
    )
}

#[tokio::test]
async fn indexing_persists_ordered_chunks_with_vectors() {
    let store = Arc::new(MemoryStore::new());
    let embedder = VocabEmbedder::new(DIM);
    let pipeline = indexing_pipeline(embedder, store.clone());

    let user = Uuid::new_v4();
    let id = seed_material(&store, user, "Volcanoes", &long_text("magma eruption crater")).await;

    let embedded = pipeline.index_material(id).await.expect("index");
    assert!(embedded > 1);

    let chunks = store.chunks_for_material(id).await.expect("chunks");
    assert_eq!(chunks.len(), embedded);
    for (position, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, position);
        assert_eq!(chunk.material_id, id);
        assert_eq!(chunk.user_id, user);
        assert!(chunk.char_end > chunk.char_start);
        let vector = chunk.embedding.as_ref().expect("embedded");
        assert_eq!(vector.len(), DIM);
    }
}

#[tokio::test]
async fn reindexing_replaces_instead_of_accumulating() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = indexing_pipeline(VocabEmbedder::new(DIM), store.clone());

    let user = Uuid::new_v4();
    let id = seed_material(&store, user, "Glaciers", &long_text("ice moraine valley")).await;

    let first = pipeline.index_material(id).await.expect("first index");
    let second = pipeline.index_material(id).await.expect("re-index");
    assert_eq!(first, second);

    let chunks = store.chunks_for_material(id).await.expect("chunks");
    assert_eq!(chunks.len(), second, "no duplicate generations coexist");
}

#[tokio::test]
async fn short_text_is_a_noop_not_an_error() {
    let store = Arc::new(MemoryStore::new());
    let embedder = VocabEmbedder::new(DIM);
    let pipeline = indexing_pipeline(embedder.clone(), store.clone());

    let user = Uuid::new_v4();
    let id = seed_material(&store, user, "Snippet", "barely anything here").await;

    let embedded = pipeline.index_material(id).await.expect("no-op");
    assert_eq!(embedded, 0);
    assert_eq!(embedder.calls(), 0);
    assert!(store.chunks_for_material(id).await.expect("chunks").is_empty());
}

#[tokio::test]
async fn error_placeholder_text_is_never_indexed() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = indexing_pipeline(VocabEmbedder::new(DIM), store.clone());

    let user = Uuid::new_v4();
    let text = format!("[ERROR] extraction failed. {}", long_text("padding words"));
    let id = seed_material(&store, user, "Bad upload", &text).await;

    let embedded = pipeline.index_material(id).await.expect("no-op");
    assert_eq!(embedded, 0);
}

#[tokio::test]
async fn unknown_material_is_an_error() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = indexing_pipeline(VocabEmbedder::new(DIM), store);

    let err = pipeline
        .index_material(Uuid::new_v4())
        .await
        .expect_err("must reject");
    assert!(matches!(err, PipelineError::MaterialNotFound(_)));
}

#[tokio::test]
async fn a_failed_embedding_leaves_a_vectorless_chunk_behind() {
    let store = Arc::new(MemoryStore::new());
    // Any chunk mentioning "krakatoa" fails to embed.
    let embedder = VocabEmbedder::poisoned(DIM, "krakatoa");
    let pipeline = indexing_pipeline(embedder, store.clone());

    let user = Uuid::new_v4();
    let text = format!(
        "{} krakatoa erupted with enormous force. {}",
        long_text("volcano ash plume"),
        long_text("lava basalt flow")
    );
    let id = seed_material(&store, user, "Eruptions", &text).await;

    let embedded = pipeline.index_material(id).await.expect("partial index");
    let chunks = store.chunks_for_material(id).await.expect("chunks");
    assert!(embedded < chunks.len(), "the poisoned chunk is not counted");

    let vectorless: Vec<_> = chunks
        .iter()
        .filter(|chunk| chunk.embedding.is_none())
        .collect();
    assert!(!vectorless.is_empty());
    for chunk in vectorless {
        assert!(chunk.content.contains("krakatoa"));
    }

    // Vectorless chunks never appear in ranking results.
    let hits = pipeline
        .search(user, "volcano eruption force", 50, None)
        .await
        .expect("search");
    assert!(hits.iter().all(|hit| !hit.content.contains("krakatoa")));
}

#[tokio::test]
async fn a_wrong_length_vector_aborts_the_run() {
    let store = Arc::new(MemoryStore::new());
    let embedder = VocabEmbedder::misconfigured(DIM, DIM + 1);
    let pipeline = indexing_pipeline(embedder, store.clone());

    let user = Uuid::new_v4();
    let id = seed_material(&store, user, "Config drift", &long_text("vector size check")).await;

    let err = pipeline.index_material(id).await.expect_err("must abort");
    match err {
        PipelineError::DimensionMismatch { expected, got } => {
            assert_eq!(expected, DIM);
            assert_eq!(got, DIM + 1);
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
}
