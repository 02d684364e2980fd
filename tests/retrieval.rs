//! Retrieval tests: similarity ranking, scope filtering, and grounded
//! answering over the in-memory store.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use studysmith::chunking::ChunkingOptions;
use studysmith::retrieval::NOTHING_INDEXED_ANSWER;
use studysmith::stores::MemoryStore;
use studysmith::{ContentPipeline, PipelineConfig};

use common::{FnCompletion, VocabEmbedder, long_text, seed_material};

const DIM: usize = 64;

fn retrieval_pipeline(
    completion: Arc<impl studysmith::CompletionClient + 'static>,
    store: Arc<MemoryStore>,
) -> ContentPipeline {
    ContentPipeline::from_store(
        completion,
        VocabEmbedder::new(DIM),
        store,
        PipelineConfig::default().with_chunking(ChunkingOptions::new(120, 20)),
    )
}

async fn seed_and_index(pipeline: &ContentPipeline, store: &MemoryStore, user: Uuid) -> (Uuid, Uuid) {
    let cats = seed_material(
        store,
        user,
        "About Cats",
        &long_text("cats are curious felines that purr and hunt mice"),
    )
    .await;
    let stars = seed_material(
        store,
        user,
        "About Stars",
        &long_text("stars are burning spheres of plasma fusing hydrogen"),
    )
    .await;
    pipeline.index_material(cats).await.expect("index cats");
    pipeline.index_material(stars).await.expect("index stars");
    (cats, stars)
}

#[tokio::test]
async fn search_ranks_the_on_topic_material_first() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = retrieval_pipeline(FnCompletion::new(common::stock_reply), store.clone());
    let user = Uuid::new_v4();
    let (cats, stars) = seed_and_index(&pipeline, &store, user).await;

    let hits = pipeline
        .search(user, "curious felines that purr", 3, None)
        .await
        .expect("search");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].material_id, cats);
    assert_eq!(hits[0].material_title, "About Cats");

    let hits = pipeline
        .search(user, "plasma fusing hydrogen", 3, None)
        .await
        .expect("search");
    assert_eq!(hits[0].material_id, stars);

    // Scores come back sorted.
    for pair in hits.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn search_respects_the_limit() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = retrieval_pipeline(FnCompletion::new(common::stock_reply), store.clone());
    let user = Uuid::new_v4();
    seed_and_index(&pipeline, &store, user).await;

    let hits = pipeline
        .search(user, "cats and stars", 2, None)
        .await
        .expect("search");
    assert!(hits.len() <= 2);
}

#[tokio::test]
async fn search_scope_restricts_to_one_material() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = retrieval_pipeline(FnCompletion::new(common::stock_reply), store.clone());
    let user = Uuid::new_v4();
    let (_cats, stars) = seed_and_index(&pipeline, &store, user).await;

    let hits = pipeline
        .search(user, "curious felines that purr", 10, Some(stars))
        .await
        .expect("search");
    assert!(hits.iter().all(|hit| hit.material_id == stars));
}

#[tokio::test]
async fn users_never_see_each_others_chunks() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = retrieval_pipeline(FnCompletion::new(common::stock_reply), store.clone());
    let owner = Uuid::new_v4();
    seed_and_index(&pipeline, &store, owner).await;

    let stranger = Uuid::new_v4();
    let hits = pipeline
        .search(stranger, "curious felines that purr", 10, None)
        .await
        .expect("search");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn empty_library_gets_the_fixed_answer_without_a_model_call() {
    let store = Arc::new(MemoryStore::new());
    let completion = FnCompletion::new(common::stock_reply);
    let pipeline = retrieval_pipeline(completion.clone(), store);

    let user = Uuid::new_v4();
    let answer = pipeline.ask_library(user, "what is a cat?").await.expect("answer");
    assert_eq!(answer.answer, NOTHING_INDEXED_ANSWER);
    assert!(answer.sources.is_empty());
    assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn answers_are_grounded_in_retrieved_context() {
    let store = Arc::new(MemoryStore::new());
    let completion = FnCompletion::new(|prompt: &str| {
        // The grounding context must reach the model, labeled by source.
        assert!(prompt.contains("[From material: About Cats]"));
        assert!(prompt.contains("Answer only from the context"));
        Ok("Cats are curious felines (from About Cats).".to_string())
    });
    let pipeline = retrieval_pipeline(completion.clone(), store.clone());

    let user = Uuid::new_v4();
    seed_and_index(&pipeline, &store, user).await;

    let answer = pipeline
        .ask_library(user, "what are cats like? curious felines purr")
        .await
        .expect("answer");
    assert_eq!(completion.calls(), 1);
    assert!(answer.answer.contains("curious felines"));
    assert!(!answer.sources.is_empty());
}

#[tokio::test]
async fn sources_are_deduplicated_per_material() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = retrieval_pipeline(
        FnCompletion::new(|_: &str| Ok("A grounded answer.".to_string())),
        store.clone(),
    );

    let user = Uuid::new_v4();
    // One long material produces several chunks sharing its vocabulary, so
    // multiple hits point at the same material.
    let cats = seed_material(
        &store,
        user,
        "About Cats",
        &long_text("cats are curious felines that purr and hunt mice"),
    )
    .await;
    pipeline.index_material(cats).await.expect("index");

    let answer = pipeline
        .ask_library(user, "curious felines that purr")
        .await
        .expect("answer");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].material_id, cats);
    assert!(answer.sources[0].similarity > 0.0);
}
