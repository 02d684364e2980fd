//! Shared test doubles: scripted completion clients and a deterministic
//! bag-of-words embedder.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use studysmith::clients::{ClientError, CompletionClient, EmbeddingClient};
use studysmith::material::Material;
use studysmith::stores::{MaterialStore, MemoryStore};

/// Completion client driven by a closure, counting every call.
pub struct FnCompletion<F> {
    reply: F,
    calls: AtomicUsize,
}

impl<F> FnCompletion<F>
where
    F: Fn(&str) -> Result<String, ClientError> + Send + Sync,
{
    pub fn new(reply: F) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> CompletionClient for FnCompletion<F>
where
    F: Fn(&str) -> Result<String, ClientError> + Send + Sync,
{
    async fn complete(&self, prompt: &str) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)(prompt)
    }
}

/// A plausible well-formed reply for whichever format the prompt asks for,
/// recognised by the distinctive tokens each prompt template carries.
pub fn stock_reply(prompt: &str) -> Result<String, ClientError> {
    if prompt.contains("\"questions\"") {
        Ok(r#"{"questions":[{"question":"What do plants produce?","options":["A) Sugar","B) Salt"],"correct":0,"explanation":"Photosynthesis yields glucose.","difficulty":"easy"}]}"#.to_string())
    } else if prompt.contains("\"terms\"") {
        Ok(r#"{"terms":[{"term":"chlorophyll","definition":"The green pigment that absorbs light."}]}"#.to_string())
    } else if prompt.contains("\"cards\"") {
        Ok(r#"{"cards":[{"front":"Photosynthesis","back":"Conversion of light into chemical energy."}]}"#.to_string())
    } else if prompt.contains("podcast script") {
        Ok("Alex: Welcome back to the show.\nSam: Today we talk photosynthesis.".to_string())
    } else if prompt.contains("TL;DR") {
        Ok("Plants convert light, water, and carbon dioxide into sugar.".to_string())
    } else {
        Ok("## Overview\n- Plants capture light energy\n- Chlorophyll drives the reaction".to_string())
    }
}

/// Deterministic bag-of-words embedder.
///
/// Each distinct lowercase word gets its own axis (first come, first served),
/// so texts sharing vocabulary score high cosine similarity and unrelated
/// texts score near zero. Vector length is fixed at construction.
pub struct VocabEmbedder {
    dimension: usize,
    vocab: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    /// Texts containing this token fail to embed.
    poison: Option<String>,
    /// When set, every vector comes back with this (wrong) length instead.
    forced_len: Option<usize>,
}

impl VocabEmbedder {
    pub fn new(dimension: usize) -> Arc<Self> {
        Arc::new(Self {
            dimension,
            vocab: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            poison: None,
            forced_len: None,
        })
    }

    /// Embedder that rejects any text containing `token`.
    pub fn poisoned(dimension: usize, token: &str) -> Arc<Self> {
        Arc::new(Self {
            dimension,
            vocab: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            poison: Some(token.to_string()),
            forced_len: None,
        })
    }

    /// Embedder that claims `dimension` but returns vectors of `actual` length.
    pub fn misconfigured(dimension: usize, actual: usize) -> Arc<Self> {
        Arc::new(Self {
            dimension,
            vocab: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            poison: None,
            forced_len: Some(actual),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for VocabEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.poison {
            if text.contains(token.as_str()) {
                return Err(ClientError::Empty);
            }
        }
        if let Some(len) = self.forced_len {
            return Ok(vec![1.0; len]);
        }

        let mut vector = vec![0.0f32; self.dimension];
        let mut vocab = self.vocab.lock();
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let next = vocab.len() % self.dimension;
            let axis = *vocab.entry(word).or_insert(next);
            vector[axis] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Seed a material with the given text and return its id.
pub async fn seed_material(store: &MemoryStore, user_id: Uuid, title: &str, text: &str) -> Uuid {
    let material = Material::new(user_id, title, Some(text.to_string()));
    let id = material.id;
    store
        .insert_material(material)
        .await
        .expect("memory insert never fails");
    id
}

/// Text comfortably above the default minimum length.
pub fn long_text(topic: &str) -> String {
    format!("{topic} ").repeat(30)
}
