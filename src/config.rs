//! Pipeline tuning knobs.
//!
//! A [`PipelineConfig`] is built once at startup and shared read-only by the
//! orchestrator, indexer, and retrieval engine. Nothing in the pipeline reads
//! the environment ambiently; environment resolution happens only in explicit
//! constructors (see [`crate::clients::gemini::GeminiClient::from_env`] and
//! [`PipelineConfig::database_url_from_env`]).

use crate::chunking::ChunkingOptions;

/// Shared configuration for both pipeline engines.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Minimum trimmed text length before either engine will run.
    pub min_text_len: usize,
    /// Defensive cap on prompt content; longer text is truncated with a marker.
    pub max_prompt_len: usize,
    /// Maximum simultaneous completion calls during the generation fan-out.
    pub fanout_limit: usize,
    /// Maximum simultaneous embedding calls during indexing.
    pub embed_limit: usize,
    /// Chunk window and overlap for the text splitter.
    pub chunking: ChunkingOptions,
    /// Result count used by `ask_library` when retrieving grounding context.
    pub default_search_limit: usize,
}

impl PipelineConfig {
    pub const DEFAULT_MIN_TEXT_LEN: usize = 50;
    pub const DEFAULT_MAX_PROMPT_LEN: usize = 50_000;
    pub const DEFAULT_FANOUT_LIMIT: usize = 5;
    pub const DEFAULT_EMBED_LIMIT: usize = 4;
    pub const DEFAULT_SEARCH_LIMIT: usize = 5;

    #[must_use]
    pub fn with_min_text_len(mut self, min_text_len: usize) -> Self {
        self.min_text_len = min_text_len;
        self
    }

    #[must_use]
    pub fn with_max_prompt_len(mut self, max_prompt_len: usize) -> Self {
        self.max_prompt_len = max_prompt_len;
        self
    }

    #[must_use]
    pub fn with_fanout_limit(mut self, fanout_limit: usize) -> Self {
        self.fanout_limit = fanout_limit.max(1);
        self
    }

    #[must_use]
    pub fn with_embed_limit(mut self, embed_limit: usize) -> Self {
        self.embed_limit = embed_limit.max(1);
        self
    }

    #[must_use]
    pub fn with_chunking(mut self, chunking: ChunkingOptions) -> Self {
        self.chunking = chunking;
        self
    }

    #[must_use]
    pub fn with_default_search_limit(mut self, default_search_limit: usize) -> Self {
        self.default_search_limit = default_search_limit.max(1);
        self
    }

    /// Resolve the SQLite database URL from `DATABASE_URL`, falling back to a
    /// local file. Loads `.env` first when present.
    pub fn database_url_from_env() -> String {
        dotenvy::dotenv().ok();
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://studysmith.db".to_string())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_len: Self::DEFAULT_MIN_TEXT_LEN,
            max_prompt_len: Self::DEFAULT_MAX_PROMPT_LEN,
            fanout_limit: Self::DEFAULT_FANOUT_LIMIT,
            embed_limit: Self::DEFAULT_EMBED_LIMIT,
            chunking: ChunkingOptions::default(),
            default_search_limit: Self::DEFAULT_SEARCH_LIMIT,
        }
    }
}
