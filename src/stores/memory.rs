//! In-memory store backing tests, examples, and single-process embedders.

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::material::{Artifact, ArtifactFormat, Chunk, Material, ProcessingStatus};

use super::{ArtifactStore, ChunkSource, ChunkStore, MaterialStore, StoreError};

/// Implements all three store traits over `FxHashMap`s behind `RwLock`s.
///
/// Share it as one `Arc<MemoryStore>` and hand clones of that `Arc` to the
/// orchestrator, indexer, and retrieval engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    materials: RwLock<FxHashMap<Uuid, Material>>,
    artifacts: RwLock<FxHashMap<(Uuid, ArtifactFormat), Artifact>>,
    chunks: RwLock<FxHashMap<Uuid, Vec<Chunk>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MaterialStore for MemoryStore {
    async fn insert_material(&self, material: Material) -> Result<(), StoreError> {
        self.materials.write().insert(material.id, material);
        Ok(())
    }

    async fn material(&self, id: Uuid) -> Result<Option<Material>, StoreError> {
        Ok(self.materials.read().get(&id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: ProcessingStatus) -> Result<(), StoreError> {
        if let Some(material) = self.materials.write().get_mut(&id) {
            material.status = status;
            material.updated_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn set_text(&self, id: Uuid, text: Option<String>) -> Result<(), StoreError> {
        if let Some(material) = self.materials.write().get_mut(&id) {
            material.text = text;
            material.updated_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn set_failure_reason(
        &self,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<(), StoreError> {
        if let Some(material) = self.materials.write().get_mut(&id) {
            material.failure_reason = reason;
            material.updated_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn delete_material(&self, id: Uuid) -> Result<(), StoreError> {
        self.materials.write().remove(&id);
        self.artifacts
            .write()
            .retain(|(material_id, _), _| *material_id != id);
        self.chunks.write().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        self.artifacts
            .write()
            .insert((artifact.material_id, artifact.format), artifact);
        Ok(())
    }

    async fn artifact(
        &self,
        material_id: Uuid,
        format: ArtifactFormat,
    ) -> Result<Option<Artifact>, StoreError> {
        Ok(self.artifacts.read().get(&(material_id, format)).cloned())
    }

    async fn formats_for(&self, material_id: Uuid) -> Result<Vec<ArtifactFormat>, StoreError> {
        let artifacts = self.artifacts.read();
        // Stable order matching the canonical format list.
        Ok(ArtifactFormat::ALL
            .into_iter()
            .filter(|format| artifacts.contains_key(&(material_id, *format)))
            .collect())
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn delete_chunks(&self, material_id: Uuid) -> Result<usize, StoreError> {
        Ok(self
            .chunks
            .write()
            .remove(&material_id)
            .map(|removed| removed.len())
            .unwrap_or(0))
    }

    async fn insert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), StoreError> {
        let mut store = self.chunks.write();
        for chunk in chunks {
            store.entry(chunk.material_id).or_default().push(chunk);
        }
        for material_chunks in store.values_mut() {
            material_chunks.sort_by_key(|chunk| chunk.chunk_index);
        }
        Ok(())
    }

    async fn scoped_chunks(
        &self,
        user_id: Uuid,
        material_id: Option<Uuid>,
    ) -> Result<Vec<ChunkSource>, StoreError> {
        let materials = self.materials.read();
        let chunks = self.chunks.read();

        let mut sources: Vec<ChunkSource> = chunks
            .iter()
            .filter(|(id, _)| material_id.is_none_or(|scope| scope == **id))
            .flat_map(|(_, material_chunks)| material_chunks.iter())
            .filter(|chunk| chunk.user_id == user_id)
            .map(|chunk| ChunkSource {
                chunk: chunk.clone(),
                material_title: materials
                    .get(&chunk.material_id)
                    .map(|material| material.title.clone())
                    .unwrap_or_default(),
            })
            .collect();
        sources.sort_by_key(|source| (source.chunk.material_id, source.chunk.chunk_index));
        Ok(sources)
    }

    async fn chunks_for_material(&self, material_id: Uuid) -> Result<Vec<Chunk>, StoreError> {
        Ok(self
            .chunks
            .read()
            .get(&material_id)
            .cloned()
            .unwrap_or_default())
    }
}
