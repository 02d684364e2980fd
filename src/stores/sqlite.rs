//! SQLite store backed by `sqlx`.
//!
//! One [`SqliteStore`] implements all three store traits over a shared
//! connection pool. Identifiers and timestamps are persisted as text (UUID
//! and RFC 3339 strings); embeddings as JSON float arrays, `NULL` when the
//! embedding call failed.
//!
//! When the default-on `sqlite-migrations` feature is enabled, embedded
//! migrations (`sqlx::migrate!("./migrations")`) run on connect; disabling it
//! assumes external schema orchestration.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::material::{Artifact, ArtifactFormat, Chunk, Material, ProcessingStatus};

use super::{ArtifactStore, ChunkSource, ChunkStore, MaterialStore, StoreError};

/// SQLite-backed implementation of the material, artifact, and chunk stores.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URL: `sqlite://studysmith.db?mode=rwc`.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|err| StoreError::Backend(format!("connect error: {err}")))?;
        #[cfg(feature = "sqlite-migrations")]
        {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|err| StoreError::Backend(format!("migration failure: {err}")))?;
        }
        Ok(Self { pool })
    }

    /// Access the underlying pool for queries outside the store traits.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn backend(context: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |err| StoreError::Backend(format!("{context}: {err}"))
}

fn parse_uuid(raw: &str, column: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|err| StoreError::Corrupt(format!("{column}: {err}")))
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt(format!("{column}: {err}")))
}

fn material_from_row(row: &SqliteRow) -> Result<Material, StoreError> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: Option<String> = row.get("updated_at");

    Ok(Material {
        id: parse_uuid(&id, "materials.id")?,
        user_id: parse_uuid(&user_id, "materials.user_id")?,
        title: row.get("title"),
        text: row.get("text"),
        status: ProcessingStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("materials.status: {status}")))?,
        failure_reason: row.get("failure_reason"),
        created_at: parse_timestamp(&created_at, "materials.created_at")?,
        updated_at: updated_at
            .map(|raw| parse_timestamp(&raw, "materials.updated_at"))
            .transpose()?,
    })
}

fn chunk_from_row(row: &SqliteRow) -> Result<Chunk, StoreError> {
    let id: String = row.get("id");
    let material_id: String = row.get("material_id");
    let user_id: String = row.get("user_id");
    let chunk_index: i64 = row.get("chunk_index");
    let char_start: i64 = row.get("char_start");
    let char_end: i64 = row.get("char_end");
    let embedding: Option<String> = row.get("embedding");

    Ok(Chunk {
        id: parse_uuid(&id, "chunks.id")?,
        material_id: parse_uuid(&material_id, "chunks.material_id")?,
        user_id: parse_uuid(&user_id, "chunks.user_id")?,
        chunk_index: chunk_index as usize,
        content: row.get("content"),
        char_start: char_start as usize,
        char_end: char_end as usize,
        embedding: embedding
            .map(|raw| serde_json::from_str::<Vec<f32>>(&raw))
            .transpose()?,
    })
}

#[async_trait::async_trait]
impl MaterialStore for SqliteStore {
    async fn insert_material(&self, material: Material) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO materials
                (id, user_id, title, text, status, failure_reason, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(material.id.to_string())
        .bind(material.user_id.to_string())
        .bind(&material.title)
        .bind(&material.text)
        .bind(material.status.as_str())
        .bind(&material.failure_reason)
        .bind(material.created_at.to_rfc3339())
        .bind(material.updated_at.map(|at| at.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(backend("insert material"))?;
        Ok(())
    }

    async fn material(&self, id: Uuid) -> Result<Option<Material>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, text, status, failure_reason, created_at, updated_at
            FROM materials WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend("select material"))?;

        row.as_ref().map(material_from_row).transpose()
    }

    async fn set_status(&self, id: Uuid, status: ProcessingStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE materials SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend("update status"))?;
        Ok(())
    }

    async fn set_text(&self, id: Uuid, text: Option<String>) -> Result<(), StoreError> {
        sqlx::query("UPDATE materials SET text = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(text)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend("update text"))?;
        Ok(())
    }

    async fn set_failure_reason(
        &self,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE materials SET failure_reason = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(reason)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend("update failure reason"))?;
        Ok(())
    }

    async fn delete_material(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend("tx begin"))?;
        let id = id.to_string();

        // Explicit cascade; foreign_keys pragma state is not relied upon.
        sqlx::query("DELETE FROM chunks WHERE material_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend("delete chunks"))?;
        sqlx::query("DELETE FROM artifacts WHERE material_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend("delete artifacts"))?;
        sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend("delete material"))?;

        tx.commit().await.map_err(backend("tx commit"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactStore for SqliteStore {
    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO artifacts (id, material_id, format, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (material_id, format) DO UPDATE SET
                id = excluded.id,
                content = excluded.content,
                created_at = excluded.created_at
            "#,
        )
        .bind(artifact.id.to_string())
        .bind(artifact.material_id.to_string())
        .bind(artifact.format.as_str())
        .bind(&artifact.content)
        .bind(artifact.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend("upsert artifact"))?;
        Ok(())
    }

    async fn artifact(
        &self,
        material_id: Uuid,
        format: ArtifactFormat,
    ) -> Result<Option<Artifact>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, material_id, format, content, created_at
            FROM artifacts WHERE material_id = ?1 AND format = ?2
            "#,
        )
        .bind(material_id.to_string())
        .bind(format.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend("select artifact"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let id: String = row.get("id");
        let created_at: String = row.get("created_at");
        Ok(Some(Artifact {
            id: parse_uuid(&id, "artifacts.id")?,
            material_id,
            format,
            content: row.get("content"),
            created_at: parse_timestamp(&created_at, "artifacts.created_at")?,
        }))
    }

    async fn formats_for(&self, material_id: Uuid) -> Result<Vec<ArtifactFormat>, StoreError> {
        let rows = sqlx::query("SELECT format FROM artifacts WHERE material_id = ?1")
            .bind(material_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(backend("select formats"))?;

        let mut present = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("format");
            let format = raw
                .parse::<ArtifactFormat>()
                .map_err(|err| StoreError::Corrupt(err.to_string()))?;
            present.push(format);
        }
        // Stable order matching the canonical format list.
        present.sort_by_key(|format| {
            ArtifactFormat::ALL
                .iter()
                .position(|candidate| candidate == format)
        });
        Ok(present)
    }
}

#[async_trait::async_trait]
impl ChunkStore for SqliteStore {
    async fn delete_chunks(&self, material_id: Uuid) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM chunks WHERE material_id = ?1")
            .bind(material_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend("delete chunks"))?;
        Ok(result.rows_affected() as usize)
    }

    async fn insert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), StoreError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(backend("tx begin"))?;
        for chunk in chunks {
            let embedding = chunk
                .embedding
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            sqlx::query(
                r#"
                INSERT INTO chunks
                    (id, material_id, user_id, chunk_index, content, char_start, char_end, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(chunk.id.to_string())
            .bind(chunk.material_id.to_string())
            .bind(chunk.user_id.to_string())
            .bind(chunk.chunk_index as i64)
            .bind(&chunk.content)
            .bind(chunk.char_start as i64)
            .bind(chunk.char_end as i64)
            .bind(embedding)
            .execute(&mut *tx)
            .await
            .map_err(backend("insert chunk"))?;
        }
        tx.commit().await.map_err(backend("tx commit"))?;
        Ok(())
    }

    async fn scoped_chunks(
        &self,
        user_id: Uuid,
        material_id: Option<Uuid>,
    ) -> Result<Vec<ChunkSource>, StoreError> {
        let base = r#"
            SELECT c.id, c.material_id, c.user_id, c.chunk_index, c.content,
                   c.char_start, c.char_end, c.embedding, m.title AS material_title
            FROM chunks c
            JOIN materials m ON m.id = c.material_id
            WHERE c.user_id = ?1
        "#;
        let rows = match material_id {
            Some(scope) => {
                sqlx::query(&format!(
                    "{base} AND c.material_id = ?2 ORDER BY c.material_id, c.chunk_index"
                ))
                .bind(user_id.to_string())
                .bind(scope.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{base} ORDER BY c.material_id, c.chunk_index"))
                    .bind(user_id.to_string())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(backend("select scoped chunks"))?;

        let mut sources = Vec::with_capacity(rows.len());
        for row in rows {
            sources.push(ChunkSource {
                chunk: chunk_from_row(&row)?,
                material_title: row.get("material_title"),
            });
        }
        Ok(sources)
    }

    async fn chunks_for_material(&self, material_id: Uuid) -> Result<Vec<Chunk>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, material_id, user_id, chunk_index, content,
                   char_start, char_end, embedding
            FROM chunks WHERE material_id = ?1 ORDER BY chunk_index
            "#,
        )
        .bind(material_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend("select chunks"))?;

        rows.iter().map(chunk_from_row).collect()
    }
}
