//! Chunk persistence and the immutable in-memory retrieval snapshot.
//!
//! Chunks live in SQLite (`chunks` table, embeddings as little-endian
//! f32 blobs). At startup every valid row is loaded into a
//! [`ChunkStore`]: parallel metadata arrays plus one dense matrix, row
//! `i` of the matrix belonging to `sources[i]`/`refs[i]`/`texts[i]`.
//! The snapshot is read-only; re-ingestion builds a fresh one and swaps
//! the `Arc`.

use std::path::PathBuf;

use ndarray::Array2;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;
use crate::rag::ranker::{cosine_top_k, RankError};
use crate::rules::parts::PartRow;

/// One ranked retrieval result; `index` addresses the owning
/// [`ChunkStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedHit {
    pub index: usize,
    pub score: f32,
}

/// Immutable retrieval snapshot shared by all requests.
pub struct ChunkStore {
    sources: Vec<String>,
    refs: Vec<String>,
    texts: Vec<String>,
    matrix: Array2<f32>,
}

impl ChunkStore {
    pub fn empty(dim: usize) -> Self {
        ChunkStore {
            sources: Vec::new(),
            refs: Vec::new(),
            texts: Vec::new(),
            matrix: Array2::zeros((0, dim)),
        }
    }

    fn from_rows(dim: usize, rows: Vec<(String, String, String, Vec<f32>)>) -> Self {
        let mut sources = Vec::with_capacity(rows.len());
        let mut refs = Vec::with_capacity(rows.len());
        let mut texts = Vec::with_capacity(rows.len());
        let mut flat = Vec::with_capacity(rows.len() * dim);

        for (source, reference, text, embedding) in rows {
            sources.push(source);
            refs.push(reference);
            texts.push(text);
            flat.extend_from_slice(&embedding);
        }

        let row_count = sources.len();
        let matrix = Array2::from_shape_vec((row_count, dim), flat)
            .unwrap_or_else(|_| Array2::zeros((0, dim)));

        ChunkStore {
            sources,
            refs,
            texts,
            matrix,
        }
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Rank every stored chunk against `query` and return the top `k`
    /// hits, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RankedHit>, RankError> {
        let (indices, scores) = cosine_top_k(query, self.matrix.view(), k)?;
        Ok(indices
            .into_iter()
            .zip(scores)
            .map(|(index, score)| RankedHit { index, score })
            .collect())
    }
}

/// SQLite-backed storage for chunks, the parts ledger, and raw manual
/// page text.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                ref TEXT NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS parts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT,
                part TEXT NOT NULL,
                cost REAL,
                notes TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS manual_pages (
                page_num INTEGER PRIMARY KEY,
                text TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        for index_sql in [
            "CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)",
            "CREATE INDEX IF NOT EXISTS idx_parts_part ON parts(part)",
            "CREATE INDEX IF NOT EXISTS idx_parts_date ON parts(date)",
        ] {
            sqlx::query(index_sql)
                .execute(&self.pool)
                .await
                .map_err(ApiError::internal)?;
        }

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Load every chunk row with a usable embedding into a fresh
    /// retrieval snapshot.
    ///
    /// Rows whose embedding is empty or whose dimension differs from
    /// `dim` are excluded from ranking (typically placeholder rows from
    /// an interrupted ingestion run).
    pub async fn load_chunks(&self, dim: usize) -> Result<ChunkStore, ApiError> {
        let rows = sqlx::query("SELECT source, ref, text, embedding FROM chunks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut valid = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for row in &rows {
            let source: String = row.get("source");
            let reference: String = row.get("ref");
            let text: String = row.get("text");
            let blob: Vec<u8> = row.get("embedding");

            let embedding = Self::deserialize_embedding(&blob);
            if embedding.len() != dim || text.is_empty() {
                skipped += 1;
                continue;
            }

            valid.push((source, reference, text, embedding));
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} chunk rows with missing or wrong-dimension embeddings",
                skipped
            );
        }

        Ok(ChunkStore::from_rows(dim, valid))
    }

    /// Replace all chunks of one logical source in a single transaction.
    ///
    /// Updates are modeled as delete-by-source plus bulk re-insert;
    /// serving keeps reading the old snapshot until it is reloaded.
    pub async fn replace_source(
        &self,
        source: &str,
        reference: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, ApiError> {
        if chunks.len() != embeddings.len() {
            return Err(ApiError::BadRequest(format!(
                "chunk/embedding count mismatch: {} != {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM chunks WHERE source = ?1")
            .bind(source)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        for (text, embedding) in chunks.iter().zip(embeddings) {
            let blob = Self::serialize_embedding(embedding);
            sqlx::query("INSERT INTO chunks (source, ref, text, embedding) VALUES (?1, ?2, ?3, ?4)")
                .bind(source)
                .bind(reference)
                .bind(text)
                .bind(&blob)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(chunks.len())
    }

    pub async fn chunk_count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(count as usize)
    }

    /// Load the full parts ledger for rule-based matching.
    pub async fn load_parts(&self) -> Result<Vec<PartRow>, ApiError> {
        let rows = sqlx::query("SELECT id, date, part, cost, notes FROM parts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| PartRow {
                id: row.get("id"),
                date: row.get("date"),
                part: row.get("part"),
                cost: row.get("cost"),
                notes: row.get("notes"),
            })
            .collect())
    }

    pub async fn insert_part(
        &self,
        date: Option<&str>,
        part: &str,
        cost: Option<f64>,
        notes: Option<&str>,
    ) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO parts (date, part, cost, notes) VALUES (?1, ?2, ?3, ?4)")
            .bind(date)
            .bind(part)
            .bind(cost)
            .bind(notes)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        let tmp = std::env::temp_dir().join(format!("carhelper-test-{}.db", uuid::Uuid::new_v4()));
        SqliteStore::new(tmp).await.unwrap()
    }

    #[tokio::test]
    async fn embedding_blob_round_trips_little_endian() {
        let embedding = vec![0.25f32, -1.5, 3.75];
        let blob = SqliteStore::serialize_embedding(&embedding);
        assert_eq!(blob.len(), 12);
        assert_eq!(SqliteStore::deserialize_embedding(&blob), embedding);
    }

    #[tokio::test]
    async fn replace_source_then_load_builds_aligned_snapshot() {
        let store = test_store().await;

        store
            .replace_source(
                "notes",
                "notes.md",
                &["ensimmäinen".to_string(), "toinen".to_string()],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();

        let chunks = store.load_chunks(2).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.dim(), 2);
        assert_eq!(chunks.sources(), ["notes", "notes"]);
        assert_eq!(chunks.refs(), ["notes.md", "notes.md"]);
        assert_eq!(chunks.texts()[1], "toinen");

        let hits = chunks.search(&[0.1, 0.9], 1).unwrap();
        assert_eq!(hits[0].index, 1);
        assert!(hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn replace_source_removes_previous_rows_of_that_source_only() {
        let store = test_store().await;

        store
            .replace_source("notes", "notes.md", &["old".to_string()], &[vec![1.0]])
            .await
            .unwrap();
        store
            .replace_source("manual", "manual.pdf#page=1", &["page".to_string()], &[vec![1.0]])
            .await
            .unwrap();
        store
            .replace_source("notes", "notes.md", &["new".to_string()], &[vec![0.5]])
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 2);
        let chunks = store.load_chunks(1).await.unwrap();
        assert!(chunks.texts().contains(&"new".to_string()));
        assert!(!chunks.texts().contains(&"old".to_string()));
    }

    #[tokio::test]
    async fn load_chunks_skips_wrong_dimension_rows() {
        let store = test_store().await;

        store
            .replace_source("notes", "notes.md", &["good".to_string()], &[vec![1.0, 2.0]])
            .await
            .unwrap();
        store
            .replace_source("parts_text", "parts.csv", &["bad".to_string()], &[vec![1.0]])
            .await
            .unwrap();

        let chunks = store.load_chunks(2).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks.texts(), ["good"]);
    }

    #[tokio::test]
    async fn mismatched_ingestion_lengths_are_rejected() {
        let store = test_store().await;
        let err = store
            .replace_source("notes", "notes.md", &["one".to_string()], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn parts_round_trip() {
        let store = test_store().await;

        store
            .insert_part(Some("2024-03-01"), "jarrupalat eteen", Some(89.90), None)
            .await
            .unwrap();
        store
            .insert_part(None, "tuulilasinpyyhkijät", None, Some("talvisarja"))
            .await
            .unwrap();

        let parts = store.load_parts().await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part, "jarrupalat eteen");
        assert_eq!(parts[0].cost, Some(89.90));
        assert_eq!(parts[1].date, None);
    }

    #[tokio::test]
    async fn empty_snapshot_searches_to_nothing() {
        let chunks = ChunkStore::empty(384);
        assert!(chunks.is_empty());
        let hits = chunks.search(&vec![0.0; 384], 5).unwrap();
        assert!(hits.is_empty());
    }
}
