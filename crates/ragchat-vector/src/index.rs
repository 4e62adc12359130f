use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::DataType;
use async_trait::async_trait;
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use ragchat_core::traits::{Embedder, VectorIndex};
use ragchat_core::types::RetrievedChunk;

use crate::schema::build_chunk_schema;
use crate::table::{open_db, open_or_create, MetaTable, DEFAULT_META_TABLE};

/// Persistent chunk collection in a LanceDB table, searched by cosine distance.
///
/// Documents are embedded with the index's own embedder on `add` and `query`.
/// The completion marker lives in the shared `meta` table under
/// `ingest_complete:<table>`.
pub struct LanceVectorIndex {
    table: Table,
    meta: MetaTable,
    marker_key: String,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl LanceVectorIndex {
    pub async fn open(
        db_path: &Path,
        table_name: &str,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self> {
        std::fs::create_dir_all(db_path).with_context(|| {
            format!("failed to create index directory {}", db_path.display())
        })?;
        let db = open_db(db_path.to_string_lossy().as_ref()).await?;
        let table = open_or_create(&db, table_name, build_chunk_schema(embedder.dim())).await?;
        let stored_dim = vector_dim(&table).await?;
        if stored_dim != Some(embedder.dim()) {
            bail!(
                "table '{}' stores vectors of dim {:?}, embedder {} produces {}",
                table_name,
                stored_dim,
                embedder.embedder_id(),
                embedder.dim()
            );
        }
        let meta = MetaTable::open(&db, DEFAULT_META_TABLE).await?;
        tracing::debug!(table = table_name, path = %db_path.display(), "opened vector index");
        Ok(Self {
            table,
            meta,
            marker_key: format!("ingest_complete:{table_name}"),
            embedder,
            batch_size: batch_size.max(1),
        })
    }

    async fn embed_all(&self, documents: &[String]) -> Result<Vec<Vec<f32>>> {
        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                     {pos}/{len} chunks ({percent}%)",
                )?
                .progress_chars("#>-"),
        );
        let mut vectors = Vec::with_capacity(documents.len());
        for batch in documents.chunks(self.batch_size) {
            let embedded = self.embedder.embed_batch(batch).await.with_context(|| {
                format!("embedding with {} failed", self.embedder.embedder_id())
            })?;
            if embedded.len() != batch.len() {
                bail!(
                    "embedder returned {} vectors for {} documents",
                    embedded.len(),
                    batch.len()
                );
            }
            if let Some(bad) = embedded.iter().find(|v| v.len() != self.embedder.dim()) {
                bail!(
                    "embedding dim mismatch: expected {}, got {}",
                    self.embedder.dim(),
                    bad.len()
                );
            }
            vectors.extend(embedded);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        Ok(vectors)
    }

    fn to_record_batch(
        &self,
        ids: &[String],
        documents: &[String],
        vectors: Vec<Vec<f32>>,
    ) -> Result<RecordBatch> {
        let dim = self.embedder.dim();
        let vectors = vectors
            .into_iter()
            .map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
        let vector_column =
            FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim as i32);
        Ok(RecordBatch::try_new(
            build_chunk_schema(dim),
            vec![
                Arc::new(StringArray::from(ids.to_vec())),
                Arc::new(StringArray::from(documents.to_vec())),
                Arc::new(vector_column),
            ],
        )?)
    }

    async fn search_one(&self, vector: Vec<f32>, n_results: usize) -> Result<Vec<RetrievedChunk>> {
        let mut stream = self
            .table
            .vector_search(vector)?
            .distance_type(DistanceType::Cosine)
            .limit(n_results)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = string_column(&batch, "id")?;
            let texts = string_column(&batch, "text")?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("_distance column missing"))?;
            for i in 0..batch.num_rows() {
                let distance = if distances.is_null(i) {
                    f32::INFINITY
                } else {
                    distances.value(i)
                };
                hits.push(RetrievedChunk {
                    id: ids.value(i).to_string(),
                    text: texts.value(i).to_string(),
                    distance,
                });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n_results);
        Ok(hits)
    }
}

async fn vector_dim(table: &Table) -> Result<Option<usize>> {
    let schema = table.schema().await?;
    Ok(schema
        .field_with_name("vector")
        .ok()
        .and_then(|f| match f.data_type() {
            DataType::FixedSizeList(_, d) => usize::try_from(*d).ok(),
            _ => None,
        }))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{name} column missing"))
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
    async fn count(&self) -> Result<usize> {
        Ok(self.table.count_rows(None).await?)
    }

    async fn add(&self, ids: &[String], documents: &[String]) -> Result<()> {
        if ids.len() != documents.len() {
            bail!(
                "ids ({}) and documents ({}) differ in length",
                ids.len(),
                documents.len()
            );
        }
        if ids.is_empty() {
            return Ok(());
        }
        let vectors = self.embed_all(documents).await?;
        let record_batch = self.to_record_batch(ids, documents, vectors)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema);
        // one commit for the whole call
        self.table.add(Box::new(reader)).execute().await?;
        tracing::info!(rows = ids.len(), "added documents");
        Ok(())
    }

    async fn query(
        &self,
        query_texts: &[String],
        n_results: usize,
    ) -> Result<Vec<Vec<RetrievedChunk>>> {
        if query_texts.is_empty() {
            return Ok(Vec::new());
        }
        if n_results == 0 || self.count().await? == 0 {
            return Ok(vec![Vec::new(); query_texts.len()]);
        }
        let vectors = self
            .embedder
            .embed_batch(query_texts)
            .await
            .context("failed to embed query")?;
        if vectors.len() != query_texts.len() {
            bail!(
                "embedder returned {} vectors for {} queries",
                vectors.len(),
                query_texts.len()
            );
        }
        let mut results = Vec::with_capacity(vectors.len());
        for vector in vectors {
            results.push(self.search_one(vector, n_results).await?);
        }
        Ok(results)
    }

    async fn ingest_marker(&self) -> Result<Option<String>> {
        self.meta.get(&self.marker_key).await
    }

    async fn mark_ingested(&self, digest: &str) -> Result<()> {
        self.meta.set(&self.marker_key, digest).await
    }

    async fn clear(&self) -> Result<()> {
        self.meta.remove(&self.marker_key).await?;
        self.table.delete("true").await?;
        tracing::info!(marker = %self.marker_key, "cleared vector index");
        Ok(())
    }
}
