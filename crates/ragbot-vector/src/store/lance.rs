//! LanceDB-backed chunk and document storage.
//!
//! Two tables: `chunks` (append-only; term maps and metadata as JSON
//! strings, embeddings as a nullable variable-length float list) and
//! `documents` (upserted by `id` via merge-insert). Internals work in
//! `anyhow` and are mapped to `Error::Store` at the trait boundary.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{
    Array, Int32Array, ListArray, RecordBatch, RecordBatchIterator, StringArray,
    TimestampMillisecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};

use ragbot_core::traits::{ChunkStore, DocumentStore};
use ragbot_core::types::{Chunk, Document};
use ragbot_core::{Error, Result};

fn embedding_field() -> Field {
    let item = Field::new("item", DataType::Float32, true);
    Field::new("embedding", DataType::List(Arc::new(item)), true)
}

fn timestamp_field(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Timestamp(TimeUnit::Millisecond, None), nullable)
}

pub fn chunks_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        Field::new("bot_id", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("token_count", DataType::Int32, false),
        Field::new("term_frequencies", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        embedding_field(),
        timestamp_field("created_at", false),
    ]))
}

pub fn documents_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("bot_id", DataType::Utf8, false),
        Field::new("filename", DataType::Utf8, false),
        Field::new("file_type", DataType::Utf8, false),
        Field::new("status", DataType::Utf8, false),
        Field::new("total_chunks", DataType::Int32, false),
        Field::new("processing_error", DataType::Utf8, true),
        timestamp_field("created_at", false),
        timestamp_field("processed_at", true),
    ]))
}

async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> anyhow::Result<()> {
    let names = conn.table_names().execute().await?;
    if names.iter().any(|n| n == name) {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(())
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("{name} column missing or of unexpected type"))
}

fn to_i32(value: usize, what: &str) -> anyhow::Result<i32> {
    i32::try_from(value).with_context(|| format!("{what} {value} does not fit the table schema"))
}

fn from_millis(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp {ms} out of range"))
}

fn chunks_to_batch(chunks: &[Chunk]) -> anyhow::Result<RecordBatch> {
    let now = Utc::now().timestamp_millis();
    let mut ids = Vec::with_capacity(chunks.len());
    let mut document_ids = Vec::with_capacity(chunks.len());
    let mut bot_ids = Vec::with_capacity(chunks.len());
    let mut chunk_indices = Vec::with_capacity(chunks.len());
    let mut contents = Vec::with_capacity(chunks.len());
    let mut token_counts = Vec::with_capacity(chunks.len());
    let mut term_maps = Vec::with_capacity(chunks.len());
    let mut metadata = Vec::with_capacity(chunks.len());
    let mut embeddings: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
    for c in chunks {
        ids.push(c.id.clone());
        document_ids.push(c.document_id.clone());
        bot_ids.push(c.bot_id.clone());
        chunk_indices.push(to_i32(c.chunk_index, "chunk_index")?);
        contents.push(c.content.clone());
        token_counts.push(to_i32(c.token_count, "token_count")?);
        term_maps.push(serde_json::to_string(&c.term_frequencies)?);
        metadata.push(serde_json::to_string(&c.metadata)?);
        embeddings.push(c.embedding.as_ref().map(|v| v.iter().map(|&x| Some(x)).collect()));
    }
    let batch = RecordBatch::try_new(
        chunks_schema(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(document_ids)),
            Arc::new(StringArray::from(bot_ids)),
            Arc::new(Int32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(Int32Array::from(token_counts)),
            Arc::new(StringArray::from(term_maps)),
            Arc::new(StringArray::from(metadata)),
            Arc::new(ListArray::from_iter_primitive::<Float32Type, _, _>(embeddings)),
            Arc::new(TimestampMillisecondArray::from(vec![now; chunks.len()])),
        ],
    )?;
    Ok(batch)
}

fn batch_to_chunks(batch: &RecordBatch) -> anyhow::Result<Vec<Chunk>> {
    let ids = column::<StringArray>(batch, "id")?;
    let document_ids = column::<StringArray>(batch, "document_id")?;
    let bot_ids = column::<StringArray>(batch, "bot_id")?;
    let chunk_indices = column::<Int32Array>(batch, "chunk_index")?;
    let contents = column::<StringArray>(batch, "content")?;
    let token_counts = column::<Int32Array>(batch, "token_count")?;
    let term_maps = column::<StringArray>(batch, "term_frequencies")?;
    let metadata = column::<StringArray>(batch, "metadata")?;
    let embeddings = column::<ListArray>(batch, "embedding")?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let embedding = if embeddings.is_null(i) {
            None
        } else {
            Some(embeddings.value(i).as_primitive::<Float32Type>().values().to_vec())
        };
        out.push(Chunk {
            id: ids.value(i).to_string(),
            document_id: document_ids.value(i).to_string(),
            bot_id: bot_ids.value(i).to_string(),
            chunk_index: usize::try_from(chunk_indices.value(i)).context("negative chunk_index")?,
            content: contents.value(i).to_string(),
            token_count: usize::try_from(token_counts.value(i)).context("negative token_count")?,
            term_frequencies: serde_json::from_str(term_maps.value(i))
                .with_context(|| format!("chunk {} has a corrupt term map", ids.value(i)))?,
            embedding,
            metadata: serde_json::from_str(metadata.value(i))
                .with_context(|| format!("chunk {} has corrupt metadata", ids.value(i)))?,
        });
    }
    Ok(out)
}

fn document_to_batch(doc: &Document) -> anyhow::Result<RecordBatch> {
    let batch = RecordBatch::try_new(
        documents_schema(),
        vec![
            Arc::new(StringArray::from(vec![doc.id.clone()])),
            Arc::new(StringArray::from(vec![doc.bot_id.clone()])),
            Arc::new(StringArray::from(vec![doc.filename.clone()])),
            Arc::new(StringArray::from(vec![doc.file_type.as_str()])),
            Arc::new(StringArray::from(vec![doc.status.as_str()])),
            Arc::new(Int32Array::from(vec![to_i32(doc.total_chunks, "total_chunks")?])),
            Arc::new(StringArray::from(vec![doc.processing_error.clone()])),
            Arc::new(TimestampMillisecondArray::from(vec![
                doc.created_at.timestamp_millis()
            ])),
            Arc::new(TimestampMillisecondArray::from(vec![
                doc.processed_at.map(|t| t.timestamp_millis())
            ])),
        ],
    )?;
    Ok(batch)
}

fn batch_row_to_document(batch: &RecordBatch, i: usize) -> anyhow::Result<Document> {
    let errors = column::<StringArray>(batch, "processing_error")?;
    let created = column::<TimestampMillisecondArray>(batch, "created_at")?;
    let processed = column::<TimestampMillisecondArray>(batch, "processed_at")?;
    Ok(Document {
        id: column::<StringArray>(batch, "id")?.value(i).to_string(),
        bot_id: column::<StringArray>(batch, "bot_id")?.value(i).to_string(),
        filename: column::<StringArray>(batch, "filename")?.value(i).to_string(),
        file_type: column::<StringArray>(batch, "file_type")?.value(i).parse()?,
        status: column::<StringArray>(batch, "status")?.value(i).parse()?,
        total_chunks: usize::try_from(column::<Int32Array>(batch, "total_chunks")?.value(i))?,
        processing_error: (!errors.is_null(i)).then(|| errors.value(i).to_string()),
        created_at: from_millis(created.value(i))?,
        processed_at: if processed.is_null(i) {
            None
        } else {
            Some(from_millis(processed.value(i))?)
        },
    })
}

fn store_err(err: anyhow::Error) -> Error {
    Error::store(format!("{err:#}"))
}

pub struct LanceStore {
    db: Connection,
    chunks_table: String,
    documents_table: String,
}

impl LanceStore {
    /// Open (or create) the database directory and make sure both tables exist.
    pub async fn open(
        db_path: &Path,
        chunks_table: &str,
        documents_table: &str,
    ) -> anyhow::Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref())
            .execute()
            .await
            .with_context(|| format!("opening LanceDB at {}", db_path.display()))?;
        ensure_table(&db, chunks_table, chunks_schema()).await?;
        ensure_table(&db, documents_table, documents_schema()).await?;
        tracing::debug!(
            path = %db_path.display(),
            chunks_table,
            documents_table,
            "lance store ready"
        );
        Ok(Self {
            db,
            chunks_table: chunks_table.to_string(),
            documents_table: documents_table.to_string(),
        })
    }

    async fn load_chunks(&self, bot_id: &str) -> anyhow::Result<Vec<Chunk>> {
        let table = self.db.open_table(&self.chunks_table).execute().await?;
        let mut stream = table
            .query()
            .only_if(format!("bot_id = {}", quote(bot_id)))
            .execute()
            .await?;
        let mut chunks = Vec::new();
        while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
            chunks.extend(batch_to_chunks(&batch)?);
        }
        // Scan order is not guaranteed; keep a stable document/position order.
        chunks.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        Ok(chunks)
    }

    async fn append_chunk(&self, chunk: &Chunk) -> anyhow::Result<()> {
        let batch = chunks_to_batch(std::slice::from_ref(chunk))?;
        let reader = Box::new(RecordBatchIterator::new(
            vec![Ok(batch)].into_iter(),
            chunks_schema(),
        ));
        self.db.open_table(&self.chunks_table).execute().await?.add(reader).execute().await?;
        Ok(())
    }

    async fn upsert_document(&self, document: &Document) -> anyhow::Result<()> {
        let table = self.db.open_table(&self.documents_table).execute().await?;
        let batch = document_to_batch(document)?;
        let reader = Box::new(RecordBatchIterator::new(
            vec![Ok(batch)].into_iter(),
            documents_schema(),
        ));
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await?;
        Ok(())
    }

    async fn find_document(&self, id: &str) -> anyhow::Result<Option<Document>> {
        let table = self.db.open_table(&self.documents_table).execute().await?;
        let mut stream = table.query().only_if(format!("id = {}", quote(id))).execute().await?;
        while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
            if batch.num_rows() == 0 {
                continue;
            }
            return Ok(Some(batch_row_to_document(&batch, 0)?));
        }
        Ok(None)
    }
}

#[async_trait]
impl ChunkStore for LanceStore {
    async fn get_chunks(&self, bot_id: &str) -> Result<Vec<Chunk>> {
        self.load_chunks(bot_id).await.map_err(store_err)
    }

    async fn put_chunk(&self, chunk: Chunk) -> Result<Chunk> {
        self.append_chunk(&chunk).await.map_err(store_err)?;
        Ok(chunk)
    }
}

#[async_trait]
impl DocumentStore for LanceStore {
    async fn put_document(&self, document: Document) -> Result<Document> {
        self.upsert_document(&document).await.map_err(store_err)?;
        Ok(document)
    }

    async fn get_document(&self, id: &str) -> Result<Document> {
        self.find_document(id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| Error::NotFound(format!("document {id}")))
    }

    async fn update_document(&self, document: &Document) -> Result<()> {
        if self.find_document(&document.id).await.map_err(store_err)?.is_none() {
            return Err(Error::NotFound(format!("document {}", document.id)));
        }
        self.upsert_document(document).await.map_err(store_err)
    }
}
