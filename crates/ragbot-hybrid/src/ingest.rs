//! Document ingestion: extract, chunk, count terms, embed, persist.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use ragbot_core::data_processor::{count_tokens, DataProcessor, SourceFile};
use ragbot_core::extract::extract_text;
use ragbot_core::traits::{ChunkStore, DocumentStore, EmbeddingProvider};
use ragbot_core::types::{Chunk, ChunkMetadata, Document, DocumentStatus};
use ragbot_core::Result;
use ragbot_text::term_frequencies;

/// Outcome of processing one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub total_chunks: usize,
    pub embedded: usize,
    pub embedding_failures: usize,
    pub insert_failures: usize,
}

pub struct IngestPipeline {
    chunks: Arc<dyn ChunkStore>,
    documents: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    processor: DataProcessor,
}

impl IngestPipeline {
    pub fn new(
        chunks: Arc<dyn ChunkStore>,
        documents: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        processor: DataProcessor,
    ) -> Self {
        Self { chunks, documents, embedder, processor }
    }

    pub fn processor(&self) -> &DataProcessor {
        &self.processor
    }

    /// Register a new pending document for `bot_id` and process it.
    pub async fn ingest_source(
        &self,
        bot_id: &str,
        source: &SourceFile,
    ) -> Result<(Document, IngestReport)> {
        let id = Uuid::new_v4().to_string();
        let document = Document::new(id, bot_id, &source.filename, source.file_type);
        let document = self.documents.put_document(document).await?;
        let report = self.process_document(&document.id, &source.bytes).await?;
        let document = self.documents.get_document(&document.id).await?;
        Ok((document, report))
    }

    /// Index one stored document from its raw bytes.
    ///
    /// Embedding failures leave the chunk without a vector and insert
    /// failures drop the chunk; both are counted, neither aborts the run.
    /// Only a failed extraction marks the document `failed`.
    pub async fn process_document(&self, document_id: &str, bytes: &[u8]) -> Result<IngestReport> {
        let mut document = self.documents.get_document(document_id).await?;
        document.status = DocumentStatus::Processing;
        document.processing_error = None;
        self.documents.update_document(&document).await?;

        let text = match extract_text(bytes, document.file_type) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(document_id, error = %e, "text extraction failed");
                document.status = DocumentStatus::Failed;
                document.processing_error = Some(e.to_string());
                if let Err(update_err) = self.documents.update_document(&document).await {
                    tracing::error!(
                        document_id,
                        error = %update_err,
                        "could not record extraction failure"
                    );
                }
                return Err(e);
            }
        };

        let pieces = self.processor.chunk_text(&text);
        tracing::info!(
            document_id,
            bot_id = %document.bot_id,
            chunks = pieces.len(),
            "chunked document"
        );

        let mut report = IngestReport { total_chunks: pieces.len(), ..IngestReport::default() };
        for (chunk_index, content) in pieces.into_iter().enumerate() {
            let embedding = match self.embedder.embed(&content).await {
                Ok(v) if !v.is_empty() => {
                    report.embedded += 1;
                    Some(v)
                }
                Ok(_) => {
                    tracing::warn!(document_id, chunk_index, "empty embedding returned");
                    report.embedding_failures += 1;
                    None
                }
                Err(e) => {
                    tracing::warn!(
                        document_id,
                        chunk_index,
                        error = %e,
                        "embedding failed, storing chunk without vector"
                    );
                    report.embedding_failures += 1;
                    None
                }
            };
            let chunk = Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document.id.clone(),
                bot_id: document.bot_id.clone(),
                chunk_index,
                token_count: count_tokens(&content),
                term_frequencies: term_frequencies(&content),
                content,
                embedding,
                metadata: ChunkMetadata::for_index(chunk_index),
            };
            if let Err(e) = self.chunks.put_chunk(chunk).await {
                tracing::error!(document_id, chunk_index, error = %e, "chunk insert failed");
                report.insert_failures += 1;
            }
        }

        document.status = DocumentStatus::Completed;
        document.total_chunks = report.total_chunks;
        document.processed_at = Some(Utc::now());
        self.documents.update_document(&document).await?;
        tracing::info!(
            document_id,
            total_chunks = report.total_chunks,
            embedded = report.embedded,
            embedding_failures = report.embedding_failures,
            insert_failures = report.insert_failures,
            "document processed"
        );
        Ok(report)
    }
}
