//! Streaming NDJSON ingestion
//!
//! Consumes the result body chunk by chunk. Only the unterminated tail of the
//! last chunk is buffered, so memory stays bounded by the longest line rather
//! than the file size.

use crate::core::ingest::record::{decode_line, StreamRecord};
use crate::core::reconcile::Reconciler;
use crate::domain::{Result, UpsertOutcome};
use crate::log_ingest_checkpoint;
use futures::{Stream, StreamExt};
use serde::Serialize;

/// Counters for one ingestion pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Records written to staging
    pub processed: u64,
    /// Lines that failed to decode
    pub errors: u64,
    /// Lines of an unrecognized type
    pub ignored: u64,
    pub inserted: u64,
    pub updated: u64,
}

/// Progress callback, invoked with the cumulative processed count
pub type ProgressFn<'a> = &'a mut (dyn FnMut(u64) + Send);

/// Splits a byte stream into lines and hands each record to the reconciler
pub struct StreamIngestor {
    reconciler: Reconciler,
    progress_interval: u64,
    checkpoint_interval: u64,
}

impl StreamIngestor {
    pub fn new(reconciler: Reconciler, progress_interval: u64, checkpoint_interval: u64) -> Self {
        Self {
            reconciler,
            progress_interval: progress_interval.max(1),
            checkpoint_interval: checkpoint_interval.max(1),
        }
    }

    /// Ingest a chunked NDJSON stream
    ///
    /// Chunk boundaries may fall anywhere, including inside a multi-byte
    /// character. Blank lines are skipped and a final line without a trailing
    /// newline is still processed. Undecodable lines are counted and skipped.
    ///
    /// # Errors
    ///
    /// Fails on a stream read error or a staging write error; rows written
    /// before the failure stay in staging.
    pub async fn ingest<S>(
        &self,
        mut stream: S,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> Result<IngestStats>
    where
        S: Stream<Item = Result<Vec<u8>>> + Unpin + Send,
    {
        let mut stats = IngestStats::default();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);

            let mut start = 0;
            while let Some(offset) = buffer[start..].iter().position(|b| *b == b'\n') {
                let end = start + offset;
                let line = buffer[start..end].to_vec();
                start = end + 1;
                self.process_line(&line, &mut stats, &mut on_progress).await?;
            }
            buffer.drain(..start);
        }

        if !buffer.is_empty() {
            self.process_line(&buffer, &mut stats, &mut on_progress).await?;
        }

        tracing::info!(
            processed = stats.processed,
            errors = stats.errors,
            ignored = stats.ignored,
            inserted = stats.inserted,
            updated = stats.updated,
            "Ingestion finished"
        );
        Ok(stats)
    }

    async fn process_line(
        &self,
        raw: &[u8],
        stats: &mut IngestStats,
        on_progress: &mut Option<ProgressFn<'_>>,
    ) -> Result<()> {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text.trim(),
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(error = %e, "Skipping line with invalid UTF-8");
                return Ok(());
            }
        };
        if text.is_empty() {
            return Ok(());
        }

        let record = match decode_line(text) {
            Ok(StreamRecord::Unrecognized) => {
                stats.ignored += 1;
                return Ok(());
            }
            Ok(record) => record,
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(error = %e, "Skipping undecodable line");
                return Ok(());
            }
        };

        match self.reconciler.apply(&record).await? {
            Some(UpsertOutcome::Inserted) => stats.inserted += 1,
            Some(UpsertOutcome::Updated) => stats.updated += 1,
            None => {}
        }
        stats.processed += 1;

        if stats.processed % self.progress_interval == 0 {
            if let Some(callback) = on_progress.as_deref_mut() {
                callback(stats.processed);
            }
        }
        if stats.processed % self.checkpoint_interval == 0 {
            log_ingest_checkpoint!(stats.processed, stats.errors);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::StagingStore;
    use crate::adapters::memory::InMemoryStore;
    use futures::stream;
    use std::sync::Arc;

    fn ingestor(store: &Arc<InMemoryStore>, progress_interval: u64) -> StreamIngestor {
        StreamIngestor::new(Reconciler::new(store.clone()), progress_interval, 5000)
    }

    fn chunks(parts: Vec<&[u8]>) -> impl Stream<Item = Result<Vec<u8>>> + Unpin + Send {
        stream::iter(parts.into_iter().map(|p| Ok(p.to_vec())).collect::<Vec<_>>())
    }

    const BODY: &str = concat!(
        r#"{"id":"ext://ProductVariant/1","sku":"AAA-1","tags":"Swim"}"#,
        "\n\n",
        r#"{"id":"ext://InventoryLevel/1","__parentId":"ext://ProductVariant/1","quantities":[{"name":"incoming","quantity":5}]}"#,
        "\n",
        r#"{"id":"ext://Product/1","title":"ignored"}"#,
        "\n",
        "{broken\n",
        r#"{"id":"ext://ProductVariant/2","sku":"BBB-2","title":"Café"}"#,
    );

    #[tokio::test]
    async fn test_chunk_boundaries_do_not_matter() {
        let whole = Arc::new(InMemoryStore::new());
        let whole_stats = ingestor(&whole, 100)
            .ingest(chunks(vec![BODY.as_bytes()]), None)
            .await
            .unwrap();

        // Split into 7-byte chunks, which also cuts through the multi-byte 'é'
        let split = Arc::new(InMemoryStore::new());
        let parts: Vec<&[u8]> = BODY.as_bytes().chunks(7).collect();
        let split_stats = ingestor(&split, 100).ingest(chunks(parts), None).await.unwrap();

        assert_eq!(whole_stats, split_stats);
        assert_eq!(whole_stats.processed, 3);
        assert_eq!(whole_stats.errors, 1);
        assert_eq!(whole_stats.ignored, 1);
        assert_eq!(
            whole.load_variants().await.unwrap(),
            split.load_variants().await.unwrap()
        );
        assert_eq!(
            split.load_variants().await.unwrap()[1].title.as_deref(),
            Some("Café")
        );
    }

    #[tokio::test]
    async fn test_progress_callback_fires_on_interval() {
        let store = Arc::new(InMemoryStore::new());
        let body: String = (0..5)
            .map(|i| format!("{{\"id\":\"ext://ProductVariant/{i}\",\"sku\":\"S-{i}\"}}\n"))
            .collect();

        let mut seen = Vec::new();
        let mut record = |n: u64| seen.push(n);
        ingestor(&store, 2)
            .ingest(chunks(vec![body.as_bytes()]), Some(&mut record))
            .await
            .unwrap();

        assert_eq!(seen, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_reingest_updates_instead_of_duplicating() {
        let store = Arc::new(InMemoryStore::new());
        let first = ingestor(&store, 100)
            .ingest(chunks(vec![BODY.as_bytes()]), None)
            .await
            .unwrap();
        let second = ingestor(&store, 100)
            .ingest(chunks(vec![BODY.as_bytes()]), None)
            .await
            .unwrap();

        assert_eq!(first.inserted, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(store.load_variants().await.unwrap().len(), 2);
        assert_eq!(store.load_inventory_levels().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_error_aborts() {
        let store = Arc::new(InMemoryStore::new());
        let parts = stream::iter(vec![
            Ok(b"{\"id\":\"ext://ProductVariant/1\",\"sku\":\"A-1\"}\n".to_vec()),
            Err(crate::domain::SyncError::Io("connection reset".to_string())),
        ]);
        let result = ingestor(&store, 100).ingest(parts, None).await;
        assert!(result.is_err());
        assert_eq!(store.load_variants().await.unwrap().len(), 1);
    }
}
