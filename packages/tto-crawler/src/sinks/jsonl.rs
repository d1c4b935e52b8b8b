//! Append-only JSON Lines sink.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::error::SinkResult;
use crate::traits::sink::RecordSink;
use crate::types::report::CrawlRecord;

/// Writes one JSON object per line to a file, appending to existing content.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Open (or create) `path` for appending. Parent directories are created.
    pub async fn open(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn write(&self, record: &CrawlRecord) -> SinkResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entry::{FilterDecision, FilterReason};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_appends_one_record_per_line() {
        let path = std::env::temp_dir()
            .join(format!("tto-crawler-{}", Uuid::new_v4()))
            .join("records.jsonl");

        let sink = JsonLinesSink::open(&path).await.unwrap();
        for url in ["https://a.edu/login", "https://a.edu/cart"] {
            sink.write(&CrawlRecord::Rejected {
                run_id: Uuid::nil(),
                site: "a".into(),
                decision: FilterDecision::reject(url, FilterReason::Navigation),
            })
            .await
            .unwrap();
        }
        sink.flush().await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: CrawlRecord = serde_json::from_str(lines[0]).unwrap();
        assert!(matches!(first, CrawlRecord::Rejected { .. }));

        // reopening appends
        let sink = JsonLinesSink::open(&path).await.unwrap();
        sink.write(&CrawlRecord::Cycle {
            run_id: Uuid::nil(),
            site: "a".into(),
            from: "https://a.edu/p2".into(),
            to: "https://a.edu/p1".into(),
        })
        .await
        .unwrap();
        sink.flush().await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 3);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
