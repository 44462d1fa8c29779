//! Chapter Publishing
//!
//! Submits a finished chapter to the backend and tracks the attempt in
//! the append-only publish history. A record is created Pending before
//! the request goes out and finalized exactly once when it resolves.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::network;
use crate::storage::ProjectStore;
use crate::types::{Chapter, NovelError, Project, PublishRecord, Result};

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    novel_title: &'a str,
    chapter_title: &'a str,
    content: &'a str,
    word_count: usize,
}

pub struct Publisher {
    base_url: String,
    store: Arc<ProjectStore>,
    client: reqwest::Client,
}

impl Publisher {
    pub fn new(base_url: impl Into<String>, store: Arc<ProjectStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network::DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| NovelError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            client,
        })
    }

    /// Submit one chapter. The returned record is already finalized
    /// and written to the history.
    pub async fn publish_chapter(
        &self,
        project: &Project,
        chapter: &Chapter,
    ) -> Result<PublishRecord> {
        let record = PublishRecord::pending(&chapter.title);
        self.store.upsert_publish_record(&record)?;

        let outcome = self.submit(project, chapter).await;
        let finalized = match outcome {
            Ok(()) => {
                info!(chapter = %chapter.title, "Chapter published");
                record.succeeded()
            }
            Err(err) => {
                warn!(chapter = %chapter.title, error = %err, "Publish failed");
                record.failed(err.to_string())
            }
        };

        self.store.upsert_publish_record(&finalized)?;
        Ok(finalized)
    }

    async fn submit(&self, project: &Project, chapter: &Chapter) -> Result<()> {
        let url = format!("{}/novel/publish", self.base_url);
        let body = PublishRequest {
            novel_title: &project.title,
            chapter_title: &chapter.title,
            content: &chapter.content,
            word_count: chapter.word_count,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NovelError::Publish {
                chapter: chapter.title.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NovelError::Publish {
                chapter: chapter.title.clone(),
                reason: format!("HTTP {}: {}", status, text),
            });
        }

        Ok(())
    }
}
