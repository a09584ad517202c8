//! Artifact upload

use futures::stream::{self, StreamExt};
use tokio::fs;
use tracing::warn;

use skiff_platform::errors::PlatformError;
use skiff_platform::store::{object_key, ObjectSink};
use skiff_platform::util::content_type_for;

use crate::output::Artifact;
use crate::reporter::BuildReporter;

/// Result of one deployment's upload phase
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub failed: usize,
}

/// Upload every artifact, at most `concurrency` in flight. A failed file is
/// reported and skipped; the rest keep going. No retries.
pub async fn upload_artifacts<S: ObjectSink>(
    store: &S,
    reporter: &BuildReporter,
    deployment_id: &str,
    artifacts: &[Artifact],
    concurrency: usize,
) -> UploadSummary {
    let results = stream::iter(artifacts)
        .map(|artifact| async move {
            let key = object_key(deployment_id, &artifact.relative);
            let rel_display = artifact.relative.display().to_string();
            reporter.line(format!("Uploading {}", rel_display)).await;

            let outcome = upload_one(store, &key, artifact).await;
            match &outcome {
                Ok(()) => {
                    reporter.line(format!("Uploaded {}", rel_display)).await;
                }
                Err(e) => {
                    warn!("Upload failed for {}: {}", rel_display, e);
                    reporter.line(format!("Upload failed for {}: {}", rel_display, e)).await;
                }
            }
            outcome.is_ok()
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<bool>>()
        .await;

    let uploaded = results.iter().filter(|ok| **ok).count();
    UploadSummary {
        uploaded,
        failed: results.len() - uploaded,
    }
}

async fn upload_one<S: ObjectSink>(
    store: &S,
    key: &str,
    artifact: &Artifact,
) -> Result<(), PlatformError> {
    let bytes = fs::read(&artifact.path).await?;
    let content_type = content_type_for(&artifact.relative);
    store.put_object(key, bytes, &content_type).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    use skiff_platform::bus::client::{BusAddress, BusClient};

    /// Sink double recording keys and content types
    #[derive(Default)]
    struct RecordingSink {
        objects: Mutex<Vec<(String, String)>>,
        reject_key: Option<String>,
    }

    #[async_trait]
    impl ObjectSink for RecordingSink {
        async fn put_object(
            &self,
            key: &str,
            _bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<(), PlatformError> {
            if self.reject_key.as_deref() == Some(key) {
                return Err(PlatformError::StoreError("rejected".to_string()));
            }
            self.objects
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(())
        }
    }

    // The publisher is never polled in tests; publishes queue locally and
    // the reporter swallows any publish error.
    fn test_reporter() -> (BusClient, BuildReporter) {
        let address = BusAddress {
            host: "localhost".to_string(),
            ..Default::default()
        };
        let bus = BusClient::connect(&address, "skiff-builder-test").unwrap();
        let reporter = BuildReporter::new(bus.log_publisher(), "dep-1");
        (bus, reporter)
    }

    async fn artifact(dir: &Path, relative: &str, contents: &str) -> Artifact {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(&path, contents).await.unwrap();
        Artifact {
            path,
            relative: relative.into(),
        }
    }

    #[tokio::test]
    async fn test_uploads_every_file_with_inferred_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = vec![
            artifact(dir.path(), "index.html", "<html></html>").await,
            artifact(dir.path(), "assets/app.js", "console.log(1)").await,
        ];

        let sink = RecordingSink::default();
        let (_bus, reporter) = test_reporter();

        let summary = upload_artifacts(&sink, &reporter, "dep-1", &artifacts, 4).await;
        assert_eq!(summary, UploadSummary { uploaded: 2, failed: 0 });

        let mut objects = sink.objects.lock().unwrap().clone();
        objects.sort();
        assert_eq!(objects[0].0, "__outputs/dep-1/assets/app.js");
        assert!(objects[0].1.contains("javascript"));
        assert_eq!(objects[1].0, "__outputs/dep-1/index.html");
        assert_eq!(objects[1].1, "text/html");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let good_one = artifact(dir.path(), "index.html", "<html></html>").await;
        let bad = artifact(dir.path(), "ghost.txt", "gone").await;
        let good_two = artifact(dir.path(), "app.js", "console.log(1)").await;

        // The file disappears between discovery and upload
        fs::remove_file(&bad.path).await.unwrap();

        let sink = RecordingSink::default();
        let (_bus, reporter) = test_reporter();

        let summary =
            upload_artifacts(&sink, &reporter, "dep-1", &[good_one, bad, good_two], 2).await;
        assert_eq!(summary, UploadSummary { uploaded: 2, failed: 1 });
        assert_eq!(sink.objects.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_store_rejection_is_skipped_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = vec![
            artifact(dir.path(), "index.html", "<html></html>").await,
            artifact(dir.path(), "app.js", "console.log(1)").await,
        ];

        let sink = RecordingSink {
            reject_key: Some("__outputs/dep-1/index.html".to_string()),
            ..Default::default()
        };
        let (_bus, reporter) = test_reporter();

        let summary = upload_artifacts(&sink, &reporter, "dep-1", &artifacts, 1).await;
        assert_eq!(summary, UploadSummary { uploaded: 1, failed: 1 });
    }
}
