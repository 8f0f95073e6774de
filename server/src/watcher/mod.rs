//! Attachment watcher
//!
//! Periodically asks the server's own HTTP surface for unlabelled emails with
//! attachments and downloads them. Errors are logged and the loop carries on.

use std::time::Duration;

use gbridge_protocol::{ApiClient, EmailFilter, DOWNLOADED_LABEL};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Counts from one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WatchReport {
    pub found: usize,
    pub downloaded: usize,
    pub failed: usize,
}

fn pending_filter() -> EmailFilter {
    EmailFilter {
        has_attachment: true,
        exclude_label: Some(DOWNLOADED_LABEL.to_string()),
        ..Default::default()
    }
}

/// One pass: list pending emails, then download each one's attachments.
pub async fn run_once(client: &ApiClient) -> WatchReport {
    let mut report = WatchReport::default();

    let emails = match client.read_emails(&pending_filter()).await {
        Ok(resp) => resp.emails,
        Err(e) => {
            error!("Attachment check failed: {}", e);
            report.failed += 1;
            return report;
        }
    };
    report.found = emails.len();
    info!("Found {} email(s) with attachments to download", emails.len());

    for email in emails {
        match client.download_attachments(&email.id).await {
            Ok(resp) => {
                report.downloaded += 1;
                info!(
                    "Downloaded {} attachment(s) from email {}: {}",
                    resp.attachments.len(),
                    email.id,
                    resp.message
                );
            }
            Err(e) => {
                report.failed += 1;
                warn!("Download failed for email {}: {}", email.id, e);
            }
        }
    }

    report
}

/// Run `run_once` every `interval` until `shutdown` fires.
///
/// The period is fixed: it does not account for how long a pass took.
pub fn spawn_attachment_watcher(
    client: ApiClient,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Attachment watcher started (every {}s)", interval.as_secs());
        loop {
            tokio::select! {
                report = run_once(&client) => {
                    info!(found = report.found, downloaded = report.downloaded, failed = report.failed, "Attachment check finished");
                }
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => break,
            }
        }
        info!("Attachment watcher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_run_once_downloads_each_pending_email() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/gmail/read-emails")
            .match_header("x-api-key", "k")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("HasAttachment".into(), "true".into()),
                Matcher::UrlEncoded("ExcludeLabel".into(), "Downloaded".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"emails":[{"id":"m1","subject":"a","from":"x"},{"id":"m2","subject":"b","from":"y"}]}"#)
            .create_async()
            .await;
        let _ok = server
            .mock("GET", "/gmail/download-attachments/m1")
            .with_status(200)
            .with_body(r#"{"attachments":[{"filename":"a.pdf","file_path":"/tmp/a.pdf"}],"message":"done"}"#)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/gmail/download-attachments/m2")
            .with_status(500)
            .with_body(r#"{"detail":"Error downloading attachments: boom"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Some("k")).unwrap();
        let report = run_once(&client).await;

        list.assert_async().await;
        assert_eq!(report, WatchReport { found: 2, downloaded: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_list_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/read-emails")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"detail":"Token not found. Authenticate via /authenticate."}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Some("k")).unwrap();
        let report = run_once(&client).await;
        assert_eq!(report, WatchReport { found: 0, downloaded: 0, failed: 1 });
    }

    #[tokio::test]
    async fn test_watcher_stops_on_shutdown() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/gmail/read-emails")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"emails":[]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Some("k")).unwrap();
        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_attachment_watcher(client, Duration::from_secs(3600), rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }
}
