use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::{channel::mpsc, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use super::cancel::{cancel_pair, CancelHandle, CancelToken};
use crate::{
    api::{BodyStream, FetchClient},
    domain::{
        CatalogEntry, CompletedDownload, DownloadResult, FetchError, FetchEvent, FetchPhase,
        Progress,
    },
    utils::file_name_from_url,
};

/// A fetch running in the background.
///
/// `events` yields phase and progress updates, then exactly one
/// [`FetchEvent::Finished`], then closes.
pub struct FetchHandle {
    pub cancel: CancelHandle,
    pub events: mpsc::UnboundedReceiver<FetchEvent>,
}

#[derive(Clone)]
pub struct Downloader {
    client: FetchClient,
}

impl Downloader {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Run one fetch on the tokio runtime, off the caller's task.
    pub fn start(&self, entry: CatalogEntry, destination: PathBuf) -> FetchHandle {
        let (cancel, token) = cancel_pair();
        let (tx, events) = mpsc::unbounded();
        let downloader = self.clone();

        tokio::spawn(async move {
            downloader
                .fetch(&entry, &destination, token, move |event| {
                    // The receiver going away only means nobody is watching anymore.
                    let _ = tx.unbounded_send(event);
                })
                .await;
        });

        FetchHandle { cancel, events }
    }

    /// Download `entry` into `destination`, reporting to `observer`.
    ///
    /// The observer sees progress in non-decreasing byte order and a single
    /// `Finished` event last. Either the target file is fully written or no
    /// file is left behind.
    pub async fn fetch<F>(
        &self,
        entry: &CatalogEntry,
        destination: &Path,
        mut cancel: CancelToken,
        mut observer: F,
    ) -> DownloadResult
    where
        F: FnMut(FetchEvent),
    {
        info!(
            name = entry.name,
            url = entry.url,
            destination = %destination.display(),
            "fetch started"
        );

        let result = self
            .run(entry, destination, &mut cancel, &mut observer)
            .await;

        match &result {
            Ok(done) => info!(
                bytes = done.bytes_written,
                path = %done.path.display(),
                "fetch completed"
            ),
            Err(FetchError::Cancelled) => info!(name = entry.name, "fetch cancelled"),
            Err(err) => warn!(name = entry.name, error = %err, "fetch failed"),
        }

        observer(FetchEvent::Finished(result.clone()));
        result
    }

    async fn run<F>(
        &self,
        entry: &CatalogEntry,
        destination: &Path,
        cancel: &mut CancelToken,
        observer: &mut F,
    ) -> DownloadResult
    where
        F: FnMut(FetchEvent),
    {
        observer(FetchEvent::Phase(FetchPhase::Validating));
        ensure_destination(destination).await?;

        let url = Url::parse(entry.url).map_err(|e| {
            FetchError::InvalidFileName(format!("{} is not a valid URL: {}", entry.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::NetworkError(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }
        let file_name = file_name_from_url(&url)?;
        let target = destination.join(&file_name);
        let staging = destination.join(staging_name(&file_name));

        observer(FetchEvent::Phase(FetchPhase::Connecting));
        let (total, stream) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            opened = self.client.download_file_stream(&url) => opened?,
        };
        debug!(?total, "connected");

        observer(FetchEvent::Phase(FetchPhase::Transferring));
        observer(FetchEvent::Progress(Progress { received: 0, total }));

        self.persist(stream, total, &staging, &target, cancel, observer)
            .await
    }

    /// Stream the body into `staging`, then move it over `target`.
    async fn persist<F>(
        &self,
        stream: BodyStream,
        total: Option<u64>,
        staging: &Path,
        target: &Path,
        cancel: &mut CancelToken,
        observer: &mut F,
    ) -> DownloadResult
    where
        F: FnMut(FetchEvent),
    {
        let bytes_written = match self
            .transfer(stream, total, staging, cancel, observer)
            .await
        {
            Ok(written) => written,
            Err(err) => {
                discard_staging(staging).await;
                return Err(err);
            }
        };

        if let Err(e) = tokio::fs::rename(staging, target).await {
            discard_staging(staging).await;
            return Err(FetchError::filesystem("Failed to move file into place", e));
        }

        Ok(CompletedDownload {
            bytes_written,
            path: target.to_path_buf(),
        })
    }

    async fn transfer<F>(
        &self,
        mut stream: BodyStream,
        total: Option<u64>,
        staging: &Path,
        cancel: &mut CancelToken,
        observer: &mut F,
    ) -> Result<u64, FetchError>
    where
        F: FnMut(FetchEvent),
    {
        let config = self.client.config();
        let chunk_size = config.chunk_size.max(1);

        let mut file = tokio::fs::File::create(staging)
            .await
            .map_err(|e| FetchError::filesystem("Failed to create file", e))?;
        let mut received: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                next = tokio::time::timeout(config.read_timeout, stream.next()) => next,
            };

            let chunk = match next {
                Err(_) => {
                    return Err(FetchError::NetworkError(format!(
                        "timed out after {:?} waiting for data",
                        config.read_timeout
                    )))
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(Some(Ok(chunk))) => chunk,
            };

            for piece in chunk.chunks(chunk_size) {
                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }
                file.write_all(piece)
                    .await
                    .map_err(|e| FetchError::filesystem("Write error", e))?;
                received += piece.len() as u64;
                observer(FetchEvent::Progress(Progress { received, total }));
            }
        }

        file.flush()
            .await
            .map_err(|e| FetchError::filesystem("Failed to flush file", e))?;
        file.sync_all()
            .await
            .map_err(|e| FetchError::filesystem("Failed to sync file", e))?;

        if let Some(expected) = total {
            if received != expected {
                return Err(FetchError::NetworkError(format!(
                    "truncated body: expected {} bytes, received {}",
                    expected, received
                )));
            }
        }

        Ok(received)
    }
}

/// Hidden sibling the body is written to before it is moved into place.
fn staging_name(file_name: &str) -> String {
    format!(".{}.part", file_name)
}

/// Make sure `dir` is a directory, creating it and its ancestors if missing.
async fn ensure_destination(dir: &Path) -> Result<(), FetchError> {
    if dir.as_os_str().is_empty() {
        return Err(FetchError::InvalidDestination(dir.to_path_buf()));
    }

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(FetchError::InvalidDestination(dir.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| FetchError::filesystem("Could not create directory", e))?;
            debug!(path = %dir.display(), "created destination directory");
            Ok(())
        }
        Err(e) => Err(FetchError::filesystem("Could not inspect destination", e)),
    }
}

async fn discard_staging(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial file"),
    }
}
