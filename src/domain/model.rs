use std::path::PathBuf;

use super::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Validating,
    Connecting,
    Transferring,
    Completed,
    Failed,
    Cancelled,
}

impl FetchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FetchPhase::Completed | FetchPhase::Failed | FetchPhase::Cancelled
        )
    }

    /// Terminal phase an invocation ends in, given its result.
    pub fn from_result(result: &DownloadResult) -> Self {
        match result {
            Ok(_) => FetchPhase::Completed,
            Err(FetchError::Cancelled) => FetchPhase::Cancelled,
            Err(_) => FetchPhase::Failed,
        }
    }

    /// True while a fetch is in flight and the start action must stay disabled.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            FetchPhase::Validating | FetchPhase::Connecting | FetchPhase::Transferring
        )
    }
}

/// Bytes received so far, plus the advertised size when the server sent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub received: u64,
    pub total: Option<u64>,
}

impl Progress {
    /// Completed share in `0.0..=1.0`, or `None` when the size is unknown.
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some((self.received as f32 / total as f32).min(1.0)),
            Some(_) => Some(1.0),
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedDownload {
    pub bytes_written: u64,
    pub path: PathBuf,
}

pub type DownloadResult = Result<CompletedDownload, FetchError>;

/// Everything a running fetch reports to its observer, in delivery order.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Phase(FetchPhase),
    Progress(Progress),
    /// Always the last event of an invocation.
    Finished(DownloadResult),
}
