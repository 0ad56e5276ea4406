pub mod cancel;
pub mod download_coordinator;

pub use cancel::CancelHandle;
pub use download_coordinator::Downloader;
