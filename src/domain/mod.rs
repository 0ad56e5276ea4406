pub mod catalog;
pub mod error;
pub mod model;

pub use catalog::{Catalog, CatalogEntry};
pub use error::FetchError;
pub use model::{CompletedDownload, DownloadResult, FetchEvent, FetchPhase, Progress};
