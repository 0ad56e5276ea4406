pub mod client;
pub mod models;

pub use client::{BodyStream, FetchClient};
pub use models::FetchConfig;
