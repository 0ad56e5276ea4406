use std::time::Duration;

/// Configuration for the fetch client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Largest slice written to disk (and reported) at once
    pub chunk_size: usize,
    pub connect_timeout: Duration,
    /// Longest wait for the response headers, and for each piece of the body
    pub read_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            connect_timeout: Duration::from_secs(20),
            read_timeout: Duration::from_secs(20),
        }
    }
}
