//! Document sources returning raw markup

use crate::error::{EtlError, Result};
use std::fs;

/// Provider of the raw markup the extractor parses
///
/// A source is asked exactly once per run. Implementations do not retry.
pub trait DocumentSource {
    /// Fetch the document identified by `location`
    fn fetch(&self, location: &str) -> Result<String>;

    /// Short name used in log output
    fn name(&self) -> &str;
}

/// Reads markup from a local file; `location` is the file path
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn fetch(&self, location: &str) -> Result<String> {
        fs::read_to_string(location).map_err(|e| EtlError::SourceUnavailable {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Returns a fixed document whatever the location
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    markup: String,
}

impl InMemorySource {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}

impl DocumentSource for InMemorySource {
    fn fetch(&self, _location: &str) -> Result<String> {
        Ok(self.markup.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(feature = "http")]
pub use http::HttpSource;

#[cfg(feature = "http")]
mod http {
    use super::DocumentSource;
    use crate::error::{EtlError, Result};
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Fetches markup with a single blocking HTTP GET
    pub struct HttpSource {
        client: Client,
    }

    impl HttpSource {
        /// Create a new HTTP document source
        pub fn new() -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(concat!("bank-etl/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| EtlError::SourceUnavailable {
                    location: "http client".to_string(),
                    reason: e.to_string(),
                })?;

            Ok(Self { client })
        }
    }

    impl DocumentSource for HttpSource {
        fn fetch(&self, location: &str) -> Result<String> {
            let unavailable = |reason: String| EtlError::SourceUnavailable {
                location: location.to_string(),
                reason,
            };

            let response = self
                .client
                .get(location)
                .send()
                .map_err(|e| unavailable(format!("HTTP request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(unavailable(format!("server returned {}", response.status())));
            }

            response
                .text()
                .map_err(|e| unavailable(format!("failed to read response: {}", e)))
        }

        fn name(&self) -> &str {
            "http"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_reads_markup() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<table><tbody></tbody></table>").unwrap();

        let markup = FileSource
            .fetch(file.path().to_str().unwrap())
            .unwrap();
        assert!(markup.contains("<tbody>"));
    }

    #[test]
    fn test_file_source_missing_file() {
        let err = FileSource.fetch("/nonexistent/banks.html").unwrap_err();
        assert!(matches!(err, EtlError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_in_memory_source_ignores_location() {
        let source = InMemorySource::new("<p>hi</p>");
        assert_eq!(source.fetch("anything").unwrap(), "<p>hi</p>");
        assert_eq!(source.name(), "memory");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_source_creation() {
        assert!(HttpSource::new().is_ok());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_source_rejects_invalid_url() {
        let source = HttpSource::new().unwrap();
        let err = source.fetch("not a url").unwrap_err();
        assert!(matches!(err, EtlError::SourceUnavailable { .. }));
    }
}
