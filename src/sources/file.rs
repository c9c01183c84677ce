use crate::core::RateSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the rate CSV from the local file system.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RateSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<Vec<u8>> {
        debug!("Reading exchange rates from {}", self.path.display());
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read exchange rates: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_file_contents() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "REF_DATE,GEO\n2023-05-31,Canada\n")?;

        let source = FileSource::new(file.path());
        let bytes = source.read().await?;
        assert_eq!(bytes, b"REF_DATE,GEO\n2023-05-31,Canada\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = FileSource::new(dir.path().join("missing.csv"));

        let err = source.read().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read exchange rates"));
        assert!(source.describe().ends_with("missing.csv"));
    }
}
