//! Where exchange-rate CSV data comes from

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;

    /// Reads the complete CSV payload. An `Err` means the source itself is
    /// unreadable and fails the whole load.
    async fn read(&self) -> Result<Vec<u8>>;
}
