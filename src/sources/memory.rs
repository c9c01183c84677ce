use crate::core::RateSource;
use anyhow::Result;
use async_trait::async_trait;

/// CSV data already held in memory, e.g. embedded in a binary or built by a test.
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: &str, data: impl Into<Vec<u8>>) -> Self {
        MemorySource {
            name: name.to_string(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl RateSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}
