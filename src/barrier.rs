//! One-shot initialization barrier for the rate table.
//!
//! The load is spawned once at startup. Every caller awaits the same shared
//! future, so nothing touches the table before it is complete, and all
//! waiters are released together when it is.

use crate::core::{RateSource, RateTable};
use crate::loader;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tracing::error;

/// Cheap, cloneable handle to the table that is (or will be) loaded.
#[derive(Clone)]
pub struct RatesHandle {
    inner: Shared<BoxFuture<'static, Arc<RateTable>>>,
}

impl RatesHandle {
    /// Starts loading from `source` on the runtime and returns immediately.
    ///
    /// An unreadable source is logged and published as an empty table, so
    /// waiters are always released.
    pub fn spawn(source: Arc<dyn RateSource>) -> Self {
        let task = tokio::spawn(async move { loader::load(source.as_ref()).await });

        let inner = async move {
            let table = match task.await {
                Ok(Ok(table)) => table,
                Ok(Err(e)) => {
                    error!("Failed to load exchange rates: {e:#}");
                    RateTable::default()
                }
                Err(e) => {
                    error!("Exchange rate load task failed: {e}");
                    RateTable::default()
                }
            };
            Arc::new(table)
        }
        .boxed()
        .shared();

        // Drive the barrier even when no request arrives, so `peek` turns
        // `Some` as soon as loading ends.
        tokio::spawn(inner.clone());

        Self { inner }
    }

    /// Wraps a table that is already built.
    pub fn ready(table: RateTable) -> Self {
        Self {
            inner: futures::future::ready(Arc::new(table)).boxed().shared(),
        }
    }

    /// Waits for the load to finish and returns the table.
    pub async fn table(&self) -> Arc<RateTable> {
        self.inner.clone().await
    }

    /// The table if loading has finished, without waiting.
    pub fn peek(&self) -> Option<Arc<RateTable>> {
        self.inner.peek().cloned()
    }
}
