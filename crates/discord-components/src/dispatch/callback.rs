use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use tokio::sync::Mutex;
use tracing::trace;

use super::Filter;
use crate::interaction::Interaction;

/// Handler logic for a decoded interaction
#[async_trait::async_trait]
pub trait ComponentHandler: Send + Sync + 'static {
    /// Handle an interaction
    ///
    /// # Errors
    /// Errors are logged by the dispatcher and do not affect other handlers.
    async fn handle(&self, int: Arc<Interaction>) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl<F, R> ComponentHandler for F
where
    F: Fn(Arc<Interaction>) -> R + Send + Sync + 'static,
    R: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, int: Arc<Interaction>) -> anyhow::Result<()> { self(int).await }
}

pub(super) struct Callback {
    pub handler: Arc<dyn ComponentHandler>,
    pub uses: Option<u32>,
    pub filter: Option<Filter>,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("uses", &self.uses)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Persistent callbacks keyed by custom ID
#[derive(Debug, Default)]
pub(super) struct Callbacks(Mutex<HashMap<String, Callback>>);

impl Callbacks {
    pub async fn insert(&self, custom_id: String, callback: Callback) {
        if self.0.lock().await.insert(custom_id, callback).is_some() {
            trace!("Replaced existing callback");
        }
    }

    pub async fn remove(&self, custom_id: &str) -> bool {
        self.0.lock().await.remove(custom_id).is_some()
    }

    /// Consume one use of the callback for this interaction's custom ID,
    /// returning its handler if it should run
    pub async fn take(&self, int: &Interaction) -> Option<Arc<dyn ComponentHandler>> {
        let id = int.custom_id();
        let mut map = self.0.lock().await;
        let cb = map.get_mut(id)?;

        if cb.uses == Some(0) {
            trace!(custom_id = id, "Removing exhausted callback");
            map.remove(id);
            return None;
        }

        if !cb.filter.as_ref().map_or(true, |f| f.matches(int)) {
            trace!(custom_id = id, "Callback filter rejected interaction");
            return None;
        }

        let handler = Arc::clone(&cb.handler);
        let exhausted = cb.uses.as_mut().is_some_and(|n| {
            *n -= 1;
            *n == 0
        });

        if exhausted {
            map.remove(id);
        }

        Some(handler)
    }
}
