use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::KnowledgeBase;

type Loader = Box<dyn Fn() -> Result<KnowledgeBase> + Send + Sync>;

/// Lazily loaded, time-limited handle to the knowledge base.
///
/// The first [`get`](Self::get) runs the loader; later calls hand out the same
/// `Arc` until `ttl` has elapsed, at which point the files are read again. If a
/// refresh fails while a previous knowledge base is cached, the previous one keeps
/// being served and the refresh is retried on the next call.
pub struct KnowledgeBaseCache {
    loader: Loader,
    ttl: Duration,
    cached: Option<Cached>,
}

struct Cached {
    loaded_at: Instant,
    value: Arc<KnowledgeBase>,
}

impl KnowledgeBaseCache {
    #[inline]
    pub fn new<F>(ttl: Duration, loader: F) -> Self
    where
        F: Fn() -> Result<KnowledgeBase> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            ttl,
            cached: None,
        }
    }

    #[inline]
    pub fn get(&mut self) -> Result<Arc<KnowledgeBase>> {
        let ttl = self.ttl;
        if let Some(fresh) = self.cached.as_ref().filter(|c| c.loaded_at.elapsed() < ttl) {
            return Ok(Arc::clone(&fresh.value));
        }

        let is_refresh = self.cached.is_some();
        debug!(
            "{} knowledge base",
            if is_refresh { "Refreshing" } else { "Loading" }
        );

        match (self.loader)() {
            Ok(knowledge_base) => {
                let value = Arc::new(knowledge_base);
                self.cached = Some(Cached {
                    loaded_at: Instant::now(),
                    value: Arc::clone(&value),
                });
                if is_refresh {
                    info!("Knowledge base refreshed");
                }
                Ok(value)
            }
            Err(e) => match &self.cached {
                Some(stale) => {
                    warn!("Knowledge base refresh failed, serving cached copy: {:#}", e);
                    Ok(Arc::clone(&stale.value))
                }
                None => Err(e),
            },
        }
    }

    /// Force the next [`get`](Self::get) to reload
    #[inline]
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
