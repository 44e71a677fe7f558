//! Swappable Serving Context

use crate::serve::ServingContext;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Shared handle to the active serving context.
///
/// Requests take an `Arc` snapshot and run against it to completion; a reload
/// swaps the whole context at once, so no request ever observes a vocabulary
/// from one bundle paired with a schema from another.
#[derive(Clone)]
pub struct ContextHandle {
    inner: Arc<RwLock<Arc<ServingContext>>>,
}

impl ContextHandle {
    pub fn new(context: ServingContext) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(context))),
        }
    }

    /// Snapshot of the active context
    pub fn current(&self) -> Arc<ServingContext> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `context`, returning the one it replaced
    pub fn replace(&self, context: ServingContext) -> Arc<ServingContext> {
        let next = Arc::new(context);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        info!(
            "Serving context swapped: {} -> {}",
            previous.version(),
            guard.version()
        );
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::{CanonicalSchema, CategoryColumn, Vocabulary};
    use inference_engine::LinearModel;
    use std::thread;

    fn context(version: &str) -> ServingContext {
        let vocabulary = Vocabulary::new(
            vec!["TotalCharges".into()],
            vec![CategoryColumn::new("gender", vec!["Female".into(), "Male".into()])],
        );
        let schema = CanonicalSchema::from_vocabulary(&vocabulary);
        let model = LinearModel::new(vec![0.0, 1.0], 0.0);
        ServingContext::new(vocabulary, schema, Box::new(model), version).unwrap()
    }

    #[test]
    fn test_replace_returns_previous() {
        let handle = ContextHandle::new(context("v1"));
        let snapshot = handle.current();

        let previous = handle.replace(context("v2"));
        assert_eq!(previous.version(), "v1");
        assert_eq!(handle.current().version(), "v2");
        // Snapshots taken before the swap stay valid
        assert_eq!(snapshot.version(), "v1");
    }

    #[test]
    fn test_concurrent_readers_see_whole_contexts() {
        let handle = ContextHandle::new(context("v1"));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let ctx = handle.current();
                        assert!(matches!(ctx.version(), "v1" | "v2"));
                        assert_eq!(ctx.schema().len(), 2);
                    }
                })
            })
            .collect();

        handle.replace(context("v2"));
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(handle.current().version(), "v2");
    }
}
