//! Process-wide, lazily-initialised model slots.
//!
//! Loading a Whisper model (or any other heavyweight backend) is expensive, so
//! each model lives in a [`LazyModel`]: the loader runs on first use, the
//! loaded value is shared read-only behind an `Arc`, and concurrent callers
//! that race on the first use block until the single load finishes.
//!
//! A `LazyModel` is an ordinary value.  It is built once in `main` and handed
//! to the pipeline as a collaborator, so tests can inject fakes instead.
//!
//! ```rust
//! use voice_eval::models::LazyModel;
//!
//! let model: LazyModel<String, String> = LazyModel::new("greeting", || Ok("hello".to_string()));
//! assert!(!model.is_loaded());
//! assert_eq!(model.get().unwrap().as_str(), "hello");
//! assert!(model.is_loaded());
//! model.teardown();
//! assert!(!model.is_loaded());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

type Loader<T, E> = Box<dyn Fn() -> Result<T, E> + Send + Sync>;

/// A model that is loaded at most once per process lifetime (until
/// [`teardown`](LazyModel::teardown)).
pub struct LazyModel<T, E> {
    name: &'static str,
    loader: Loader<T, E>,
    slot: Mutex<Option<Arc<T>>>,
}

impl<T, E> LazyModel<T, E> {
    /// Create an empty slot; `loader` is not called until [`get`](Self::get).
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Box::new(loader),
            slot: Mutex::new(None),
        }
    }

    /// Return the loaded model, loading it first if necessary.
    ///
    /// The slot lock is held for the duration of the load, so a second caller
    /// waits instead of loading a duplicate copy.  A failed load leaves the
    /// slot empty; the next call tries again.
    pub fn get(&self) -> Result<Arc<T>, E> {
        let mut slot = self.lock();
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        log::info!("loading model '{}'", self.name);
        let started = std::time::Instant::now();
        let model = Arc::new((self.loader)()?);
        log::info!(
            "model '{}' loaded in {} ms",
            self.name,
            started.elapsed().as_millis()
        );

        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Returns `true` once the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop the cached model.  Callers still holding an `Arc` keep their copy
    /// alive until they release it.
    pub fn teardown(&self) {
        if self.lock().take().is_some() {
            log::info!("model '{}' released", self.name);
        }
    }

    /// Name used in log lines.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<T>>> {
        // A panic inside a loader cannot leave a half-written slot behind.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_model(counter: Arc<AtomicUsize>) -> LazyModel<usize, String> {
        LazyModel::new("counter", move || {
            Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
        })
    }

    #[test]
    fn loads_once_for_repeated_gets() {
        let counter = Arc::new(AtomicUsize::new(0));
        let model = counting_model(Arc::clone(&counter));

        assert_eq!(*model.get().unwrap(), 1);
        assert_eq!(*model.get().unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_use_loads_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let model = Arc::new(counting_model(Arc::clone(&counter)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let model = Arc::clone(&model);
                std::thread::spawn(move || *model.get().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn teardown_forces_reload() {
        let counter = Arc::new(AtomicUsize::new(0));
        let model = counting_model(Arc::clone(&counter));

        model.get().unwrap();
        model.teardown();
        assert!(!model.is_loaded());
        assert_eq!(*model.get().unwrap(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&attempts);
        let model: LazyModel<u8, String> = LazyModel::new("broken", move || {
            a.fetch_add(1, Ordering::SeqCst);
            Err("missing file".into())
        });

        assert!(model.get().is_err());
        assert!(model.get().is_err());
        assert!(!model.is_loaded());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
