//! Mutex-guarded singleton
//!
//! For resources where even a discarded duplicate is unacceptable, such as a
//! database engine whose construction creates schemas. The first caller runs
//! the initializer while every concurrent caller waits for it; if it fails,
//! the singleton stays empty and the next caller tries again.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// One-time, fallible, blocking initialization of a shared instance
///
/// ```
/// use cellar_storage::Singleton;
///
/// static ENGINE: Singleton<String> = Singleton::new("engine");
///
/// let engine = ENGINE.connect(|| Ok::<_, std::io::Error>("mysql://stickre".to_string())).unwrap();
/// assert_eq!(*engine, "mysql://stickre");
/// assert!(ENGINE.is_connected());
/// ```
pub struct Singleton<T> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
}

impl<T> Singleton<T> {
    /// Create an unconnected singleton; `name` appears in log lines
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Get the instance, running `init` if this is the first successful call
    ///
    /// Concurrent callers block until the running initializer finishes.
    pub fn connect<F, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.cell
            .get_or_try_init(|| match init() {
                Ok(instance) => {
                    info!(singleton = self.name, "singleton initialized");
                    Ok(Arc::new(instance))
                }
                Err(e) => {
                    warn!(singleton = self.name, "singleton initialization failed");
                    Err(e)
                }
            })
            .map(Arc::clone)
    }

    /// Instance, if already connected
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Check if initialization has succeeded
    pub fn is_connected(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}
