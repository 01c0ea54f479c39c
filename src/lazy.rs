//! Fallible lazy initialisation.
//!
//! Stateful resources such as the transcript cache must not touch the
//! filesystem when the server starts. [`Lazy`] holds the constructor and runs
//! it on first access. A failed initialisation is not remembered, so the next
//! access tries again.

use tokio::sync::OnceCell;

type Init<T, E> = Box<dyn Fn() -> Result<T, E> + Send + Sync>;

/// A value created on first use by a fallible constructor.
pub struct Lazy<T, E> {
    cell: OnceCell<T>,
    init: Init<T, E>,
}

impl<T, E> Lazy<T, E> {
    /// Creates an uninitialised value with the given constructor.
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Box::new(init),
        }
    }

    /// Returns the value, running the constructor if this is the first access.
    ///
    /// # Errors
    ///
    /// Returns the constructor's error. The value stays uninitialised.
    pub async fn get(&self) -> Result<&T, E> {
        self.cell
            .get_or_try_init(|| async { (self.init)() })
            .await
    }

    /// Returns `true` once the constructor has succeeded.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T: std::fmt::Debug, E> std::fmt::Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy").field("value", &self.cell.get()).finish()
    }
}
