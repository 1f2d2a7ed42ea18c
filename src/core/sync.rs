//! Synchronization utilities for robust mutex handling
//!
//! Mutex poisoning is turned into domain errors here so that a panic inside
//! one critical section surfaces as an error on every later lock attempt
//! instead of a cascade of panics.

use std::sync::{LockResult, PoisonError};

/// Handle poisoned lock results with consistent error handling
///
/// Works for anything wrapped in a `LockResult`: plain `lock()` guards as
/// well as the guard handed back by `Condvar::wait_while`.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use handoff::core::sync::handle_mutex_poison;
/// use handoff::queue::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| QueueError::LockPoisoned { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| error_constructor(poison_description(&poison_err)))
}

fn poison_description<T>(poison_err: &PoisonError<T>) -> String {
    format!(
        "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {}",
        poison_err
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Condvar, Mutex};
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct TestError {
        message: String,
    }

    #[test]
    fn test_handle_mutex_poison_success() {
        let mutex = Arc::new(Mutex::new(42));
        let result = handle_mutex_poison(mutex.lock(), |msg| TestError { message: msg });

        assert!(result.is_ok());
        assert_eq!(*result.unwrap(), 42);
    }

    #[test]
    fn test_handle_mutex_poison_with_poisoned_mutex() {
        let mutex = Arc::new(Mutex::new(42));
        let mutex_clone = Arc::clone(&mutex);

        // Poison the mutex by panicking while holding the lock
        let _ = thread::spawn(move || {
            let _guard = mutex_clone.lock().unwrap();
            panic!("Intentional panic to poison mutex");
        })
        .join();

        let result = handle_mutex_poison(mutex.lock(), |msg| TestError { message: msg });

        assert!(result.is_err());
        let error = result.unwrap_err();
        assert!(error.message.contains("mutex poisoned"));
        assert!(error.message.contains("panic occurred"));
    }

    #[test]
    fn test_handle_mutex_poison_with_condvar_wait() {
        let pair = Arc::new((Mutex::new(true), Condvar::new()));
        let (mutex, condvar) = &*pair;

        // Predicate is already false, so wait_while returns immediately
        let guard = mutex.lock().unwrap();
        let guard = handle_mutex_poison(condvar.wait_while(guard, |ready| !*ready), |msg| {
            TestError { message: msg }
        })
        .unwrap();
        assert!(*guard);
    }
}
