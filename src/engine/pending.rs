//! Completion of an engine call that may still be running.

use std::time::Duration;

use futures_channel::oneshot;

use super::EngineError;

/// Result of an engine call, resolved inline or by a worker.
///
/// A worker that drops the reply (it panicked or exited) resolves the call
/// with [`EngineError::WorkerGone`].
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, EngineError>>,
    value: Option<Result<T, EngineError>>,
    duration: Option<Duration>,
}

impl<T> Pending<T> {
    pub(crate) fn channel() -> (oneshot::Sender<Result<T, EngineError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx,
                value: None,
                duration: None,
            },
        )
    }

    /// Already resolved call.
    pub fn ready(value: Result<T, EngineError>) -> Self {
        let (_tx, rx) = oneshot::channel();
        Self {
            rx,
            value: Some(value),
            duration: None,
        }
    }

    /// Record how long the engine spent on the call.
    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Time spent inside the engine, when the call was measured where it ran.
    #[inline]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Take the result if the call has resolved.
    pub fn try_take(&mut self) -> Option<Result<T, EngineError>> {
        if let Some(value) = self.value.take() {
            return Some(value);
        }
        match self.rx.try_recv() {
            Ok(Some(value)) => Some(value),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(EngineError::WorkerGone)),
        }
    }

    /// Whether [`try_take`](Self::try_take) would return a result.
    pub fn is_resolved(&mut self) -> bool {
        if self.value.is_none() {
            self.value = self.try_take();
        }
        self.value.is_some()
    }

    /// Block the calling thread until the call resolves, keeping the result
    /// for the next [`try_take`](Self::try_take).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn block(&mut self) {
        if self.value.is_none() {
            let value = pollster::block_on(&mut self.rx).unwrap_or(Err(EngineError::WorkerGone));
            self.value = Some(value);
        }
    }

    /// Block until the call resolves and return its result.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait(mut self) -> Result<T, EngineError> {
        self.block();
        self.value.take().unwrap_or(Err(EngineError::WorkerGone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready() {
        let mut pending = Pending::ready(Ok(3));
        assert!(pending.is_resolved());
        assert_eq!(pending.try_take().unwrap().unwrap(), 3);
    }

    #[test]
    fn test_duration_is_kept() {
        let pending = Pending::ready(Ok(1)).with_duration(Duration::from_millis(4));
        assert_eq!(pending.duration(), Some(Duration::from_millis(4)));
        assert_eq!(Pending::<u8>::ready(Ok(1)).duration(), None);
    }

    #[test]
    fn test_resolves_later() {
        let (tx, mut pending) = Pending::channel();
        assert!(pending.try_take().is_none());
        assert!(!pending.is_resolved());

        tx.send(Ok("done")).unwrap();
        assert!(pending.is_resolved());
        assert_eq!(pending.try_take().unwrap().unwrap(), "done");
    }

    #[test]
    fn test_dropped_sender_is_worker_gone() {
        let (tx, mut pending) = Pending::<u32>::channel();
        drop(tx);
        assert!(matches!(
            pending.try_take(),
            Some(Err(EngineError::WorkerGone))
        ));
    }

    #[test]
    fn test_wait_across_threads() {
        let (tx, pending) = Pending::channel();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            tx.send(Ok(7u64)).unwrap();
        });
        assert_eq!(pending.wait().unwrap(), 7);
        sender.join().unwrap();
    }
}
