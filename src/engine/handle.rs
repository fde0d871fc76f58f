//! Owned engine instance, executing inline or on a dedicated worker thread.

use std::sync::Arc;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc;
#[cfg(not(target_arch = "wasm32"))]
use std::thread;

#[cfg(not(target_arch = "wasm32"))]
use futures_channel::oneshot;

use crate::schema::{Execution, Observation, SimulationConfig};

use super::{Engine, EngineError, EngineFactory, Pending};

#[cfg(not(target_arch = "wasm32"))]
type Reply = oneshot::Sender<Result<Observation, EngineError>>;

/// Work sent to a worker thread, processed in order.
#[cfg(not(target_arch = "wasm32"))]
enum Job {
    Step(Reply),
    Reset(Box<SimulationConfig>, Reply),
    Dispose,
}

#[cfg(not(target_arch = "wasm32"))]
struct WorkerHandle {
    jobs: mpsc::Sender<Job>,
    thread: Option<thread::JoinHandle<()>>,
}

enum Backend<E> {
    Inline(E),
    #[cfg(not(target_arch = "wasm32"))]
    Worker(WorkerHandle),
}

/// Wall-clock timer for engine calls made on the calling thread.
#[cfg(not(target_arch = "wasm32"))]
struct Stopwatch(std::time::Instant);

#[cfg(not(target_arch = "wasm32"))]
impl Stopwatch {
    fn start() -> Self {
        Self(std::time::Instant::now())
    }

    fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// `std::time::Instant` is unavailable on wasm32; use the JS clock.
#[cfg(target_arch = "wasm32")]
struct Stopwatch(f64);

#[cfg(target_arch = "wasm32")]
impl Stopwatch {
    fn start() -> Self {
        Self(js_sys::Date::now())
    }

    fn elapsed(&self) -> Duration {
        let ms = (js_sys::Date::now() - self.0).max(0.0);
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or_default()
    }
}

/// Run an engine call inline, measuring its duration.
fn timed(call: impl FnOnce() -> Result<Observation, EngineError>) -> Pending<Observation> {
    let stopwatch = Stopwatch::start();
    let value = call();
    Pending::ready(value).with_duration(stopwatch.elapsed())
}

/// Exclusive owner of one engine instance.
///
/// Calls are answered with [`Pending`] completions. The engine is disposed
/// exactly once, either by [`dispose`](Self::dispose) or on drop.
pub struct EngineHandle<E: Engine> {
    backend: Option<Backend<E>>,
}

impl<E: Engine> EngineHandle<E> {
    /// Create an engine through `factory`, inline or on a new worker thread.
    ///
    /// The returned completion resolves with the engine's initial observation.
    pub fn launch<F>(
        factory: &Arc<F>,
        config: SimulationConfig,
        execution: Execution,
    ) -> (Self, Pending<Observation>)
    where
        F: EngineFactory<Engine = E>,
    {
        match execution {
            Execution::Inline => Self::launch_inline(factory.as_ref(), &config),
            #[cfg(not(target_arch = "wasm32"))]
            Execution::Worker => Self::launch_worker(Arc::clone(factory), config),
            #[cfg(target_arch = "wasm32")]
            Execution::Worker => {
                log::warn!("Worker execution unavailable on wasm32, running engine inline");
                Self::launch_inline(factory.as_ref(), &config)
            }
        }
    }

    fn launch_inline<F>(factory: &F, config: &SimulationConfig) -> (Self, Pending<Observation>)
    where
        F: EngineFactory<Engine = E>,
    {
        match factory.create(config) {
            Ok(engine) => {
                let observation = engine.observe();
                (
                    Self {
                        backend: Some(Backend::Inline(engine)),
                    },
                    Pending::ready(Ok(observation)),
                )
            }
            Err(e) => (Self { backend: None }, Pending::ready(Err(e))),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn launch_worker<F>(factory: Arc<F>, config: SimulationConfig) -> (Self, Pending<Observation>)
    where
        F: EngineFactory<Engine = E>,
    {
        let (ready_tx, ready) = Pending::channel();
        let (jobs, job_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("engine-worker".into())
            .spawn(move || worker_main(factory.as_ref(), &config, ready_tx, job_rx));

        match spawned {
            Ok(thread) => (
                Self {
                    backend: Some(Backend::Worker(WorkerHandle {
                        jobs,
                        thread: Some(thread),
                    })),
                },
                ready,
            ),
            Err(e) => (
                Self { backend: None },
                Pending::ready(Err(EngineError::Spawn(e))),
            ),
        }
    }

    /// Advance the engine one step.
    pub fn step(&mut self) -> Pending<Observation> {
        match &mut self.backend {
            Some(Backend::Inline(engine)) => timed(|| engine.step()),
            #[cfg(not(target_arch = "wasm32"))]
            Some(Backend::Worker(worker)) => worker.submit(Job::Step),
            None => Pending::ready(Err(EngineError::Disposed)),
        }
    }

    /// Reinitialize the engine in place with a new configuration.
    pub fn reset(&mut self, config: SimulationConfig) -> Pending<Observation> {
        match &mut self.backend {
            Some(Backend::Inline(engine)) => timed(|| engine.reset(&config)),
            #[cfg(not(target_arch = "wasm32"))]
            Some(Backend::Worker(worker)) => {
                worker.submit(|reply| Job::Reset(Box::new(config), reply))
            }
            None => Pending::ready(Err(EngineError::Disposed)),
        }
    }

    /// Release the engine. Queued worker calls are processed first.
    pub fn dispose(&mut self) {
        match self.backend.take() {
            Some(Backend::Inline(mut engine)) => {
                engine.dispose();
                log::debug!("Disposed inline engine");
            }
            #[cfg(not(target_arch = "wasm32"))]
            Some(Backend::Worker(mut worker)) => {
                // A worker that already exited has disposed its engine.
                let _ = worker.jobs.send(Job::Dispose);
                // Detach; the thread exits after draining its queue.
                drop(worker.thread.take());
                log::debug!("Disposed engine worker");
            }
            None => {}
        }
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.backend.is_none()
    }

    /// Whether calls run on a worker thread.
    pub fn is_worker(&self) -> bool {
        match self.backend {
            #[cfg(not(target_arch = "wasm32"))]
            Some(Backend::Worker(_)) => true,
            _ => false,
        }
    }
}

impl<E: Engine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl WorkerHandle {
    fn submit(&self, job: impl FnOnce(Reply) -> Job) -> Pending<Observation> {
        let (reply, pending) = Pending::channel();
        if self.jobs.send(job(reply)).is_err() {
            return Pending::ready(Err(EngineError::WorkerGone));
        }
        pending
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn worker_main<F: EngineFactory>(
    factory: &F,
    config: &SimulationConfig,
    ready: Reply,
    jobs: mpsc::Receiver<Job>,
) {
    let mut engine = match factory.create(config) {
        Ok(engine) => {
            let _ = ready.send(Ok(engine.observe()));
            engine
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    log::debug!("Engine worker started");

    while let Ok(job) = jobs.recv() {
        match job {
            Job::Step(reply) => {
                let _ = reply.send(engine.step());
            }
            Job::Reset(config, reply) => {
                let _ = reply.send(engine.reset(&config));
            }
            Job::Dispose => break,
        }
    }

    engine.dispose();
    log::debug!("Engine worker stopped");
}
