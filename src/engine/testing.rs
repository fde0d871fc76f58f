//! Instrumented engine for exercising handles and run loops.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::schema::{GridSnapshot, Observation, SimulationConfig};

use super::{Engine, EngineError, EngineFactory};

/// Grid edge of mock observations.
pub const MOCK_GRID: usize = 4;

/// Counters shared between a factory, its engines and the test.
#[derive(Debug, Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub steps: AtomicUsize,
    pub resets: AtomicUsize,
    pub disposed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Spin until a worker has disposed its engine.
    pub fn wait_disposed(&self) {
        for _ in 0..500 {
            if self.disposed.load(Ordering::SeqCst) > 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

#[derive(Default)]
pub struct MockFactory {
    pub counters: Arc<Counters>,
    pub fail_create: bool,
    pub panic_on_step: bool,
    /// Step number (1-based) that fails.
    pub fail_step: Option<u64>,
    /// Each step waits for one message when set.
    pub gate: Mutex<Option<mpsc::Receiver<()>>>,
    /// Time each step spends inside the engine.
    pub step_sleep: Duration,
}

pub fn gated_factory() -> (MockFactory, mpsc::Sender<()>) {
    let (tx, rx) = mpsc::channel();
    let factory = MockFactory {
        gate: Mutex::new(Some(rx)),
        ..Default::default()
    };
    (factory, tx)
}

pub struct MockEngine {
    counters: Arc<Counters>,
    step: u64,
    panic_on_step: bool,
    fail_step: Option<u64>,
    gate: Option<mpsc::Receiver<()>>,
    step_sleep: Duration,
    disposed: bool,
}

impl EngineFactory for MockFactory {
    type Engine = MockEngine;

    fn create(&self, _config: &SimulationConfig) -> Result<MockEngine, EngineError> {
        if self.fail_create {
            return Err(EngineError::Step("create failed".into()));
        }
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().ok().and_then(|mut g| g.take());
        Ok(MockEngine {
            counters: Arc::clone(&self.counters),
            step: 0,
            panic_on_step: self.panic_on_step,
            fail_step: self.fail_step,
            gate,
            step_sleep: self.step_sleep,
            disposed: false,
        })
    }
}

impl Engine for MockEngine {
    fn step(&mut self) -> Result<Observation, EngineError> {
        let counters = &self.counters;
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        if !self.step_sleep.is_zero() {
            std::thread::sleep(self.step_sleep);
        }
        if self.panic_on_step {
            panic!("mock engine panic");
        }

        self.step += 1;
        counters.steps.fetch_add(1, Ordering::SeqCst);
        counters.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_step == Some(self.step) {
            return Err(EngineError::Step(format!("step {} failed", self.step)));
        }
        Ok(self.observe())
    }

    fn reset(&mut self, _config: &SimulationConfig) -> Result<Observation, EngineError> {
        self.counters.resets.fetch_add(1, Ordering::SeqCst);
        self.step = 0;
        Ok(self.observe())
    }

    /// Cell `step % 16` is alive; the active count cycles through `step % 5`.
    fn observe(&self) -> Observation {
        let len = MOCK_GRID * MOCK_GRID;
        let mut cells = vec![false; len];
        cells[self.step as usize % len] = true;
        Observation {
            step: self.step,
            evaluations: self.step * 10,
            evaluations_delta: 10,
            max_fitness: Some(self.step as f32),
            active_cells: self.step as usize % 5,
            grid: Some(GridSnapshot {
                width: MOCK_GRID,
                height: MOCK_GRID,
                cells,
            }),
            ..Default::default()
        }
    }

    fn dispose(&mut self) {
        assert!(!self.disposed, "engine disposed twice");
        self.disposed = true;
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
    }
}
