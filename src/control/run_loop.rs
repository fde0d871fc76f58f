//! Run-loop state machine.
//!
//! A [`RunLoop`] owns one engine handle and drives it through
//! `Uninitialized -> Initializing -> Idle <-> Stepping -> Destroying ->
//! Uninitialized`. It is cooperative: [`RunLoop::dispatch`] applies commands
//! and [`RunLoop::pump`] collects engine completions and starts due steps.
//! Both take `now`, the caller's monotonic clock as an offset from an
//! arbitrary origin. At most one engine call is in flight at any time.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{EngineError, EngineFactory, EngineHandle, Pending};
use crate::schema::{ControlConfig, Metric, Observation, SimulationConfig};

use super::command::{Command, CommandError};
use super::scheduler::AutoPlayScheduler;
use super::series::{PlotUpdate, StatisticsAggregator, TimeSeries};
use super::state::{Phase, RunState};
use super::tracker::ActivationMap;

/// Callback fired with every new state snapshot.
pub type StateListener = Box<dyn Fn(&Arc<RunState>) + Send>;

struct InFlight {
    pending: Pending<Observation>,
    started: Duration,
}

/// Drives one simulation engine from presentation-layer commands.
pub struct RunLoop<F: EngineFactory> {
    factory: Arc<F>,
    control: ControlConfig,
    state: Arc<RunState>,
    handle: Option<EngineHandle<F::Engine>>,
    pending_init: Option<Pending<Observation>>,
    in_flight: Option<InFlight>,
    queued_init: Option<SimulationConfig>,
    scheduler: AutoPlayScheduler,
    activation: ActivationMap,
    stats: StatisticsAggregator,
    listeners: Vec<StateListener>,
    next_instance: u64,
}

impl<F: EngineFactory> RunLoop<F> {
    pub fn new(factory: F, control: ControlConfig) -> Self {
        Self::with_shared_factory(Arc::new(factory), control)
    }

    pub fn with_shared_factory(factory: Arc<F>, control: ControlConfig) -> Self {
        let stats = StatisticsAggregator::new(&control.series, control.history_len);
        Self {
            factory,
            control,
            state: Arc::new(RunState::default()),
            handle: None,
            pending_init: None,
            in_flight: None,
            queued_init: None,
            scheduler: AutoPlayScheduler::new(),
            activation: ActivationMap::new(),
            stats,
            listeners: Vec::new(),
            next_instance: 1,
        }
    }

    /// Current state snapshot.
    #[inline]
    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    pub fn control(&self) -> &ControlConfig {
        &self.control
    }

    pub fn series(&self, metric: Metric) -> Option<&TimeSeries> {
        self.stats.series(metric)
    }

    pub fn activation_map(&self) -> &ActivationMap {
        &self.activation
    }

    /// Drain plot updates produced since the last call.
    pub fn take_plot_updates(&mut self) -> Vec<PlotUpdate> {
        self.stats.take_updates()
    }

    /// When the next auto-play tick is due, if one is armed.
    pub fn next_wakeup(&self) -> Option<Duration> {
        self.scheduler.deadline()
    }

    /// Whether an engine call is outstanding.
    pub fn is_waiting_on_engine(&self) -> bool {
        self.pending_init.is_some() || self.in_flight.is_some()
    }

    pub fn on_state_replaced(&mut self, listener: impl Fn(&Arc<RunState>) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Apply a command. Returns `false` when it was ignored for the current phase.
    pub fn dispatch(&mut self, command: Command, now: Duration) -> bool {
        let phase = self.state.phase;
        let name = command.name();
        let accepted = match (command, phase) {
            (Command::Initialize(config), Phase::Uninitialized) => {
                self.begin_init(config);
                true
            }
            (Command::Initialize(config), Phase::Initializing) => {
                log::info!("Superseding pending initialization");
                self.release_engine();
                self.begin_init(config);
                true
            }
            (Command::Initialize(config), Phase::Destroying) => {
                log::info!("Initialization queued until teardown completes");
                self.queued_init = Some(config);
                true
            }
            (Command::Restart(config), Phase::Idle) => {
                self.begin_restart(config);
                true
            }
            (Command::RequestStep, Phase::Idle | Phase::Stepping) => {
                if !self.state.step_requested {
                    self.transition(|s| s.step_requested = true);
                }
                true
            }
            (Command::ToggleAutoRun, Phase::Idle | Phase::Stepping) => {
                let auto_run = !self.state.auto_run;
                if !auto_run {
                    self.scheduler.cancel();
                } else if phase == Phase::Idle {
                    self.scheduler.arm(now);
                }
                self.transition(|s| s.auto_run = auto_run);
                log::debug!("Auto-run {}", if auto_run { "on" } else { "off" });
                true
            }
            (Command::Reset, Phase::Initializing | Phase::Idle | Phase::Stepping) => {
                self.begin_teardown();
                true
            }
            _ => false,
        };

        if !accepted {
            log::warn!("Ignoring {name} command in phase {phase:?}");
        }
        accepted
    }

    /// Parse and apply a JSON command. Unknown command types are logged and
    /// ignored; malformed commands are returned as errors.
    pub fn dispatch_json(&mut self, json: &str, now: Duration) -> Result<bool, CommandError> {
        match Command::from_json(json) {
            Ok(command) => Ok(self.dispatch(command, now)),
            Err(CommandError::UnknownType(kind)) => {
                log::warn!("Ignoring unknown command type {kind:?}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Collect engine completions and start a step if one is due.
    pub fn pump(&mut self, now: Duration) {
        self.poll_init(now);
        self.poll_step(now);
        self.maybe_start_step(now);
    }

    /// Block until the outstanding engine call, if any, has resolved.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait_for_engine(&mut self) {
        if let Some(pending) = self.pending_init.as_mut() {
            pending.block();
        } else if let Some(flight) = self.in_flight.as_mut() {
            flight.pending.block();
        }
    }

    /// Pump until `done` holds for the state or nothing else can happen,
    /// blocking on engine calls and sleeping until armed ticks.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_blocking(
        &mut self,
        clock: impl Fn() -> Duration,
        mut done: impl FnMut(&RunState) -> bool,
    ) {
        loop {
            self.pump(clock());
            if done(&self.state) {
                return;
            }
            if self.is_waiting_on_engine() {
                self.wait_for_engine();
                continue;
            }
            match self.next_wakeup() {
                Some(at) => std::thread::sleep(at.saturating_sub(clock())),
                None if self.state.step_requested && self.state.phase == Phase::Idle => {}
                None => return,
            }
        }
    }

    fn begin_init(&mut self, config: SimulationConfig) {
        let instance = self.next_instance;
        self.next_instance += 1;

        let (handle, pending) =
            EngineHandle::launch(&self.factory, config.clone(), self.control.execution);
        self.handle = Some(handle);
        self.pending_init = Some(pending);
        self.activation.clear();
        self.stats.clear();

        log::info!("Initializing engine instance {instance}");
        self.replace(RunState {
            phase: Phase::Initializing,
            seed: config.ca.seed,
            instance,
            ..Default::default()
        });
    }

    fn begin_restart(&mut self, config: SimulationConfig) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        let pending = handle.reset(config.clone());
        self.pending_init = Some(pending);
        self.scheduler.cancel();
        self.activation.clear();
        self.stats.clear();

        log::info!("Restarting engine instance {}", self.state.instance);
        let instance = self.state.instance;
        self.replace(RunState {
            phase: Phase::Initializing,
            seed: config.ca.seed,
            instance,
            ..Default::default()
        });
    }

    fn begin_teardown(&mut self) {
        self.scheduler.cancel();
        self.pending_init = None;
        self.activation.clear();
        self.transition(|s| {
            s.phase = Phase::Destroying;
            s.step_requested = false;
            s.last_observation = None;
            s.cells_ever_active = 0;
        });

        if self.in_flight.is_none() {
            self.finish_teardown();
        } else {
            log::debug!("Teardown waiting for in-flight step");
        }
    }

    fn finish_teardown(&mut self) {
        self.in_flight = None;
        self.release_engine();
        self.activation.clear();
        self.stats.clear();

        let instance = self.state.instance;
        log::info!("Engine instance {instance} destroyed");
        self.replace(RunState {
            instance,
            ..Default::default()
        });

        if let Some(config) = self.queued_init.take() {
            self.begin_init(config);
        }
    }

    fn fail(&mut self, error: EngineError) {
        let instance = self.state.instance;
        log::error!("Engine instance {instance} failed: {error}");

        self.scheduler.cancel();
        self.pending_init = None;
        self.in_flight = None;
        self.release_engine();
        self.activation.clear();
        self.stats.clear();

        self.replace(RunState {
            instance,
            error: Some(error.to_string()),
            ..Default::default()
        });
    }

    fn release_engine(&mut self) {
        self.pending_init = None;
        if let Some(mut handle) = self.handle.take() {
            handle.dispose();
        }
    }

    fn poll_init(&mut self, now: Duration) {
        let Some(pending) = self.pending_init.as_mut() else {
            return;
        };
        let Some(result) = pending.try_take() else {
            return;
        };
        self.pending_init = None;

        match result {
            Ok(observation) => {
                if let Some(grid) = &observation.grid {
                    self.activation.record(grid);
                }
                let auto_run = self.control.auto_run;
                if auto_run {
                    self.scheduler.arm(now);
                }
                let cells_ever_active = self.activation.count();
                log::info!("Engine instance {} ready", self.state.instance);
                self.transition(|s| {
                    s.phase = Phase::Idle;
                    s.auto_run = auto_run;
                    s.last_observation = Some(Arc::new(observation));
                    s.cells_ever_active = cells_ever_active;
                });
            }
            Err(e) => self.fail(e),
        }
    }

    fn poll_step(&mut self, now: Duration) {
        let Some(flight) = self.in_flight.as_mut() else {
            return;
        };
        let Some(result) = flight.pending.try_take() else {
            return;
        };
        let started = flight.started;
        let measured = flight.pending.duration();
        self.in_flight = None;

        if self.state.phase == Phase::Destroying {
            log::debug!("Discarding step result after reset");
            self.finish_teardown();
            return;
        }

        match result {
            Ok(observation) => {
                // Worker calls are timed on the caller's clock, queueing included.
                let duration = measured.unwrap_or_else(|| now.saturating_sub(started));
                self.apply_step(observation, duration, now)
            }
            Err(e) => self.fail(e),
        }
    }

    fn apply_step(&mut self, observation: Observation, duration: Duration, now: Duration) {
        if let Some(grid) = &observation.grid {
            self.activation.record(grid);
        }
        let cells_ever_active = self.activation.count();
        self.stats.push(&observation, cells_ever_active);

        if self.state.auto_run {
            self.scheduler.arm(now.saturating_add(self.control.step_delay()));
        }

        log::debug!(
            "Step {} done in {:?}, {} active cells",
            observation.step,
            duration,
            observation.active_cells
        );
        self.transition(|s| {
            s.phase = Phase::Idle;
            s.busy = false;
            s.steps_executed += 1;
            s.elapsed_run_time += duration;
            s.cells_ever_active = cells_ever_active;
            s.last_observation = Some(Arc::new(observation));
        });
    }

    fn maybe_start_step(&mut self, now: Duration) {
        if self.state.phase != Phase::Idle || self.in_flight.is_some() {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        let due = self.state.auto_run && self.scheduler.take_due(now);
        if !due && !self.state.step_requested {
            return;
        }

        self.scheduler.cancel();
        let pending = handle.step();
        self.in_flight = Some(InFlight {
            pending,
            started: now,
        });
        self.transition(|s| {
            s.phase = Phase::Stepping;
            s.busy = true;
            s.step_requested = false;
        });
    }

    /// Replace the snapshot with a modified copy.
    fn transition(&mut self, update: impl FnOnce(&mut RunState)) {
        let mut next = RunState::clone(&self.state);
        update(&mut next);
        self.replace(next);
    }

    fn replace(&mut self, next: RunState) {
        self.state = Arc::new(next);
        for listener in &self.listeners {
            listener(&self.state);
        }
    }
}

impl<F: EngineFactory> Drop for RunLoop<F> {
    fn drop(&mut self) {
        self.scheduler.cancel();
        self.pending_init = None;
        // Worker steps still queued finish before the worker disposes.
        drop(mem::take(&mut self.in_flight));
        self.release_engine();
    }
}
