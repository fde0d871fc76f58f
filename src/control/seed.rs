//! Propagation of the best evolved phenotype into the Game of Life run loop.

use std::time::Duration;

use crate::engine::EngineFactory;
use crate::schema::{Observation, SimulationConfig};

use super::command::Command;
use super::run_loop::RunLoop;
use super::state::Phase;

/// Outcome of [`SeedBinding::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSync {
    /// No seed is available yet; nothing was initialized.
    Missing,
    /// The run loop already uses this seed.
    Unchanged,
    /// The run loop was (re)initialized with the new seed.
    Reseeded,
}

/// Binds a run loop's seed to a phenotype by value.
///
/// Seeds are compared by string equality; the run loop is only
/// reinitialized when the value changes.
#[derive(Debug, Clone)]
pub struct SeedBinding {
    base: SimulationConfig,
    applied: Option<String>,
}

impl SeedBinding {
    /// `base` supplies every setting except the seed.
    pub fn new(base: SimulationConfig) -> Self {
        Self {
            base,
            applied: None,
        }
    }

    /// Seed most recently handed to the run loop.
    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    /// Forget the applied seed so the next sync initializes even with the
    /// same value, e.g. to retry after an engine failure.
    pub fn clear(&mut self) {
        self.applied = None;
    }

    /// Replace the base settings; the next sync reinitializes.
    pub fn set_base(&mut self, base: SimulationConfig) {
        self.base = base;
        self.applied = None;
    }

    /// Seed the run loop with `seed` unless it already runs with it.
    pub fn sync<F: EngineFactory>(
        &mut self,
        seed: Option<&str>,
        run_loop: &mut RunLoop<F>,
        now: Duration,
    ) -> SeedSync {
        let Some(seed) = seed else {
            log::info!("No seed available");
            return SeedSync::Missing;
        };

        let state = run_loop.state();
        let phase = state.phase;
        if self.applied.as_deref() == Some(seed) {
            // A seed whose engine failed stays failed until it changes.
            if phase != Phase::Uninitialized || state.error.is_some() {
                return SeedSync::Unchanged;
            }
        }

        let config = self.base.with_seed(seed);
        match phase {
            Phase::Idle => {
                run_loop.dispatch(Command::Restart(config), now);
            }
            Phase::Uninitialized | Phase::Initializing | Phase::Destroying => {
                run_loop.dispatch(Command::Initialize(config), now);
            }
            Phase::Stepping => {
                run_loop.dispatch(Command::Reset, now);
                run_loop.dispatch(Command::Initialize(config), now);
            }
        }

        log::info!("Seeded run loop with {seed}");
        self.applied = Some(seed.to_string());
        SeedSync::Reseeded
    }

    /// Sync with the best phenotype of an evolution observation.
    pub fn sync_from<F: EngineFactory>(
        &mut self,
        observation: &Observation,
        run_loop: &mut RunLoop<F>,
        now: Duration,
    ) -> SeedSync {
        self.sync(observation.best_phenotype.as_deref(), run_loop, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MockFactory;
    use crate::schema::ControlConfig;
    use std::sync::Arc;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn seed(c: char) -> String {
        c.to_string().repeat(64)
    }

    #[test]
    fn test_same_seed_initializes_once() {
        let mut run_loop = RunLoop::new(MockFactory::default(), ControlConfig::life());
        let counters = Arc::clone(&run_loop_counters(&run_loop));
        let mut binding = SeedBinding::new(SimulationConfig::default());
        let a = seed('A');

        assert_eq!(binding.sync(Some(&a), &mut run_loop, ms(0)), SeedSync::Reseeded);
        run_loop.pump(ms(0));
        for t in 1..3 {
            assert_eq!(binding.sync(Some(&a), &mut run_loop, ms(t)), SeedSync::Unchanged);
            run_loop.pump(ms(t));
        }
        assert_eq!(counters.created(), 1);
        assert_eq!(counters.resets(), 0);

        let b = seed('B');
        assert_eq!(binding.sync(Some(&b), &mut run_loop, ms(3)), SeedSync::Reseeded);
        run_loop.pump(ms(3));
        assert_eq!(binding.sync(Some(&b), &mut run_loop, ms(4)), SeedSync::Unchanged);
        assert_eq!(counters.created(), 1);
        assert_eq!(counters.resets(), 1);
        assert_eq!(run_loop.state().seed.as_deref(), Some(b.as_str()));
        assert_eq!(run_loop.phase(), Phase::Idle);
    }

    #[test]
    fn test_missing_seed() {
        let mut run_loop = RunLoop::new(MockFactory::default(), ControlConfig::life());
        let mut binding = SeedBinding::new(SimulationConfig::default());
        assert_eq!(binding.sync(None, &mut run_loop, ms(0)), SeedSync::Missing);
        assert_eq!(
            binding.sync_from(&Observation::default(), &mut run_loop, ms(0)),
            SeedSync::Missing
        );
        assert_eq!(run_loop.phase(), Phase::Uninitialized);
        assert!(binding.applied().is_none());
    }

    #[test]
    fn test_reseeds_after_reset() {
        let mut run_loop = RunLoop::new(MockFactory::default(), ControlConfig::life());
        let counters = Arc::clone(&run_loop_counters(&run_loop));
        let mut binding = SeedBinding::new(SimulationConfig::default());
        let a = seed('A');

        binding.sync(Some(&a), &mut run_loop, ms(0));
        run_loop.pump(ms(0));
        run_loop.dispatch(Command::Reset, ms(1));

        assert_eq!(binding.sync(Some(&a), &mut run_loop, ms(2)), SeedSync::Reseeded);
        run_loop.pump(ms(2));
        assert_eq!(counters.created(), 2);
        assert_eq!(run_loop.phase(), Phase::Idle);
    }

    #[test]
    fn test_reseed_while_stepping() {
        let mut run_loop = RunLoop::new(MockFactory::default(), ControlConfig::life());
        let counters = Arc::clone(&run_loop_counters(&run_loop));
        let mut binding = SeedBinding::new(SimulationConfig::default());

        binding.sync(Some(&seed('A')), &mut run_loop, ms(0));
        run_loop.pump(ms(0));
        run_loop.dispatch(Command::RequestStep, ms(1));
        run_loop.pump(ms(1));
        assert_eq!(run_loop.phase(), Phase::Stepping);

        let b = seed('B');
        assert_eq!(binding.sync(Some(&b), &mut run_loop, ms(2)), SeedSync::Reseeded);
        run_loop.pump(ms(3));
        run_loop.pump(ms(4));
        assert_eq!(run_loop.phase(), Phase::Idle);
        assert_eq!(run_loop.state().seed.as_deref(), Some(b.as_str()));
        assert_eq!(counters.created(), 2);
        assert_eq!(counters.disposed(), 1);
    }

    #[test]
    fn test_failed_seed_is_not_retried() {
        let factory = MockFactory {
            fail_create: true,
            ..Default::default()
        };
        let mut run_loop = RunLoop::new(factory, ControlConfig::life());
        let mut binding = SeedBinding::new(SimulationConfig::default());
        let a = seed('A');

        let outcomes: Vec<SeedSync> = (0..3)
            .map(|t| {
                let sync = binding.sync(Some(&a), &mut run_loop, ms(t));
                run_loop.pump(ms(t));
                sync
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![SeedSync::Reseeded, SeedSync::Unchanged, SeedSync::Unchanged]
        );
        assert_eq!(run_loop.phase(), Phase::Uninitialized);
        assert!(run_loop.state().error.is_some());

        // A new value is tried once.
        let b = seed('B');
        assert_eq!(binding.sync(Some(&b), &mut run_loop, ms(3)), SeedSync::Reseeded);
        run_loop.pump(ms(3));
        assert_eq!(binding.sync(Some(&b), &mut run_loop, ms(4)), SeedSync::Unchanged);

        // Clearing the binding retries explicitly.
        binding.clear();
        assert_eq!(binding.sync(Some(&b), &mut run_loop, ms(5)), SeedSync::Reseeded);
        assert_eq!(run_loop.phase(), Phase::Initializing);
    }

    fn run_loop_counters(run_loop: &RunLoop<MockFactory>) -> Arc<crate::engine::testing::Counters> {
        Arc::clone(&run_loop.factory().counters)
    }
}
