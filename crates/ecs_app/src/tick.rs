//! Fixed-interval tick loop.
//!
//! Each tick the loop runs the per-tick script (the driver's hook for
//! scripted scene changes), then [`World::update`]. Ticks are paced by a
//! `tokio` interval; a tick that overruns its budget is logged and the next
//! one is delayed rather than bunched up.

use std::time::{Duration, Instant};

use ecs_world::{EcsError, World};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Environment variable overriding the tick rate (ticks per second).
pub const TICK_RATE_ENV: &str = "ECS_TICK_RATE";

/// Environment variable overriding the tick limit (0 = unlimited).
pub const MAX_TICKS_ENV: &str = "ECS_MAX_TICKS";

/// Default tick rate: one tick every 100 ms.
pub const DEFAULT_TICK_RATE: f64 = 10.0;

/// Errors raised while reading the tick configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid ECS_TICK_RATE value {value:?}: expected a positive number")]
    InvalidTickRate { value: String },

    #[error("invalid ECS_MAX_TICKS value {value:?}: expected a non-negative integer")]
    InvalidMaxTicks { value: String },
}

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// Read the configuration from [`TICK_RATE_ENV`] and [`MAX_TICKS_ENV`],
    /// falling back to the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but cannot be parsed, or
    /// the tick rate is not positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var(TICK_RATE_ENV).ok(),
            std::env::var(MAX_TICKS_ENV).ok(),
        )
    }

    fn from_vars(tick_rate: Option<String>, max_ticks: Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = tick_rate {
            config.tick_rate = match raw.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate > 0.0 => rate,
                _ => return Err(ConfigError::InvalidTickRate { value: raw }),
            };
        }

        if let Some(raw) = max_ticks {
            config.max_ticks = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMaxTicks { value: raw.clone() })?;
        }

        Ok(config)
    }

    /// Duration of one tick.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

/// Drives a [`World`] at a fixed rate.
#[derive(Debug)]
pub struct TickLoop {
    config: TickConfig,
    world: World,
}

impl TickLoop {
    /// Create a tick loop around `world`.
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self { config, world }
    }

    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Run one tick: `script` with the number of ticks already completed,
    /// then a world update.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `script` or by the update.
    pub fn step<F>(&mut self, script: &mut F) -> Result<(), EcsError>
    where
        F: FnMut(&mut World, u64) -> Result<(), EcsError>,
    {
        let completed = self.world.tick();
        script(&mut self.world, completed)?;
        self.world.update()?;

        debug!(
            tick_id = self.world.tick(),
            entities = self.world.components().len(),
            systems = self.world.systems().len(),
            "tick complete"
        );
        Ok(())
    }

    /// Run ticks at the configured rate until `max_ticks` is reached, or
    /// forever when it is 0.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first tick error.
    pub async fn run<F>(&mut self, mut script: F) -> Result<(), EcsError>
    where
        F: FnMut(&mut World, u64) -> Result<(), EcsError>,
    {
        let budget = self.config.period();
        let mut interval = tokio::time::interval(budget);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        let mut tick_count = 0u64;
        loop {
            interval.tick().await;
            let start = Instant::now();

            self.step(&mut script)?;
            self.check_budget(start.elapsed(), budget);

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }
        }
    }

    /// Warn if a tick took longer than `budget`; returns whether it did.
    fn check_budget(&self, elapsed: Duration, budget: Duration) -> bool {
        if elapsed <= budget {
            return false;
        }
        warn!(
            tick_id = self.world.tick(),
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = budget.as_millis() as u64,
            "tick exceeded time budget"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use ecs_world::Component;

    use super::*;

    struct Marker;
    impl Component for Marker {}

    fn no_script(_: &mut World, _: u64) -> Result<(), EcsError> {
        Ok(())
    }

    #[test]
    fn test_default_config() {
        let config = TickConfig::default();
        assert_eq!(config.tick_rate, 10.0);
        assert_eq!(config.max_ticks, 0);
        assert_eq!(config.period(), Duration::from_millis(100));
    }

    #[test]
    fn test_config_from_vars() {
        let config = TickConfig::from_vars(Some("50".into()), Some(" 7 ".into())).unwrap();
        assert_eq!(config, TickConfig { tick_rate: 50.0, max_ticks: 7 });

        let config = TickConfig::from_vars(None, None).unwrap();
        assert_eq!(config, TickConfig::default());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        for raw in ["0", "-5", "fast", "NaN", "inf"] {
            assert!(matches!(
                TickConfig::from_vars(Some(raw.into()), None),
                Err(ConfigError::InvalidTickRate { .. })
            ));
        }
        assert!(matches!(
            TickConfig::from_vars(None, Some("-1".into())),
            Err(ConfigError::InvalidMaxTicks { .. })
        ));
    }

    #[test]
    fn test_step_runs_script_before_update() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), World::new());
        let mut seen = Vec::new();
        let mut script = |_: &mut World, completed: u64| {
            seen.push(completed);
            Ok(())
        };

        tick_loop.step(&mut script).unwrap();
        tick_loop.step(&mut script).unwrap();

        assert_eq!(seen, vec![0, 1]);
        assert_eq!(tick_loop.world().tick(), 2);
    }

    #[tokio::test]
    async fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 5,
        };
        let mut tick_loop = TickLoop::new(config, World::new());
        tick_loop.run(no_script).await.unwrap();
        assert_eq!(tick_loop.world().tick(), 5);
    }

    #[test]
    fn test_check_budget_flags_overrun() {
        let tick_loop = TickLoop::new(TickConfig::default(), World::new());
        let budget = Duration::from_millis(10);
        assert!(!tick_loop.check_budget(Duration::from_millis(10), budget));
        assert!(tick_loop.check_budget(Duration::from_millis(11), budget));
    }

    #[tokio::test]
    async fn test_run_slow_final_tick_still_completes() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 1,
        };
        let mut tick_loop = TickLoop::new(config, World::new());
        let mut calls = 0;
        tick_loop
            .run(|_, _| {
                calls += 1;
                std::thread::sleep(Duration::from_millis(5));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(tick_loop.world().tick(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_script_error() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 0,
        };
        let mut tick_loop = TickLoop::new(config, World::new());
        let entity = tick_loop.world().create_entity();

        // The second attach of the same kind fails and ends the loop.
        let err = tick_loop
            .run(|world, _| world.add_component_to_entity(entity, Marker))
            .await
            .unwrap_err();

        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
        assert_eq!(tick_loop.world().tick(), 1);
    }
}
