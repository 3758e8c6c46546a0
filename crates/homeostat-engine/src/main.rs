//! Headless engine for the Homeostat simulation.
//!
//! Loads a configuration, runs `simulation.instances` independent
//! environments in parallel, drives each with the configured built-in
//! policy for `simulation.episodes` episodes, and writes one JSON line per
//! finished episode to stdout. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path argument or `homeostat-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Spawn one blocking task per environment instance
//! 4. Collect the instance reports
//! 5. Log the totals

mod error;
mod progress;
mod sink;

use std::io::Write;
use std::path::{Path, PathBuf};

use homeostat_core::config::LoggingConfig;
use homeostat_core::policy;
use homeostat_core::{Environment, LogFormat, SimulationConfig, run_episode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;
use crate::sink::JsonLinesSink;

/// Config file looked up when no path argument is given.
const DEFAULT_CONFIG_PATH: &str = "homeostat-config.yaml";

/// Totals of one environment instance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct InstanceReport {
    instance: u32,
    episodes: u32,
    ticks: u64,
    total_reward: f64,
}

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any instance fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging settings live in it, so this comes first.
    let (config, source) = load_config(std::env::args().nth(1).map(PathBuf::from))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("homeostat-engine starting");
    info!(
        source = %source,
        seed = config.simulation.seed,
        instances = config.simulation.instances,
        episodes = config.simulation.episodes,
        fixed_delta_time = config.simulation.fixed_delta_time,
        policy = ?config.simulation.policy.kind,
        "Configuration loaded"
    );
    if config.agent.max_steps == 0 {
        warn!("agent.max_steps is 0; episodes end only on a termination condition");
    }

    // 3. Spawn the instances.
    let mut handles = Vec::new();
    for instance in 0..config.simulation.instances {
        let instance_config = instance_config(&config, instance);
        handles.push(tokio::task::spawn_blocking(move || {
            run_instance(instance, instance_config, std::io::stdout())
        }));
    }

    // 4. Collect the reports.
    let mut totals = InstanceReport::default();
    for handle in handles {
        let report = handle.await.map_err(|e| EngineError::Join {
            message: e.to_string(),
        })??;
        info!(
            instance = report.instance,
            episodes = report.episodes,
            ticks = report.ticks,
            total_reward = report.total_reward,
            "Instance finished"
        );
        totals.episodes = totals.episodes.saturating_add(report.episodes);
        totals.ticks = totals.ticks.saturating_add(report.ticks);
        totals.total_reward += report.total_reward;
    }

    // 5. Log the totals.
    info!(
        episodes = totals.episodes,
        ticks = totals.ticks,
        total_reward = totals.total_reward,
        "homeostat-engine shutdown complete"
    );

    Ok(())
}

/// Load and validate the configuration.
///
/// An explicit path must exist. Without one, `homeostat-config.yaml` in the
/// working directory is used when present, defaults otherwise.
fn load_config(path: Option<PathBuf>) -> Result<(SimulationConfig, String), EngineError> {
    let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let explicit = config_path != Path::new(DEFAULT_CONFIG_PATH);
    let (config, source) = if explicit || config_path.exists() {
        (
            SimulationConfig::from_file(&config_path)?,
            config_path.display().to_string(),
        )
    } else {
        (SimulationConfig::default(), String::from("defaults"))
    };
    config.validate()?;
    Ok((config, source))
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Copy of `config` with the seed offset for `instance`.
fn instance_config(config: &SimulationConfig, instance: u32) -> SimulationConfig {
    let mut instance_config = config.clone();
    instance_config.simulation.seed = config.simulation.seed.wrapping_add(u64::from(instance));
    instance_config
}

/// Run every configured episode of one instance, writing lines to `out`.
fn run_instance<W>(
    instance: u32,
    config: SimulationConfig,
    out: W,
) -> Result<InstanceReport, EngineError>
where
    W: Write + Send + 'static,
{
    let seed = config.simulation.seed;
    let episodes = config.simulation.episodes;
    let mut action_source = policy::from_config(&config.simulation.policy, seed);
    let sink = JsonLinesSink::new(instance, out);
    let mut env = Environment::with_reference_collaborators(config, Box::new(sink))
        .map_err(|source| EngineError::Instance { instance, source })?;
    let mut callback = ProgressCallback::new(instance);

    info!(instance, seed, episodes, "Instance started");

    let mut report = InstanceReport {
        instance,
        ..InstanceReport::default()
    };
    for _ in 0..episodes {
        let result = run_episode(&mut env, action_source.as_mut(), &mut callback)
            .map_err(|source| EngineError::Instance { instance, source })?;
        info!(
            instance,
            episode = result.summary.episode,
            end_reason = ?result.end_reason,
            ticks = result.total_ticks,
            total_reward = result.total_reward,
            "Episode finished"
        );
        report.episodes = report.episodes.saturating_add(1);
        report.ticks = report.ticks.saturating_add(result.total_ticks);
        report.total_reward += result.total_reward;
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Writer shared with the test after the sink takes ownership.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn short_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.agent.max_steps = 20;
        config.simulation.episodes = 3;
        config
    }

    #[test]
    fn instance_seeds_are_offset() {
        let config = short_config();
        assert_eq!(instance_config(&config, 0).simulation.seed, config.simulation.seed);
        assert_eq!(
            instance_config(&config, 3).simulation.seed,
            config.simulation.seed.wrapping_add(3)
        );
    }

    #[test]
    fn instance_writes_one_line_per_episode() {
        let buffer = SharedBuffer::default();
        let report = run_instance(2, short_config(), buffer.clone()).unwrap();
        assert_eq!(report.episodes, 3);
        assert_eq!(report.ticks, 60);

        let episodes: Vec<_> = buffer
            .lines()
            .into_iter()
            .filter(|line| line["type"] == "episode")
            .collect();
        assert_eq!(episodes.len(), 3);
        for (expected, line) in (1_u32..).zip(&episodes) {
            assert_eq!(line["instance"], 2);
            assert_eq!(line["episode"], expected);
            assert_eq!(line["end_reason"], "MaxStepReached");
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SimulationConfig::default();
        config.simulation.fixed_delta_time = 0.0;
        let result = run_instance(0, config, SharedBuffer::default());
        assert!(matches!(result, Err(EngineError::Instance { instance: 0, .. })));
    }

    #[test]
    fn shipped_config_runs() {
        let yaml = include_str!("../../../homeostat-config.yaml");
        let mut config = SimulationConfig::parse(yaml).unwrap();
        config.simulation.episodes = 1;
        config.agent.max_steps = 50;
        let report = run_instance(0, config, SharedBuffer::default()).unwrap();
        assert_eq!(report.episodes, 1);
        assert!(report.ticks <= 50);
    }

    #[test]
    fn missing_explicit_config_fails() {
        let result = load_config(Some(PathBuf::from("does-not-exist.yaml")));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[tokio::test]
    async fn instances_run_in_parallel_tasks() {
        let config = short_config();
        let buffer = SharedBuffer::default();
        let handles: Vec<_> = (0..2)
            .map(|instance| {
                let config = instance_config(&config, instance);
                let out = buffer.clone();
                tokio::task::spawn_blocking(move || run_instance(instance, config, out))
            })
            .collect();
        for handle in handles {
            let report = handle.await.unwrap().unwrap();
            assert_eq!(report.episodes, 3);
        }
        let count = buffer
            .lines()
            .iter()
            .filter(|line| line["type"] == "episode")
            .count();
        assert_eq!(count, 6);
    }
}
