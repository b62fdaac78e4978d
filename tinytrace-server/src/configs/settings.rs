use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tinytrace_api::models::Rssi;
use tinytrace_cctv::{DEFAULT_CAMERA_ID, SamplingPolicy};

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    /// Substring matched against advertised local names
    pub target_name: String,
    pub threshold: Rssi,
    pub window_size: usize,
    pub scan_period_secs: u64,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioKind {
    Ble,
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub base_rssi: Rssi,
    pub amplitude: Rssi,
    pub period_secs: u64,
    pub jitter: Rssi,
    pub interval_ms: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            base_rssi: -68,
            amplitude: 18,
            period_secs: 120,
            jitter: 4,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Radio {
    pub kind: RadioKind,
    #[serde(default)]
    pub simulation: Simulation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cctv {
    pub model_path: String,
    /// Directory of extracted frames, the bundled clip when unset
    pub video_path: Option<String>,
    pub backend_url: String,
    pub startup_delay_secs: u64,
    pub confidence: f32,
    #[serde(default = "default_camera_id")]
    pub camera_id: String,
    #[serde(default = "default_report_attempts")]
    pub report_attempts: u32,
    #[serde(default)]
    pub sampling: SamplingPolicy,
}

fn default_camera_id() -> String {
    DEFAULT_CAMERA_ID.to_string()
}

fn default_report_attempts() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub monitor: Monitor,
    pub radio: Radio,
    pub cctv: Option<Cctv>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::load(Path::new("configs"), &run_mode, Self::environment())
    }

    /// Variables named `TINYTRACE_{SECTION}__{KEY}`, e.g.
    /// `TINYTRACE_MONITOR__SCAN_PERIOD_SECS`. The double underscore keeps
    /// single underscores inside key names intact.
    pub fn environment() -> Environment {
        Environment::with_prefix("TINYTRACE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Layers `default.toml`, the optional `{run_mode}.toml` and `environment`
    /// from lowest to highest precedence.
    pub fn load(dir: &Path, run_mode: &str, environment: Environment) -> Result<Self, ConfigError> {
        let mut settings: Settings = Config::builder()
            .add_source(File::from(dir.join("default")))
            .add_source(File::from(dir.join(run_mode)).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        if let Some(cctv) = settings.cctv.as_mut() {
            if Path::new(&cctv.model_path).exists() {
                cctv.model_path = normalize_path(&cctv.model_path)
                    .map_err(|e| ConfigError::Message(e.to_string()))?
                    .to_string_lossy()
                    .to_string();
            }
            if let Some(video_path) = &cctv.video_path {
                if Path::new(video_path).exists() {
                    let video_path = normalize_path(video_path)
                        .map_err(|e| ConfigError::Message(e.to_string()))?
                        .to_string_lossy()
                        .to_string();

                    cctv.video_path = Some(video_path);
                }
            }
        }

        Ok(settings)
    }

    /// Rejects values that would spin the scan loop or empty the window.
    fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;
        for (key, value) in [
            ("monitor.scan_period_secs", monitor.scan_period_secs),
            ("monitor.retry_delay_secs", monitor.retry_delay_secs),
            ("monitor.window_size", monitor.window_size as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Message(format!("{key} must be greater than zero")));
            }
        }

        if self.radio.kind == RadioKind::Simulated && self.radio.simulation.interval_ms == 0 {
            return Err(ConfigError::Message(
                "radio.simulation.interval_ms must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;

    fn configs_dir() -> &'static Path {
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../configs"))
    }

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Settings::environment().source(Some(vars))
    }

    /// Copies the bundled defaults next to an overlay in a scratch directory.
    fn scratch_configs(name: &str, overlay: &str) -> std::path::PathBuf {
        let dir = env::temp_dir().join(format!("tinytrace-settings-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::copy(configs_dir().join("default.toml"), dir.join("default.toml")).unwrap();
        fs::write(dir.join("test.toml"), overlay).unwrap();
        dir
    }

    #[test]
    fn test_default_settings_load() {
        let settings = Settings::load(configs_dir(), "missing-mode", environment(&[])).unwrap();

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.monitor.threshold, -80);
        assert_eq!(settings.monitor.window_size, 10);
        assert_eq!(settings.radio.kind, RadioKind::Simulated);

        let cctv = settings.cctv.unwrap();
        assert_eq!(cctv.report_attempts, 1);
        assert_eq!(cctv.sampling, SamplingPolicy::default());
    }

    #[test]
    fn test_environment_overrides_files() {
        let settings = Settings::load(
            configs_dir(),
            "missing-mode",
            environment(&[
                ("TINYTRACE_SERVER__PORT", "6000"),
                ("TINYTRACE_LOGGER__LEVEL", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.server.port, 6000);
        assert_eq!(settings.logger.level, "debug");
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn test_environment_overrides_keys_with_underscores() {
        let settings = Settings::load(
            configs_dir(),
            "missing-mode",
            environment(&[
                ("TINYTRACE_MONITOR__SCAN_PERIOD_SECS", "4"),
                ("TINYTRACE_MONITOR__TARGET_NAME", "Child-02"),
                ("TINYTRACE_RADIO__SIMULATION__INTERVAL_MS", "250"),
                ("SERVER_PORT", "6000"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.monitor.scan_period_secs, 4);
        assert_eq!(settings.monitor.target_name, "Child-02");
        assert_eq!(settings.radio.simulation.interval_ms, 250);
        assert_eq!(settings.monitor.retry_delay_secs, 5);
        // Unprefixed variables are not read
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_run_mode_overlay_replaces_nested_keys() {
        let dir = scratch_configs("overlay", "[monitor]\nthreshold = -75\n");

        let settings = Settings::load(&dir, "test", environment(&[])).unwrap();

        assert_eq!(settings.monitor.threshold, -75);
        assert_eq!(settings.monitor.window_size, 10);
        assert_eq!(settings.monitor.target_name, "Child-01");
    }

    #[test]
    fn test_zero_durations_rejected() {
        let dir = scratch_configs("zero-period", "[monitor]\nscan_period_secs = 0\n");
        let err = Settings::load(&dir, "test", environment(&[])).unwrap_err();
        assert!(err.to_string().contains("monitor.scan_period_secs"));

        let dir = scratch_configs("zero-retry", "[monitor]\nretry_delay_secs = 0\n");
        let err = Settings::load(&dir, "test", environment(&[])).unwrap_err();
        assert!(err.to_string().contains("monitor.retry_delay_secs"));
    }

    #[test]
    fn test_missing_defaults_fail() {
        let dir = env::temp_dir().join("tinytrace-settings-missing");

        assert!(Settings::load(&dir, "test", environment(&[])).is_err());
    }
}
