//! Client settings read from the process environment.
use std::env;
use std::path::PathBuf;

/// Configuration for one headless skirmish run.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub scenario_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub max_turns: usize,
    /// Advance one phase record per step instead of whole turns.
    pub phase_stepped: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scenario_path: None,
            config_path: None,
            max_turns: 200,
            phase_stepped: false,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SKIRMISH_SCENARIO` - Scenario RON file (default: built-in frigate duel)
    /// - `SKIRMISH_CONFIG` - Runtime config RON file (default: built-in defaults)
    /// - `SKIRMISH_MAX_TURNS` - Turn limit before giving up (default: 200)
    /// - `SKIRMISH_PHASE_STEPPED` - Step phase by phase (default: false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.scenario_path = env::var_os("SKIRMISH_SCENARIO").map(PathBuf::from);
        config.config_path = env::var_os("SKIRMISH_CONFIG").map(PathBuf::from);

        if let Some(turns) = read_env::<usize>("SKIRMISH_MAX_TURNS") {
            config.max_turns = turns.max(1);
        }
        if let Some(stepped) = read_env::<bool>("SKIRMISH_PHASE_STEPPED") {
            config.phase_stepped = stepped;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
