use crate::errors::{AntError, Result};

use oxignp::GnpConfig;
use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Settings of the foraging experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AntConfig {
    /// `.trl` file to forage on, relative to the configuration file.
    pub trail: PathBuf,
    /// Moves allowed per phase of an episode.
    pub moves: usize,
    /// Number of random individuals evaluated.
    pub population: NonZeroUsize,
    pub seed: u64,
    /// Reward eating through delayed rewards instead of
    /// immediate ones.
    #[serde(default)]
    pub delayed_rewards: bool,
    /// Where to write the champion's RON checkpoint, relative
    /// to the configuration file.
    pub checkpoint: Option<PathBuf>,
}

/// A run configuration, as read from a TOML file with
/// `[gnp]` and `[ant]` tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub gnp: GnpConfig,
    pub ant: AntConfig,
}

impl RunConfig {
    /// Reads and validates a configuration file. Relative paths
    /// inside it are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<RunConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AntError::io(path, e))?;
        let mut config = RunConfig::from_toml(&text)?;
        if let Some(dir) = path.parent() {
            config.ant.trail = dir.join(&config.ant.trail);
            config.ant.checkpoint = config.ant.checkpoint.map(|c| dir.join(c));
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<RunConfig> {
        let config: RunConfig = toml::from_str(text)?;
        config.gnp.validate()?;
        if config.ant.moves == 0 {
            return Err(AntError::Config("the ant needs at least one move".into()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxignp::{LearningConfig, SelectorConfig};

    const BUNDLED: &str = include_str!("../ant.toml");

    #[test]
    fn bundled_config_is_valid() {
        let config = RunConfig::from_toml(BUNDLED).unwrap();
        assert_eq!(config.gnp.selector, SelectorConfig::EGreedy { epsilon: 0.1 });
        assert!(matches!(
            config.gnp.learning,
            LearningConfig::Sarsa { .. } | LearningConfig::SarsaWithEligibilityTraces { .. }
        ));
        assert_eq!(config.ant.trail, PathBuf::from("trails/hook.trl"));
        assert!(config.ant.moves > 0);
    }

    #[test]
    fn zero_moves_rejected() {
        let text = BUNDLED.replace("moves = 400", "moves = 0");
        assert!(matches!(RunConfig::from_toml(&text), Err(AntError::Config(_))));
    }

    #[test]
    fn invalid_network_rejected() {
        let text = BUNDLED.replace("epsilon = 0.1", "epsilon = 1.5");
        assert!(matches!(RunConfig::from_toml(&text), Err(AntError::Gnp(_))));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(RunConfig::from_toml("[gnp"), Err(AntError::Config(_))));
    }
}
