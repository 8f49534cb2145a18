use oxignp::GnpError;

use thiserror::Error;

/// Errors stopping an ant run.
#[derive(Debug, Error)]
pub enum AntError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("trail line {line}: {reason}")]
    Trail { line: usize, reason: String },
    #[error(transparent)]
    Gnp(#[from] GnpError),
    #[error("cannot write checkpoint: {0}")]
    Checkpoint(#[from] ron::Error),
}

pub type Result<T> = std::result::Result<T, AntError>;

impl AntError {
    pub(crate) fn trail(line: usize, reason: impl Into<String>) -> AntError {
        AntError::Trail {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> AntError {
        AntError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<toml::de::Error> for AntError {
    fn from(err: toml::de::Error) -> Self {
        AntError::Config(err.to_string())
    }
}
