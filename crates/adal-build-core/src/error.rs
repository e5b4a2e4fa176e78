use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid target configuration: {0}")]
    InvalidConfig(String),

    #[error("duplicate target name: {0}")]
    DuplicateTarget(String),

    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {code}")]
    CommandFailed { program: String, code: i32 },

    #[error("process error: {0}")]
    Process(String),

    #[error("{0} does not exist")]
    NotFound(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
