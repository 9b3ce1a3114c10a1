use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to spawn `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command `{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },
    #[error("service name must not be empty or contain control characters")]
    InvalidServiceName,
}

impl AppError {
    pub fn command_spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandSpawn {
            command: command.into(),
            source,
        }
    }

    pub fn command_failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            detail: detail.into(),
        }
    }
}
