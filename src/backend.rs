//! Service manager command surface
//!
//! The backend trait is the seam for alternate service managers; the rest of
//! the crate only ever sees raw listing text and start/stop results.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    command::CommandRunner,
    errors::AppError,
};

#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Raw multi-block text from the platform's "list all services" command.
    async fn list_services(&self) -> Result<String, AppError>;
    async fn start_service(&self, name: &str) -> Result<(), AppError>;
    async fn stop_service(&self, name: &str) -> Result<(), AppError>;
}

/// Backend for the Windows service control tool (`sc.exe`).
pub struct ScServiceManager {
    runner: Arc<dyn CommandRunner>,
}

impl ScServiceManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run_checked(&self, args: &[&str]) -> Result<String, AppError> {
        let output = self.runner.run("sc", args).await?;
        if !output.success() {
            return Err(AppError::command_failed(
                format!("sc {}", args.join(" ")),
                output.failure_detail(),
            ));
        }
        Ok(output.stdout)
    }
}

pub fn validate_service_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
        return Err(AppError::InvalidServiceName);
    }
    Ok(trimmed)
}

#[async_trait]
impl ServiceManager for ScServiceManager {
    async fn list_services(&self) -> Result<String, AppError> {
        self.run_checked(&["queryex", "state=", "all"]).await
    }

    async fn start_service(&self, name: &str) -> Result<(), AppError> {
        let name = validate_service_name(name)?;
        self.run_checked(&["start", name]).await.map(|_| ())
    }

    async fn stop_service(&self, name: &str) -> Result<(), AppError> {
        let name = validate_service_name(name)?;
        self.run_checked(&["stop", name]).await.map(|_| ())
    }
}
