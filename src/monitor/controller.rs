//! Control operations against named services
//!
//! Commands for the same service name never interleave: each name gets its
//! own mutex, created on demand, held for the full operation (both steps of
//! a restart). Operations on distinct names proceed independently.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    backend::{validate_service_name, ServiceManager},
    errors::AppError,
};

pub struct ServiceController {
    manager: Arc<dyn ServiceManager>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ServiceController {
    pub fn new(manager: Arc<dyn ServiceManager>) -> Self {
        Self {
            manager,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Names are validated before this runs, so the map only ever holds
    /// entries for names that reached the backend.
    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn start(&self, name: &str) -> Result<(), AppError> {
        let name = validate_service_name(name)?;
        let lock = self.lock_for(name).await;
        let _guard = lock.lock().await;
        self.manager.start_service(name).await
    }

    pub async fn stop(&self, name: &str) -> Result<(), AppError> {
        let name = validate_service_name(name)?;
        let lock = self.lock_for(name).await;
        let _guard = lock.lock().await;
        self.manager.stop_service(name).await
    }

    /// Stop, then start. Fail-fast: a failed stop returns immediately and the
    /// start is never attempted. A start that fails after a successful stop
    /// leaves the service stopped; there is no rollback.
    pub async fn restart(&self, name: &str) -> Result<(), AppError> {
        let name = validate_service_name(name)?;
        let lock = self.lock_for(name).await;
        let _guard = lock.lock().await;
        self.manager.stop_service(name).await?;
        self.manager.start_service(name).await
    }
}
