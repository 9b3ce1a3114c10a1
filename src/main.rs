use std::sync::Arc;

use service_monitor::{
    backend::ScServiceManager,
    build_app,
    command::SystemCommandRunner,
    config::Config,
    logging,
    monitor::{broadcaster::Broadcaster, controller::ServiceController, poller::InventoryPoller},
    sampler::SystemSampler,
    AppState,
};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;

    let runner = Arc::new(SystemCommandRunner::new());
    let manager = Arc::new(ScServiceManager::new(runner));

    let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
    let broadcaster = Arc::new(Broadcaster::new(refresh_tx.downgrade()));
    let controller = Arc::new(ServiceController::new(manager.clone()));
    let poller = Arc::new(InventoryPoller::new(
        manager,
        Arc::new(SystemSampler::new()),
        broadcaster.clone(),
    ));
    tokio::spawn(poller.run(config.poll_interval, refresh_rx));

    let state = AppState::new(controller, broadcaster);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        poll_interval_secs = config.poll_interval.as_secs(),
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
