mod agent;
mod alarm;
mod api;
mod config;
mod control;
mod db;
mod error;
mod policy;
mod predictor;
mod reading_cache;
mod router;
mod sensors;
mod sink;
mod weather;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal, time};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    agent::OpenAiAgent,
    alarm::AlarmEvaluator,
    api::AppState,
    config::Config,
    control::IrrigationController,
    policy::DecisionPolicy,
    predictor::LinearPredictor,
    reading_cache::ReadingCache,
    router::CommandRouter,
    sensors::{SensorService, SimulatedSensors},
    sink::PgLogSink,
    weather::AmapClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config. Inverted moisture thresholds abort startup here; the
    // service must not run with an unusable policy.
    let config = Config::from_env()?;

    // Connect to DB and run migrations
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    // Shared in-memory window of recent readings plus last weather snapshot
    let cache = ReadingCache::new(config.history_window);

    // Build collaborators behind their capability traits
    let weather = Arc::new(AmapClient::new(&config)?);
    let agent = Arc::new(OpenAiAgent::new(&config)?);
    let predictor = Arc::new(LinearPredictor::new());
    let sink = Arc::new(PgLogSink::new(pool.clone()));
    let alarm = Arc::new(AlarmEvaluator::new(&config));
    let controller = Arc::new(IrrigationController::new());

    let command_router = Arc::new(CommandRouter::new(
        weather,
        predictor,
        agent,
        sink,
        alarm.clone(),
        controller.clone(),
        cache.clone(),
        DecisionPolicy::new(config.thresholds, config.confidence_floor),
        config.default_city.clone(),
        config.sensor_ids.clone(),
        config.irrigation_duration_minutes,
    ));

    // Spawn sensor-polling task
    {
        let service = SensorService::new(
            pool.clone(),
            Arc::new(SimulatedSensors::new(config.sensor_ids.clone())),
            cache.clone(),
        );
        let interval = Duration::from_secs(config.poll_interval_secs);

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            info!(interval_secs = interval.as_secs(), "Sensor polling loop started");

            loop {
                ticker.tick().await;
                if let Err(e) = service.collect_and_store().await {
                    tracing::error!(error = %e, "Failed to collect sensor reading");
                }
            }
        });
    }

    // Spawn the automated irrigation check — shares the same cache and runs
    // independently of user-triggered routing
    {
        let router = command_router.clone();
        let interval = Duration::from_secs(config.check_interval_secs);

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            info!(interval_secs = interval.as_secs(), "Automated irrigation check started");

            loop {
                ticker.tick().await;
                let response = router.decide_and_apply().await;
                if let Some(decision) = response.decision {
                    info!(
                        action = decision.action.as_str(),
                        reason = %decision.reason,
                        "Automated irrigation check completed"
                    );
                }
            }
        });
    }

    // Start HTTP server
    let state = AppState {
        pool,
        router: command_router,
        controller,
        alarm,
        cache,
    };
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
