use std::sync::Arc;

use anyhow::Context;

use ploxi_onboard::config::AppConfig;
use ploxi_onboard::flows::manager::spawn_sweeper;
use ploxi_onboard::flows::{FlowManager, FlowServices};
use ploxi_onboard::handoff::{HandoffStore, LibSqlStore, MemoryStore};
use ploxi_onboard::routes::flow_routes;
use ploxi_onboard::wizard::SubmitEffect;
use ploxi_onboard::wizard::submission::{HttpSubmitter, LoggingSubmitter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    eprintln!("🌱 Ploxi onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/flows", config.port);
    eprintln!("   Store: {}", config.db_path.display());

    // Session slots expire with idle flows; durable slots go to libSQL
    let durable = LibSqlStore::new_local(&config.db_path)
        .await
        .context("Failed to open handoff store")?;
    let store = HandoffStore::new(Arc::new(MemoryStore::new()), Arc::new(durable));

    let submitter: Arc<dyn SubmitEffect> = match &config.register_endpoint {
        Some(base_url) => {
            eprintln!("   Registrations: POST {base_url}");
            Arc::new(HttpSubmitter::new(base_url.clone()))
        }
        None => {
            eprintln!(
                "   Registrations: logged (delay {} ms)",
                config.submit_delay.as_millis()
            );
            Arc::new(LoggingSubmitter::new(config.submit_delay))
        }
    };

    let flows = Arc::new(FlowManager::new(FlowServices { store, submitter }));
    eprintln!(
        "   Sessions: expire after {} s idle, swept every {} s",
        config.session_ttl.as_secs(),
        config.sweep_interval.as_secs()
    );
    spawn_sweeper(flows.clone(), config.session_ttl, config.sweep_interval);
    let app = flow_routes(flows);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Onboarding API started");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
