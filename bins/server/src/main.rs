//! Opexa API Server
//!
//! Main entry point for the Opexa budget service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opexa_api::{AppState, create_router};
use opexa_core::SystemClock;
use opexa_core::budget::{
    ActualsSource, AllocationPlan, BudgetAnalysisEngine, DepartmentShare, JsonFileRepository,
    RandomActuals,
};
use opexa_shared::{AppConfig, BudgetConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opexa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Build and load the engine
    let mut engine = build_engine(&config.budget)?;
    if engine.restore()? {
        info!("Resumed from saved budget snapshot");
    } else {
        let period = engine.initialize()?;
        info!(period = %period.name, "Seeded new budget period");
    }

    // Create router
    let app = create_router(AppState::new(engine, config.budget.currency.as_str()));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_engine(config: &BudgetConfig) -> anyhow::Result<BudgetAnalysisEngine> {
    let plan = AllocationPlan::new(
        config
            .departments
            .iter()
            .map(|d| DepartmentShare {
                department: d.name.clone(),
                percentage: d.percentage,
            })
            .collect(),
    )
    .context("Invalid department allocation")?;

    let actuals: Box<dyn ActualsSource> = match config.seed {
        Some(seed) => {
            info!(seed, "Demo actuals seeded");
            Box::new(RandomActuals::seeded(seed))
        }
        None => Box::new(RandomActuals::from_entropy()),
    };

    let mut engine =
        BudgetAnalysisEngine::new(Arc::new(SystemClock), actuals).with_allocation_plan(plan);

    if let Some(path) = &config.storage_path {
        info!(path = %path.display(), "Budget snapshots stored on disk");
        engine = engine.with_repository(Arc::new(JsonFileRepository::new(path)));
    }

    Ok(engine)
}
