use dealrank::api;
use dealrank::config::Config;
use dealrank::db::init_db;
use dealrank::domain::TimeMs;
use dealrank::engagement::EngagementService;
use dealrank::identity::{HttpIdentityProvider, IdentityGate, IdentityProvider};
use dealrank::ledger::VoteLedger;
use dealrank::moderation::ModerationService;
use dealrank::ranking::RankingService;
use dealrank::Repository;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let provider: Arc<dyn IdentityProvider> =
        Arc::new(HttpIdentityProvider::new(config.identity_api_url.clone()));
    let gate = IdentityGate::new(provider);

    let ledger = Arc::new(VoteLedger::new(repo.clone(), gate.clone()));
    let moderation = Arc::new(ModerationService::new(repo.clone(), gate.clone()));
    let engagement = Arc::new(EngagementService::new(
        repo.clone(),
        config.view_dedup_window_ms(),
    ));
    let ranking = Arc::new(RankingService::new(
        repo.clone(),
        gate.clone(),
        config.heat_params(),
        config.max_page_size,
    ));

    // Periodic expiry sweep: published deals past their expiry drop out of
    // the public views immediately, the sweep settles their stored status.
    let sweeper = moderation.clone();
    let sweep_every = Duration::from_secs(config.expiry_sweep_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.sweep_expired(TimeMs::now()).await {
                tracing::warn!(error = %e, "Expiry sweep failed");
            }
        }
    });

    // Create router
    let app = api::create_router(api::AppState::new(
        ledger, moderation, engagement, ranking, gate,
    ));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
