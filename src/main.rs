use phishguard::classifier::ClassifierHandle;
use phishguard::config::Config;
use phishguard::db::Database;
use phishguard::features::FeatureEngine;
use phishguard::models::FeatureName;
use phishguard::rate_limiter::ApiRateLimiters;
use phishguard::web::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_file("config.toml")?;
    println!("✓ Configuration loaded");

    // Initialize database
    let mut db = Database::open(&config.storage.db_path)?;
    db.init_schema()?;
    let purged = db.purge_older_than(config.storage.retention_days)?;
    if purged > 0 {
        println!("✓ Purged {} query records past retention", purged);
    }
    println!("✓ Database initialized at {}", config.storage.db_path);
    let db = Arc::new(Mutex::new(db));

    // Load the classifier once; a missing artifact is a reported state,
    // the extraction endpoints keep working without it.
    let classifier = Arc::new(ClassifierHandle::load(&config.model.path));
    if classifier.ready() {
        println!("✓ Model loaded from {}", config.model.path);
    } else {
        tracing::warn!(
            "⚠️  {} — /api/query/predict will return 503",
            classifier.status()
        );
    }

    // Build the extraction engine (fetcher + whois + dns wiring)
    let engine = Arc::new(FeatureEngine::from_config(&config)?);
    println!("✓ Feature engine ready ({} features)", FeatureName::COUNT);

    // Rate limiters for the scan endpoints, with periodic cleanup
    let rate_limiters = Arc::new(ApiRateLimiters::new());
    let limiters_for_cleanup = rate_limiters.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(300)).await;
            limiters_for_cleanup.cleanup_all();
        }
    });

    // Create web server state
    let app_state = AppState {
        db,
        engine,
        classifier,
        rate_limiters,
        config: Arc::new(config.clone()),
    };
    println!("✓ Web server state created");

    // Create router
    let app = create_router(app_state);
    println!("✓ Router configured");

    // Create listener
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!(
        "\n==> PhishGuard v{} initialized successfully!",
        env!("CARGO_PKG_VERSION")
    );
    println!("    Server listening on http://{}", addr);
    println!("    Query log retention: {} days", config.storage.retention_days);
    println!("    Fetch timeout: {} seconds", config.fetcher.timeout_seconds);
    println!("\n    Press Ctrl+C to stop the server\n");

    // Start server
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
