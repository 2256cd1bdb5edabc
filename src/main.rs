use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sipzy::{batch_import, create_router, import, init_pool, run_migrations, AppState, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: DATABASE_URL (default: sqlite://sipzy.db)");
            eprintln!("Optional: LISTEN_ADDR (default: 0.0.0.0:3000)");
            eprintln!("Optional: SIPZY_PAGE_SIZE (default: 12, between 1 and 100)");
            eprintln!("Optional: SIPZY_SEED_FILE (batch import JSON loaded at startup)");
            eprintln!("Optional: SIPZY_STATIC_DIR (default: static)");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Sipzy server");
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database: {}", config.database_url);

    // Connect to database
    let pool = match init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database connection error: {}", e);
            std::process::exit(1);
        }
    };

    // Run migrations
    if let Err(e) = run_migrations(&pool).await {
        eprintln!("Migration error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Database migrations completed");

    // Seed catalog
    if let Some(seed_file) = &config.seed_file {
        match import::load_batch(seed_file) {
            Ok(batch) => {
                let response = batch_import(&pool, batch).await;
                tracing::info!("Seeded from {}: {}", seed_file.display(), response.message);
            }
            Err(e) => {
                eprintln!("Seed error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let state = AppState::new(pool, config.page_size);

    // Build router
    let app = create_router(state)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server running at http://{}", config.listen_addr);

    axum::serve(listener, app).await.expect("Server error");
}
