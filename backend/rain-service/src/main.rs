use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use rain_service::clients::context::ContextGenerator;
use rain_service::clients::fetcher::DocumentFetcher;
use rain_service::clients::imagery::ImageSynthesizer;
use rain_service::clients::scorer::HttpRelevanceScorer;
use rain_service::handlers::{accuracy, articles, chunks, feed, settings, AppState};
use rain_service::middleware::JwtAuthMiddleware;
use rain_service::services::Replenisher;
use anyhow::Context;
use rain_service::{metrics, Config};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "rain-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "rain-service"
        })),
    }
}

async fn serve_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::render())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting rain-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let http = reqwest::Client::new();
    let state = web::Data::new(AppState {
        pool,
        replenisher: Replenisher::new(),
        scorer: HttpRelevanceScorer::new(http.clone(), &config.scorer),
        context: ContextGenerator::new(http.clone(), &config.scorer),
        fetcher: DocumentFetcher::new(http.clone(), &config.fetcher),
        imagery: ImageSynthesizer::new(http, &config.imagery),
        config: config.clone(),
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/health", web::get().to(health_summary))
            .route("/metrics", web::get().to(serve_metrics))
            .service(
                web::scope("/api")
                    .wrap(JwtAuthMiddleware::new(config.auth.jwt_secret.clone()))
                    .service(
                        web::scope("/feed")
                            .service(feed::get_feed)
                            .service(feed::replenish_feed)
                            .service(feed::reroll_feed)
                            .service(feed::save_position),
                    )
                    .service(
                        web::scope("/chunks")
                            .service(chunks::rate_chunk)
                            .service(chunks::chunk_context),
                    )
                    .service(web::scope("/accuracy").service(accuracy::get_accuracy))
                    .service(
                        web::scope("/settings")
                            .service(settings::get_settings)
                            .service(settings::update_settings),
                    )
                    .service(
                        web::scope("/articles")
                            .service(articles::list_articles)
                            .service(articles::save_article)
                            .service(articles::update_article)
                            .service(articles::delete_article),
                    ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run()
    .await?;

    Ok(())
}
