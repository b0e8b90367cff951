mod core;
mod features;
mod modules;
mod shared;

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::accounts::{routes as accounts_routes, AccountService};
use crate::features::auth::routes as auth_routes;
use crate::features::auth::services::{SessionService, TokenService};
use crate::features::auth::{AuthService, JwtValidator};
use crate::features::dashboard::{routes as dashboard_routes, DashboardService};
use crate::features::incidents::{routes as incidents_routes, ImageService, IncidentService};
use crate::features::reports::{routes as reports_routes, ReportService};
use crate::modules::storage::MinIOClient;
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (tokio_worker_threads={}, pid={})",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Auth and accounts
    let session_service = Arc::new(SessionService::new(pool.clone(), Arc::clone(&clock)));
    let token_service = Arc::new(TokenService::new(&config.auth, Arc::clone(&clock)));
    let account_service = Arc::new(AccountService::new(
        pool.clone(),
        Arc::clone(&session_service),
        Arc::clone(&clock),
    ));
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&account_service),
        Arc::clone(&session_service),
        Arc::clone(&token_service),
        Arc::clone(&clock),
    ));
    let jwt_validator = Arc::new(JwtValidator::new(
        Arc::clone(&token_service),
        Arc::clone(&session_service),
    ));
    tracing::info!(
        "Auth initialized (issuer: {}, token ttl: {}s)",
        config.auth.issuer,
        config.auth.token_ttl.as_secs()
    );

    if let Some(bootstrap) = &config.bootstrap_admin {
        account_service
            .ensure_bootstrap_admin(bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap administrator: {}", e))?;
    }

    // Storage
    let minio_client = Arc::new(
        MinIOClient::new(config.minio.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?,
    );
    minio_client.ensure_bucket_exists().await;
    tracing::info!("MinIO client initialized for bucket: {}", config.minio.bucket);

    // Incidents, statistics and reports
    let incident_service = Arc::new(IncidentService::new(
        pool.clone(),
        Arc::clone(&minio_client),
        Arc::clone(&clock),
    ));
    let image_service = Arc::new(ImageService::new(
        Arc::clone(&incident_service),
        Arc::clone(&minio_client),
    ));
    let dashboard_service = Arc::new(DashboardService::new(pool.clone()));
    let report_service = Arc::new(ReportService::new(Arc::clone(&incident_service)));
    tracing::info!("Incident services initialized");

    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a live session)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&auth_service)))
        .merge(incidents_routes::routes(
            Arc::clone(&incident_service),
            image_service,
        ))
        .merge(dashboard_routes::routes(dashboard_service))
        .merge(reports_routes::routes(report_service))
        .merge(accounts_routes::routes(account_service))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator,
            middleware::auth_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let public_routes = Router::new().merge(auth_routes::public_routes(auth_service));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
