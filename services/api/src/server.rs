use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNotificationPublisher, InMemoryRequestRepository};
use crate::routes::with_service_routes;
use axum::http::{header, HeaderValue, Method};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use creditly::chat::ChatRelay;
use creditly::config::{AppConfig, BrandConfig};
use creditly::error::AppError;
use creditly::telemetry;
use creditly::workflows::credit::intake::CreditRequestService;
use creditly::workflows::credit::CreditCatalog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let catalog = CreditCatalog::standard();
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        environment: config.environment,
        brand: config.brand.clone(),
        catalog: Arc::new(catalog.clone()),
    };

    let repository = Arc::new(InMemoryRequestRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let request_service = Arc::new(CreditRequestService::new(catalog, repository, notifications));

    let chat = match ChatRelay::from_config(&config.chat, &config.brand) {
        Ok(relay) => relay,
        Err(err) => {
            warn!(error = %err, "chat client could not be built, replies will use the fallback");
            ChatRelay::new(None, &config.brand)
        }
    };

    let app = with_service_routes(request_service, Arc::new(chat))
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer(&config.brand));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = config.environment.label(),
        %addr,
        base_url = %config.brand.base_url,
        "credit-intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn cors_layer(brand: &BrandConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = brand
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "skipping CORS origin that is not a valid header value");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
