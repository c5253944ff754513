use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEvaluationSink, InMemoryReviewRepository};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grade_review::config::AppConfig;
use grade_review::error::AppError;
use grade_review::telemetry;
use grade_review::workflows::grading::ReviewService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let evaluations = Arc::new(InMemoryEvaluationSink::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        evaluations: evaluations.clone(),
    };

    let repository = Arc::new(InMemoryReviewRepository::default());
    let review_service = Arc::new(ReviewService::new(repository, evaluations, config.review));

    let app = with_review_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        redistribution = config.review.redistribution.label(),
        placeholder_fallback = config.review.placeholder_fallback,
        "grade review service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
