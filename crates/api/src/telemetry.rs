use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::trace::HttpMakeClassifier;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

pub fn stack() -> ServiceBuilder<
    Stack<RequestBodyLimitLayer, Stack<CorsLayer, Stack<TraceLayer<HttpMakeClassifier>, Identity>>>,
> {
    let trace = TraceLayer::new_for_http();
    let cors = CorsLayer::permissive();
    let limit = RequestBodyLimitLayer::new(4 * 1024 * 1024);

    ServiceBuilder::new().layer(trace).layer(cors).layer(limit)
}
