//! HTTP API server for the order service.
//!
//! Exposes checkout, order lookup and the payment callback over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::services::{
    EventBridgeSink, HttpCartStore, HttpCatalogClient, HttpNotificationSink, HttpPaymentSink,
    LogSink, SqsQueueSink,
};
use fulfillment::{
    CartStore, CatalogClient, CheckoutOrchestrator, DispatchConfig, DispatchWorkerHandle,
    Dispatcher, EventBusSink, InMemoryCartStore, InMemoryCatalog, InMemoryEventBus,
    InMemoryNotificationSink, InMemoryPaymentSink, InMemoryQueue, NotificationSink,
    PaymentCallbackHandler, PaymentSink, QueueSink, Sinks,
};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderRepository;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: OrderRepository + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<R>).get(routes::orders::list::<R>),
        )
        .route("/orders/callback", post(routes::orders::callback::<R>))
        .route("/orders/{id}", get(routes::orders::get::<R>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Everything checkout and fan-out talk to besides the repository.
#[derive(Clone)]
pub struct Collaborators {
    pub cart: Arc<dyn CartStore>,
    pub catalog: Arc<dyn CatalogClient>,
    pub sinks: Sinks,
}

/// Recording stand-ins for every collaborator, kept accessible so tests can
/// seed carts and products and inspect what was sent.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServices {
    pub cart: InMemoryCartStore,
    pub catalog: InMemoryCatalog,
    pub payment: InMemoryPaymentSink,
    pub notification: InMemoryNotificationSink,
    pub queue: InMemoryQueue,
    pub event_bus: InMemoryEventBus,
}

impl InMemoryServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            cart: Arc::new(self.cart.clone()),
            catalog: Arc::new(self.catalog.clone()),
            sinks: Sinks {
                payment: Arc::new(self.payment.clone()),
                notification: Arc::new(self.notification.clone()),
                queue: Arc::new(self.queue.clone()),
                event_bus: Arc::new(self.event_bus.clone()),
            },
        }
    }
}

impl Collaborators {
    /// Uses the HTTP implementation for every collaborator with a configured
    /// URL, SQS and EventBridge for the queue and bus when named, and a
    /// [`LogSink`] for every sink left unset.
    ///
    /// An unset cart or catalog URL falls back to an empty in-memory store
    /// and is reported with a warning.
    pub async fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        for var in config.missing_checkout_inputs() {
            tracing::warn!(var, "not set, checkout reads from an empty in-memory store");
        }

        let cart: Arc<dyn CartStore> = match &config.cart_service_url {
            Some(url) => Arc::new(HttpCartStore::new(client.clone(), url.as_str())),
            None => Arc::new(InMemoryCartStore::new()),
        };
        let catalog: Arc<dyn CatalogClient> = match &config.product_service_url {
            Some(url) => Arc::new(HttpCatalogClient::new(client.clone(), url.as_str())),
            None => Arc::new(InMemoryCatalog::new()),
        };

        let payment: Arc<dyn PaymentSink> = match &config.payment_service_url {
            Some(url) => Arc::new(HttpPaymentSink::new(client.clone(), url.as_str())),
            None => Arc::new(LogSink),
        };
        let notification: Arc<dyn NotificationSink> = match &config.notification_service_url {
            Some(url) => Arc::new(HttpNotificationSink::new(client, url.as_str())),
            None => Arc::new(LogSink),
        };

        let aws = if config.uses_aws() {
            Some(aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await)
        } else {
            None
        };
        let queue: Arc<dyn QueueSink> = match (&aws, &config.sqs_queue_url) {
            (Some(sdk), Some(url)) => Arc::new(SqsQueueSink::new(sdk, url.as_str())),
            _ => Arc::new(LogSink),
        };
        let event_bus: Arc<dyn EventBusSink> = match (&aws, &config.event_bus_name) {
            (Some(sdk), Some(name)) => Arc::new(EventBridgeSink::new(sdk, name.as_str())),
            _ => Arc::new(LogSink),
        };

        Ok(Self {
            cart,
            catalog,
            sinks: Sinks {
                payment,
                notification,
                queue,
                event_bus,
            },
        })
    }
}

/// Wires the orchestrator, callback handler and dispatcher around a
/// repository. The returned handle owns the fan-out worker.
pub fn create_state<R: OrderRepository + Clone + 'static>(
    repository: R,
    collaborators: Collaborators,
    dispatch: DispatchConfig,
) -> (Arc<AppState<R>>, DispatchWorkerHandle) {
    let (dispatcher, worker) = Dispatcher::spawn(collaborators.sinks, dispatch);

    let state = Arc::new(AppState {
        orchestrator: CheckoutOrchestrator::new(
            repository.clone(),
            collaborators.cart,
            collaborators.catalog,
            dispatcher.clone(),
        ),
        callbacks: PaymentCallbackHandler::new(repository.clone(), dispatcher),
        repository,
    });

    (state, worker)
}

/// Creates application state with in-memory collaborators.
pub fn create_default_state<R: OrderRepository + Clone + 'static>(
    repository: R,
) -> (Arc<AppState<R>>, DispatchWorkerHandle, InMemoryServices) {
    let services = InMemoryServices::new();
    let (state, worker) = create_state(
        repository,
        services.collaborators(),
        DispatchConfig::new(Config::default().callback_url()),
    );
    (state, worker, services)
}
