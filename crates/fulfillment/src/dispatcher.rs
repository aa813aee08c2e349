//! Post-order fan-out.
//!
//! Every order that is created or changes status is handed to the
//! [`Dispatcher`], which queues it for a background worker and returns
//! immediately. The worker runs each job as its own task, and within a job
//! the payment, notification, queue and event-bus calls run concurrently.
//! At most `capacity` jobs run at once and at most `capacity` more wait in
//! the queue; anything beyond that is dropped at submission.
//! A failing or slow sink never affects the others, and never affects the
//! request that produced the order.

use std::sync::Arc;

use domain::{Order, OrderStatus};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use crate::services::{
    BusEvent, EventBusSink, EventType, Notification, NotificationSink, PaymentInitiation,
    PaymentSink, QueueSink, SinkError,
};

/// Default number of jobs that may wait for the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// The one-way collaborators every job fans out to.
#[derive(Clone)]
pub struct Sinks {
    pub payment: Arc<dyn PaymentSink>,
    pub notification: Arc<dyn NotificationSink>,
    pub queue: Arc<dyn QueueSink>,
    pub event_bus: Arc<dyn EventBusSink>,
}

/// Dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Bound of the job queue and of the jobs running at once. Submissions
    /// beyond it are dropped.
    pub capacity: usize,
    /// URL the payment provider reports results to.
    pub callback_url: String,
}

impl DispatchConfig {
    pub fn new(callback_url: impl Into<String>) -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            callback_url: callback_url.into(),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Handle used to submit fan-out jobs.
///
/// Cheap to clone. The worker stops once every clone is dropped or
/// [`DispatchWorkerHandle::shutdown`] is called.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sender: mpsc::Sender<Order>,
}

/// Owner handle of the background worker.
#[derive(Debug)]
pub struct DispatchWorkerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl DispatchWorkerHandle {
    /// Stops accepting jobs, then waits for queued and running jobs to finish.
    pub async fn shutdown(self) {
        let Self { shutdown, task } = self;
        let _ = shutdown.send(());
        wait_for_worker(task).await;
    }

    /// Waits for the worker to exit without closing the queue.
    pub async fn join(self) {
        wait_for_worker(self.task).await;
    }
}

async fn wait_for_worker(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        tracing::error!(error = %e, "dispatch worker panicked");
    }
}

impl Dispatcher {
    /// Starts the background worker on the current runtime.
    pub fn spawn(sinks: Sinks, config: DispatchConfig) -> (Self, DispatchWorkerHandle) {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let context = Arc::new(JobContext {
            sinks,
            callback_url: config.callback_url,
        });
        let permits = Arc::new(Semaphore::new(capacity));
        let task = tokio::spawn(run_worker(receiver, shutdown_rx, permits, context));

        (
            Self { sender },
            DispatchWorkerHandle {
                shutdown: shutdown_tx,
                task,
            },
        )
    }

    /// Queues a fan-out job for `order`.
    ///
    /// Never waits. Returns false when the job was dropped because the queue
    /// is full or the worker has stopped.
    pub fn submit(&self, order: Order) -> bool {
        let order_id = order.id();
        match self.sender.try_send(order) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%order_id, "dispatch queue full, dropping fan-out job");
                metrics::counter!("dispatch_jobs_dropped_total").increment(1);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(%order_id, "dispatcher stopped, dropping fan-out job");
                metrics::counter!("dispatch_jobs_dropped_total").increment(1);
                false
            }
        }
    }
}

/// Takes the next job only once a running slot is free, so a stalled sink
/// backs up into the channel instead of into the task set.
async fn next_job(
    receiver: &mut mpsc::Receiver<Order>,
    permits: &Arc<Semaphore>,
) -> Option<(Order, OwnedSemaphorePermit)> {
    let permit = Arc::clone(permits).acquire_owned().await.ok()?;
    let order = receiver.recv().await?;
    Some((order, permit))
}

async fn run_worker(
    mut receiver: mpsc::Receiver<Order>,
    mut shutdown: oneshot::Receiver<()>,
    permits: Arc<Semaphore>,
    context: Arc<JobContext>,
) {
    let mut in_flight = JoinSet::new();
    let mut listening = true;

    loop {
        tokio::select! {
            signal = &mut shutdown, if listening => {
                listening = false;
                // A dropped handle leaves the queue open.
                if signal.is_ok() {
                    tracing::info!("dispatcher closing, draining queued jobs");
                    receiver.close();
                }
            }
            received = next_job(&mut receiver, &permits) => match received {
                Some((order, permit)) => {
                    let context = Arc::clone(&context);
                    in_flight.spawn(async move {
                        context.fan_out(order).await;
                        drop(permit);
                    });
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "fan-out job panicked");
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "fan-out job panicked");
        }
    }
    tracing::info!("dispatcher stopped");
}

struct JobContext {
    sinks: Sinks,
    callback_url: String,
}

impl JobContext {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), status = %order.status()))]
    async fn fan_out(&self, order: Order) {
        metrics::counter!("dispatch_jobs_total").increment(1);
        let message = notification_for(&order);

        let (payment, notification, queue, event_bus) = tokio::join!(
            self.initiate_payment(&order),
            self.sinks.notification.send(&message),
            self.sinks.queue.publish(&order),
            self.put_event(&order),
        );

        if let Some(result) = payment {
            record("payment", result);
        }
        record("notification", notification);
        record("queue", queue);
        record("event_bus", event_bus);
    }

    /// Only a freshly created order starts payment.
    async fn initiate_payment(&self, order: &Order) -> Option<Result<(), SinkError>> {
        if !order.status().is_pending() {
            return None;
        }
        let request = PaymentInitiation {
            order_id: order.id(),
            user_id: order.user_id(),
            amount: order.total(),
            callback_url: self.callback_url.clone(),
        };
        Some(self.sinks.payment.initiate(&request).await)
    }

    async fn put_event(&self, order: &Order) -> Result<(), SinkError> {
        let event = if order.status().is_pending() {
            BusEvent::new(EventType::OrderCreated, serde_json::to_value(order)?)
        } else {
            BusEvent::new(
                EventType::OrderStatusChanged,
                serde_json::json!({
                    "order_id": order.id(),
                    "status": order.status(),
                    "user_id": order.user_id(),
                }),
            )
        };
        self.sinks.event_bus.put_event(event).await
    }
}

fn notification_for(order: &Order) -> Notification {
    let message = match order.status() {
        OrderStatus::Pending => format!("New order #{} created", order.id()),
        status => format!("Your order #{} is now {}", order.id(), status),
    };
    Notification {
        user_id: order.user_id(),
        order_id: order.id(),
        status: order.status(),
        total: order.total(),
        message,
    }
}

fn record(sink: &'static str, result: Result<(), SinkError>) {
    match result {
        Ok(()) => tracing::debug!(sink, "sink call succeeded"),
        Err(e) => {
            tracing::warn!(sink, error = %e, "sink call failed");
            metrics::counter!("dispatch_sink_failures_total", "sink" => sink).increment(1);
        }
    }
}
