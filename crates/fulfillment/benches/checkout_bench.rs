use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, PaymentCallback, UserId};
use fulfillment::{
    CheckoutOrchestrator, DispatchConfig, Dispatcher, InMemoryCartStore, InMemoryCatalog,
    InMemoryEventBus, InMemoryNotificationSink, InMemoryPaymentSink, InMemoryQueue,
    PaymentCallbackHandler, Sinks,
};
use order_store::InMemoryOrderRepository;

struct Bench {
    orchestrator: CheckoutOrchestrator<InMemoryOrderRepository>,
    handler: PaymentCallbackHandler<InMemoryOrderRepository>,
}

fn setup(lines: usize) -> Bench {
    let repository = InMemoryOrderRepository::new();
    let cart = InMemoryCartStore::new();
    let catalog = InMemoryCatalog::new();
    for i in 0..lines {
        let sku = format!("SKU-{i:03}");
        catalog.insert(sku.clone(), Money::from_cents(1000 + i as i64));
        cart.add_line(UserId::new(1), sku, 2);
    }

    let (dispatcher, _worker) = Dispatcher::spawn(
        Sinks {
            payment: Arc::new(InMemoryPaymentSink::new()),
            notification: Arc::new(InMemoryNotificationSink::new()),
            queue: Arc::new(InMemoryQueue::new()),
            event_bus: Arc::new(InMemoryEventBus::new()),
        },
        DispatchConfig::new("http://localhost:8080/orders/callback"),
    );

    Bench {
        orchestrator: CheckoutOrchestrator::new(
            repository.clone(),
            Arc::new(cart),
            Arc::new(catalog),
            dispatcher.clone(),
        ),
        handler: PaymentCallbackHandler::new(repository, dispatcher),
    }
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let bench = rt.block_on(async { setup(10) });

    c.bench_function("checkout/10_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                bench.orchestrator.checkout(UserId::new(1)).await.unwrap();
            });
        });
    });
}

fn bench_checkout_then_callback(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let bench = rt.block_on(async { setup(3) });

    c.bench_function("checkout/with_success_callback", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = bench.orchestrator.checkout(UserId::new(1)).await.unwrap();
                bench
                    .handler
                    .handle(PaymentCallback::new(order.id(), "success"))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_checkout, bench_checkout_then_callback);
criterion_main!(benches);
