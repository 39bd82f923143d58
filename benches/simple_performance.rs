use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sms_core::*;
use sms_web_generic::{Payload, RelayHandler, RelayRequest};
use std::sync::Arc;
use tokio::runtime::Runtime;

struct NoopClient;

#[async_trait]
impl SmsClient for NoopClient {
    async fn send(&self, _req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        Ok(SendResponse {
            id: String::new(),
            provider: "noop",
            raw: serde_json::Value::Null,
        })
    }
}

fn form_body(recipients: usize) -> String {
    let mut form = String::from("authToken=bench-token&message=Hello+from+the+bench");
    for i in 0..recipients {
        form.push_str(&format!("&to=%2B614{:08}", i));
    }
    STANDARD.encode(form)
}

fn benchmark_relay_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let handler = RelayHandler::new(Arc::new(NoopClient), "bench-token");

    let recipient_counts = vec![1, 10, 100];
    let mut group = c.benchmark_group("relay_dispatch");

    for count in recipient_counts {
        let body = form_body(count);

        group.bench_with_input(BenchmarkId::new("handle", count), &count, |b, &_count| {
            b.to_async(&rt).iter(|| async {
                let request = RelayRequest::new("POST", "/send", vec![], Some(body.clone()));
                black_box(handler.handle(request).await)
            })
        });
    }
    group.finish();
}

fn benchmark_rejections(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let handler = RelayHandler::new(Arc::new(NoopClient), "bench-token");
    let unauthorized = STANDARD.encode("authToken=wrong&message=Hi&to=%2B61400000001");

    let mut group = c.benchmark_group("rejections");

    group.bench_function("route_not_found", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                handler
                    .handle(RelayRequest::new("GET", "/", vec![], None))
                    .await,
            )
        })
    });

    group.bench_function("unauthorized", |b| {
        b.to_async(&rt).iter(|| async {
            let request = RelayRequest::new("POST", "/send", vec![], Some(unauthorized.clone()));
            black_box(handler.handle(request).await)
        })
    });

    group.finish();
}

fn benchmark_payload_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_decoding");

    for count in [1, 100] {
        let body = form_body(count);
        group.bench_with_input(BenchmarkId::new("decode", count), &count, |b, &_count| {
            b.iter(|| black_box(Payload::decode(&body)))
        });
    }

    group.finish();
}

fn benchmark_configuration_loading(c: &mut Criterion) {
    use sms_relay::config::AppConfig;

    let mut group = c.benchmark_group("configuration");

    group.bench_function("create_default", |b| {
        b.iter(|| black_box(AppConfig::default()))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_relay_dispatch,
    benchmark_rejections,
    benchmark_payload_decoding,
    benchmark_configuration_loading
);

criterion_main!(benches);
