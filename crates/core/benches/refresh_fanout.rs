use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::future::join_all;
use tollgate_core::testing::{token_store_with, MockRefresher, MockTransport};
use tollgate_core::AuthenticatedClient;
use tollgate_domain::{ClientConfig, HttpMethod, TokenPair};

async fn expired_client() -> AuthenticatedClient {
    AuthenticatedClient::new(
        ClientConfig::new("https://api.test"),
        token_store_with(Some(TokenPair::new("A1", "R1"))).await,
        Arc::new(MockTransport::accepting("A2")),
        Arc::new(MockRefresher::succeeding(TokenPair::new("A2", "R2"))),
    )
}

fn refresh_fanout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_fanout");
    group.sample_size(20).measurement_time(std::time::Duration::from_secs(10));

    for burst in [1_usize, 16, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(burst), &burst, |b, &burst| {
            let runtime = tokio::runtime::Runtime::new().expect("runtime");

            b.iter(|| {
                runtime.block_on(async move {
                    let client = expired_client().await;
                    let requests = (0..burst)
                        .map(|i| client.execute(client.request(HttpMethod::Get, &format!("/{i}"))));
                    for outcome in join_all(requests).await {
                        black_box(outcome.expect("replayed"));
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(core_benchmarks, refresh_fanout_benchmark);
criterion_main!(core_benchmarks);
