//! Benchmarks for resolution and cached lookups.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grantline_core::authz::{
    resolve, AuthorizationRecord, IdentityContext, PartitionedRecords, Permission, UserId, ALL_RESOURCES,
};
use grantline_core::cache::{AuthorizationCacheConfig, CachingAuthorizationService};
use std::collections::HashSet;

const ENGINE: &str = "camunda-bpm";
const CATEGORY: &str = "process-definition";

/// A batch mixing every layer and kind, with a quarter of the records
/// carrying a permission the check does not care about.
fn records(count: usize) -> Vec<AuthorizationRecord> {
    (0..count)
        .map(|i| {
            let permission = if i % 4 == 0 { "edit" } else { "view" };
            let resource = format!("definition-{}", i % 97);
            let record = match i % 6 {
                0 => AuthorizationRecord::global(ENGINE, CATEGORY, ALL_RESOURCES),
                1 => AuthorizationRecord::global(ENGINE, CATEGORY, resource),
                2 => AuthorizationRecord::grant(ENGINE, CATEGORY, resource).for_group(format!("group-{}", i % 8)),
                3 => AuthorizationRecord::revoke(ENGINE, CATEGORY, resource).for_group(format!("group-{}", i % 8)),
                4 => AuthorizationRecord::grant(ENGINE, CATEGORY, resource).for_user("alice"),
                _ => AuthorizationRecord::revoke(ENGINE, CATEGORY, resource).for_user("alice"),
            };
            record.with_permissions([permission])
        })
        .collect()
}

fn view() -> HashSet<Permission> {
    [Permission::new("view")].into_iter().collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let identity = IdentityContext::new("alice").with_groups(["group-1", "group-3", "group-5"]);
    let relevant = view();
    for size in [10usize, 100, 1_000, 10_000] {
        let batch = records(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| black_box(resolve(&ENGINE.into(), batch, &relevant, &identity, &CATEGORY.into())));
        });
    }
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    let identity = IdentityContext::new("alice").with_groups(["group-1", "group-3", "group-5"]);
    let batch = records(1_000);
    group.bench_function("1000_records", |b| { b.iter(|| black_box(PartitionedRecords::split(&batch, &identity).len())); });
    group.finish();
}

fn bench_is_authorized(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_authorized");
    let identity = IdentityContext::new("alice").with_groups(["group-1"]);
    let decision = resolve(&ENGINE.into(), &records(1_000), &view(), &identity, &CATEGORY.into());
    group.bench_function("allowed", |b| { b.iter(|| black_box(decision.is_authorized("definition-7"))); });
    group.bench_function("unknown", |b| { b.iter(|| black_box(decision.is_authorized("missing"))); });
    group.finish();
}

fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");
    let rt = tokio::runtime::Runtime::new().unwrap();
    let batch = records(1_000);
    let service = CachingAuthorizationService::from_fn(
        move |user_id: UserId| {
            let batch = batch.clone();
            async move {
                let identity = IdentityContext::new(user_id);
                Ok(resolve(&ENGINE.into(), &batch, &view(), &identity, &CATEGORY.into()))
            }
        },
        AuthorizationCacheConfig::default(),
    )
    .unwrap();
    let alice = UserId::new("alice");
    rt.block_on(async { service.get(&alice).await.unwrap(); });
    group.bench_function("hit", |b| { b.iter(|| { rt.block_on(async { black_box(service.get(&alice).await.unwrap()); }); }); });
    group.bench_function("invalidate_then_get", |b| { b.iter(|| { rt.block_on(async { service.on_identity_session_end(&alice).await; black_box(service.get(&alice).await.unwrap()); }); }); });
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_partition, bench_is_authorized, bench_cached_get);
criterion_main!(benches);
