use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use it_desk::services::{NotificationProducer, NotificationStore};
use tempfile::tempdir;

fn seeded(store: Arc<NotificationStore>, size: usize) -> NotificationProducer {
    let producer = NotificationProducer::new(store);
    for i in 0..size {
        producer
            .notify_new_employee(&format!("e{i}"), "Bench User", "Engineering", "T1")
            .expect("seed");
    }
    producer
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("notification_add");
    for size in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("memory", size), &size, |b, &size| {
            let producer = seeded(Arc::new(NotificationStore::in_memory()), size);
            b.iter(|| producer.notify_new_employee("new", "New Hire", "Sales", "T9").expect("add"));
        });

        group.bench_with_input(BenchmarkId::new("file", size), &size, |b, &size| {
            let tmp = tempdir().expect("tempdir");
            let producer = seeded(Arc::new(NotificationStore::open_dir(tmp.path())), size);
            b.iter(|| producer.notify_new_employee("new", "New Hire", "Sales", "T9").expect("add"));
        });
    }
    group.finish();
}

fn bench_pending(c: &mut Criterion) {
    let mut group = c.benchmark_group("notification_pending");
    for size in [10usize, 100, 1_000] {
        let tmp = tempdir().expect("tempdir");
        let store = Arc::new(NotificationStore::open_dir(tmp.path()));
        seeded(store.clone(), size);
        let ids: Vec<String> = store.list().iter().step_by(2).map(|n| n.id.clone()).collect();
        for id in &ids {
            store.mark_processed(id).expect("mark");
        }

        group.bench_with_input(BenchmarkId::new("list_pending", size), &size, |b, _| {
            b.iter(|| store.list_pending().len());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_pending);
criterion_main!(benches);
