// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Hot paths on every request:
//   1. Collection merge — upsert of a response batch into cached items
//   2. Coverage planning — deciding whether a request can shortcut
//   3. Cache reads — freshness checks and scoped enumeration

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wkcache::api::types::Kanji;
use wkcache::cache::{Cache, SqliteStore};
use wkcache::collection::{CacheableCollection, Collection};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// `per_level` kanji for each of levels 1..=levels.
fn build_kanji(levels: u32, per_level: u32) -> Vec<Kanji> {
    (1..=levels)
        .flat_map(|level| {
            (0..per_level).map(move |i| Kanji {
                character: format!("k{level}-{i}"),
                meaning: format!("meaning {i}"),
                important_reading: "onyomi".into(),
                level,
                ..Default::default()
            })
        })
        .collect()
}

// ─── Benchmark: Merge ───────────────────────────────────────────────────────

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let cached = Collection::from_items(build_kanji(60, 35));
    let update = build_kanji(60, 35);
    group.bench_function("merge_2100_identical", |b| {
        b.iter(|| {
            let mut c = cached.clone();
            c.merge(black_box(update.clone()));
        })
    });

    let new_level = build_kanji(61, 35).split_off(60 * 35);
    group.bench_function("merge_one_new_level", |b| {
        b.iter(|| {
            let mut c = cached.clone();
            c.merge(black_box(new_level.clone()));
        })
    });

    group.finish();
}

// ─── Benchmark: Coverage ────────────────────────────────────────────────────

fn bench_coverage(c: &mut Criterion) {
    let cached = Collection::from_items(build_kanji(60, 35));
    let default_levels: &[u32] = &[];
    let mixed_levels: &[u32] = &[1, 30, 61];

    c.bench_function("plan_default_levels_60", |b| {
        b.iter(|| cached.plan(black_box(default_levels), Some(60)))
    });

    c.bench_function("plan_missing_level", |b| {
        b.iter(|| cached.plan(black_box(mixed_levels), Some(61)))
    });
}

// ─── Benchmark: Cache reads ─────────────────────────────────────────────────

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    let memory = Cache::in_memory(Duration::from_secs(3600));
    let scope = memory.root().child("user/bench");
    Collection::from_items(build_kanji(10, 35)).dump(&scope);
    group.bench_function("memory_load_350", |b| {
        b.iter(|| {
            let mut c: Collection<Kanji> = Collection::new();
            c.load(black_box(&scope));
            c
        })
    });

    let store = SqliteStore::in_memory().expect("open in-memory db");
    let sqlite = Cache::new(Box::new(store), Duration::from_secs(3600));
    let scope = sqlite.root().child("user/bench");
    Collection::from_items(build_kanji(10, 35)).dump(&scope);
    group.bench_function("sqlite_load_350", |b| {
        b.iter(|| {
            let mut c: Collection<Kanji> = Collection::new();
            c.load(black_box(&scope));
            c
        })
    });

    group.bench_function("sqlite_get_single", |b| {
        b.iter(|| scope.get::<Kanji>(black_box("kanji/k5-7")))
    });

    group.finish();
}

criterion_group!(benches, bench_merge, bench_coverage, bench_cache);
criterion_main!(benches);
