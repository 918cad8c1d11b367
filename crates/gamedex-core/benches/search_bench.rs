//! # Search Benchmarks
//!
//! Performance benchmarks for the search-paginate engine.
//!
//! Run with: `cargo bench -p gamedex-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gamedex_core::{
    AgeRating, CatalogStore, Game, GameId, MemoryCatalog, SearchParams, SearchRequest, search,
};
use std::collections::BTreeSet;
use std::hint::black_box;

const BASE: &str = "http://localhost:8080/v1/games/search";

/// Create a catalog with N games spread over a few release years.
fn create_catalog(size: usize) -> MemoryCatalog {
    let mut store = MemoryCatalog::new();
    for i in 0..size {
        store
            .insert(Game {
                id: GameId(0),
                title: format!("Game {:06}", (i * 7919) % size.max(1)),
                description: "bench".to_string(),
                release_year: 1990 + (i % 30) as i32,
                age_rating: AgeRating::Free,
                developer: None,
                genres: BTreeSet::new(),
            })
            .expect("insert");
    }
    store
}

fn request(q: Option<&str>, sort: &str) -> SearchRequest {
    SearchRequest::resolve::<Game>(&SearchParams {
        q: q.map(str::to_string),
        sort: Some(sort.to_string()),
        direction: Some("desc".to_string()),
        page: Some(3),
        size: Some(20),
    })
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_full_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_all");
    for size in [100, 1_000, 10_000] {
        let store = create_catalog(size);
        let req = request(None, "title");
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| search::<Game, _>(black_box(&store), black_box(&req), BASE))
        });
    }
    group.finish();
}

fn bench_text_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_text");
    for size in [100, 1_000, 10_000] {
        let store = create_catalog(size);
        let req = request(Some("game 00"), "releaseYear");
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| search::<Game, _>(black_box(&store), black_box(&req), BASE))
        });
    }
    group.finish();
}

fn bench_year_query(c: &mut Criterion) {
    let store = create_catalog(10_000);
    let req = request(Some("2001"), "id");
    c.bench_function("search_year_10000", |b| {
        b.iter(|| search::<Game, _>(black_box(&store), black_box(&req), BASE))
    });
}

criterion_group!(benches, bench_full_listing, bench_text_query, bench_year_query);
criterion_main!(benches);
