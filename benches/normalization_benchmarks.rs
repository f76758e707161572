//! Performance benchmarks for the Timesheet Normalization Engine.
//!
//! Covers the per-field resolvers, roster search as the roster grows, and
//! end-to-end timesheet normalization through the HTTP API.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use timesheet_engine::api::{AppState, create_router};
use timesheet_engine::config::ConfigLoader;
use timesheet_engine::identity::{RosterRegistry, WeightedSimilarity};
use timesheet_engine::models::DateContext;
use timesheet_engine::normalization::{DateResolver, TimeResolver};
use timesheet_engine::store::InMemoryTimesheetStore;

use axum::{body::Body, http::Request};
use chrono::NaiveDate;
use tower::ServiceExt;

const RAW_DATES: [&str; 6] = [
    "2024-03-05",
    "03/05/2024",
    "3/5/24",
    "Tuesday 5",
    "Tue",
    "March 5, 2024",
];
const RAW_TIMES: [&str; 6] = ["9:00am", "6.70", "l2:3O pm", "1730", "noon", "7:10"];

fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    AppState::new(config)
}

/// Creates a timesheet request with `entry_count` visits per employee.
fn create_timesheet_body(
    organization_id: &str,
    employee_count: usize,
    entry_count: usize,
) -> String {
    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let employees: Vec<serde_json::Value> = (0..employee_count)
        .map(|e| {
            let entries: Vec<serde_json::Value> = days
                .iter()
                .cycle()
                .take(entry_count)
                .map(|day| {
                    serde_json::json!({
                        "date": day,
                        "time_in": "9:00am",
                        "time_out": "5:15pm"
                    })
                })
                .collect();
            serde_json::json!({
                "employee_name": format!("Employee {:03}", e),
                "service_code": "T1019",
                "signature_present": true,
                "entries": entries
            })
        })
        .collect();

    serde_json::json!({
        "organization_id": organization_id,
        "week_start": "2024-03-04",
        "timesheet": { "client_name": "Bench Client", "employees": employees }
    })
    .to_string()
}

/// Benchmark: date resolution across every rule.
fn bench_date_resolution(c: &mut Criterion) {
    let resolver = DateResolver::default();
    let context = DateContext {
        week_start: NaiveDate::from_ymd_opt(2024, 3, 4),
    };

    c.bench_function("resolve_dates", |b| {
        b.iter(|| {
            for raw in RAW_DATES {
                black_box(resolver.resolve(black_box(raw), &context));
            }
        })
    });
}

/// Benchmark: time resolution including OCR repairs.
fn bench_time_resolution(c: &mut Criterion) {
    let resolver = TimeResolver::default();

    c.bench_function("resolve_times", |b| {
        b.iter(|| {
            for raw in RAW_TIMES {
                black_box(resolver.resolve(black_box(raw)));
            }
        })
    });
}

/// Benchmark: roster search as the roster grows.
fn bench_roster_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_search");

    for roster_size in [10usize, 100, 1000].iter() {
        let registry = RosterRegistry::new();
        let index = registry.index_for(
            "org_bench",
            Arc::new(InMemoryTimesheetStore::new()),
            Arc::new(WeightedSimilarity::default()),
            5,
        );
        for i in 0..*roster_size {
            index
                .register(&format!("Employee {:04} Surname", i), Vec::new())
                .expect("Failed to register employee");
        }

        group.throughput(Throughput::Elements(*roster_size as u64));
        group.bench_with_input(
            BenchmarkId::new("employees", roster_size),
            roster_size,
            |b, _| b.iter(|| black_box(index.search(black_box("Employe 0042 Surnme"), None))),
        );
    }

    group.finish();
}

/// Benchmark: full timesheet normalization and storage over HTTP.
fn bench_timesheet_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let state = create_test_state();
    let router = create_router(state);

    let mut group = c.benchmark_group("timesheet_pipeline");

    for employee_count in [1usize, 4, 16].iter() {
        let body = create_timesheet_body("org_bench", *employee_count, 14);

        group.throughput(Throughput::Elements(*employee_count as u64));
        group.bench_with_input(
            BenchmarkId::new("employees", employee_count),
            employee_count,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    let router = router.clone();
                    let response = router
                        .oneshot(
                            Request::builder()
                                .method("POST")
                                .uri("/timesheets")
                                .header("Content-Type", "application/json")
                                .body(Body::from(body.clone()))
                                .unwrap(),
                        )
                        .await
                        .unwrap();
                    black_box(response)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_date_resolution,
    bench_time_resolution,
    bench_roster_search,
    bench_timesheet_pipeline,
);
criterion_main!(benches);
