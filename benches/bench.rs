// Criterion benchmarks for the seating planner

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use seating_planner::core::{PairHistory, PenaltyModel, SeatingEngine};
use seating_planner::models::{Attendee, HistoryRecord, TableConfig};
use chrono::NaiveDate;

const DEPARTMENTS: [&str; 6] = ["Sales", "Legal", "Ops", "R&D", "Finance", "HR"];
const LOCATIONS: [&str; 4] = ["Oslo", "Rome", "Lima", "Pune"];

fn create_attendee(id: usize) -> Attendee {
    Attendee::named(format!("Guest {}", id))
        .with_attribute("department", DEPARTMENTS[id % DEPARTMENTS.len()])
        .with_attribute("location", LOCATIONS[(id / 3) % LOCATIONS.len()])
}

fn create_history(attendee_count: usize, table_size: usize, events: usize) -> Vec<HistoryRecord> {
    (0..events)
        .map(|event| {
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::weeks(event as i64);
            (0..attendee_count).fold(HistoryRecord::new(date), |record, id| {
                let table = (id + event) % attendee_count.div_ceil(table_size) + 1;
                record.with_seat(format!("Guest {}", id), table)
            })
        })
        .collect()
}

fn bench_assign(c: &mut Criterion) {
    let engine = SeatingEngine::with_default_model();

    let mut group = c.benchmark_group("assign");

    for attendee_count in [12, 48, 120, 240].iter() {
        let attendees: Vec<Attendee> = (0..*attendee_count).map(create_attendee).collect();
        let config = TableConfig::sized_for(*attendee_count, 8);
        let history = create_history(*attendee_count, 8, 3);

        group.bench_with_input(
            BenchmarkId::new("assign_seeded", attendee_count),
            attendee_count,
            |b, _| {
                b.iter(|| {
                    engine.assign_seeded(
                        black_box(&attendees),
                        black_box(&config),
                        black_box(&history),
                        black_box(42),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_single_pass(c: &mut Criterion) {
    let engine = SeatingEngine::new(PenaltyModel::default(), 1);
    let attendees: Vec<Attendee> = (0..120).map(create_attendee).collect();
    let config = TableConfig::sized_for(120, 10);

    c.bench_function("single_pass_120_attendees", |b| {
        b.iter(|| {
            engine.assign_seeded(black_box(&attendees), black_box(&config), &[], black_box(7))
        });
    });
}

fn bench_pair_history(c: &mut Criterion) {
    let records = create_history(240, 8, 12);

    c.bench_function("pair_history_240_attendees_12_events", |b| {
        b.iter(|| PairHistory::from_records(black_box(&records), black_box(3)));
    });
}

criterion_group!(
    benches,
    bench_assign,
    bench_single_pass,
    bench_pair_history
);
criterion_main!(benches);
