use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::constants::*;
use sim_core::{AcquiredTech, Business, GameSnapshot, Product, TechCode};
use sim_engine::replay;

fn build_snapshot() -> GameSnapshot {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut business = Business::template(start);
    business.id = 2;
    business.automation_enabled = true;
    business.money = 1_000_000;
    GameSnapshot {
        business,
        products: vec![Product {
            id: 1,
            business_id: 2,
            name: "Bench Freight".into(),
            cost_to_build: DEFAULT_COST_TO_BUILD,
            sales_price: DEFAULT_SALES_PRICE,
            weight: DEFAULT_PRODUCT_WEIGHT,
            on_hand: 0,
            build_active: false,
            build_started_at: None,
            build_duration_ms: 0,
            quantity_per_build: DEFAULT_PRODUCTS_PER_BUILD,
        }],
        orders: vec![],
        acquired: vec![
            AcquiredTech { code: TechCode::AutoBuilder, modifier: 1.0, expires_at: None },
            AcquiredTech { code: TechCode::AutoShipper, modifier: 1.0, expires_at: None },
        ],
    }
}

fn bench_ticks(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("tick_1s", |b| {
        let mut snapshot = build_snapshot();
        let mut now = snapshot.business.created_at;
        b.iter(|| {
            now += Duration::seconds(1);
            let outcome = sim_engine::advance(&snapshot, now, &mut rng).unwrap();
            replay::apply(&mut snapshot, &outcome, now);
        })
    });

    // Long-idle catch-up must stay closed-form: a 30-minute gap should
    // cost the same as any other single tick.
    c.bench_function("tick_idle_30m", |b| {
        b.iter(|| {
            let snapshot = build_snapshot();
            let later = snapshot.business.created_at + Duration::minutes(30);
            let _ = sim_engine::advance(&snapshot, later, &mut rng).unwrap();
        })
    });
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
