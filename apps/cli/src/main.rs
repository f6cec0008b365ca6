#![deny(warnings)]

//! Headless CLI: runs one business in memory for a stretch of game time
//! and prints KPI lines. Used for balance checks without a database.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::constants::*;
use sim_core::{
    validate_business, AcquiredTech, Business, GameSnapshot, Product, TechCode,
};
use sim_engine::ledger::Modifiers;
use sim_engine::{orders, production, replay};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn parse_args() -> (u32, u64, bool) {
    let mut minutes = 10u32;
    let mut seed = 42u64;
    let mut automated = false;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--minutes" => minutes = it.next().and_then(|s| s.parse().ok()).unwrap_or(minutes),
            "--seed" => seed = it.next().and_then(|s| s.parse().ok()).unwrap_or(seed),
            "--automated" => automated = true,
            _ => {}
        }
    }
    (minutes, seed, automated)
}

fn starting_snapshot(now: DateTime<Utc>, automated: bool) -> GameSnapshot {
    let mut business = Business::template(now);
    business.id = 2;
    business.name = "Casey".to_string();
    business.business_name = "Casey Cargo".to_string();

    let mut acquired = Vec::new();
    if automated {
        business.automation_enabled = true;
        for code in [TechCode::AutoBuilder, TechCode::AutoShipper] {
            acquired.push(AcquiredTech { code, modifier: 1.0, expires_at: None });
        }
    }

    GameSnapshot {
        business,
        products: vec![Product {
            id: 1,
            business_id: 2,
            name: "Standard Freight".to_string(),
            cost_to_build: DEFAULT_COST_TO_BUILD,
            sales_price: DEFAULT_SALES_PRICE,
            weight: DEFAULT_PRODUCT_WEIGHT,
            on_hand: 0,
            build_active: false,
            build_started_at: None,
            build_duration_ms: 0,
            quantity_per_build: DEFAULT_PRODUCTS_PER_BUILD,
        }],
        orders: Vec::new(),
        acquired,
    }
}

/// A simple manual-play policy: keep the line building and ship whatever
/// fits whenever nothing is in transit.
fn play_turn(snapshot: &mut GameSnapshot, now: DateTime<Utc>, rng: &mut ChaCha8Rng) {
    let mods = Modifiers::at(&snapshot.acquired, now);
    if !snapshot.business.automation_enabled {
        if let Ok(plan) =
            production::start_build(&snapshot.business, &snapshot.products, &mods, now)
        {
            replay::apply_build(snapshot, &plan);
        }
    }
    if let Ok(plan) = orders::ship_order(
        &snapshot.business,
        &snapshot.products,
        &snapshot.orders,
        &mods,
        now,
        rng,
    ) {
        replay::apply_shipment(snapshot, &plan);
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let (minutes, seed, automated) = parse_args();
    info!(minutes, seed, automated, "starting headless run");

    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut snapshot = starting_snapshot(start, automated);
    validate_business(&snapshot.business)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let total_seconds = i64::from(minutes) * 60;
    let mut now = start;
    for _ in 0..total_seconds {
        now += Duration::seconds(1);
        let outcome = sim_engine::advance(&snapshot, now, &mut rng)?;
        replay::apply(&mut snapshot, &outcome, now);
        if !snapshot.business.active {
            break;
        }
        play_turn(&mut snapshot, now, &mut rng);
    }

    let b = &snapshot.business;
    println!(
        "Run OK | minutes: {} | money: ${} | shipped: {} | earned: ${} | xp: {} | on hand: {}",
        minutes,
        b.money,
        b.orders_shipped,
        b.total_money_earned,
        b.xp,
        snapshot.products[0].on_hand
    );

    Ok(())
}
