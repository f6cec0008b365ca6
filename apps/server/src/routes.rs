//! Route handlers: the poll endpoint, player actions, and projections.

use axum::extract::State;
use axum::http::header::{HeaderMap, COOKIE, SET_COOKIE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use sim_core::constants::REPUTATION_WINDOW_SECONDS;
use sim_core::{AcquiredTech, GameSnapshot};
use sim_engine::ledger::Modifiers;
use sim_engine::progression::{self, ChallengeKind};
use sim_engine::{orders, production};
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, NetworkBusiness};
use crate::views::{BusinessView, FinalStatsView, OrderView, ProductView, TechnologyView};

const SESSION_COOKIE: &str = "session_id";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/create-account", post(create_account))
        .route("/check-session", get(check_session))
        .route("/game-info", get(game_info))
        .route("/start-product-build", post(start_product_build))
        .route("/start-shipping", post(start_shipping))
        .route("/purchase-technology", post(purchase_technology))
        .route("/toggle-building-automation", post(toggle_building_automation))
        .route("/spend-skill-point", post(spend_skill_point))
        .route("/complete-truck-to-warehouse-game", post(complete_truck_game))
        .route("/complete-find-the-product-haystack-game", post(complete_haystack_game))
        .route("/leaderboard", get(leaderboard))
        .route("/network-data", get(network_data))
        .route("/admin-stats", get(admin_stats))
        .with_state(state)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == SESSION_COOKIE).then(|| value.to_string())
    })
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<i64, ApiError> {
    let token = session_token(headers).ok_or(ApiError::Unauthorized)?;
    persistence::session_business(&state.pool, &token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// Acquired technologies through the short-TTL cache that bounds
/// per-poll query load.
async fn acquired_for(
    state: &AppState,
    business_id: i64,
) -> Result<Vec<AcquiredTech>, ApiError> {
    if let Some(cached) = state.tech_cache.get(&business_id) {
        return Ok(cached);
    }
    let acquired = persistence::acquired_technologies(&state.pool, business_id).await?;
    state.tech_cache.insert(business_id, acquired.clone());
    Ok(acquired)
}

/// Reputation through its 60s cache; stale entries recompute lazily.
async fn reputation_for(
    state: &AppState,
    business_id: i64,
    now: DateTime<Utc>,
) -> Result<u8, ApiError> {
    if let Some(cached) = state.reputation_cache.get(&business_id) {
        return Ok(cached);
    }
    let window_start = now - Duration::seconds(REPUTATION_WINDOW_SECONDS);
    let (positive, negative) =
        persistence::reputation_counts(&state.pool, business_id, window_start).await?;
    let score = sim_econ::reputation_score(positive, negative);
    state.reputation_cache.insert(business_id, score);
    Ok(score)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest {
    name: String,
    business_name: String,
}

async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Response, ApiError> {
    if req.name.trim().is_empty() || req.business_name.trim().is_empty() {
        return Err(ApiError::precondition("Name and business name are required"));
    }
    let now = Utc::now();
    let business_id =
        persistence::create_business(&state.pool, req.name.trim(), req.business_name.trim(), now)
            .await?;
    let token = state.new_token();
    persistence::create_session(&state.pool, &token, business_id, now).await?;
    info!(business_id, "account created");

    let mut response =
        Json(json!({ "success": true, "playerId": business_id })).into_response();
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly");
    response.headers_mut().insert(
        SET_COOKIE,
        cookie.parse().map_err(|_| ApiError::Internal("cookie".into()))?,
    );
    Ok(response)
}

async fn check_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let logged_in = match session_token(&headers) {
        Some(token) => persistence::session_business(&state.pool, &token)
            .await?
            .is_some(),
        None => false,
    };
    Ok(Json(json!({ "loggedIn": logged_in })))
}

fn game_over_response(snapshot: &GameSnapshot) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "gameOver": true,
        "business": BusinessView::from(&snapshot.business),
        "finalStats": FinalStatsView::from(&snapshot.business),
    }))
}

/// The per-poll entry point: advances the simulation and returns the
/// full snapshot.
async fn game_info(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(&state, &headers).await?;
    let now = Utc::now();

    let mut snapshot = persistence::load_snapshot(&state.pool, business_id).await?;
    if !snapshot.business.active {
        return Ok(game_over_response(&snapshot));
    }
    snapshot.acquired = acquired_for(&state, business_id).await?;

    let outcome = {
        let mut rng = state.rng.lock().unwrap_or_else(|e| e.into_inner());
        sim_engine::advance(&snapshot, now, &mut *rng)?
    };
    let reputation = reputation_for(&state, business_id, now).await?;

    let applied = persistence::apply_tick(
        &state.pool,
        business_id,
        snapshot.business.last_game_update,
        now,
        &outcome,
        reputation as i64,
    )
    .await?;
    if applied && !outcome.revoked_technologies.is_empty() {
        state.tech_cache.invalidate(&business_id);
    }

    // Respond from a fresh read so the reply reflects exactly what
    // landed, including a lost compare-and-swap.
    let fresh = persistence::load_snapshot(&state.pool, business_id).await?;
    if !fresh.business.active {
        return Ok(game_over_response(&fresh));
    }
    let offered = persistence::available_technologies(&state.pool, business_id).await?;

    Ok(Json(json!({
        "success": true,
        "gameOver": false,
        "business": BusinessView::from(&fresh.business),
        "reputation": reputation,
        "products": fresh.products.iter().map(ProductView::from).collect::<Vec<_>>(),
        "orders": fresh.orders.iter().map(OrderView::from).collect::<Vec<_>>(),
        "availableTechnologies": offered.iter().map(TechnologyView::from).collect::<Vec<_>>(),
        "acquiredTechnologies": fresh
            .acquired
            .iter()
            .map(|a| a.code.as_str())
            .collect::<Vec<_>>(),
        "secondsUntilNextOrder": outcome.seconds_until_next_order,
        "timeRemainingSeconds": outcome.time_remaining_seconds,
    })))
}

async fn start_product_build(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(&state, &headers).await?;
    let now = Utc::now();
    let snapshot = persistence::load_snapshot(&state.pool, business_id).await?;
    if !snapshot.business.active {
        return Err(ApiError::precondition("The game is over"));
    }
    let mods = Modifiers::at(&snapshot.acquired, now);
    let plan = production::start_build(&snapshot.business, &snapshot.products, &mods, now)?;
    persistence::apply_build(
        &state.pool,
        business_id,
        plan.completed.as_ref(),
        &plan.started,
        plan.sets_build_challenge,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "steps": plan.steps,
        "durationMs": plan.started.duration_ms,
        "cost": plan.started.cost,
    })))
}

async fn start_shipping(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(&state, &headers).await?;
    let now = Utc::now();
    let snapshot = persistence::load_snapshot(&state.pool, business_id).await?;
    if !snapshot.business.active {
        return Err(ApiError::precondition("The game is over"));
    }
    let mods = Modifiers::at(&snapshot.acquired, now);
    let plan = {
        let mut rng = state.rng.lock().unwrap_or_else(|e| e.into_inner());
        orders::ship_order(
            &snapshot.business,
            &snapshot.products,
            &snapshot.orders,
            &mods,
            now,
            &mut *rng,
        )?
    };
    persistence::apply_shipment(
        &state.pool,
        business_id,
        plan.order_id,
        plan.started_at,
        plan.duration_ms,
        plan.cost_money,
        plan.sets_ship_challenge,
        plan.sync_transition.as_ref(),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "orderId": plan.order_id,
        "steps": plan.steps,
        "durationMs": plan.duration_ms,
        "cost": plan.cost,
        "completedImmediately": plan.sync_transition.is_some(),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseRequest {
    tech_id: i64,
}

async fn purchase_technology(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(&state, &headers).await?;
    let now = Utc::now();
    let outcome =
        persistence::purchase_technology(&state.pool, business_id, req.tech_id, now).await?;
    state.tech_cache.invalidate(&business_id);

    let message = match &outcome.takeover_victim {
        Some(victim) => format!("{} acquired {victim}!", outcome.technology.name),
        None => format!("{} acquired", outcome.technology.name),
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

async fn toggle_building_automation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(&state, &headers).await?;
    let enabled = persistence::toggle_automation(&state.pool, business_id).await?;
    Ok(Json(json!({ "success": true, "automationEnabled": enabled })))
}

#[derive(Deserialize)]
struct SkillRequest {
    skill: String,
}

async fn spend_skill_point(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SkillRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(&state, &headers).await?;
    let business = persistence::load_business(&state.pool, business_id)
        .await?
        .ok_or_else(|| ApiError::Internal("business row vanished".into()))?;
    let spend = progression::spend_skill_point(&business, &req.skill)?;
    persistence::apply_skill_spend(&state.pool, business_id, spend.skill, spend.new_rate_ms)
        .await?;
    Ok(Json(json!({ "success": true, "skill": spend.skill.as_str() })))
}

async fn complete_challenge(
    state: &AppState,
    headers: &HeaderMap,
    kind: ChallengeKind,
) -> Result<Json<serde_json::Value>, ApiError> {
    let business_id = require_session(state, headers).await?;
    let business = persistence::load_business(&state.pool, business_id)
        .await?
        .ok_or_else(|| ApiError::Internal("business row vanished".into()))?;
    let award = progression::complete_challenge(&business, kind)?;
    persistence::apply_challenge_completion(
        &state.pool,
        business_id,
        kind == ChallengeKind::Truck,
        award.xp,
        award.skill_points,
    )
    .await?;
    Ok(Json(json!({ "success": true, "xpAwarded": award.xp })))
}

async fn complete_truck_game(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    complete_challenge(&state, &headers, ChallengeKind::Truck).await
}

async fn complete_haystack_game(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    complete_challenge(&state, &headers, ChallengeKind::Haystack).await
}

async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entries = persistence::leaderboard(&state.pool, 10).await?;
    Ok(Json(json!({ "success": true, "leaderboard": entries })))
}

async fn network_data(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(cached) = state.network_cache.get(&()) {
        return Ok(Json(json!({ "success": true, "businesses": cached })));
    }
    let now = Utc::now();
    let entries = persistence::network_overview(&state.pool).await?;
    let mut businesses = Vec::with_capacity(entries.len());
    for entry in &entries {
        let reputation = reputation_for(&state, entry.id, now).await?;
        businesses.push(NetworkBusiness::from_entry(entry, reputation));
    }
    state.network_cache.insert((), businesses.clone());
    Ok(Json(json!({ "success": true, "businesses": businesses })))
}

async fn admin_stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = persistence::admin_stats(&state.pool).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}
