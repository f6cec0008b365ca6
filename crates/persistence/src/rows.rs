//! Row mirrors of the domain types, kept private to this crate.

use chrono::{DateTime, Utc};
use sim_core::{AcquiredTech, Business, Order, OrderState, Product, TechCode, Technology};

use crate::StoreError;

#[derive(sqlx::FromRow)]
pub(crate) struct BusinessRow {
    pub id: i64,
    pub name: String,
    pub business_name: String,
    pub money: i64,
    pub tech_level: i64,
    pub orders_shipped: i64,
    pub total_money_earned: i64,
    pub building_speed_ms: i64,
    pub shipping_speed_ms: i64,
    pub order_spawn_ms: i64,
    pub products_per_build: i64,
    pub products_per_order: i64,
    pub orders_per_ship: i64,
    pub order_spawn_count: i64,
    pub xp: i64,
    pub available_points: i64,
    pub points_spent: i64,
    pub automation_enabled: bool,
    pub logistics_penalty: bool,
    pub build_challenge_pending: bool,
    pub ship_challenge_pending: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_game_update: DateTime<Utc>,
    pub last_order_spawned_at: DateTime<Utc>,
    pub final_money: Option<i64>,
    pub final_tech_level: Option<i64>,
    pub final_orders_shipped: Option<i64>,
    pub final_reputation: Option<i64>,
    pub expiration_reason: Option<String>,
    pub acquired_by: Option<String>,
}

impl From<BusinessRow> for Business {
    fn from(r: BusinessRow) -> Self {
        Business {
            id: r.id,
            name: r.name,
            business_name: r.business_name,
            money: r.money,
            tech_level: r.tech_level,
            orders_shipped: r.orders_shipped,
            total_money_earned: r.total_money_earned,
            building_speed_ms: r.building_speed_ms,
            shipping_speed_ms: r.shipping_speed_ms,
            order_spawn_ms: r.order_spawn_ms,
            products_per_build: r.products_per_build,
            products_per_order: r.products_per_order,
            orders_per_ship: r.orders_per_ship,
            order_spawn_count: r.order_spawn_count,
            xp: r.xp,
            available_points: r.available_points,
            points_spent: r.points_spent,
            automation_enabled: r.automation_enabled,
            logistics_penalty: r.logistics_penalty,
            build_challenge_pending: r.build_challenge_pending,
            ship_challenge_pending: r.ship_challenge_pending,
            active: r.active,
            created_at: r.created_at,
            last_game_update: r.last_game_update,
            last_order_spawned_at: r.last_order_spawned_at,
            final_money: r.final_money,
            final_tech_level: r.final_tech_level,
            final_orders_shipped: r.final_orders_shipped,
            final_reputation: r.final_reputation,
            expiration_reason: r.expiration_reason,
            acquired_by: r.acquired_by,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
    pub cost_to_build: i64,
    pub sales_price: i64,
    pub weight: i64,
    pub on_hand: i64,
    pub build_active: bool,
    pub build_started_at: Option<DateTime<Utc>>,
    pub build_duration_ms: i64,
    pub quantity_per_build: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            business_id: r.business_id,
            name: r.name,
            cost_to_build: r.cost_to_build,
            sales_price: r.sales_price,
            weight: r.weight,
            on_hand: r.on_hand,
            build_active: r.build_active,
            build_started_at: r.build_started_at,
            build_duration_ms: r.build_duration_ms,
            quantity_per_build: r.quantity_per_build,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub id: i64,
    pub business_id: i64,
    pub quantity: i64,
    pub distance_miles: i64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub due_by: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub shipping_cost: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(r: OrderRow) -> Result<Self, StoreError> {
        let state = OrderState::parse(&r.state)
            .ok_or_else(|| StoreError::InvalidStored(format!("order state {}", r.state)))?;
        Ok(Order {
            id: r.id,
            business_id: r.business_id,
            quantity: r.quantity,
            distance_miles: r.distance_miles,
            state,
            created_at: r.created_at,
            due_by: r.due_by,
            started_at: r.started_at,
            duration_ms: r.duration_ms,
            shipping_cost: r.shipping_cost,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AcquiredRow {
    pub code: String,
    pub modifier: f64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<AcquiredRow> for AcquiredTech {
    type Error = StoreError;

    fn try_from(r: AcquiredRow) -> Result<Self, StoreError> {
        let code = TechCode::parse(&r.code)
            .ok_or_else(|| StoreError::InvalidStored(format!("tech code {}", r.code)))?;
        Ok(AcquiredTech { code, modifier: r.modifier, expires_at: r.expires_at })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TechnologyRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub cost: i64,
    pub tech_level_required: i64,
    pub modifier: f64,
}

impl TryFrom<TechnologyRow> for Technology {
    type Error = StoreError;

    fn try_from(r: TechnologyRow) -> Result<Self, StoreError> {
        let code = TechCode::parse(&r.code)
            .ok_or_else(|| StoreError::InvalidStored(format!("tech code {}", r.code)))?;
        Ok(Technology {
            id: r.id,
            code,
            name: r.name,
            description: r.description,
            cost: r.cost,
            tech_level_required: r.tech_level_required,
            modifier: r.modifier,
        })
    }
}
