//! Wire views of the domain types, camelCased for the browser client.

use serde::Serialize;
use sim_core::{Business, Order, Product, Technology};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessView {
    pub id: i64,
    pub name: String,
    pub business_name: String,
    pub money: i64,
    pub tech_level: i64,
    pub orders_shipped: i64,
    pub total_money_earned: i64,
    pub xp: i64,
    pub available_points: i64,
    pub points_spent: i64,
    pub automation_enabled: bool,
    pub build_challenge_pending: bool,
    pub ship_challenge_pending: bool,
    pub active: bool,
}

impl From<&Business> for BusinessView {
    fn from(b: &Business) -> Self {
        Self {
            id: b.id,
            name: b.name.clone(),
            business_name: b.business_name.clone(),
            money: b.money,
            tech_level: b.tech_level,
            orders_shipped: b.orders_shipped,
            total_money_earned: b.total_money_earned,
            xp: b.xp,
            available_points: b.available_points,
            points_spent: b.points_spent,
            automation_enabled: b.automation_enabled,
            build_challenge_pending: b.build_challenge_pending,
            ship_challenge_pending: b.ship_challenge_pending,
            active: b.active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub cost_to_build: i64,
    pub sales_price: i64,
    pub on_hand: i64,
    pub building: bool,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            cost_to_build: p.cost_to_build,
            sales_price: p.sales_price,
            on_hand: p.on_hand,
            building: p.build_active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i64,
    pub quantity: i64,
    pub distance_miles: i64,
    pub state: &'static str,
    pub due_by: String,
}

impl From<&Order> for OrderView {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            quantity: o.quantity,
            distance_miles: o.distance_miles,
            state: o.state.as_str(),
            due_by: o.due_by.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyView {
    pub id: i64,
    pub code: &'static str,
    pub name: String,
    pub description: String,
    pub cost: i64,
}

impl From<&Technology> for TechnologyView {
    fn from(t: &Technology) -> Self {
        Self {
            id: t.id,
            code: t.code.as_str(),
            name: t.name.clone(),
            description: t.description.clone(),
            cost: t.cost,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalStatsView {
    pub final_money: Option<i64>,
    pub final_tech_level: Option<i64>,
    pub final_orders_shipped: Option<i64>,
    pub final_reputation: Option<i64>,
    pub expiration_reason: Option<String>,
    pub acquired_by: Option<String>,
}

impl From<&Business> for FinalStatsView {
    fn from(b: &Business) -> Self {
        Self {
            final_money: b.final_money,
            final_tech_level: b.final_tech_level,
            final_orders_shipped: b.final_orders_shipped,
            final_reputation: b.final_reputation,
            expiration_reason: b.expiration_reason.clone(),
            acquired_by: b.acquired_by.clone(),
        }
    }
}
