//! Technology offers, purchases, and their one-time effects.

use chrono::{DateTime, Duration, Utc};
use sim_core::constants::{ADVERTISING_DURATION_SECONDS, REPUTATION_WINDOW_SECONDS};
use sim_core::{TechCode, Technology};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::rows::{AcquiredRow, BusinessRow, TechnologyRow};
use crate::StoreError;

/// A business's acquired technologies as the engines consume them.
pub async fn acquired_technologies(
    pool: &SqlitePool,
    business_id: i64,
) -> Result<Vec<sim_core::AcquiredTech>, StoreError> {
    let rows: Vec<AcquiredRow> = sqlx::query_as(
        "SELECT t.code AS code, t.modifier AS modifier, a.expires_at AS expires_at
         FROM acquired_technologies a
         JOIN technologies t ON t.id = a.technology_id
         WHERE a.business_id = ?1",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(TryInto::try_into).collect()
}

/// Technologies currently offered to a business.
pub async fn available_technologies(
    pool: &SqlitePool,
    business_id: i64,
) -> Result<Vec<Technology>, StoreError> {
    let rows: Vec<TechnologyRow> = sqlx::query_as(
        "SELECT t.* FROM technologies t
         JOIN available_technologies a ON a.technology_id = t.id
         WHERE a.business_id = ?1
         ORDER BY t.cost",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(TryInto::try_into).collect()
}

/// Offer one technology the business does not already have on offer or
/// own, drawn at random among those whose level requirement is met.
/// A no-op when nothing qualifies; the pool refills as levels rise.
pub async fn make_new_technology_available(
    pool: &SqlitePool,
    business_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<i64>, StoreError> {
    let mut conn = pool.acquire().await?;
    make_available_on(&mut conn, business_id, now).await
}

pub(crate) async fn make_available_on(
    conn: &mut SqliteConnection,
    business_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<i64>, StoreError> {
    let candidate: Option<i64> = sqlx::query_scalar(
        "SELECT t.id FROM technologies t
         WHERE t.tech_level_required <=
               (SELECT tech_level FROM businesses WHERE id = ?1)
           AND t.id NOT IN
               (SELECT technology_id FROM available_technologies WHERE business_id = ?1)
           AND t.id NOT IN
               (SELECT technology_id FROM acquired_technologies WHERE business_id = ?1)
         ORDER BY RANDOM()
         LIMIT 1",
    )
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(technology_id) = candidate else {
        return Ok(None);
    };
    sqlx::query(
        "INSERT INTO available_technologies (business_id, technology_id, offered_at)
         VALUES (?1, ?2, ?3)",
    )
    .bind(business_id)
    .bind(technology_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(Some(technology_id))
}

/// What a successful purchase did.
#[derive(Debug)]
pub struct PurchaseOutcome {
    pub technology: Technology,
    /// Business name of a hostile-takeover victim, when that effect ran.
    pub takeover_victim: Option<String>,
}

/// Purchase an offered technology.
///
/// Runs as one transaction: the money check and deduction are a single
/// guarded update, one-time effects execute before the acquisition is
/// recorded, and any failure rolls the whole purchase back with no
/// partial state.
pub async fn purchase_technology(
    pool: &SqlitePool,
    business_id: i64,
    technology_id: i64,
    now: DateTime<Utc>,
) -> Result<PurchaseOutcome, StoreError> {
    let mut tx = pool.begin().await?;

    let offered: Option<i64> = sqlx::query_scalar(
        "SELECT technology_id FROM available_technologies
         WHERE business_id = ?1 AND technology_id = ?2",
    )
    .bind(business_id)
    .bind(technology_id)
    .fetch_optional(&mut *tx)
    .await?;
    if offered.is_none() {
        return Err(StoreError::NotFound("offered technology"));
    }

    let row: TechnologyRow = sqlx::query_as("SELECT * FROM technologies WHERE id = ?1")
        .bind(technology_id)
        .fetch_one(&mut *tx)
        .await?;
    let technology: Technology = row.try_into()?;

    let charged = sqlx::query(
        "UPDATE businesses SET money = money - ?1, tech_level = tech_level + 1
         WHERE id = ?2 AND active = 1 AND money >= ?1",
    )
    .bind(technology.cost)
    .bind(business_id)
    .execute(&mut *tx)
    .await?;
    if charged.rows_affected() == 0 {
        return Err(StoreError::InsufficientFunds);
    }

    let mut expires_at = None;
    let mut takeover_victim = None;
    match technology.code {
        TechCode::AdCampaign => {
            expires_at = Some(now + Duration::seconds(ADVERTISING_DURATION_SECONDS));
        }
        TechCode::ExclusiveLogistics => {
            sqlx::query(
                "UPDATE businesses SET logistics_penalty = 1
                 WHERE active = 1 AND id NOT IN (?1, 1)",
            )
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
        }
        TechCode::HostileTakeover => {
            takeover_victim = Some(run_takeover(&mut tx, business_id, now).await?);
        }
        _ => {}
    }

    sqlx::query(
        "INSERT INTO acquired_technologies
            (business_id, technology_id, acquired_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(business_id)
    .bind(technology_id)
    .bind(now)
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM available_technologies
         WHERE business_id = ?1 AND technology_id = ?2",
    )
    .bind(business_id)
    .bind(technology_id)
    .execute(&mut *tx)
    .await?;

    make_available_on(&mut tx, business_id, now).await?;

    tx.commit().await?;
    info!(business_id, code = technology.code.as_str(), "technology purchased");
    Ok(PurchaseOutcome { technology, takeover_victim })
}

/// Force-expire one random rival and transfer its money and lifetime
/// shipped count to the acquirer. The victim's finalization is a single
/// conditional update so it cannot race the victim's own tick.
async fn run_takeover(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    business_id: i64,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let victim: Option<BusinessRow> = sqlx::query_as(
        "SELECT * FROM businesses
         WHERE active = 1 AND id NOT IN (?1, 1)
         ORDER BY RANDOM()
         LIMIT 1",
    )
    .bind(business_id)
    .fetch_optional(&mut **tx)
    .await?;
    let victim = victim.ok_or(StoreError::Conflict("no rival business to take over"))?;

    let acquirer_name: String =
        sqlx::query_scalar("SELECT business_name FROM businesses WHERE id = ?1")
            .bind(business_id)
            .fetch_one(&mut **tx)
            .await?;

    let window_start = now - Duration::seconds(REPUTATION_WINDOW_SECONDS);
    let (positive, negative) =
        crate::orders::reputation_counts_on(&mut **tx, victim.id, window_start).await?;
    let reputation = sim_econ::reputation_score(positive, negative) as i64;

    let finalized = sqlx::query(
        "UPDATE businesses SET
            active = 0,
            final_money = money,
            final_tech_level = tech_level,
            final_orders_shipped = orders_shipped,
            final_reputation = ?1,
            expiration_reason = 'hostile takeover',
            acquired_by = ?2
         WHERE id = ?3 AND active = 1",
    )
    .bind(reputation)
    .bind(&acquirer_name)
    .bind(victim.id)
    .execute(&mut **tx)
    .await?;
    if finalized.rows_affected() == 0 {
        return Err(StoreError::Conflict("takeover target no longer active"));
    }

    sqlx::query(
        "UPDATE businesses SET money = money + ?1, orders_shipped = orders_shipped + ?2
         WHERE id = ?3",
    )
    .bind(victim.money)
    .bind(victim.orders_shipped)
    .bind(business_id)
    .execute(&mut **tx)
    .await?;

    info!(victim = victim.id, business_id, "hostile takeover executed");
    Ok(victim.business_name)
}
