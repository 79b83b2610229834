//! Subscription operations
//!
//! Every write recomputes or preserves `renewal_date` inside a single
//! SQLite transaction, so readers never see a half-applied save. Write
//! transactions begin `IMMEDIATE` and wait on the busy timeout for the lock.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use super::{parse_date, parse_datetime, parse_decimal, Database};
use crate::analytics::{self, PortfolioStats, StatsConfig};
use crate::error::{Error, Result};
use crate::models::{BillingCycle, Subscription, SubscriptionFilter, SubscriptionInput};
use crate::renewal::next_renewal;

const SUBSCRIPTION_COLUMNS: &str = "id, name, monthly_price, yearly_price, billing_cycle, cost, \
     start_date, renewal_date, renewal_overridden, is_active, category, created_at, updated_at";

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let monthly_price: Option<String> = row.get(2)?;
    let yearly_price: Option<String> = row.get(3)?;
    let billing_cycle: String = row.get(4)?;
    let cost: String = row.get(5)?;
    let start_date: String = row.get(6)?;
    let renewal_date: String = row.get(7)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(Subscription {
        id: row.get(0)?,
        name: row.get(1)?,
        monthly_price: monthly_price.map(|s| parse_decimal(2, &s)).transpose()?,
        yearly_price: yearly_price.map(|s| parse_decimal(3, &s)).transpose()?,
        billing_cycle: billing_cycle.parse::<BillingCycle>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?,
        cost: parse_decimal(5, &cost)?,
        start_date: parse_date(6, &start_date)?,
        renewal_date: parse_date(7, &renewal_date)?,
        renewal_overridden: row.get(8)?,
        is_active: row.get(9)?,
        category: row.get(10)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

fn fetch_subscription(conn: &Connection, id: i64) -> Result<Option<Subscription>> {
    let sql = format!("SELECT {} FROM subscriptions WHERE id = ?", SUBSCRIPTION_COLUMNS);
    Ok(conn
        .query_row(&sql, params![id], subscription_from_row)
        .optional()?)
}

/// Soft-deleted records are invisible to every mutation
fn fetch_active_subscription(conn: &Connection, id: i64) -> Result<Subscription> {
    fetch_subscription(conn, id)?
        .filter(|s| s.is_active)
        .ok_or_else(|| Error::subscription_not_found(id))
}

fn store_renewal(conn: &Connection, id: i64, renewal_date: NaiveDate, overridden: bool) -> Result<()> {
    conn.execute(
        "UPDATE subscriptions SET renewal_date = ?, renewal_overridden = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        params![renewal_date.to_string(), overridden, id],
    )?;
    Ok(())
}

impl Database {
    /// Validate input and insert a new subscription with its first renewal date
    pub fn create_subscription(&self, input: &SubscriptionInput, today: NaiveDate) -> Result<Subscription> {
        let valid = input.validate()?;
        let renewal_date = next_renewal(valid.start_date, valid.billing_cycle, today)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            r#"
            INSERT INTO subscriptions (name, monthly_price, yearly_price, billing_cycle, cost, start_date, renewal_date, category)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                valid.name,
                valid.monthly_price.map(|p| p.to_string()),
                valid.yearly_price.map(|p| p.to_string()),
                valid.billing_cycle.as_str(),
                valid.cost.to_string(),
                valid.start_date.to_string(),
                renewal_date.to_string(),
                valid.category,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let subscription = fetch_active_subscription(&tx, id)?;
        tx.commit()?;

        info!(id, name = %subscription.name, renewal = %renewal_date, "Created subscription");
        Ok(subscription)
    }

    /// Replace a subscription's fields
    ///
    /// The renewal date is recomputed unless a manual override is in place
    /// and neither `start_date` nor `billing_cycle` changed. Changing either
    /// clears the override.
    pub fn update_subscription(
        &self,
        id: i64,
        input: &SubscriptionInput,
        today: NaiveDate,
    ) -> Result<Subscription> {
        let valid = input.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = fetch_active_subscription(&tx, id)?;

        let anchor_changed =
            existing.start_date != valid.start_date || existing.billing_cycle != valid.billing_cycle;
        let (renewal_date, overridden) = if existing.renewal_overridden && !anchor_changed {
            (existing.renewal_date, true)
        } else {
            (next_renewal(valid.start_date, valid.billing_cycle, today)?, false)
        };

        tx.execute(
            r#"
            UPDATE subscriptions
            SET name = ?,
                monthly_price = ?,
                yearly_price = ?,
                billing_cycle = ?,
                cost = ?,
                start_date = ?,
                renewal_date = ?,
                renewal_overridden = ?,
                category = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                valid.name,
                valid.monthly_price.map(|p| p.to_string()),
                valid.yearly_price.map(|p| p.to_string()),
                valid.billing_cycle.as_str(),
                valid.cost.to_string(),
                valid.start_date.to_string(),
                renewal_date.to_string(),
                overridden,
                valid.category,
                id,
            ],
        )?;
        let subscription = fetch_active_subscription(&tx, id)?;
        tx.commit()?;

        debug!(id, renewal = %renewal_date, overridden, "Updated subscription");
        Ok(subscription)
    }

    /// Get subscription by ID, active or not
    pub fn get_subscription(&self, id: i64) -> Result<Option<Subscription>> {
        let conn = self.conn()?;
        fetch_subscription(&conn, id)
    }

    /// List subscriptions in renewal order
    ///
    /// Only active records unless `include_inactive` is set.
    pub fn list_subscriptions(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>> {
        let conn = self.conn()?;

        let mut conditions: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !filter.include_inactive {
            conditions.push("is_active = TRUE");
        }
        if let Some(ref category) = filter.category {
            conditions.push("category = ?");
            params_vec.push(Box::new(category.clone()));
        }
        if let Some(cycle) = filter.billing_cycle {
            conditions.push("billing_cycle = ?");
            params_vec.push(Box::new(cycle.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            "SELECT {} FROM subscriptions {} ORDER BY renewal_date ASC, id ASC",
            SUBSCRIPTION_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let subscriptions = stmt
            .query_map(params_refs.as_slice(), subscription_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    /// Every record, including soft-deleted ones
    pub fn all_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.list_subscriptions(&SubscriptionFilter {
            include_inactive: true,
            ..Default::default()
        })
    }

    /// Distinct categories in use by active subscriptions
    pub fn list_categories(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM subscriptions WHERE is_active = TRUE AND category IS NOT NULL ORDER BY category",
        )?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(categories)
    }

    /// Recompute the renewal date from the anchor, discarding any override
    pub fn recompute_renewal(&self, id: i64, today: NaiveDate) -> Result<NaiveDate> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = fetch_active_subscription(&tx, id)?;

        let renewal_date = next_renewal(existing.start_date, existing.billing_cycle, today)?;
        store_renewal(&tx, id, renewal_date, false)?;
        tx.commit()?;

        debug!(id, renewal = %renewal_date, "Recomputed renewal date");
        Ok(renewal_date)
    }

    /// Manually set the renewal date, bypassing the calculation
    ///
    /// Dates before `today` are rejected.
    pub fn set_manual_renewal(&self, id: i64, renewal_date: NaiveDate, today: NaiveDate) -> Result<Subscription> {
        if renewal_date < today {
            return Err(Error::validation("Renewal date cannot be in the past"));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        fetch_active_subscription(&tx, id)?;
        store_renewal(&tx, id, renewal_date, true)?;
        let subscription = fetch_active_subscription(&tx, id)?;
        tx.commit()?;

        info!(id, renewal = %renewal_date, "Manual renewal date override");
        Ok(subscription)
    }

    /// Mark a subscription inactive; the row is kept for lifetime spend
    pub fn soft_delete_subscription(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE subscriptions SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND is_active = TRUE",
            params![id],
        )?;
        if updated == 0 {
            return Err(Error::subscription_not_found(id));
        }

        info!(id, "Soft-deleted subscription");
        Ok(())
    }

    /// Roll forward stored renewal dates that are no longer in the future
    ///
    /// Overridden dates are left alone. Returns the number of rows updated.
    pub fn refresh_renewal_dates(&self, today: NaiveDate) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stale = {
            let sql = format!(
                "SELECT {} FROM subscriptions WHERE is_active = TRUE AND renewal_overridden = FALSE AND renewal_date <= ?",
                SUBSCRIPTION_COLUMNS
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map(params![today.to_string()], subscription_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        for sub in &stale {
            let renewal_date = next_renewal(sub.start_date, sub.billing_cycle, today)?;
            store_renewal(&tx, sub.id, renewal_date, false)?;
        }
        tx.commit()?;

        if !stale.is_empty() {
            info!(count = stale.len(), "Refreshed stale renewal dates");
        }
        Ok(stale.len())
    }

    /// Portfolio statistics over a consistent snapshot of every record
    pub fn portfolio_stats(&self, today: NaiveDate) -> Result<PortfolioStats> {
        self.portfolio_stats_with_config(today, &StatsConfig::default())
    }

    pub fn portfolio_stats_with_config(
        &self,
        today: NaiveDate,
        config: &StatsConfig,
    ) -> Result<PortfolioStats> {
        let subscriptions = self.all_subscriptions()?;
        analytics::compute_stats_with_config(&subscriptions, today, config)
    }
}
