//! MySQL reads and writes feeding the balance calculator.

use crate::error::ApiError;
use crate::leave_balance::editor::AllocationStore;
use crate::model::leave_policy::{Allocation, BalanceMap, LeaveBalanceEntry, LeavePolicy, Quotas};
use crate::model::leave_request::{LeaveRequest, LeaveType};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::warn;

/// Column list matching `LeaveRequest`'s fields.
pub const LEAVE_COLUMNS: &str = r#"
    id,
    employee_id,
    leave_type,
    start_date,
    end_date,
    CAST(total_days AS SIGNED) AS total_days,
    status,
    reason,
    review_comments,
    created_at
"#;

fn to_days(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

fn known_type(raw: &str, table: &str) -> Option<LeaveType> {
    let parsed = LeaveType::from_str(raw.trim()).ok();
    if parsed.is_none() {
        warn!(leave_type = raw, table, "Skipping row with unknown leave type");
    }
    parsed
}

fn quotas_from_rows(rows: Vec<(String, i64)>, table: &str) -> Quotas {
    rows.into_iter()
        .filter_map(|(leave_type, days)| Some((known_type(&leave_type, table)?, to_days(days))))
        .collect()
}

pub async fn load_policy(pool: &MySqlPool) -> Result<LeavePolicy, ApiError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT leave_type, CAST(days AS SIGNED) FROM leave_policy",
    )
    .fetch_all(pool)
    .await?;

    Ok(quotas_from_rows(rows, "leave_policy"))
}

/// Upserts the given quotas; types not mentioned keep their current value.
pub async fn save_policy(pool: &MySqlPool, policy: &LeavePolicy) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    for (leave_type, days) in policy.iter() {
        sqlx::query(
            r#"
            INSERT INTO leave_policy (leave_type, days)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE days = VALUES(days)
            "#,
        )
        .bind(leave_type.as_str())
        .bind(days)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn load_allocation(pool: &MySqlPool, employee_id: u64) -> Result<Allocation, ApiError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT leave_type, CAST(days AS SIGNED)
        FROM leave_allocations
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    Ok(quotas_from_rows(rows, "leave_allocations"))
}

impl AllocationStore for MySqlPool {
    /// Replaces the employee's whole allocation in one transaction.
    async fn save_allocation(&self, employee_id: u64, allocation: &Allocation) -> Result<(), ApiError> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM leave_allocations WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        for (leave_type, days) in allocation.iter() {
            sqlx::query(
                "INSERT INTO leave_allocations (employee_id, leave_type, days) VALUES (?, ?, ?)",
            )
            .bind(employee_id)
            .bind(leave_type.as_str())
            .bind(days)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Precomputed balances stored for the employee, if any.
pub async fn load_snapshot(pool: &MySqlPool, employee_id: u64) -> Result<BalanceMap, ApiError> {
    let rows = sqlx::query_as::<_, (String, i64, i64, i64)>(
        r#"
        SELECT
            leave_type,
            CAST(total AS SIGNED),
            CAST(used AS SIGNED),
            CAST(remaining AS SIGNED)
        FROM leave_balance_snapshots
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(leave_type, total, used, remaining)| {
            let leave_type = known_type(&leave_type, "leave_balance_snapshots")?;
            Some((
                leave_type,
                LeaveBalanceEntry {
                    total: to_days(total),
                    used: to_days(used),
                    remaining: to_days(remaining),
                },
            ))
        })
        .collect())
}

/// Approved requests of one employee; period filtering is left to the
/// calculator.
pub async fn load_approved_requests(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Vec<LeaveRequest>, ApiError> {
    let sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE employee_id = ? AND status = 'approved'"
    );

    Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(employee_id)
        .fetch_all(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_huge_day_counts_are_clamped() {
        assert_eq!(to_days(-3), 0);
        assert_eq!(to_days(12), 12);
        assert_eq!(to_days(i64::MAX), u32::MAX);
    }

    #[test]
    fn unknown_types_are_dropped_from_rows() {
        let quotas = quotas_from_rows(
            vec![
                ("Annual".into(), 12),
                ("sabbatical".into(), 30),
                ("sick".into(), -1),
            ],
            "leave_policy",
        );

        assert_eq!(quotas.get(LeaveType::Annual), Some(12));
        assert_eq!(quotas.get(LeaveType::Sick), Some(0));
        assert_eq!(quotas.iter().count(), 2);
    }
}
