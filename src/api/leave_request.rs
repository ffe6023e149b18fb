use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::leave_balance::store::LEAVE_COLUMNS;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::utils::db_utils::page_offset;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "annual")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy the break")]
    pub review_comments: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub limit: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Serialize, Default, PartialEq, Debug, ToSchema)]
pub struct LeaveStats {
    #[schema(example = 4)]
    pub pending: i64,
    #[schema(example = 12)]
    pub approved: i64,
    #[schema(example = 1)]
    pub rejected: i64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee ID (ignored for employees, who only see their own)
    pub employee_id: Option<u64>,
    /// Filter by leave status: pending, approved or rejected
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Items per page, at most 100
    #[serde(alias = "per_page")]
    pub limit: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Status(LeaveStatus),
}

/// Inclusive number of calendar days between two dates.
fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

fn where_clause(auth: &AuthUser, filter: &LeaveFilter) -> Result<(String, Vec<FilterValue>), ApiError> {
    let mut sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    let employee_id = if auth.role.manages_leave() {
        filter.employee_id
    } else {
        Some(auth.own_employee_id()?)
    };

    if let Some(emp_id) = employee_id {
        sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = filter.status.as_deref() {
        let status = LeaveStatus::from_str(status.trim())
            .map_err(|_| ApiError::BadRequest(format!("Unknown leave status: {status}")))?;
        sql.push_str(" AND status = ?");
        args.push(FilterValue::Status(status));
    }

    Ok((sql, args))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "status": "pending",
            "total_days": 3
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.own_employee_id()?;

    if payload.start_date > payload.end_date {
        return Err(ApiError::BadRequest("start_date cannot be after end_date".into()).into());
    }
    if payload.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("reason is required".into()).into());
    }

    let total_days = inclusive_days(payload.start_date, payload.end_date);

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, start_date, end_date, total_days, status, reason)
        VALUES (?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.leave_type.as_str())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(total_days)
    .bind(payload.reason.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        ApiError::Internal
    })?;

    tracing::info!(employee_id, leave_type = payload.leave_type.as_str(), total_days, "Leave request submitted");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending",
        "total_days": total_days
    })))
}

/// Moves a pending request to `status`. A request is reviewed at most once.
async fn review(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    status: LeaveStatus,
    body: Option<web::Json<ReviewLeave>>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let comments = body
        .and_then(|b| b.into_inner().review_comments)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, review_comments = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(status.as_str())
    .bind(comments)
    .bind(leave_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, status = status.as_str(), "Leave review failed");
        ApiError::Internal
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::BadRequest("Leave request not found or already processed".into()).into());
    }

    tracing::info!(leave_id, reviewer = auth.user_id, status = status.as_str(), "Leave reviewed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {}", status.as_str())
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ReviewLeave, description = "Optional review comments", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewLeave>>,
) -> actix_web::Result<impl Responder> {
    review(auth, pool.get_ref(), path.into_inner(), LeaveStatus::Approved, body).await
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = ReviewLeave, description = "Optional review comments", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewLeave>>,
) -> actix_web::Result<impl Responder> {
    review(auth, pool.get_ref(), path.into_inner(), LeaveStatus::Rejected, body).await
}

/// Get one leave request
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
    let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    auth.require_access_to(leave.employee_id)?;

    Ok(HttpResponse::Ok().json(leave))
}

/// Paginated leave requests
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = page_offset(page, limit)?;

    let (where_sql, args) = where_clause(&auth, &query)?;

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Status(s) => count_q.bind(s.as_str()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        ApiError::Internal
    })?;

    let data_sql = format!(
        r#"
        SELECT {LEAVE_COLUMNS}
        FROM leave_requests
        {where_sql}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Status(s) => data_q.bind(s.as_str()),
        };
    }

    let leaves = data_q
        .bind(limit)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page,
        limit,
        total,
    }))
}

/// Request counts per status for dashboard cards
#[utoipa::path(
    get,
    path = "/api/leave/stats",
    responses(
        (status = 200, description = "Counts per status", body = LeaveStats),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let filter = LeaveFilter {
        employee_id: None,
        status: None,
        page: None,
        limit: None,
    };
    let (where_sql, args) = where_clause(&auth, &filter)?;

    let sql = format!("SELECT status, COUNT(*) FROM leave_requests{where_sql} GROUP BY status");
    let mut q = sqlx::query_as::<_, (String, i64)>(&sql);
    for arg in &args {
        q = match arg {
            FilterValue::U64(v) => q.bind(*v),
            FilterValue::Status(s) => q.bind(s.as_str()),
        };
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(stats_from_rows(rows)))
}

fn stats_from_rows(rows: Vec<(String, i64)>) -> LeaveStats {
    rows.into_iter()
        .fold(LeaveStats::default(), |mut stats, (status, count)| {
            match LeaveStatus::from_str(status.trim()) {
                Ok(LeaveStatus::Pending) => stats.pending += count,
                Ok(LeaveStatus::Approved) => stats.approved += count,
                Ok(LeaveStatus::Rejected) => stats.rejected += count,
                Err(_) => tracing::warn!(status = %status, "Ignoring unknown leave status"),
            }
            stats
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
        }
    }

    fn filter(employee_id: Option<u64>, status: Option<&str>) -> LeaveFilter {
        LeaveFilter {
            employee_id,
            status: status.map(str::to_string),
            page: None,
            limit: None,
        }
    }

    #[test]
    fn day_span_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert_eq!(inclusive_days(d(1), d(1)), 1);
        assert_eq!(inclusive_days(d(1), d(3)), 3);
    }

    #[test]
    fn employees_are_scoped_to_themselves() {
        let (sql, args) = where_clause(&user(Role::Employee, Some(5)), &filter(Some(99), None)).unwrap();
        assert_eq!(sql, " WHERE 1=1 AND employee_id = ?");
        assert!(matches!(args.as_slice(), [FilterValue::U64(5)]));
    }

    #[test]
    fn hr_can_filter_by_any_employee_and_status() {
        let (sql, args) =
            where_clause(&user(Role::Hr, None), &filter(Some(99), Some("Approved"))).unwrap();
        assert_eq!(sql, " WHERE 1=1 AND employee_id = ? AND status = ?");
        assert!(matches!(
            args.as_slice(),
            [FilterValue::U64(99), FilterValue::Status(LeaveStatus::Approved)]
        ));
    }

    #[test]
    fn unknown_status_filter_is_rejected() {
        assert!(where_clause(&user(Role::Admin, None), &filter(None, Some("done"))).is_err());
    }

    #[test]
    fn stats_fold_rows_by_status() {
        let stats = stats_from_rows(vec![
            ("pending".into(), 2),
            ("approved".into(), 5),
            ("weird".into(), 9),
        ]);
        assert_eq!(
            stats,
            LeaveStats {
                pending: 2,
                approved: 5,
                rejected: 0
            }
        );
    }
}
