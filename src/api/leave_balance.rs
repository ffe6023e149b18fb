use crate::api::employee::ensure_employee_exists;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::leave_balance::calculator::{BalanceCalculator, BalanceInputs, BalanceSummary};
use crate::leave_balance::period::PeriodFilter;
use crate::leave_balance::store;
use crate::model::leave_policy::{Allocation, BalanceMap, LeavePolicy};
use crate::model::leave_request::LeaveRequest;
use crate::utils::leave_cache::LeaveCache;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct BalanceQuery {
    /// Calendar year, defaults to the current one
    pub year: Option<i32>,
    /// Range start (YYYY-MM-DD), overrides `year`
    #[param(value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Range end (YYYY-MM-DD), overrides `year`
    #[param(value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

impl BalanceQuery {
    pub fn period(&self) -> PeriodFilter {
        PeriodFilter::resolve(self.year, self.from, self.to, chrono::Local::now().date_naive())
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeBalanceResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(value_type = Object, example = json!({"kind": "year", "year": 2026}))]
    pub period: PeriodFilter,
    #[schema(value_type = Object, example = json!({
        "annual": {"total": 10, "used": 3, "remaining": 7},
        "sick": {"total": 8, "used": 0, "remaining": 8},
        "casual": {"total": 10, "used": 0, "remaining": 10}
    }))]
    pub balances: BalanceMap,
    pub summary: BalanceSummary,
}

/// Everything stored that feeds one employee's balance.
pub struct BalanceSources {
    pub policy: LeavePolicy,
    pub allocation: Allocation,
    pub requests: Vec<LeaveRequest>,
    pub snapshot: BalanceMap,
}

impl BalanceSources {
    pub async fn load(pool: &MySqlPool, cache: &LeaveCache, employee_id: u64) -> Result<Self, ApiError> {
        let policy = cache.policy(|| store::load_policy(pool)).await?;
        let allocation = cache
            .allocation(employee_id, || store::load_allocation(pool, employee_id))
            .await?;
        let requests = store::load_approved_requests(pool, employee_id).await?;
        let snapshot = store::load_snapshot(pool, employee_id).await?;

        Ok(Self {
            policy,
            allocation,
            requests,
            snapshot,
        })
    }

    /// An empty allocation means "no override".
    pub fn inputs(&self, period: PeriodFilter) -> BalanceInputs<'_> {
        BalanceInputs {
            policy: &self.policy,
            allocation: Some(&self.allocation).filter(|a| !a.is_empty()),
            requests: &self.requests,
            snapshot: Some(&self.snapshot),
            period,
        }
    }
}

async fn balance_for(
    pool: &MySqlPool,
    cache: &LeaveCache,
    calculator: &BalanceCalculator,
    employee_id: u64,
    query: &BalanceQuery,
) -> Result<EmployeeBalanceResponse, ApiError> {
    let sources = BalanceSources::load(pool, cache, employee_id).await?;
    let report = calculator.report(&sources.inputs(query.period()));

    tracing::debug!(
        employee_id,
        total_used = report.summary.total_used,
        "Computed leave balance"
    );

    Ok(EmployeeBalanceResponse {
        employee_id,
        period: report.period,
        balances: report.balances,
        summary: report.summary,
    })
}

/// The caller's own leave balance
#[utoipa::path(
    get,
    path = "/api/leave-balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Per-type balance", body = EmployeeBalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn my_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
    calculator: web::Data<BalanceCalculator>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.own_employee_id()?;
    let response = balance_for(pool.get_ref(), &cache, &calculator, employee_id, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Another employee's leave balance (HR/Admin, or the employee themselves)
#[utoipa::path(
    get,
    path = "/api/leave-balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Per-type balance", body = EmployeeBalanceResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn employee_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
    calculator: web::Data<BalanceCalculator>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_access_to(employee_id)?;
    ensure_employee_exists(pool.get_ref(), employee_id).await?;

    let response = balance_for(pool.get_ref(), &cache, &calculator, employee_id, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}
