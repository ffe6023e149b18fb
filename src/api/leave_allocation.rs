use crate::api::employee::ensure_employee_exists;
use crate::api::leave_balance::{BalanceQuery, BalanceSources};
use crate::auth::auth::AuthUser;
use crate::leave_balance::calculator::BalanceCalculator;
use crate::leave_balance::editor::{AllocationEditor, BalancePreview};
use crate::leave_balance::store;
use crate::model::leave_policy::Allocation;
use crate::utils::leave_cache::LeaveCache;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct AllocationPayload {
    #[schema(value_type = Object, example = json!({"annual": 14, "sick": 8, "casual": 10}))]
    pub allocations: Allocation,
}

/// Employee-specific quota override
#[utoipa::path(
    get,
    path = "/api/leave-allocation/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Override quotas; empty when the company policy applies", body = AllocationPayload),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Allocation"
)]
pub async fn get_allocation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_access_to(employee_id)?;
    ensure_employee_exists(pool.get_ref(), employee_id).await?;

    let allocations = cache
        .allocation(employee_id, || store::load_allocation(pool.get_ref(), employee_id))
        .await?;

    Ok(HttpResponse::Ok().json(AllocationPayload { allocations }))
}

/// Replace an employee's quota override (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/leave-allocation/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = AllocationPayload,
    responses(
        (status = 200, description = "Committed override", body = AllocationPayload),
        (status = 400, description = "Unknown leave type or negative quota"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Allocation"
)]
pub async fn update_allocation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
    path: web::Path<u64>,
    payload: web::Json<AllocationPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();
    ensure_employee_exists(pool.get_ref(), employee_id).await?;

    let current = store::load_allocation(pool.get_ref(), employee_id).await?;

    let mut editor = AllocationEditor::new(employee_id);
    editor.load(current);
    editor.begin_edit();
    editor.replace_draft(payload.into_inner().allocations)?;
    editor.save(pool.get_ref()).await?;

    cache.invalidate_allocation(employee_id).await;
    info!(employee_id = editor.employee_id(), reviewer = auth.user_id, "Leave allocation updated");

    Ok(HttpResponse::Ok().json(AllocationPayload {
        allocations: editor.saved().cloned().unwrap_or_default(),
    }))
}

/// Preview balances under a proposed override without saving it (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/leave-allocation/{employee_id}/preview",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        BalanceQuery
    ),
    request_body = AllocationPayload,
    responses(
        (status = 200, description = "Committed and proposed balances side by side", body = BalancePreview),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Allocation"
)]
pub async fn preview_allocation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
    calculator: web::Data<BalanceCalculator>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
    payload: web::Json<AllocationPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();
    ensure_employee_exists(pool.get_ref(), employee_id).await?;

    let sources = BalanceSources::load(pool.get_ref(), &cache, employee_id).await?;
    let inputs = sources.inputs(query.period());
    let preview = BalancePreview::compute(&calculator, &inputs, inputs.allocation, &payload.allocations);

    Ok(HttpResponse::Ok().json(preview))
}
