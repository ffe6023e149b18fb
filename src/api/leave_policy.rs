use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::leave_balance::store;
use crate::model::leave_policy::LeavePolicy;
use crate::utils::leave_cache::LeaveCache;
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::info;

/// Company-wide leave quotas
#[utoipa::path(
    get,
    path = "/api/leave-policy",
    responses(
        (status = 200, description = "Days per leave type", body = Object, example = json!({
            "annual": 10, "sick": 8, "casual": 10
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Policy"
)]
pub async fn get_policy(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
) -> actix_web::Result<impl Responder> {
    let policy = cache.policy(|| store::load_policy(pool.get_ref())).await?;
    Ok(HttpResponse::Ok().json(policy))
}

/// Update company-wide leave quotas (Admin)
#[utoipa::path(
    put,
    path = "/api/leave-policy",
    request_body(content = Object, description = "Days per leave type; omitted types are left unchanged", example = json!({
        "annual": 12, "sick": 8
    })),
    responses(
        (status = 200, description = "Policy after the update", body = Object),
        (status = 400, description = "Unknown leave type or negative quota"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Policy"
)]
pub async fn update_policy(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<LeaveCache>,
    payload: web::Json<LeavePolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.is_empty() {
        return Err(ApiError::BadRequest("No quotas provided".into()).into());
    }

    store::save_policy(pool.get_ref(), &payload).await?;
    cache.invalidate_policy().await;
    info!(admin = auth.user_id, "Leave policy updated");

    let policy = cache.policy(|| store::load_policy(pool.get_ref())).await?;
    Ok(HttpResponse::Ok().json(policy))
}
