use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::leave_allocation::AllocationPayload;
use crate::api::leave_balance::EmployeeBalanceResponse;
use crate::api::leave_request::{CreateLeave, LeaveListResponse, LeaveStats, ReviewLeave};
use crate::auth::handlers::TokenPair;
use crate::leave_balance::calculator::{BalanceReport, BalanceSummary};
use crate::leave_balance::editor::BalancePreview;
use crate::model::employee::Employee;
use crate::model::leave_policy::LeaveBalanceEntry;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::models::LoginReqDto;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leavedesk API",
        version = "1.0.0",
        description = r#"
## Leave Balance Service

Tracks employee leave: requests, approvals, company-wide quotas, per-employee
overrides and the resulting balances.

### 🔹 Key Features
- **Leave Requests**
  - Apply for leave, approve/reject requests, view history and counts
- **Leave Policy**
  - Company default quota per leave type
- **Leave Allocation**
  - Per-employee quota overrides, with a preview before saving
- **Leave Balance**
  - Allocated, used and remaining days per type for a year or a date range

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Policy and allocation changes are restricted to **Admin** or **HR**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_stats,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::leave_policy::get_policy,
        crate::api::leave_policy::update_policy,

        crate::api::leave_balance::my_balance,
        crate::api::leave_balance::employee_balance,

        crate::api::leave_allocation::get_allocation,
        crate::api::leave_allocation::update_allocation,
        crate::api::leave_allocation::preview_allocation,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            CreateLeave,
            ReviewLeave,
            LeaveListResponse,
            LeaveStats,
            LeaveBalanceEntry,
            BalanceSummary,
            BalanceReport,
            BalancePreview,
            EmployeeBalanceResponse,
            AllocationPayload,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Leave Policy", description = "Company-wide leave quotas"),
        (name = "Leave Balance", description = "Allocated, used and remaining leave"),
        (name = "Leave Allocation", description = "Per-employee quota overrides"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
