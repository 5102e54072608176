use crate::api::attendance::{BulkMarkRequest, DayRequest, MarkDayRequest, MonthQuery};
use crate::api::employee::{CreateEmployee, OrgQuery, UpdateEmployee};
use crate::api::payroll::{PayrollQuery, PayrollResponse};
use crate::model::attendance::{AttendanceStatus, DailyAttendance};
use crate::model::employee::{Employee, PayScheme, RoleClass};
use crate::service::ledger::{DaySnapshot, MarkEntry};
use crate::service::month_view::EmployeeMonth;
use crate::service::payroll::PayrollLine;
use crate::service::registry::ChartSlot;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by every protected path.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Ledger API",
        version = "1.0.0",
        description = r#"
## Attendance Ledger & Payroll

Employee registry, daily attendance and monthly payroll for a group of mills.

### 🔹 Key Features
- **Employee Management**
  - Create, update, soft-delete and list employees
  - Per-organization codes allocated from Staff and Labor ranges, reused after an employee leaves
- **Attendance Management**
  - Mark one date for one employee or the whole eligible roster
  - Dense monthly views, unmarked days shown as `-`
- **Payroll**
  - Monthly, daily and hourly pay schemes
  - Whole-month payroll per organization

### 🔐 Security
Every endpoint is protected using **JWT Bearer authentication**.
Tokens carrying an `org` claim are limited to that organization.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::list_by_rate,
        crate::api::employee::employee_chart,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::day_snapshot,
        crate::api::attendance::bulk_mark,
        crate::api::attendance::mark_day,
        crate::api::attendance::monthly,
        crate::api::attendance::employee_monthly,

        crate::api::payroll::compute_payroll
    ),
    components(
        schemas(
            CreateEmployee,
            UpdateEmployee,
            OrgQuery,
            Employee,
            RoleClass,
            PayScheme,
            ChartSlot,
            DayRequest,
            BulkMarkRequest,
            MarkDayRequest,
            MonthQuery,
            MarkEntry,
            DaySnapshot,
            AttendanceStatus,
            DailyAttendance,
            EmployeeMonth,
            PayrollQuery,
            PayrollLine,
            PayrollResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee registry and code allocation APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Payroll", description = "Payroll derivation APIs"),
    )
)]
pub struct ApiDoc;
