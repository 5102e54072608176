use crate::{
    auth::auth::AuthUser,
    model::attendance::AttendanceStatus,
    service::{
        ledger::{self, DaySnapshot, MarkEntry},
        month_view::{self, EmployeeMonth},
        registry,
    },
    store::Store,
    utils::dates::deserialize_day,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayRequest {
    #[serde(deserialize_with = "deserialize_day")]
    #[schema(example = "2024-03-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Mittal Spinners", nullable = true)]
    pub org: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkMarkRequest {
    #[serde(deserialize_with = "deserialize_day")]
    #[schema(example = "2024-03-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Mittal Spinners", nullable = true)]
    pub org: Option<String>,
    pub attendance: Vec<MarkEntry>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkDayRequest {
    #[serde(deserialize_with = "deserialize_day")]
    #[schema(example = "2024-03-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    #[schema(example = 8.0)]
    pub hours_worked: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    #[schema(example = "Mittal Spinners")]
    /// Restrict to one organization
    pub org: Option<String>,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 2)]
    /// 1-12
    pub month: u32,
}

/// Attendance of every eligible employee on one date
#[utoipa::path(
    post,
    path = "/api/attendance/day",
    request_body = DayRequest,
    responses(
        (status = 200, description = "Unmarked employees read as Absent with 0 hours",
            body = Vec<DaySnapshot>)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn day_snapshot(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<DayRequest>,
) -> actix_web::Result<impl Responder> {
    let DayRequest { date, org } = payload.into_inner();
    let org = auth.scope_org(org)?;
    let snapshot = ledger::day_snapshot(store.get_ref(), date, org).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Mark one date for many employees
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = BulkMarkRequest,
    responses(
        (status = 200, description = "Attendance marked", body = Object, example = json!({
            "message": "Attendance marked successfully!",
            "marked": 12
        })),
        (status = 500, description = "Some writes failed; others may have been applied")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn bulk_mark(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<BulkMarkRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_marker()?;
    let BulkMarkRequest {
        date,
        org,
        attendance,
    } = payload.into_inner();
    let org = auth.scope_org(org)?;

    let marked = ledger::bulk_mark(store.get_ref(), date, org, attendance).await?;

    info!(by = %auth.username, %date, marked, "Bulk attendance via API");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance marked successfully!",
        "marked": marked
    })))
}

/// Mark one date for one employee
#[utoipa::path(
    put,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = MarkDayRequest,
    responses(
        (status = 200, description = "Day recorded, replacing any earlier value"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_day(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    payload: web::Json<MarkDayRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_marker()?;
    let employee_id = path.into_inner();
    let employee = registry::get_employee(store.get_ref(), employee_id).await?;
    auth.scope_org(Some(employee.org))?;

    let MarkDayRequest {
        date,
        status,
        hours_worked,
    } = payload.into_inner();
    ledger::mark_day(store.get_ref(), employee_id, date, status, hours_worked).await?;
    let stored = ledger::get_day(store.get_ref(), employee_id, date).await?;

    Ok(HttpResponse::Ok().json(json!({
        "employeeId": employee_id,
        "date": date,
        "status": stored.status,
        "hoursWorked": stored.hours_worked
    })))
}

/// Dense day-by-day view of a month
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Unmarked days carry \"-\" for status and hours",
            body = Vec<EmployeeMonth>),
        (status = 400, description = "Invalid month")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let MonthQuery { org, year, month } = query.into_inner();
    let org = auth.scope_org(org)?;
    let views = month_view::org_month_views(store.get_ref(), org, year, month).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// One employee's month
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/monthly",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("year", Query, description = "Calendar year"),
        ("month", Query, description = "Month 1-12")
    ),
    responses(
        (status = 200, body = EmployeeMonth),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn employee_monthly(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let view =
        month_view::employee_month(store.get_ref(), path.into_inner(), query.year, query.month)
            .await?;
    auth.scope_org(Some(view.employee.org.clone()))?;
    Ok(HttpResponse::Ok().json(view))
}
