use crate::{
    auth::auth::AuthUser,
    model::{
        employee::{Employee, NewEmployee, PayScheme, RoleClass},
        organization::OrgTable,
    },
    service::registry::{self, ChartSlot, EmployeePatch},
    store::Store,
    utils::dates::{deserialize_day, deserialize_opt_day, today},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "Ramesh Kumar")]
    pub name: String,
    #[schema(example = "9876543210", nullable = true)]
    pub mobile: Option<String>,
    #[schema(example = "Mittal Spinners")]
    pub org: String,
    pub role_class: RoleClass,
    #[serde(deserialize_with = "deserialize_day")]
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub join_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_opt_day")]
    #[schema(example = "2025-01-01", format = "date", value_type = String, nullable = true)]
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: PayScheme,
    #[schema(example = 500.0, nullable = true)]
    pub base_rate: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub mobile: Option<String>,
    /// Changing org or role class replaces the employee (new id and code)
    pub org: Option<String>,
    pub role_class: Option<RoleClass>,
    #[serde(default, deserialize_with = "deserialize_opt_day")]
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub join_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_opt_day")]
    #[schema(example = "2025-01-01", format = "date", value_type = String)]
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: Option<PayScheme>,
    pub base_rate: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct OrgQuery {
    #[schema(example = "Mittal Spinners")]
    /// Restrict to one organization
    pub org: Option<String>,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created with an allocated code", body = Employee),
        (status = 400, description = "Leave date not after join date"),
        (status = 409, description = "No free code in the org/role range"),
        (status = 422, description = "Unknown organization")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    orgs: web::Data<OrgTable>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();
    auth.scope_org(Some(payload.org.clone()))?;

    let employee = registry::create_employee(
        store.get_ref(),
        orgs.get_ref(),
        NewEmployee {
            name: payload.name,
            mobile: payload.mobile,
            org: payload.org,
            role_class: payload.role_class,
            join_date: payload.join_date,
            leave_date: payload.leave_date,
            pay_scheme: payload.pay_scheme,
            base_rate: payload.base_rate.unwrap_or(0.0),
        },
    )
    .await?;

    info!(
        by = %auth.username,
        user_id = auth.user_id,
        employee_id = employee.id,
        "Employee created via API"
    );
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(OrgQuery),
    responses(
        (status = 200, description = "Active employees ordered by code", body = Vec<Employee>)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<OrgQuery>,
) -> actix_web::Result<impl Responder> {
    let org = auth.scope_org(query.into_inner().org)?;
    let employees = registry::list_active(store.get_ref(), org, today()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/serialized",
    params(OrgQuery),
    responses(
        (status = 200, description = "Active employees ordered by base rate", body = Vec<Employee>)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_by_rate(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<OrgQuery>,
) -> actix_web::Result<impl Responder> {
    let org = auth.scope_org(query.into_inner().org)?;
    let employees = registry::list_by_rate(store.get_ref(), org, today()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/chart",
    params(OrgQuery),
    responses(
        (status = 200, description = "Every code slot of the org", body = Vec<ChartSlot>),
        (status = 400, description = "Organization is required"),
        (status = 422, description = "Unknown organization")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn employee_chart(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    orgs: web::Data<OrgTable>,
    query: web::Query<OrgQuery>,
) -> actix_web::Result<impl Responder> {
    let Some(org) = auth.scope_org(query.into_inner().org)? else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Organization is required."
        })));
    };
    let chart = registry::employee_chart(store.get_ref(), orgs.get_ref(), &org, today()).await?;
    Ok(HttpResponse::Ok().json(chart))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "NotFound",
            "message": "Employee 7 not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee = registry::get_employee(store.get_ref(), path.into_inner()).await?;
    auth.scope_org(Some(employee.org.clone()))?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Updated employee, or its replacement after reclassification",
            body = Employee),
        (status = 400, description = "Leave date not after join date"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    orgs: web::Data<OrgTable>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();
    let body = body.into_inner();

    let current = registry::get_employee(store.get_ref(), employee_id).await?;
    auth.scope_org(Some(current.org))?;
    if let Some(org) = &body.org {
        auth.scope_org(Some(org.clone()))?;
    }

    let employee = registry::update_employee(
        store.get_ref(),
        orgs.get_ref(),
        employee_id,
        EmployeePatch {
            name: body.name,
            mobile: body.mobile,
            org: body.org,
            role_class: body.role_class,
            join_date: body.join_date,
            leave_date: body.leave_date,
            pay_scheme: body.pay_scheme,
            base_rate: body.base_rate,
        },
    )
    .await?;

    info!(by = %auth.username, employee_id, new_id = employee.id, "Employee updated via API");
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Marked as deleted", body = Object, example = json!({
            "message": "Employee deleted successfully."
        })),
        (status = 400, description = "Already deleted"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    let current = registry::get_employee(store.get_ref(), employee_id).await?;
    auth.scope_org(Some(current.org))?;
    registry::soft_delete(store.get_ref(), employee_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully."
    })))
}
