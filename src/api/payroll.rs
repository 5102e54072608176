use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::service::payroll::{self, PayrollLine};
use crate::store::Store;
use crate::utils::dates::today;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = "Mittal Spinners")]
    pub org: Option<String>,

    #[schema(example = 2024)]
    pub year: i32,

    #[schema(example = 2)]
    pub month: u32,
}

#[derive(serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResponse {
    pub success: bool,
    pub salary_data: Vec<PayrollLine>,
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PayrollResponse),
        (status = 400, description = "Organization is required"),
        (status = 422, description = "Missing rate or incomplete attendance for some employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn compute_payroll(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let PayrollQuery { org, year, month } = query.into_inner();
    let Some(org) = auth.scope_org(org)? else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Organization is required."
        })));
    };

    let salary_data = payroll::org_payroll(store.get_ref(), &org, year, month, today()).await?;

    Ok(HttpResponse::Ok().json(PayrollResponse {
        success: true,
        salary_data,
    }))
}
