use std::sync::Arc;

use actix_web::middleware::from_fn;
use actix_web::web::{self, Data};
use actix_web::{App, http::StatusCode, test};
use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::auth::jwt::generate_access_token;
use crate::auth::middleware::auth_middleware;
use crate::config::{Config, StoreKind};
use crate::model::attendance::AttendanceStatus;
use crate::model::organization::OrgTable;
use crate::routes;
use crate::service::ledger;
use crate::store::{MemoryStore, Store};

const SECRET: &str = "test-secret";
const ADMIN: u8 = 1;
const HR: u8 = 2;
const VIEWER: u8 = 4;

fn config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        store: StoreKind::Memory,
        database_url: None,
        jwt_secret: SECRET.into(),
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        org_config_path: None,
    }
}

fn bearer(role: u8, org: Option<&str>) -> (&'static str, String) {
    let token = generate_access_token(1, "desk", role, org, SECRET, 600);
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::from($store.clone()))
                .app_data(Data::new(OrgTable::default()))
                .app_data(Data::new(config()))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .configure(routes::api),
                ),
        )
        .await
    };
}

fn store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

fn new_hire(org: &str, role_class: &str, scheme: &str, rate: f64) -> Value {
    json!({
        "name": "Ramesh",
        "org": org,
        "roleClass": role_class,
        "joinDate": "2024-01-01",
        "payScheme": scheme,
        "baseRate": rate
    })
}

#[actix_web::test]
async fn rejects_requests_without_token() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get().uri("/api/employees").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn rejects_token_scoped_to_unknown_org() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get()
        .uri("/api/employees")
        .insert_header(bearer(HR, Some("Nowhere Mills")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Unknown organization in token");

    let req = test::TestRequest::get()
        .uri("/api/employees")
        .insert_header(("Authorization", "Token abc"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn creates_employee_with_first_code() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(HR, None))
        .set_json(new_hire("Mittal Spinners", "Staff", "Monthly", 30000.0))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "1");
    assert_eq!(body["org"], "Mittal Spinners");
    assert_eq!(body["deleted"], false);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(HR, None))
        .set_json(new_hire("Jai Durga Cottex", "Labor", "Daily", 400.0))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], "JDC-101");
}

#[actix_web::test]
async fn viewer_cannot_create_and_scoped_hr_stays_in_org() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(VIEWER, None))
        .set_json(new_hire("Mittal Spinners", "Staff", "Monthly", 30000.0))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(HR, Some("HRM Spinners")))
        .set_json(new_hire("Mittal Spinners", "Staff", "Monthly", 30000.0))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_org_is_unprocessable() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(ADMIN, None))
        .set_json(new_hire("Nowhere Mills", "Staff", "Monthly", 30000.0))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "InvalidOrganization");
}

#[actix_web::test]
async fn chart_requires_org() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get()
        .uri("/api/employees/chart")
        .insert_header(bearer(ADMIN, None))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/employees/chart?org=HRM%20Spinners")
        .insert_header(bearer(ADMIN, None))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(200));
    assert_eq!(body[0]["code"], "301");
}

#[actix_web::test]
async fn missing_employee_is_not_found() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get()
        .uri("/api/employees/42")
        .insert_header(bearer(ADMIN, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NotFound");
}

#[actix_web::test]
async fn month_view_marks_unrecorded_days() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(HR, None))
        .set_json(new_hire("Mittal Spinners", "Labor", "Daily", 500.0))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/attendance/{id}"))
        .insert_header(bearer(HR, None))
        .set_json(json!({"date": "2024-03-10", "status": "Present", "hoursWorked": 8}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/attendance/monthly?org=Mittal%20Spinners&year=2024&month=3")
        .insert_header(bearer(VIEWER, None))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let days = body[0]["days"].as_array().unwrap();
    assert_eq!(days.len(), 31);
    assert_eq!(days[0]["status"], "-");
    assert_eq!(days[0]["hoursWorked"], "-");
    assert_eq!(days[9]["status"], "Present");
    assert_eq!(days[9]["hoursWorked"], 8.0);
}

#[actix_web::test]
async fn unrepresentable_year_is_a_bad_request() {
    let store = store();
    let app = app!(store);

    for uri in [
        "/api/attendance/monthly?year=2147483647&month=12",
        "/api/payroll?org=Mittal%20Spinners&year=2147483647&month=12",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(ADMIN, None))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn bulk_mark_then_day_snapshot() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(HR, None))
        .set_json(new_hire("HRM Spinners", "Staff", "Monthly", 30000.0))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/attendance/mark")
        .insert_header(bearer(HR, None))
        .set_json(json!({
            "date": "2024-05-02",
            "org": "HRM Spinners",
            "attendance": [
                {"employeeId": created["id"], "status": "Half-Day", "hoursWorked": 4},
                {"employeeId": 999, "status": "Present", "hoursWorked": 8}
            ]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["marked"], 1);

    let req = test::TestRequest::post()
        .uri("/api/attendance/day")
        .insert_header(bearer(VIEWER, None))
        .set_json(json!({"date": "2024-05-02", "org": "HRM Spinners"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["status"], "Half-Day");
}

#[actix_web::test]
async fn payroll_for_complete_month() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(HR, None))
        .set_json(new_hire("Mittal Spinners", "Labor", "Daily", 500.0))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/payroll?org=Mittal%20Spinners&year=2024&month=2")
        .insert_header(bearer(HR, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let first = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    for date in first.iter_days().take(29) {
        ledger::mark_day(store.as_ref(), id, date, AttendanceStatus::Present, 8.0)
            .await
            .unwrap();
    }

    let req = test::TestRequest::get()
        .uri("/api/payroll?org=Mittal%20Spinners&year=2024&month=2")
        .insert_header(bearer(HR, None))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let line = &body["salaryData"][0];
    assert_eq!(line["code"], "101");
    assert_eq!(line["summary"], "d-29,H-232");
    assert_eq!(line["actualWage"], "14500.00");
    assert_eq!(line["netPayable"], "14500.00");

    let req = test::TestRequest::get()
        .uri("/api/payroll?org=Mittal%20Spinners&year=2024&month=2")
        .insert_header(bearer(VIEWER, None))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}
