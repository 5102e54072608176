use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::organization::OrgTable;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::{Value, json};
use tracing::{debug, warn};

fn bearer_token(req: &ServiceRequest) -> Result<&str, Value> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| json!({"error": "Missing Authorization header"}))?
        .to_str()
        .map_err(|_| json!({"error": "Invalid Authorization header encoding"}))?;
    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| json!({"error": "Authorization header must start with Bearer"}))
}

/// Resolves the caller from the bearer token. A token pinned to an
/// organization must name one the service knows.
fn authenticate(req: &ServiceRequest, secret: &str) -> Result<AuthUser, Value> {
    let claims = verify_token(bearer_token(req)?, secret)
        .map_err(|e| json!({"error": "Invalid or expired token", "details": e}))?;

    let role = Role::from_id(claims.role).ok_or_else(|| json!({"error": "Invalid role"}))?;

    if let (Some(org), Some(orgs)) = (&claims.org, req.app_data::<Data<OrgTable>>()) {
        if orgs.get(org).is_none() {
            warn!(user_id = claims.user_id, org = %org, "Token scoped to unknown organization");
            return Err(json!({"error": "Unknown organization in token"}));
        }
    }

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        org: claims.org,
    })
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match authenticate(&req, &config.jwt_secret) {
        Ok(user) => {
            debug!(
                user_id = user.user_id,
                role = ?user.role,
                org = user.org.as_deref().unwrap_or("*"),
                "Request authenticated"
            );
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(body) => {
            let resp = HttpResponse::Unauthorized().json(body);
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
