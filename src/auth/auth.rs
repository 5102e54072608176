use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if the token pins the user to one organization
    pub org: Option<String>,
}

/// Reads the user placed in request extensions by `auth_middleware`.
impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Missing token")),
        )
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }

    /// Supervisors may mark attendance in addition to HR and admins
    pub fn require_marker(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Hr | Role::Supervisor) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Supervisor/HR/Admin only"))
        }
    }

    /// Resolves the org a request may see. Admins and unscoped users get what
    /// they asked for; a scoped user is pinned to their own org.
    pub fn scope_org(&self, requested: Option<String>) -> actix_web::Result<Option<String>> {
        match (&self.org, self.role) {
            (_, Role::Admin) | (None, _) => Ok(requested),
            (Some(own), _) => match requested {
                Some(r) if &r != own => Err(actix_web::error::ErrorForbidden(
                    "Not allowed for this organization",
                )),
                _ => Ok(Some(own.clone())),
            },
        }
    }
}
