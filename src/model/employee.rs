use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum RoleClass {
    Staff,
    Labor,
}

impl RoleClass {
    pub const ALL: [RoleClass; 2] = [RoleClass::Staff, RoleClass::Labor];
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum PayScheme {
    Monthly,
    Daily,
    Hourly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 7,
        "name": "Ramesh Kumar",
        "mobile": "9876543210",
        "org": "Mittal Spinners",
        "roleClass": "Staff",
        "code": "12",
        "joinDate": "2024-01-01",
        "leaveDate": null,
        "payScheme": "Daily",
        "baseRate": 500.0,
        "deleted": false
    })
)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    #[schema(nullable = true)]
    pub mobile: Option<String>,
    pub org: String,
    pub role_class: RoleClass,
    pub code: String,
    #[schema(value_type = String, format = "date")]
    pub join_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: PayScheme,
    pub base_rate: f64,
    pub deleted: bool,
}

impl Employee {
    /// Active on `day`: not deleted and not yet past the leave date.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        !self.deleted && self.leave_date.is_none_or(|leave| leave >= day)
    }

    /// Employed on `day`: joined on or before it and not left before it.
    pub fn is_eligible_on(&self, day: NaiveDate) -> bool {
        self.join_date <= day && self.is_active_on(day)
    }

    /// Employed at any point in `[first, last]`.
    pub fn overlaps(&self, first: NaiveDate, last: NaiveDate) -> bool {
        !self.deleted
            && self.join_date <= last
            && self.leave_date.is_none_or(|leave| leave >= first)
    }
}

/// Employee fields before a code and id are assigned.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub mobile: Option<String>,
    pub org: String,
    pub role_class: RoleClass,
    pub join_date: NaiveDate,
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: PayScheme,
    pub base_rate: f64,
}

impl NewEmployee {
    pub fn with_code(self, id: u64, code: String) -> Employee {
        Employee {
            id,
            name: self.name,
            mobile: self.mobile,
            org: self.org,
            role_class: self.role_class,
            code,
            join_date: self.join_date,
            leave_date: self.leave_date,
            pay_scheme: self.pay_scheme,
            base_rate: self.base_rate,
            deleted: false,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct EmployeeFilter {
    pub org: Option<String>,
    pub role_class: Option<RoleClass>,
    pub include_deleted: bool,
}

impl EmployeeFilter {
    pub fn org(org: Option<String>) -> Self {
        Self {
            org,
            ..Default::default()
        }
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        (self.include_deleted || !employee.deleted)
            && self.org.as_deref().is_none_or(|org| employee.org == org)
            && self.role_class.is_none_or(|role| employee.role_class == role)
    }
}
