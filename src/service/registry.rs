use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::employee::{Employee, EmployeeFilter, NewEmployee, PayScheme, RoleClass};
use crate::model::organization::OrgTable;
use crate::service::allocator::allocate_code;
use crate::store::Store;

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Clone)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub org: Option<String>,
    pub role_class: Option<RoleClass>,
    pub join_date: Option<NaiveDate>,
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: Option<PayScheme>,
    pub base_rate: Option<f64>,
}

/// One printable roster slot.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartSlot {
    pub code: String,
    pub name: String,
    pub role_class: RoleClass,
}

fn check_range(join: NaiveDate, leave: Option<NaiveDate>) -> AppResult<()> {
    match leave {
        Some(leave) if leave <= join => Err(AppError::InvalidRange),
        _ => Ok(()),
    }
}

fn check_rate(rate: f64) -> AppResult<()> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!("base rate must be non-negative, got {rate}")))
    }
}

async fn next_code(
    store: &dyn Store,
    orgs: &OrgTable,
    org: &str,
    role: RoleClass,
    anchor: NaiveDate,
    exclude: Option<u64>,
) -> AppResult<String> {
    if orgs.get(org).is_none() {
        return Err(AppError::InvalidOrganization(org.to_string()));
    }
    let mut band = store
        .find_employees(&EmployeeFilter {
            org: Some(org.to_string()),
            role_class: Some(role),
            include_deleted: true,
        })
        .await?;
    band.retain(|e| Some(e.id) != exclude);
    allocate_code(orgs, org, role, anchor, &band)
}

/// Employed at some common day in both windows; an open leave date runs forever.
fn windows_overlap(a: &Employee, b: &Employee) -> bool {
    a.leave_date.is_none_or(|leave| b.join_date <= leave)
        && b.leave_date.is_none_or(|leave| a.join_date <= leave)
}

/// Rejects a join/leave change that would let two holders of one code overlap.
async fn check_code_window(store: &dyn Store, employee: &Employee) -> AppResult<()> {
    let band = store
        .find_employees(&EmployeeFilter {
            org: Some(employee.org.clone()),
            role_class: Some(employee.role_class),
            include_deleted: true,
        })
        .await?;
    let clash = band.iter().find(|other| {
        other.id != employee.id && other.code == employee.code && windows_overlap(other, employee)
    });
    match clash {
        Some(other) => Err(AppError::Validation(format!(
            "code {} is held by employee {} during that period",
            employee.code, other.id
        ))),
        None => Ok(()),
    }
}

#[instrument(skip(store, orgs, new), fields(org = %new.org, role = %new.role_class))]
pub async fn create_employee(
    store: &dyn Store,
    orgs: &OrgTable,
    new: NewEmployee,
) -> AppResult<Employee> {
    check_range(new.join_date, new.leave_date)?;
    check_rate(new.base_rate)?;

    let code = next_code(store, orgs, &new.org, new.role_class, new.join_date, None).await?;
    let employee = store.insert_employee(new, code).await?;

    info!(employee_id = employee.id, code = %employee.code, "Employee created");
    Ok(employee)
}

pub async fn get_employee(store: &dyn Store, id: u64) -> AppResult<Employee> {
    store.get_employee(id).await?.ok_or(AppError::NotFound(id))
}

/// Applies `patch`. A change of org or role class replaces the employee:
/// the old record and all its attendance are dropped and a new record with
/// a fresh id and code is returned.
#[instrument(skip(store, orgs, patch))]
pub async fn update_employee(
    store: &dyn Store,
    orgs: &OrgTable,
    id: u64,
    patch: EmployeePatch,
) -> AppResult<Employee> {
    let current = get_employee(store, id).await?;
    if current.deleted {
        return Err(AppError::AlreadyDeleted(id));
    }

    let join_date = patch.join_date.unwrap_or(current.join_date);
    let leave_date = patch.leave_date.or(current.leave_date);
    check_range(join_date, leave_date)?;
    if let Some(rate) = patch.base_rate {
        check_rate(rate)?;
    }

    let org = patch.org.unwrap_or_else(|| current.org.clone());
    let role_class = patch.role_class.unwrap_or(current.role_class);
    let reclassified = org != current.org || role_class != current.role_class;

    let name = patch.name.unwrap_or_else(|| current.name.clone());
    let mobile = patch.mobile.or_else(|| current.mobile.clone());
    let pay_scheme = patch.pay_scheme.unwrap_or(current.pay_scheme);
    let base_rate = patch.base_rate.unwrap_or(current.base_rate);

    if reclassified {
        let code = next_code(store, orgs, &org, role_class, join_date, Some(id)).await?;
        let replacement = NewEmployee {
            name,
            mobile,
            org,
            role_class,
            join_date,
            leave_date,
            pay_scheme,
            base_rate,
        };
        let employee = store.reclassify(id, replacement, code).await?;
        warn!(
            old_id = id,
            old_code = %current.code,
            new_id = employee.id,
            code = %employee.code,
            org = %employee.org,
            "Employee reclassified; prior attendance discarded"
        );
        return Ok(employee);
    }

    let window_moved = join_date != current.join_date || leave_date != current.leave_date;
    let updated = Employee {
        name,
        mobile,
        join_date,
        leave_date,
        pay_scheme,
        base_rate,
        ..current
    };
    if window_moved {
        check_code_window(store, &updated).await?;
    }
    if !store.update_employee(&updated).await? {
        return Err(AppError::NotFound(id));
    }
    info!(employee_id = id, "Employee updated");
    Ok(updated)
}

#[instrument(skip(store))]
pub async fn soft_delete(store: &dyn Store, id: u64) -> AppResult<()> {
    let mut employee = get_employee(store, id).await?;
    if employee.deleted {
        return Err(AppError::AlreadyDeleted(id));
    }
    employee.deleted = true;
    if !store.update_employee(&employee).await? {
        return Err(AppError::NotFound(id));
    }
    info!(employee_id = id, code = %employee.code, "Employee soft-deleted");
    Ok(())
}

/// Employees active on `today`, ordered by code string.
pub async fn list_active(
    store: &dyn Store,
    org: Option<String>,
    today: NaiveDate,
) -> AppResult<Vec<Employee>> {
    let mut employees: Vec<Employee> = store
        .find_employees(&EmployeeFilter::org(org))
        .await?
        .into_iter()
        .filter(|e| e.is_active_on(today))
        .collect();
    employees.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(employees)
}

/// Active employees ordered by base rate ascending.
pub async fn list_by_rate(
    store: &dyn Store,
    org: Option<String>,
    today: NaiveDate,
) -> AppResult<Vec<Employee>> {
    let mut employees = list_active(store, org, today).await?;
    employees.sort_by(|a, b| a.base_rate.total_cmp(&b.base_rate));
    Ok(employees)
}

/// Every slot of the org's Staff band then Labor band, named where an active employee holds it.
pub async fn employee_chart(
    store: &dyn Store,
    orgs: &OrgTable,
    org: &str,
    today: NaiveDate,
) -> AppResult<Vec<ChartSlot>> {
    let codes = orgs
        .get(org)
        .ok_or_else(|| AppError::InvalidOrganization(org.to_string()))?;
    let active = list_active(store, Some(org.to_string()), today).await?;

    let mut chart = Vec::new();
    for role in RoleClass::ALL {
        for n in codes.range(role).iter() {
            let code = codes.format_code(n);
            let name = active
                .iter()
                .find(|e| e.code == code)
                .map(|e| e.name.clone())
                .unwrap_or_default();
            chart.push(ChartSlot {
                code,
                name,
                role_class: role,
            });
        }
    }
    Ok(chart)
}
