use std::collections::HashMap;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, DailyAttendance};
use crate::model::employee::{Employee, EmployeeFilter};
use crate::store::Store;
use crate::utils::dates::{days_in_month, first_day, last_day};

/// Rendered in place of status and hours for a day nobody marked.
pub const NO_RECORD: &str = "-";

/// One calendar day of a month view. Serializes as
/// `{"date", "status", "hoursWorked"}` with `"-"` for unmarked days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub entry: Option<DailyAttendance>,
}

impl Serialize for MonthDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MonthDay", 3)?;
        s.serialize_field("date", &self.date)?;
        match &self.entry {
            Some(entry) => {
                s.serialize_field("status", &entry.status)?;
                s.serialize_field("hoursWorked", &entry.hours_worked)?;
            }
            None => {
                s.serialize_field("status", NO_RECORD)?;
                s.serialize_field("hoursWorked", NO_RECORD)?;
            }
        }
        s.end()
    }
}

#[derive(Debug, Clone, serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeMonth {
    pub employee: Employee,
    #[schema(value_type = Vec<Object>)]
    pub days: Vec<MonthDay>,
}

pub fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    first_day(year, month)
        .zip(last_day(year, month))
        .ok_or_else(|| AppError::Validation(format!("invalid month {year}-{month:02}")))
}

/// Dense day-by-day view of one month; always `days_in_month` entries.
pub fn build_month_view(
    record: Option<&AttendanceRecord>,
    year: i32,
    month: u32,
) -> AppResult<Vec<MonthDay>> {
    let (first, _) = month_bounds(year, month)?;
    Ok(first
        .iter_days()
        .take(days_in_month(year, month) as usize)
        .map(|date| MonthDay {
            date,
            entry: record.and_then(|r| r.day(date).copied()),
        })
        .collect())
}

pub async fn employee_month(
    store: &dyn Store,
    employee_id: u64,
    year: i32,
    month: u32,
) -> AppResult<EmployeeMonth> {
    let employee = store
        .get_employee(employee_id)
        .await?
        .ok_or(AppError::NotFound(employee_id))?;
    let record = store.get_attendance(employee_id, year, month).await?;
    let days = build_month_view(record.as_ref(), year, month)?;
    Ok(EmployeeMonth { employee, days })
}

/// Month views for everyone employed at some point during the month.
pub async fn org_month_views(
    store: &dyn Store,
    org: Option<String>,
    year: i32,
    month: u32,
) -> AppResult<Vec<EmployeeMonth>> {
    let (first, last) = month_bounds(year, month)?;
    let employees: Vec<Employee> = store
        .find_employees(&EmployeeFilter::org(org))
        .await?
        .into_iter()
        .filter(|e| e.overlaps(first, last))
        .collect();

    let ids: Vec<u64> = employees.iter().map(|e| e.id).collect();
    let records: HashMap<u64, AttendanceRecord> = store
        .find_attendance(&ids, year, month)
        .await?
        .into_iter()
        .map(|r| (r.employee_id, r))
        .collect();

    employees
        .into_iter()
        .map(|employee| {
            let days = build_month_view(records.get(&employee.id), year, month)?;
            Ok(EmployeeMonth { employee, days })
        })
        .collect()
}
