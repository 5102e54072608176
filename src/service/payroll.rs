//! Monthly wage derivation from attendance.
//!
//! For the current month only days up to today are walked and missing days
//! are tolerated; any other month must carry a fact for every day.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, EmployeeFilter, PayScheme};
use crate::service::month_view::month_bounds;
use crate::store::Store;
use crate::utils::dates::days_in_month;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AttendanceTally {
    /// Present/half-day hours, counted only for hourly employees.
    pub worked_hours: f64,
    /// Present/half-day hours regardless of scheme.
    pub worked_hours_all: f64,
    pub present_days: u32,
    pub absent_days: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollLine {
    pub employee_id: u64,
    pub code: String,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub join_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: PayScheme,
    pub gross_rate: f64,
    /// `H-<hours>` for hourly pay, otherwise `d-<days>,H-<hours>`.
    #[schema(example = "d-20,H-160")]
    pub summary: String,
    pub present_days: u32,
    pub absent_days: u32,
    #[schema(value_type = String, example = "10000.00")]
    pub actual_wage: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub advances: Decimal,
    #[schema(value_type = String, example = "10000.00")]
    pub net_payable: Decimal,
}

pub fn is_current_month(year: i32, month: u32, today: NaiveDate) -> bool {
    today.year() == year && today.month() == month
}

/// Days to walk: up to today within the current month, else the whole month.
pub fn effective_days(year: i32, month: u32, today: NaiveDate) -> u32 {
    if is_current_month(year, month, today) {
        today.day()
    } else {
        days_in_month(year, month)
    }
}

pub fn tally(
    record: Option<&AttendanceRecord>,
    scheme: PayScheme,
    first: NaiveDate,
    days: u32,
) -> AttendanceTally {
    let mut t = AttendanceTally::default();
    for date in first.iter_days().take(days as usize) {
        let Some(entry) = record.and_then(|r| r.day(date)) else {
            continue;
        };
        if entry.status.is_worked() {
            if scheme == PayScheme::Hourly {
                t.worked_hours += entry.hours_worked;
            }
            t.present_days += 1;
            t.worked_hours_all += entry.hours_worked;
        } else {
            t.absent_days += 1;
        }
    }
    t
}

/// Wage before rounding.
pub fn wage(scheme: PayScheme, base_rate: f64, days_in_month: u32, t: &AttendanceTally) -> f64 {
    let dim = f64::from(days_in_month);
    match scheme {
        PayScheme::Monthly => {
            let per_day = base_rate / dim / 12.0;
            let earned = per_day * t.worked_hours_all;
            if t.absent_days == 0 {
                earned
            } else {
                earned - (base_rate / dim) * f64::from(t.absent_days)
            }
        }
        PayScheme::Daily => base_rate * f64::from(t.present_days),
        PayScheme::Hourly => base_rate * t.worked_hours,
    }
}

/// Two decimal places, half away from zero.
pub fn to_money(value: f64) -> Decimal {
    let mut money = Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    money.rescale(2);
    money
}

fn format_hours(hours: f64) -> String {
    // whole numbers print without a fraction, e.g. "160" rather than "160.0"
    if hours.fract() == 0.0 {
        format!("{hours:.0}")
    } else {
        format!("{hours}")
    }
}

/// Wage for one employee for `year`/`month` as of `today`.
pub fn compute_salary(
    employee: &Employee,
    record: Option<&AttendanceRecord>,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> AppResult<PayrollLine> {
    let (first, _) = month_bounds(year, month)?;
    let dim = days_in_month(year, month);

    if employee.base_rate <= 0.0 || !employee.base_rate.is_finite() {
        return Err(AppError::MissingRate(format!(
            "{} ({})",
            employee.code, employee.name
        )));
    }

    let current = is_current_month(year, month, today);
    let t = tally(record, employee.pay_scheme, first, effective_days(year, month, today));

    let recorded = record.map_or(0, AttendanceRecord::recorded_days);
    if !current && recorded < dim as usize {
        return Err(AppError::IncompleteAttendance(
            format!("{} ({})", employee.code, employee.name),
            format!("{month}/{year}"),
        ));
    }

    let actual_wage = to_money(wage(employee.pay_scheme, employee.base_rate, dim, &t));
    let advances = Decimal::new(0, 2);
    let summary = match employee.pay_scheme {
        PayScheme::Hourly => format!("H-{}", format_hours(t.worked_hours)),
        _ => format!("d-{},H-{}", t.present_days, format_hours(t.worked_hours_all)),
    };

    Ok(PayrollLine {
        employee_id: employee.id,
        code: employee.code.clone(),
        name: employee.name.clone(),
        join_date: employee.join_date,
        leave_date: employee.leave_date,
        pay_scheme: employee.pay_scheme,
        gross_rate: employee.base_rate,
        summary,
        present_days: t.present_days,
        absent_days: t.absent_days,
        actual_wage,
        advances,
        net_payable: actual_wage - advances,
    })
}

/// Payroll for everyone in `org` employed during the month; the first
/// employee that cannot be costed fails the whole run.
#[instrument(skip(store))]
pub async fn org_payroll(
    store: &dyn Store,
    org: &str,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> AppResult<Vec<PayrollLine>> {
    let (first, last) = month_bounds(year, month)?;
    let employees: Vec<Employee> = store
        .find_employees(&EmployeeFilter::org(Some(org.to_string())))
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

    let lines = employees
        .iter()
        .map(|e| compute_salary(e, records.get(&e.id), year, month, today))
        .collect::<AppResult<Vec<_>>>()?;

    debug!(employees = lines.len(), "Payroll computed");
    Ok(lines)
}
