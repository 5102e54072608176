use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceStatus, DailyAttendance};
use crate::model::employee::{Employee, EmployeeFilter, PayScheme};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    #[schema(example = 7)]
    pub employee_id: u64,
    pub status: AttendanceStatus,
    #[serde(default)]
    #[schema(example = 8.0)]
    pub hours_worked: f64,
}

/// One employee's attendance on a single date.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub employee_id: u64,
    pub name: String,
    pub code: String,
    #[schema(value_type = String, format = "date")]
    pub join_date: NaiveDate,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub leave_date: Option<NaiveDate>,
    pub pay_scheme: PayScheme,
    pub base_rate: f64,
    pub status: AttendanceStatus,
    pub hours_worked: f64,
}

fn check_hours(hours: f64) -> AppResult<()> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!("hours worked must be non-negative, got {hours}")))
    }
}

/// Employees on the books on `date`, optionally within one org.
pub async fn eligible_on(
    store: &dyn Store,
    date: NaiveDate,
    org: Option<String>,
) -> AppResult<Vec<Employee>> {
    Ok(store
        .find_employees(&EmployeeFilter::org(org))
        .await?
        .into_iter()
        .filter(|e| e.is_eligible_on(date))
        .collect())
}

/// Records one day for one employee, replacing whatever was there.
/// The employment window is not consulted.
#[instrument(skip(store))]
pub async fn mark_day(
    store: &dyn Store,
    employee_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
    hours_worked: f64,
) -> AppResult<()> {
    check_hours(hours_worked)?;
    if store.get_employee(employee_id).await?.is_none() {
        return Err(AppError::NotFound(employee_id));
    }
    store
        .upsert_day(
            employee_id,
            date,
            DailyAttendance {
                status,
                hours_worked,
            },
        )
        .await?;
    debug!(employee_id, %date, %status, hours_worked, "Attendance marked");
    Ok(())
}

/// Stored entry for the day, or Absent/0 when nothing was marked.
pub async fn get_day(
    store: &dyn Store,
    employee_id: u64,
    date: NaiveDate,
) -> AppResult<DailyAttendance> {
    let record = store
        .get_attendance(employee_id, date.year(), date.month())
        .await?;
    Ok(record
        .and_then(|r| r.day(date).copied())
        .unwrap_or_else(DailyAttendance::unmarked))
}

/// Marks `date` for every eligible employee that has an entry; other entries are ignored.
/// Writes run concurrently, one per employee; any failure fails the call,
/// though successful writes stay applied.
#[instrument(skip(store, entries), fields(entries = entries.len()))]
pub async fn bulk_mark(
    store: &dyn Store,
    date: NaiveDate,
    org: Option<String>,
    entries: Vec<MarkEntry>,
) -> AppResult<usize> {
    let by_id: HashMap<u64, MarkEntry> =
        entries.into_iter().map(|e| (e.employee_id, e)).collect();

    let eligible = eligible_on(store, date, org).await?;
    let targets: Vec<(u64, DailyAttendance)> = eligible
        .iter()
        .filter_map(|employee| {
            by_id.get(&employee.id).map(|entry| {
                let day = DailyAttendance {
                    status: entry.status,
                    hours_worked: entry.hours_worked,
                };
                (employee.id, day)
            })
        })
        .collect();
    for (_, day) in &targets {
        check_hours(day.hours_worked)?;
    }

    let writes = targets
        .iter()
        .map(|(employee_id, day)| store.upsert_day(*employee_id, date, *day));
    let results = join_all(writes).await;

    let total = results.len();
    let mut failed = 0;
    for result in &results {
        if let Err(e) = result {
            error!(error = %e, %date, "Attendance write failed");
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(AppError::PartialWrite { failed, total });
    }

    info!(%date, marked = total, "Attendance marked for eligible employees");
    Ok(total)
}

/// Every eligible employee's status on `date`, defaulting to Absent/0.
pub async fn day_snapshot(
    store: &dyn Store,
    date: NaiveDate,
    org: Option<String>,
) -> AppResult<Vec<DaySnapshot>> {
    let employees = eligible_on(store, date, org).await?;
    let ids: Vec<u64> = employees.iter().map(|e| e.id).collect();
    let records: HashMap<u64, _> = store
        .find_attendance(&ids, date.year(), date.month())
        .await?
        .into_iter()
        .map(|r| (r.employee_id, r))
        .collect();

    Ok(employees
        .into_iter()
        .map(|e| {
            let entry = records
                .get(&e.id)
                .and_then(|r| r.day(date).copied())
                .unwrap_or_else(DailyAttendance::unmarked);
            DaySnapshot {
                employee_id: e.id,
                name: e.name,
                code: e.code,
                join_date: e.join_date,
                leave_date: e.leave_date,
                pay_scheme: e.pay_scheme,
                base_rate: e.base_rate,
                status: entry.status,
                hours_worked: entry.hours_worked,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceRecord;
    use crate::model::employee::{NewEmployee, RoleClass};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    /// Memory store whose day writes fail for one employee.
    struct FailingWrites {
        inner: MemoryStore,
        broken: u64,
    }

    #[async_trait]
    impl Store for FailingWrites {
        async fn insert_employee(
            &self,
            employee: NewEmployee,
            code: String,
        ) -> AppResult<Employee> {
            self.inner.insert_employee(employee, code).await
        }

        async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
            self.inner.get_employee(id).await
        }

        async fn update_employee(&self, employee: &Employee) -> AppResult<bool> {
            self.inner.update_employee(employee).await
        }

        async fn find_employees(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
            self.inner.find_employees(filter).await
        }

        async fn reclassify(
            &self,
            old_id: u64,
            replacement: NewEmployee,
            code: String,
        ) -> AppResult<Employee> {
            self.inner.reclassify(old_id, replacement, code).await
        }

        async fn get_attendance(
            &self,
            employee_id: u64,
            year: i32,
            month: u32,
        ) -> AppResult<Option<AttendanceRecord>> {
            self.inner.get_attendance(employee_id, year, month).await
        }

        async fn find_attendance(
            &self,
            employee_ids: &[u64],
            year: i32,
            month: u32,
        ) -> AppResult<Vec<AttendanceRecord>> {
            self.inner.find_attendance(employee_ids, year, month).await
        }

        async fn upsert_day(
            &self,
            employee_id: u64,
            date: NaiveDate,
            entry: DailyAttendance,
        ) -> AppResult<()> {
            if employee_id == self.broken {
                return Err(AppError::Storage("disk full".into()));
            }
            self.inner.upsert_day(employee_id, date, entry).await
        }
    }

    fn present(employee_id: u64, hours_worked: f64) -> MarkEntry {
        MarkEntry {
            employee_id,
            status: AttendanceStatus::Present,
            hours_worked,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed(
        store: &dyn Store,
        org: &str,
        code: &str,
        join: NaiveDate,
        leave: Option<NaiveDate>,
    ) -> Employee {
        store
            .insert_employee(
                NewEmployee {
                    name: format!("worker {code}"),
                    mobile: None,
                    org: org.to_string(),
                    role_class: RoleClass::Labor,
                    join_date: join,
                    leave_date: leave,
                    pay_scheme: PayScheme::Hourly,
                    base_rate: 60.0,
                },
                code.to_string(),
            )
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn second_mark_overwrites_first() {
        let store = MemoryStore::new();
        let e = seed(&store, "Mittal Spinners", "101", day(2024, 1, 1), None).await;
        let d = day(2024, 3, 4);

        mark_day(&store, e.id, d, AttendanceStatus::Present, 8.0).await.unwrap();
        mark_day(&store, e.id, d, AttendanceStatus::HalfDay, 4.0).await.unwrap();

        let got = get_day(&store, e.id, d).await.unwrap();
        assert_eq!(got.status, AttendanceStatus::HalfDay);
        assert_eq!(got.hours_worked, 4.0);
        let record = store.get_attendance(e.id, 2024, 3).await.unwrap().unwrap();
        assert_eq!(record.recorded_days(), 1);
    }

    #[actix_web::test]
    async fn unmarked_day_reads_as_absent() {
        let store = MemoryStore::new();
        let e = seed(&store, "Mittal Spinners", "101", day(2024, 1, 1), None).await;
        let got = get_day(&store, e.id, day(2024, 3, 4)).await.unwrap();
        assert_eq!(got, DailyAttendance::unmarked());
        // nothing was persisted by the read
        assert!(store.get_attendance(e.id, 2024, 3).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn mark_day_outside_window_is_accepted() {
        let store = MemoryStore::new();
        let e = seed(&store, "Mittal Spinners", "101", day(2024, 5, 1), None).await;
        mark_day(&store, e.id, day(2024, 4, 1), AttendanceStatus::Present, 8.0)
            .await
            .unwrap();
        assert!(matches!(
            mark_day(&store, 404, day(2024, 4, 1), AttendanceStatus::Present, 8.0).await,
            Err(AppError::NotFound(404))
        ));
        assert!(matches!(
            mark_day(&store, e.id, day(2024, 4, 1), AttendanceStatus::Present, -1.0).await,
            Err(AppError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn bulk_mark_skips_ineligible_employees() {
        let store = MemoryStore::new();
        let d = day(2024, 3, 10);
        let here = seed(&store, "Mittal Spinners", "101", day(2024, 1, 1), None).await;
        let left_on = Some(day(2024, 3, 9));
        let left = seed(&store, "Mittal Spinners", "102", day(2023, 1, 1), left_on).await;
        let future = seed(&store, "Mittal Spinners", "103", day(2024, 4, 1), None).await;
        let elsewhere = seed(&store, "HRM Spinners", "401", day(2024, 1, 1), None).await;

        let entries = [here.id, left.id, future.id, elsewhere.id, 999]
            .into_iter()
            .map(|employee_id| MarkEntry {
                employee_id,
                status: AttendanceStatus::Present,
                hours_worked: 8.0,
            })
            .collect();
        let marked = bulk_mark(&store, d, Some("Mittal Spinners".into()), entries)
            .await
            .unwrap();

        assert_eq!(marked, 1);
        assert_eq!(get_day(&store, here.id, d).await.unwrap().status, AttendanceStatus::Present);
        for id in [left.id, future.id, elsewhere.id] {
            assert!(store.get_attendance(id, 2024, 3).await.unwrap().is_none());
        }
    }

    #[actix_web::test]
    async fn snapshot_defaults_unmarked_employees() {
        let store = MemoryStore::new();
        let d = day(2024, 3, 10);
        let a = seed(&store, "Mittal Spinners", "101", day(2024, 1, 1), None).await;
        let b = seed(&store, "Mittal Spinners", "102", day(2024, 1, 1), None).await;
        mark_day(&store, a.id, d, AttendanceStatus::Present, 9.5).await.unwrap();

        let snapshot = day_snapshot(&store, d, None).await.unwrap();
        assert_eq!(snapshot.len(), 2);
        let a_row = snapshot.iter().find(|s| s.employee_id == a.id).unwrap();
        let b_row = snapshot.iter().find(|s| s.employee_id == b.id).unwrap();
        assert_eq!((a_row.status, a_row.hours_worked), (AttendanceStatus::Present, 9.5));
        assert_eq!((b_row.status, b_row.hours_worked), (AttendanceStatus::Absent, 0.0));
        assert_eq!(b_row.code, "102");
    }

    #[actix_web::test]
    async fn bulk_mark_reports_failed_writes_and_keeps_the_rest() {
        let d = day(2024, 3, 10);
        let mut store = FailingWrites {
            inner: MemoryStore::new(),
            broken: 0,
        };
        let a = seed(&store, "Mittal Spinners", "101", day(2024, 1, 1), None).await;
        let b = seed(&store, "Mittal Spinners", "102", day(2024, 1, 1), None).await;
        let c = seed(&store, "Mittal Spinners", "103", day(2024, 1, 1), None).await;
        store.broken = b.id;

        let entries = vec![present(a.id, 8.0), present(b.id, 8.0), present(c.id, 6.0)];
        let result = bulk_mark(&store, d, None, entries).await;
        assert!(matches!(result, Err(AppError::PartialWrite { failed: 1, total: 3 })));

        assert_eq!(get_day(&store, a.id, d).await.unwrap().hours_worked, 8.0);
        assert_eq!(get_day(&store, c.id, d).await.unwrap().hours_worked, 6.0);
        assert!(store.get_attendance(b.id, 2024, 3).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn bulk_mark_validates_only_written_entries() {
        let store = MemoryStore::new();
        let d = day(2024, 3, 10);
        let e = seed(&store, "Mittal Spinners", "101", day(2024, 1, 1), None).await;

        let marked = bulk_mark(&store, d, None, vec![present(e.id, 8.0), present(999, -1.0)])
            .await
            .unwrap();
        assert_eq!(marked, 1);

        let rejected = bulk_mark(&store, d, None, vec![present(e.id, -1.0)]).await;
        assert!(matches!(rejected, Err(AppError::Validation(_))));
        assert_eq!(get_day(&store, e.id, d).await.unwrap().hours_worked, 8.0);
    }
}
