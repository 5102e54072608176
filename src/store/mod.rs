//! Document-style persistence for employees and monthly attendance records.
//!
//! Each employee and each `(employee, year, month)` attendance record is one
//! document, written as a whole. The only multi-document write is
//! [`Store::reclassify`], which backends must apply atomically.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, DailyAttendance};
use crate::model::employee::{Employee, EmployeeFilter, NewEmployee};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Persists a new employee with the given code and returns it with its id.
    async fn insert_employee(&self, employee: NewEmployee, code: String) -> AppResult<Employee>;

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>>;

    /// Overwrites the stored document; returns false if `employee.id` is unknown.
    async fn update_employee(&self, employee: &Employee) -> AppResult<bool>;

    async fn find_employees(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>>;

    /// Deletes all attendance of `old_id`, deletes `old_id`, and inserts the
    /// replacement, as one unit.
    async fn reclassify(
        &self,
        old_id: u64,
        replacement: NewEmployee,
        code: String,
    ) -> AppResult<Employee>;

    async fn get_attendance(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> AppResult<Option<AttendanceRecord>>;

    async fn find_attendance(
        &self,
        employee_ids: &[u64],
        year: i32,
        month: u32,
    ) -> AppResult<Vec<AttendanceRecord>>;

    /// Creates the month record if needed and sets the day, overwriting any prior value.
    async fn upsert_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: DailyAttendance,
    ) -> AppResult<()>;
}
