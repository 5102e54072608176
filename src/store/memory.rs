use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, DailyAttendance};
use crate::model::employee::{Employee, EmployeeFilter, NewEmployee};
use crate::store::Store;

#[derive(Default)]
struct Inner {
    next_id: u64,
    employees: BTreeMap<u64, Employee>,
    attendance: HashMap<(u64, i32, u32), AttendanceRecord>,
}

impl Inner {
    fn insert(&mut self, employee: NewEmployee, code: String) -> Employee {
        self.next_id += 1;
        let employee = employee.with_code(self.next_id, code);
        self.employees.insert(employee.id, employee.clone());
        employee
    }
}

/// In-process store; all documents live behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| AppError::Storage("memory store poisoned".into()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| AppError::Storage("memory store poisoned".into()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_employee(&self, employee: NewEmployee, code: String) -> AppResult<Employee> {
        Ok(self.write()?.insert(employee, code))
    }

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.read()?.employees.get(&id).cloned())
    }

    async fn update_employee(&self, employee: &Employee) -> AppResult<bool> {
        let mut inner = self.write()?;
        match inner.employees.get_mut(&employee.id) {
            Some(slot) => {
                *slot = employee.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_employees(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
        Ok(self
            .read()?
            .employees
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn reclassify(
        &self,
        old_id: u64,
        replacement: NewEmployee,
        code: String,
    ) -> AppResult<Employee> {
        let mut inner = self.write()?;
        if inner.employees.remove(&old_id).is_none() {
            return Err(AppError::NotFound(old_id));
        }
        inner.attendance.retain(|(id, _, _), _| *id != old_id);
        Ok(inner.insert(replacement, code))
    }

    async fn get_attendance(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> AppResult<Option<AttendanceRecord>> {
        Ok(self
            .read()?
            .attendance
            .get(&(employee_id, year, month))
            .cloned())
    }

    async fn find_attendance(
        &self,
        employee_ids: &[u64],
        year: i32,
        month: u32,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let inner = self.read()?;
        Ok(employee_ids
            .iter()
            .filter_map(|id| inner.attendance.get(&(*id, year, month)).cloned())
            .collect())
    }

    async fn upsert_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: DailyAttendance,
    ) -> AppResult<()> {
        let (year, month) = (date.year(), date.month());
        self.write()?
            .attendance
            .entry((employee_id, year, month))
            .or_insert_with(|| AttendanceRecord::empty(employee_id, year, month))
            .attendance
            .insert(date, entry);
        Ok(())
    }
}
