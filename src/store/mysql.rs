use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sqlx::types::Json;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, DailyAttendance, DayMap};
use crate::model::employee::{Employee, EmployeeFilter, NewEmployee, PayScheme, RoleClass};
use crate::store::Store;

const EMPLOYEE_COLUMNS: &str = "id, name, mobile, org, role_class, code, join_date, leave_date, \
                                pay_scheme, base_rate, deleted";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64, // BIGINT UNSIGNED
    name: String,
    mobile: Option<String>,
    org: String,
    role_class: String,
    code: String,
    join_date: NaiveDate,
    leave_date: Option<NaiveDate>,
    pay_scheme: String,
    base_rate: f64,
    deleted: bool,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role_class = RoleClass::from_str(&row.role_class)
            .map_err(|_| AppError::Storage(format!("bad role_class {:?}", row.role_class)))?;
        let pay_scheme = PayScheme::from_str(&row.pay_scheme)
            .map_err(|_| AppError::Storage(format!("bad pay_scheme {:?}", row.pay_scheme)))?;
        Ok(Employee {
            id: row.id,
            name: row.name,
            mobile: row.mobile,
            org: row.org,
            role_class,
            code: row.code,
            join_date: row.join_date,
            leave_date: row.leave_date,
            pay_scheme,
            base_rate: row.base_rate,
            deleted: row.deleted,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    employee_id: u64,
    year: i32,
    month: u32,
    days: Json<DayMap>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            employee_id: row.employee_id,
            year: row.year,
            month: row.month,
            attendance: row.days.0,
        }
    }
}

/// MySQL backend: one `employees` row per employee, one `attendance` row per
/// employee-month with the sparse day map in a JSON column.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, MySql>,
        employee: NewEmployee,
        code: String,
    ) -> AppResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (name, mobile, org, role_class, code, join_date, leave_date,
             pay_scheme, base_rate, deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.mobile)
        .bind(&employee.org)
        .bind(employee.role_class.to_string())
        .bind(&code)
        .bind(employee.join_date)
        .bind(employee.leave_date)
        .bind(employee.pay_scheme.to_string())
        .bind(employee.base_rate)
        .execute(&mut **tx)
        .await?;

        Ok(employee.with_code(result.last_insert_id(), code))
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn insert_employee(&self, employee: NewEmployee, code: String) -> AppResult<Employee> {
        let mut tx = self.pool.begin().await?;
        let employee = Self::insert_in(&mut tx, employee, code).await?;
        tx.commit().await?;
        Ok(employee)
    }

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn update_employee(&self, employee: &Employee) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, mobile = ?, org = ?, role_class = ?, code = ?, join_date = ?,
                leave_date = ?, pay_scheme = ?, base_rate = ?, deleted = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.mobile)
        .bind(&employee.org)
        .bind(employee.role_class.to_string())
        .bind(&employee.code)
        .bind(employee.join_date)
        .bind(employee.leave_date)
        .bind(employee.pay_scheme.to_string())
        .bind(employee.base_rate)
        .bind(employee.deleted)
        .bind(employee.id)
        .execute(&self.pool)
        .await?;

        // MySQL reports 0 affected rows when nothing changed, so confirm existence.
        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
            )
            .bind(employee.id)
            .fetch_one(&self.pool)
            .await?;
            return Ok(exists != 0);
        }
        Ok(true)
    }

    async fn find_employees(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
        let mut conditions = Vec::new();
        let mut bindings: Vec<String> = Vec::new();

        if !filter.include_deleted {
            conditions.push("deleted = FALSE");
        }
        if let Some(org) = &filter.org {
            conditions.push("org = ?");
            bindings.push(org.clone());
        }
        if let Some(role) = filter.role_class {
            conditions.push("role_class = ?");
            bindings.push(role.to_string());
        }

        let where_clause = if conditions.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees {where_clause} ORDER BY id");
        debug!(sql = %sql, bindings = ?bindings, "Fetching employees");

        let mut query = sqlx::query_as::<_, EmployeeRow>(&sql);
        for b in &bindings {
            query = query.bind(b);
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    async fn reclassify(
        &self,
        old_id: u64,
        replacement: NewEmployee,
        code: String,
    ) -> AppResult<Employee> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            // dropping `tx` rolls back the attendance delete
            return Err(AppError::NotFound(old_id));
        }

        let employee = Self::insert_in(&mut tx, replacement, code).await?;
        tx.commit().await?;
        Ok(employee)
    }

    async fn get_attendance(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> AppResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT employee_id, year, month, days
            FROM attendance
            WHERE employee_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AttendanceRecord::from))
    }

    async fn find_attendance(
        &self,
        employee_ids: &[u64],
        year: i32,
        month: u32,
    ) -> AppResult<Vec<AttendanceRecord>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; employee_ids.len()].join(", ");
        let sql = format!(
            "SELECT employee_id, year, month, days FROM attendance \
             WHERE year = ? AND month = ? AND employee_id IN ({placeholders})"
        );
        debug!(sql = %sql, year, month, count = employee_ids.len(), "Fetching attendance");

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql).bind(year).bind(month);
        for id in employee_ids {
            query = query.bind(*id);
        }
        Ok(query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::from)
            .collect())
    }

    async fn upsert_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: DailyAttendance,
    ) -> AppResult<()> {
        let (year, month) = (date.year(), date.month());
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, Json<DayMap>>(
            r#"
            SELECT days FROM attendance
            WHERE employee_id = ? AND year = ? AND month = ?
            FOR UPDATE
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month)
        .fetch_optional(&mut *tx)
        .await?;

        let mut days = current.map(|j| j.0).unwrap_or_default();
        days.insert(date, entry);

        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, year, month, days)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE days = VALUES(days)
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month)
        .bind(Json(&days))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
