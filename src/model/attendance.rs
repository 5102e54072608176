use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(rename = "Half-Day")]
    #[strum(serialize = "Half-Day")]
    HalfDay,
}

impl AttendanceStatus {
    /// Present and half days both count as days worked.
    pub fn is_worked(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::HalfDay)
    }
}

/// One day's attendance fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub status: AttendanceStatus,
    #[serde(default)]
    pub hours_worked: f64,
}

impl DailyAttendance {
    /// Read-time fallback for a day nobody marked.
    pub fn unmarked() -> Self {
        Self {
            status: AttendanceStatus::Absent,
            hours_worked: 0.0,
        }
    }
}

/// Sparse day map, keyed by calendar day.
pub type DayMap = BTreeMap<NaiveDate, DailyAttendance>;

/// One employee's attendance for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub employee_id: u64,
    pub year: i32,
    pub month: u32,
    pub attendance: DayMap,
}

impl AttendanceRecord {
    pub fn empty(employee_id: u64, year: i32, month: u32) -> Self {
        Self {
            employee_id,
            year,
            month,
            attendance: DayMap::new(),
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DailyAttendance> {
        self.attendance.get(&date)
    }

    /// Number of distinct days of this record's own month that carry a fact.
    pub fn recorded_days(&self) -> usize {
        self.attendance
            .keys()
            .filter(|d| d.year() == self.year && d.month() == self.month)
            .count()
    }
}
