//! Employee code allocation.
//!
//! Codes live in a per-organization, per-role numeric band. A code is
//! occupied at an anchor date when its holder has no leave date or leaves on
//! or after that date. Codes whose holders left before the anchor are
//! recycled first, smallest first; otherwise the band is scanned upward.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::model::employee::{Employee, RoleClass};
use crate::model::organization::OrgTable;

/// Trailing decimal digits of a code, e.g. `"JDC-42"` -> 42.
pub fn numeric_suffix(code: &str) -> Option<u32> {
    let digits = code.len() - code.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    code[code.len() - digits..].parse().ok()
}

/// Picks a free code for a hire joining `org`/`role` on `anchor`.
///
/// `employees` should hold every employee of that org and role, deleted or
/// not; others are ignored.
pub fn allocate_code(
    orgs: &OrgTable,
    org: &str,
    role: RoleClass,
    anchor: NaiveDate,
    employees: &[Employee],
) -> AppResult<String> {
    let codes = orgs
        .get(org)
        .ok_or_else(|| AppError::InvalidOrganization(org.to_string()))?;
    let range = codes.range(role);

    let in_band = || {
        employees
            .iter()
            .filter(move |e| e.org == org && e.role_class == role)
    };
    let suffix_in_range = |e: &Employee| numeric_suffix(&e.code).filter(|n| range.contains(*n));

    let occupied: BTreeSet<u32> = in_band()
        .filter(|e| e.leave_date.is_none_or(|leave| leave >= anchor))
        .filter_map(suffix_in_range)
        .collect();

    let reusable = in_band()
        .filter(|e| e.leave_date.is_some_and(|leave| leave < anchor))
        .filter_map(suffix_in_range)
        .filter(|n| !occupied.contains(n))
        .min();
    if let Some(n) = reusable {
        return Ok(codes.format_code(n));
    }

    range
        .iter()
        .find(|n| !occupied.contains(n))
        .map(|n| codes.format_code(n))
        .ok_or_else(|| AppError::AllocationExhausted(org.to_string(), role.to_string()))
}
