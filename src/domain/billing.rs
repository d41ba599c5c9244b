//! Plan resolution, monthly charges, usage warnings and revenue aggregation.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_CURRENCY: &str = "ILS";
pub const FREE_PLAN_CODE: &str = "FREE";

/// Usage ratio at which the seller starts being warned.
pub const APPROACHING_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanTerms {
    pub free_quota: i32,
    pub lead_price: i64,
    pub fixed_fee: i64,
    pub currency: String,
}

impl PlanTerms {
    pub fn free() -> Self {
        Self {
            free_quota: 0,
            lead_price: 0,
            fixed_fee: 0,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Per-customer deal fields stored on the user; each one overrides the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingOverrides {
    pub free_quota: Option<i32>,
    pub lead_price: Option<i64>,
    pub fixed_fee: Option<i64>,
}

impl BillingOverrides {
    pub fn is_empty(&self) -> bool {
        self.free_quota.is_none() && self.lead_price.is_none() && self.fixed_fee.is_none()
    }
}

/// Resolve the terms a seller is billed under: overrides, then the assigned
/// plan, then the role default, then FREE.
pub fn effective_terms(
    overrides: &BillingOverrides,
    assigned: Option<&PlanTerms>,
    role_default: Option<&PlanTerms>,
) -> PlanTerms {
    let base = assigned
        .or(role_default)
        .cloned()
        .unwrap_or_else(PlanTerms::free);
    PlanTerms {
        free_quota: overrides.free_quota.unwrap_or(base.free_quota),
        lead_price: overrides.lead_price.unwrap_or(base.lead_price),
        fixed_fee: overrides.fixed_fee.unwrap_or(base.fixed_fee),
        currency: base.currency,
    }
}

pub fn billable_leads(terms: &PlanTerms, leads: i64) -> i64 {
    (leads - i64::from(terms.free_quota)).max(0)
}

pub fn amount_due(terms: &PlanTerms, leads: i64) -> Result<i64, AppError> {
    billable_leads(terms, leads)
        .checked_mul(terms.lead_price)
        .and_then(|usage| usage.checked_add(terms.fixed_fee))
        .ok_or_else(|| AppError::BadRequest("Amount due is out of range".into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    None,
    Approaching,
    Reached,
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UsageWarning {
    pub level: WarningLevel,
    /// `leads / free_quota`; absent when the plan has no free quota.
    pub ratio: Option<f64>,
    pub leads: i64,
    pub free_quota: i32,
    pub remaining: i64,
}

pub fn usage_warning(leads: i64, free_quota: i32) -> UsageWarning {
    let quota = i64::from(free_quota);
    if quota <= 0 {
        return UsageWarning {
            level: WarningLevel::None,
            ratio: None,
            leads,
            free_quota,
            remaining: 0,
        };
    }

    let ratio = leads as f64 / quota as f64;
    let level = if leads > quota {
        WarningLevel::Exceeded
    } else if leads == quota {
        WarningLevel::Reached
    } else if ratio >= APPROACHING_RATIO {
        WarningLevel::Approaching
    } else {
        WarningLevel::None
    };

    UsageWarning {
        level,
        ratio: Some(ratio),
        leads,
        free_quota,
        remaining: (quota - leads).max(0),
    }
}

/// The fields of a stored snapshot that revenue aggregation needs.
#[derive(Debug, Clone)]
pub struct SnapshotFigures {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub month: String,
    pub leads_count: i64,
    pub amount_due: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RevenueRow {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub months: i64,
    pub leads: i64,
    pub amount_due: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RevenueReport {
    pub rows: Vec<RevenueRow>,
    pub total_leads: i64,
    pub total_amount_due: i64,
}

pub fn aggregate_revenue(snapshots: &[SnapshotFigures]) -> RevenueReport {
    let mut grouped: HashMap<(String, Uuid), RevenueRow> = HashMap::new();
    for snap in snapshots {
        let row = grouped
            .entry((snap.entity_type.clone(), snap.entity_id))
            .or_insert_with(|| RevenueRow {
                entity_type: snap.entity_type.clone(),
                entity_id: snap.entity_id,
                months: 0,
                leads: 0,
                amount_due: 0,
                currency: snap.currency.clone(),
            });
        row.months += 1;
        row.leads += snap.leads_count;
        row.amount_due = row.amount_due.saturating_add(snap.amount_due);
    }

    let mut rows: Vec<RevenueRow> = grouped.into_values().collect();
    rows.sort_by(|a, b| {
        b.amount_due
            .cmp(&a.amount_due)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let total_leads = rows.iter().map(|r| r.leads).sum();
    let total_amount_due = rows
        .iter()
        .fold(0_i64, |total, r| total.saturating_add(r.amount_due));
    RevenueReport {
        rows,
        total_leads,
        total_amount_due,
    }
}

pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Half-open UTC range `[start, end)` covering the month.
pub fn month_bounds(month: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid month {month}, expected YYYY-MM"));
    let (year, mon) = month.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || mon.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let mon: u32 = mon.parse().map_err(|_| invalid())?;

    let start = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)
    }
    .ok_or_else(invalid)?;

    let to_utc = |d: NaiveDate| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap_or_default());
    Ok((to_utc(start), to_utc(end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds("2025-12").unwrap();
        assert_eq!(start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn malformed_months_are_rejected() {
        for bad in ["2025", "2025-13", "25-01", "2025-1", "abcd-ef", ""] {
            assert!(month_bounds(bad).is_err(), "{bad} should be rejected");
        }
    }
}
