use car_marketplace_api::domain::billing::{
    BillingOverrides, PlanTerms, SnapshotFigures, WarningLevel, aggregate_revenue, amount_due,
    effective_terms, usage_warning,
};
use car_marketplace_api::error::AppError;
use uuid::Uuid;

fn basic() -> PlanTerms {
    PlanTerms {
        free_quota: 30,
        lead_price: 1500,
        fixed_fee: 9900,
        currency: "ILS".into(),
    }
}

#[test]
fn leads_inside_the_quota_cost_only_the_fixed_fee() {
    let terms = basic();
    assert_eq!(amount_due(&terms, 0).unwrap(), 9900);
    assert_eq!(amount_due(&terms, 30).unwrap(), 9900);
    assert_eq!(amount_due(&terms, 31).unwrap(), 9900 + 1500);
    assert_eq!(amount_due(&terms, 40).unwrap(), 9900 + 10 * 1500);
}

#[test]
fn an_amount_beyond_range_is_an_error() {
    let terms = PlanTerms {
        free_quota: 0,
        lead_price: i64::MAX,
        fixed_fee: 0,
        currency: "ILS".into(),
    };
    assert_eq!(amount_due(&terms, 1).unwrap(), i64::MAX);
    assert!(matches!(amount_due(&terms, 2), Err(AppError::BadRequest(_))));

    let terms = PlanTerms {
        fixed_fee: i64::MAX,
        lead_price: 1,
        ..terms
    };
    assert!(amount_due(&terms, 1).is_err());
}

#[test]
fn overrides_win_field_by_field() {
    let assigned = basic();
    let role_default = PlanTerms {
        free_quota: 5,
        lead_price: 0,
        fixed_fee: 0,
        currency: "ILS".into(),
    };
    let overrides = BillingOverrides {
        free_quota: Some(100),
        lead_price: None,
        fixed_fee: Some(0),
    };

    let terms = effective_terms(&overrides, Some(&assigned), Some(&role_default));
    assert_eq!(terms.free_quota, 100);
    assert_eq!(terms.lead_price, 1500);
    assert_eq!(terms.fixed_fee, 0);
}

#[test]
fn role_default_then_free_when_nothing_is_assigned() {
    let role_default = basic();
    let none = BillingOverrides::default();

    assert_eq!(effective_terms(&none, None, Some(&role_default)), role_default);
    assert_eq!(effective_terms(&none, None, None), PlanTerms::free());
}

#[test]
fn warning_levels_follow_quota_usage() {
    assert_eq!(usage_warning(10, 30).level, WarningLevel::None);
    assert_eq!(usage_warning(24, 30).level, WarningLevel::Approaching);
    assert_eq!(usage_warning(30, 30).level, WarningLevel::Reached);

    let over = usage_warning(33, 30);
    assert_eq!(over.level, WarningLevel::Exceeded);
    assert_eq!(over.remaining, 0);

    let unlimited = usage_warning(500, 0);
    assert_eq!(unlimited.level, WarningLevel::None);
    assert_eq!(unlimited.ratio, None);
}

#[test]
fn revenue_groups_months_per_seller_and_ranks_by_amount() {
    let yard = Uuid::new_v4();
    let agent = Uuid::new_v4();
    let snap = |entity_type: &str, id: Uuid, month: &str, leads: i64, amount: i64| SnapshotFigures {
        entity_type: entity_type.into(),
        entity_id: id,
        month: month.into(),
        leads_count: leads,
        amount_due: amount,
        currency: "ILS".into(),
    };

    let report = aggregate_revenue(&[
        snap("AGENT", agent, "2025-01", 4, 1000),
        snap("YARD", yard, "2025-01", 40, 20000),
        snap("YARD", yard, "2025-02", 35, 15000),
    ]);

    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].entity_id, yard);
    assert_eq!(report.rows[0].months, 2);
    assert_eq!(report.rows[0].leads, 75);
    assert_eq!(report.rows[0].amount_due, 35000);
    assert_eq!(report.total_leads, 79);
    assert_eq!(report.total_amount_due, 36000);
}

#[test]
fn empty_range_has_zero_totals() {
    let report = aggregate_revenue(&[]);
    assert!(report.rows.is_empty());
    assert_eq!(report.total_amount_due, 0);
}
