use chrono::{DateTime, Duration, Utc};

use super::PromotionKind;
use crate::error::AppError;

/// Largest quantity of one product on a single order line.
pub const MAX_LINE_QUANTITY: i32 = 52;

/// Kinds active at `now`, highest priority first.
pub fn badges(
    now: DateTime<Utc>,
    boost_until: Option<DateTime<Utc>>,
    highlight_until: Option<DateTime<Utc>>,
    exposure_until: Option<DateTime<Utc>>,
) -> Vec<PromotionKind> {
    let active = |until: Option<DateTime<Utc>>| until.is_some_and(|u| u > now);
    [
        (PromotionKind::ExposurePlus, exposure_until),
        (PromotionKind::Highlight, highlight_until),
        (PromotionKind::Boost, boost_until),
    ]
    .into_iter()
    .filter(|(_, until)| active(*until))
    .map(|(kind, _)| kind)
    .collect()
}

pub fn label(kind: PromotionKind) -> &'static str {
    match kind {
        PromotionKind::ExposurePlus => "Exposure+",
        PromotionKind::Highlight => "Highlighted",
        PromotionKind::Boost => "Boosted",
        PromotionKind::BrandPage => "Featured seller",
    }
}

pub fn primary_label(badges: &[PromotionKind]) -> Option<&'static str> {
    badges.first().copied().map(label)
}

/// New expiry when buying `days` more of a promotion. Time still left on an
/// active promotion is kept; an expired one restarts from `now`.
pub fn extend_until(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    days: i64,
) -> Result<DateTime<Utc>, AppError> {
    let from = current.filter(|c| *c > now).unwrap_or(now);
    Duration::try_days(days)
        .and_then(|delta| from.checked_add_signed(delta))
        .ok_or_else(|| AppError::BadRequest("Promotion period is out of range".into()))
}
