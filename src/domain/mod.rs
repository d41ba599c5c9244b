//! Roles, statuses and the pure business rules of the marketplace.
//!
//! Everything under this module is free of I/O so services and tests can use
//! it directly.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

pub mod billing;
pub mod catalog;
pub mod listing;
pub mod promotions;
pub mod search;

/// Parse a stored or submitted enum value, rejecting unknown strings.
pub fn parse_enum<T: FromStr>(value: &str, what: &str) -> Result<T, AppError> {
    T::from_str(value.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {what}: {value}")))
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Yard,
    Agent,
    Private,
    Customer,
}

impl Role {
    /// Roles that own listings, receive leads and are billed.
    pub fn is_seller(self) -> bool {
        matches!(self, Role::Yard | Role::Agent | Role::Private)
    }

    pub fn can_self_register(self) -> bool {
        self != Role::Admin
    }

    pub fn sellers() -> [Role; 3] {
        [Role::Yard, Role::Agent, Role::Private]
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    InProgress,
    Closed,
    Lost,
}

impl LeadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LeadStatus::Closed | LeadStatus::Lost)
    }

    pub fn can_transition_to(self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        matches!(
            (self, next),
            (New, InProgress) | (New, Closed) | (New, Lost) | (InProgress, Closed) | (InProgress, Lost)
        )
    }

    /// Options a status dropdown should offer from the current state.
    pub fn next_options(self) -> Vec<LeadStatus> {
        use strum::IntoEnumIterator;
        LeadStatus::iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadSource {
    WebForm,
    Phone,
    Whatsapp,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CarStatus {
    Active,
    Paused,
    Sold,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionOrderStatus {
    Draft,
    Paid,
    Cancelled,
}

impl PromotionOrderStatus {
    pub fn can_transition_to(self, next: PromotionOrderStatus) -> bool {
        use PromotionOrderStatus::*;
        matches!((self, next), (Draft, Paid) | (Draft, Cancelled))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionKind {
    Boost,
    Highlight,
    ExposurePlus,
    BrandPage,
}

impl PromotionKind {
    /// Whether the promotion is applied to a single listing rather than the seller.
    pub fn is_car_scoped(self) -> bool {
        self != PromotionKind::BrandPage
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportJobStatus {
    Uploaded,
    Processing,
    PreviewReady,
    Committing,
    Committed,
    Failed,
}

impl ImportJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportJobStatus::Committed | ImportJobStatus::Failed)
    }

    pub fn can_transition_to(self, next: ImportJobStatus) -> bool {
        use ImportJobStatus::*;
        matches!(
            (self, next),
            (Uploaded, Processing)
                | (Processing, PreviewReady)
                | (Processing, Failed)
                | (PreviewReady, Committing)
                | (Committing, Committed)
                | (Committing, Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_their_stored_form() {
        assert_eq!(Role::Yard.to_string(), "YARD");
        assert_eq!(parse_enum::<Role>("PRIVATE", "role").unwrap(), Role::Private);
        assert!(parse_enum::<Role>("dealer", "role").is_err());
    }

    #[test]
    fn only_seller_roles_are_billed() {
        assert!(Role::Yard.is_seller());
        assert!(Role::Agent.is_seller());
        assert!(Role::Private.is_seller());
        assert!(!Role::Customer.is_seller());
        assert!(!Role::Admin.is_seller());
        assert!(!Role::Admin.can_self_register());
    }

    #[test]
    fn lead_dropdown_offers_only_valid_transitions() {
        assert_eq!(
            LeadStatus::New.next_options(),
            vec![LeadStatus::InProgress, LeadStatus::Closed, LeadStatus::Lost]
        );
        assert_eq!(
            LeadStatus::InProgress.next_options(),
            vec![LeadStatus::Closed, LeadStatus::Lost]
        );
        assert!(LeadStatus::Closed.next_options().is_empty());
        assert!(!LeadStatus::InProgress.can_transition_to(LeadStatus::New));
        assert!(!LeadStatus::New.can_transition_to(LeadStatus::New));
    }

    #[test]
    fn import_job_moves_forward_only() {
        use ImportJobStatus::*;
        assert!(Uploaded.can_transition_to(Processing));
        assert!(PreviewReady.can_transition_to(Committing));
        assert!(!Uploaded.can_transition_to(Committing));
        assert!(!Committed.can_transition_to(Failed));
        assert!(Failed.is_terminal());
        assert_eq!(PreviewReady.to_string(), "PREVIEW_READY");
    }
}
