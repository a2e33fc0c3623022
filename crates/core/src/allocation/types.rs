//! Allocation rule types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, AllocationRuleId, CompanyId};

/// How an allocation rule splits an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMethod {
    /// Destinations receive a percentage of the input.
    Percentage,
    /// Destinations receive fixed amounts that must sum to the input.
    Fixed,
}

/// A single allocation destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationDestination {
    /// Account receiving the slice.
    pub account_id: AccountId,
    /// Percentage of the input (Percentage method).
    pub percentage: Option<Decimal>,
    /// Fixed amount (Fixed method).
    pub fixed_amount: Option<Decimal>,
    /// Application order; also decides which destination absorbs residue.
    pub sequence: u32,
    /// Inactive destinations are skipped.
    pub is_active: bool,
}

/// A deterministic rule splitting an amount across destination accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRule {
    /// Unique identifier.
    pub id: AllocationRuleId,
    /// Company this rule belongs to.
    pub company_id: CompanyId,
    /// Rule name, unique per company.
    pub name: String,
    /// Split method.
    pub method: AllocationMethod,
    /// Destinations, kept sorted by sequence.
    pub destinations: Vec<AllocationDestination>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AllocationRule {
    /// Active destinations in sequence order.
    #[must_use]
    pub fn active_destinations(&self) -> Vec<&AllocationDestination> {
        let mut active: Vec<&AllocationDestination> =
            self.destinations.iter().filter(|d| d.is_active).collect();
        active.sort_by_key(|d| d.sequence);
        active
    }
}

/// One slice of an applied allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSlice {
    /// Destination account.
    pub account_id: AccountId,
    /// Amount allocated to the account.
    pub amount: Decimal,
}

/// Input for creating an allocation rule.
#[derive(Debug, Clone)]
pub struct CreateRuleInput {
    /// Company the rule belongs to.
    pub company_id: CompanyId,
    /// Rule name, unique per company.
    pub name: String,
    /// Split method.
    pub method: AllocationMethod,
    /// Destinations.
    pub destinations: Vec<AllocationDestination>,
}

/// Patch for updating an allocation rule.
#[derive(Debug, Clone, Default)]
pub struct UpdateRulePatch {
    /// New name.
    pub name: Option<String>,
    /// New method.
    pub method: Option<AllocationMethod>,
    /// Replacement destinations.
    pub destinations: Option<Vec<AllocationDestination>>,
}
