//! Allocation engine.
//!
//! Applies deterministic split rules: Percentage rules round each slice
//! half-to-even (or half-up, per configuration) and let the last active
//! destination absorb the residual so the slices sum to the input
//! exactly; Fixed rules pay out stated amounts and fail when they do not
//! cover the input.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::LedgerConfig;
use tally_shared::types::{AllocationRuleId, CompanyId};
use tally_shared::{Clock, types::money::round_display};

use super::error::AllocationError;
use super::types::{
    AllocationDestination, AllocationMethod, AllocationRule, AllocationSlice, CreateRuleInput,
    UpdateRulePatch,
};
use crate::store::LedgerStore;

/// Half of the display unit; the tolerance for percentage sums.
const PERCENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Service owning allocation rules and their application.
#[derive(Clone)]
pub struct AllocationService {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl AllocationService {
    /// Creates a new allocation service over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    /// Creates an allocation rule after validating its destinations.
    pub async fn create_rule(&self, input: CreateRuleInput) -> Result<AllocationRule, AllocationError> {
        validate_destinations(input.method, &input.destinations)?;
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;
        if state
            .rules
            .values()
            .any(|r| r.company_id == input.company_id && r.name == input.name)
        {
            return Err(AllocationError::NameInUse(input.name));
        }

        let mut destinations = input.destinations;
        destinations.sort_by_key(|d| d.sequence);
        let rule = AllocationRule {
            id: AllocationRuleId::new(),
            company_id: input.company_id,
            name: input.name,
            method: input.method,
            destinations,
            created_at: now,
            updated_at: now,
        };
        state.rules.insert(rule.id, rule.clone());

        tracing::debug!(rule = %rule.name, "allocation rule created");
        Ok(rule)
    }

    /// Updates an allocation rule, revalidating the result.
    pub async fn update_rule(
        &self,
        id: AllocationRuleId,
        patch: UpdateRulePatch,
    ) -> Result<AllocationRule, AllocationError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;

        let current = state
            .rules
            .get(&id)
            .cloned()
            .ok_or(AllocationError::NotFound(id))?;

        if let Some(name) = &patch.name
            && state
                .rules
                .values()
                .any(|r| r.id != id && r.company_id == current.company_id && r.name == *name)
        {
            return Err(AllocationError::NameInUse(name.clone()));
        }

        let method = patch.method.unwrap_or(current.method);
        let mut destinations = patch.destinations.unwrap_or(current.destinations);
        validate_destinations(method, &destinations)?;
        destinations.sort_by_key(|d| d.sequence);

        let rule = state.rules.get_mut(&id).ok_or(AllocationError::NotFound(id))?;
        if let Some(name) = patch.name {
            rule.name = name;
        }
        rule.method = method;
        rule.destinations = destinations;
        rule.updated_at = now;

        Ok(rule.clone())
    }

    /// Fetches a rule by id.
    pub async fn get_rule(&self, id: AllocationRuleId) -> Result<AllocationRule, AllocationError> {
        let state = self.store.read().await;
        state
            .rules
            .get(&id)
            .cloned()
            .ok_or(AllocationError::NotFound(id))
    }

    /// Lists a company's rules ordered by name.
    pub async fn list_rules(&self, company_id: CompanyId) -> Vec<AllocationRule> {
        let state = self.store.read().await;
        let mut rules: Vec<AllocationRule> = state
            .rules
            .values()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        rules
    }

    /// Applies a rule to an amount.
    ///
    /// The returned slices always sum to `amount` exactly: for Percentage
    /// rules the last active destination absorbs any rounding residual;
    /// for Fixed rules a sum that strays beyond the monetary epsilon fails
    /// with a mismatch, and any sub-epsilon residue lands on the last
    /// destination.
    pub async fn apply(
        &self,
        id: AllocationRuleId,
        amount: Decimal,
    ) -> Result<Vec<AllocationSlice>, AllocationError> {
        let rule = self.get_rule(id).await?;
        self.apply_rule(&rule, amount)
    }

    /// Applies an already-loaded rule to an amount.
    pub fn apply_rule(
        &self,
        rule: &AllocationRule,
        amount: Decimal,
    ) -> Result<Vec<AllocationSlice>, AllocationError> {
        let active = rule.active_destinations();
        if active.is_empty() {
            return Err(AllocationError::NoActiveDestinations);
        }

        match rule.method {
            AllocationMethod::Percentage => Ok(self.apply_percentage(&active, amount)),
            AllocationMethod::Fixed => self.apply_fixed(&active, amount),
        }
    }

    fn apply_percentage(
        &self,
        active: &[&AllocationDestination],
        amount: Decimal,
    ) -> Vec<AllocationSlice> {
        let hundred = Decimal::ONE_HUNDRED;
        let mut slices = Vec::with_capacity(active.len());
        let mut allocated = Decimal::ZERO;

        for destination in &active[..active.len() - 1] {
            let percent = destination.percentage.unwrap_or(Decimal::ZERO);
            let slice = round_display(amount * percent / hundred, self.config.rounding_mode);
            allocated += slice;
            slices.push(AllocationSlice {
                account_id: destination.account_id,
                amount: slice,
            });
        }

        // The last active destination absorbs the residual so the slices
        // conserve the input exactly.
        let last = active[active.len() - 1];
        slices.push(AllocationSlice {
            account_id: last.account_id,
            amount: amount - allocated,
        });
        slices
    }

    fn apply_fixed(
        &self,
        active: &[&AllocationDestination],
        amount: Decimal,
    ) -> Result<Vec<AllocationSlice>, AllocationError> {
        let total: Decimal = active
            .iter()
            .map(|d| d.fixed_amount.unwrap_or(Decimal::ZERO))
            .sum();
        if (total - amount).abs() > self.config.monetary_epsilon {
            return Err(AllocationError::Mismatch {
                expected: amount,
                actual: total,
            });
        }

        let mut slices: Vec<AllocationSlice> = active
            .iter()
            .map(|d| AllocationSlice {
                account_id: d.account_id,
                amount: d.fixed_amount.unwrap_or(Decimal::ZERO),
            })
            .collect();
        // Sub-epsilon residue lands on the last destination.
        let residue = amount - total;
        if !residue.is_zero()
            && let Some(last) = slices.last_mut()
        {
            last.amount += residue;
        }
        Ok(slices)
    }
}

/// Validates destinations for the given method.
fn validate_destinations(
    method: AllocationMethod,
    destinations: &[AllocationDestination],
) -> Result<(), AllocationError> {
    let active: Vec<(usize, &AllocationDestination)> = destinations
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_active)
        .collect();
    if active.is_empty() {
        return Err(AllocationError::NoActiveDestinations);
    }

    match method {
        AllocationMethod::Percentage => {
            let mut sum = Decimal::ZERO;
            for (index, destination) in &active {
                let percent = destination
                    .percentage
                    .ok_or(AllocationError::MissingDestinationAmount { index: *index })?;
                if percent <= Decimal::ZERO {
                    return Err(AllocationError::InvalidPercentages { sum: percent });
                }
                sum += percent;
            }
            if (sum - Decimal::ONE_HUNDRED).abs() > PERCENT_TOLERANCE {
                return Err(AllocationError::InvalidPercentages { sum });
            }
        }
        AllocationMethod::Fixed => {
            let mut sum = Decimal::ZERO;
            for (index, destination) in &active {
                let fixed = destination
                    .fixed_amount
                    .ok_or(AllocationError::MissingDestinationAmount { index: *index })?;
                if fixed < Decimal::ZERO {
                    return Err(AllocationError::InvalidFixedAmounts);
                }
                sum += fixed;
            }
            if sum <= Decimal::ZERO {
                return Err(AllocationError::InvalidFixedAmounts);
            }
        }
    }
    Ok(())
}
