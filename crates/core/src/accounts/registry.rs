//! Account registry service.
//!
//! Owns the chart of accounts: creation, updates, soft deletion, the
//! hierarchy tree, and balance queries over posted activity.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CompanyId, PageRequest, PageResponse};
use tally_shared::{Clock, LedgerConfig};

use super::error::AccountError;
use super::types::{
    Account, AccountFilter, AccountNode, AccountStatus, BalanceReport, CreateAccountInput,
    UpdateAccountPatch,
};
use crate::store::{LedgerState, LedgerStore};

/// Service for chart of accounts operations.
#[derive(Clone)]
pub struct AccountRegistry {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl AccountRegistry {
    /// Creates a new registry over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    /// Creates an account.
    ///
    /// The code is uppercased and must be unique among the company's
    /// non-archived accounts. A parent, when given, must share the
    /// company and classification; creating a child marks the parent
    /// as non-leaf.
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account, AccountError> {
        let code = normalize_code(&input.code)?;
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;

        if state.account_codes.contains_key(&(input.company_id, code.clone())) {
            return Err(AccountError::CodeInUse(code));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = state
                .accounts
                .get(&parent_id)
                .filter(|p| p.status != AccountStatus::Archived)
                .ok_or(AccountError::ParentNotFound(parent_id))?;
            if parent.company_id != input.company_id {
                return Err(AccountError::ParentCompanyMismatch(parent_id));
            }
            if parent.classification != input.classification {
                return Err(AccountError::ParentClassificationMismatch(parent_id));
            }
        }

        let account = Account {
            id: AccountId::new(),
            company_id: input.company_id,
            code: code.clone(),
            name: input.name,
            description: input.description,
            classification: input.classification,
            subtype: input.subtype,
            parent_id: input.parent_id,
            status: AccountStatus::Active,
            is_system: input.is_system,
            is_tax_related: input.is_tax_related,
            is_reconcilable: input.is_reconcilable,
            currency: input.currency,
            opening_balance: input.opening_balance,
            opening_balance_date: input.opening_balance_date,
            has_children: false,
            created_at: now,
            updated_at: now,
        };

        if let Some(parent_id) = input.parent_id
            && let Some(parent) = state.accounts.get_mut(&parent_id)
        {
            parent.has_children = true;
        }

        state
            .account_codes
            .insert((input.company_id, code), account.id);
        state.accounts.insert(account.id, account.clone());

        tracing::debug!(account = %account.id, code = %account.code, "account created");
        Ok(account)
    }

    /// Fetches an account by id.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AccountError> {
        let state = self.store.read().await;
        state
            .accounts
            .get(&id)
            .cloned()
            .ok_or(AccountError::NotFound(id))
    }

    /// Updates an account.
    ///
    /// Classification, subtype, and the reconcilable flag freeze once any
    /// posted line references the account; system accounts can never be
    /// retyped. Parent changes walk ancestor links and reject cycles.
    pub async fn update_account(
        &self,
        id: AccountId,
        patch: UpdateAccountPatch,
    ) -> Result<Account, AccountError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;

        let current = state
            .accounts
            .get(&id)
            .filter(|a| a.status != AccountStatus::Archived)
            .cloned()
            .ok_or(AccountError::NotFound(id))?;

        // Archiving through a patch goes through the same gates as delete.
        if patch.status == Some(AccountStatus::Archived) {
            drop(state);
            self.delete_account(id).await?;
            return self.get_account(id).await;
        }

        let has_posted = state.account_has_posted_lines(id);

        let retyping = patch.classification.is_some_and(|c| c != current.classification);
        let resubtyping = patch
            .subtype
            .as_ref()
            .is_some_and(|s| *s != current.subtype);
        let reflagging = patch
            .is_reconcilable
            .is_some_and(|r| r != current.is_reconcilable);

        if (retyping || resubtyping || reflagging) && has_posted {
            return Err(AccountError::ProtectedFieldChange(id));
        }
        if retyping && current.is_system {
            return Err(AccountError::SystemAccountProtected(id));
        }

        let classification = patch.classification.unwrap_or(current.classification);

        // The hierarchy invariant: parent and child share classification.
        if retyping {
            if let Some(parent_id) = current.parent_id
                && state
                    .accounts
                    .get(&parent_id)
                    .is_some_and(|p| p.classification != classification)
            {
                return Err(AccountError::ParentClassificationMismatch(parent_id));
            }
            if state
                .child_accounts(id)
                .iter()
                .any(|c| c.classification != classification)
            {
                return Err(AccountError::ProtectedFieldChange(id));
            }
        }

        let new_parent = match patch.parent_id {
            None => current.parent_id,
            Some(None) => None,
            Some(Some(parent_id)) => {
                let parent = state
                    .accounts
                    .get(&parent_id)
                    .filter(|p| p.status != AccountStatus::Archived)
                    .ok_or(AccountError::ParentNotFound(parent_id))?;
                if parent.company_id != current.company_id {
                    return Err(AccountError::ParentCompanyMismatch(parent_id));
                }
                if parent.classification != classification {
                    return Err(AccountError::ParentClassificationMismatch(parent_id));
                }
                if state.is_ancestor_or_self(id, parent_id) {
                    return Err(AccountError::HierarchyCycle(id, parent_id));
                }
                Some(parent_id)
            }
        };

        let new_code = match &patch.code {
            None => current.code.clone(),
            Some(code) => {
                let code = normalize_code(code)?;
                if code != current.code
                    && state
                        .account_codes
                        .contains_key(&(current.company_id, code.clone()))
                {
                    return Err(AccountError::CodeInUse(code));
                }
                code
            }
        };

        // All checks passed; apply the patch.
        if new_code != current.code {
            state.account_codes.remove(&(current.company_id, current.code.clone()));
            state
                .account_codes
                .insert((current.company_id, new_code.clone()), id);
        }

        let old_parent = current.parent_id;
        if old_parent != new_parent {
            if let Some(old) = old_parent {
                let still_parent = state
                    .accounts
                    .values()
                    .any(|a| a.id != id && a.parent_id == Some(old) && a.status != AccountStatus::Archived);
                if let Some(parent) = state.accounts.get_mut(&old) {
                    parent.has_children = still_parent;
                }
            }
            if let Some(new) = new_parent
                && let Some(parent) = state.accounts.get_mut(&new)
            {
                parent.has_children = true;
            }
        }

        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(AccountError::NotFound(id))?;
        account.code = new_code;
        account.classification = classification;
        account.parent_id = new_parent;
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(description) = patch.description {
            account.description = description;
        }
        if let Some(subtype) = patch.subtype {
            account.subtype = subtype;
        }
        if let Some(status) = patch.status {
            account.status = status;
        }
        if let Some(is_tax_related) = patch.is_tax_related {
            account.is_tax_related = is_tax_related;
        }
        if let Some(is_reconcilable) = patch.is_reconcilable {
            account.is_reconcilable = is_reconcilable;
        }
        if let Some(currency) = patch.currency {
            account.currency = currency;
        }
        if let Some(opening_balance) = patch.opening_balance {
            account.opening_balance = opening_balance;
        }
        if let Some(opening_balance_date) = patch.opening_balance_date {
            account.opening_balance_date = opening_balance_date;
        }
        account.updated_at = now;

        Ok(account.clone())
    }

    /// Soft-deletes an account.
    ///
    /// Gated on: not a system account, no non-archived children, and no
    /// posted journal lines. The archived account keeps its code but
    /// frees it for reuse.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AccountError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;

        let account = state
            .accounts
            .get(&id)
            .filter(|a| a.status != AccountStatus::Archived)
            .cloned()
            .ok_or(AccountError::NotFound(id))?;

        if account.is_system {
            return Err(AccountError::SystemAccountProtected(id));
        }
        if state
            .child_accounts(id)
            .iter()
            .any(|c| c.status != AccountStatus::Archived)
        {
            return Err(AccountError::HasActiveChildren(id));
        }
        if state.account_has_posted_lines(id) {
            return Err(AccountError::HasPostedLines(id));
        }

        state
            .account_codes
            .remove(&(account.company_id, account.code.clone()));
        if let Some(entry) = state.accounts.get_mut(&id) {
            entry.status = AccountStatus::Archived;
            entry.updated_at = now;
        }

        if let Some(parent_id) = account.parent_id {
            let still_parent = state
                .accounts
                .values()
                .any(|a| a.parent_id == Some(parent_id) && a.status != AccountStatus::Archived);
            if let Some(parent) = state.accounts.get_mut(&parent_id) {
                parent.has_children = still_parent;
            }
        }

        tracing::debug!(account = %id, "account archived");
        Ok(())
    }

    /// Lists accounts matching the filter, ordered by code.
    pub async fn list_accounts(
        &self,
        company_id: CompanyId,
        filter: AccountFilter,
        page: PageRequest,
    ) -> PageResponse<Account> {
        let state = self.store.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.company_id == company_id)
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| filter.classification.is_none_or(|c| a.classification == c))
            .filter(|a| {
                filter
                    .parent_id
                    .as_ref()
                    .is_none_or(|p| a.parent_id == *p)
            })
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let total = accounts.len() as u64;
        let data: Vec<Account> = accounts
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        PageResponse::new(data, page.page, page.per_page, total)
    }

    /// Builds the account hierarchy tree for a company.
    ///
    /// Archived accounts are excluded; siblings are ordered by code.
    pub async fn get_hierarchy(&self, company_id: CompanyId) -> Vec<AccountNode> {
        let state = self.store.read().await;
        let mut roots: Vec<&Account> = state
            .accounts
            .values()
            .filter(|a| {
                a.company_id == company_id
                    && a.parent_id.is_none()
                    && a.status != AccountStatus::Archived
            })
            .collect();
        roots.sort_by(|a, b| a.code.cmp(&b.code));
        roots
            .into_iter()
            .map(|root| build_node(&state, root))
            .collect()
    }

    /// Computes an account's balance from posted lines through `as_of`.
    ///
    /// The net balance is signed by the account's normal side; with
    /// `include_children`, descendants contribute under the same sign
    /// convention (hierarchy members share a classification).
    pub async fn get_balance(
        &self,
        id: AccountId,
        as_of: Option<NaiveDate>,
        include_children: bool,
    ) -> Result<BalanceReport, AccountError> {
        let state = self.store.read().await;
        let account = state.accounts.get(&id).ok_or(AccountError::NotFound(id))?;

        let targets: Vec<AccountId> = if include_children {
            state.account_with_descendants(id)
        } else {
            vec![id]
        };

        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        for (_, line) in state.posted_lines(account.company_id, None, as_of) {
            if targets.contains(&line.account_id) {
                debit_total += line.debit;
                credit_total += line.credit;
            }
        }

        let balance = account.normal_side().signed_delta(debit_total, credit_total);

        Ok(BalanceReport {
            account_id: id,
            code: account.code.clone(),
            as_of,
            include_children,
            debit_total,
            credit_total,
            balance,
        })
    }

    /// The configured base currency, used as the default for new accounts.
    #[must_use]
    pub fn base_currency(&self) -> tally_shared::types::CurrencyCode {
        self.config.base_currency.clone()
    }
}

fn build_node(state: &LedgerState, account: &Account) -> AccountNode {
    let mut children: Vec<&Account> = state
        .child_accounts(account.id)
        .into_iter()
        .filter(|c| c.status != AccountStatus::Archived)
        .collect();
    children.sort_by(|a, b| a.code.cmp(&b.code));
    AccountNode {
        account: account.clone(),
        children: children
            .into_iter()
            .map(|child| build_node(state, child))
            .collect(),
    }
}

/// Uppercases and validates an account code.
fn normalize_code(code: &str) -> Result<String, AccountError> {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return Err(AccountError::InvalidCode(code.to_string()));
    }
    Ok(normalized)
}
