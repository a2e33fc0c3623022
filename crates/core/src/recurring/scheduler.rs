//! Recurring journal scheduler.
//!
//! A cooperative task wakes on the caller's clock, selects Active
//! templates whose `next_run_date` has arrived, and submits generated
//! entries through the normal journal-store → posting-engine path. One
//! wake catches up every due occurrence in date order. Idempotence comes
//! from `(template, entry_date)` uniqueness: a crash between submitting a
//! generated entry and advancing the template re-enters here and advances
//! without re-submitting.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, TemplateId};
use tally_shared::{Clock, LedgerConfig};

use super::error::RecurringError;
use super::schedule::occurrence_date;
use super::types::{
    CreateTemplateInput, EndRule, RecurringTemplate, TemplateStatus, UpdateTemplatePatch,
};
use crate::journal::store::JournalStore;
use crate::journal::types::{CreateEntryInput, JournalEntry, LineInput};
use crate::posting::engine::PostingEngine;
use crate::store::LedgerStore;

/// Outcome of one scheduler pass over one template.
#[derive(Debug)]
pub struct RunOutcome {
    /// The template after the pass.
    pub template: RecurringTemplate,
    /// Entries posted during the pass, in occurrence order.
    pub posted: Vec<JournalEntry>,
}

/// Service owning recurring templates and their scheduled emission.
#[derive(Clone)]
pub struct RecurringScheduler {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
    journal: JournalStore,
    engine: PostingEngine,
}

impl RecurringScheduler {
    /// Creates a new scheduler over the shared store.
    #[must_use]
    pub fn new(
        store: Arc<LedgerStore>,
        config: Arc<LedgerConfig>,
        clock: Arc<dyn Clock>,
        journal: JournalStore,
        engine: PostingEngine,
    ) -> Self {
        Self {
            store,
            config,
            clock,
            journal,
            engine,
        }
    }

    /// How often the cooperative task should wake.
    #[must_use]
    pub fn wake_interval(&self) -> std::time::Duration {
        self.config.recurring_scheduler_interval
    }

    /// Creates a template.
    ///
    /// The blueprint must balance exactly and the name must be unique per
    /// company. `next_run_date` starts at the start date.
    pub async fn create_template(
        &self,
        input: CreateTemplateInput,
    ) -> Result<RecurringTemplate, RecurringError> {
        if input.interval == 0 {
            return Err(RecurringError::InvalidInterval);
        }
        if input.lines.len() < 2 {
            return Err(RecurringError::InsufficientLines);
        }
        let debit: Decimal = input.lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = input.lines.iter().map(|l| l.credit).sum();
        if (debit - credit).abs() > self.config.monetary_epsilon {
            return Err(RecurringError::UnbalancedTemplate { debit, credit });
        }
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;
        if state
            .templates
            .values()
            .any(|t| t.company_id == input.company_id && t.name == input.name)
        {
            return Err(RecurringError::NameInUse(input.name));
        }

        let template = RecurringTemplate {
            id: TemplateId::new(),
            company_id: input.company_id,
            name: input.name,
            frequency: input.frequency,
            interval: input.interval,
            start_date: input.start_date,
            end_rule: input.end_rule,
            status: TemplateStatus::Active,
            lines: input.lines,
            currency: input.currency,
            next_run_date: input.start_date,
            last_run_date: None,
            occurrence_count: 0,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        state.templates.insert(template.id, template.clone());

        tracing::debug!(template = %template.name, "recurring template created");
        Ok(template)
    }

    /// Updates a template's cadence or blueprint.
    ///
    /// Terminal templates reject updates. Changing frequency or interval
    /// re-derives `next_run_date` from the occurrences already emitted.
    pub async fn update_template(
        &self,
        id: TemplateId,
        patch: UpdateTemplatePatch,
    ) -> Result<RecurringTemplate, RecurringError> {
        if let Some(0) = patch.interval {
            return Err(RecurringError::InvalidInterval);
        }
        if let Some(lines) = &patch.lines {
            if lines.len() < 2 {
                return Err(RecurringError::InsufficientLines);
            }
            let debit: Decimal = lines.iter().map(|l| l.debit).sum();
            let credit: Decimal = lines.iter().map(|l| l.credit).sum();
            if (debit - credit).abs() > self.config.monetary_epsilon {
                return Err(RecurringError::UnbalancedTemplate { debit, credit });
            }
        }
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;

        let company_id = state
            .templates
            .get(&id)
            .map(|t| t.company_id)
            .ok_or(RecurringError::NotFound(id))?;
        if let Some(name) = &patch.name
            && state
                .templates
                .values()
                .any(|t| t.id != id && t.company_id == company_id && t.name == *name)
        {
            return Err(RecurringError::NameInUse(name.clone()));
        }

        let template = state
            .templates
            .get_mut(&id)
            .ok_or(RecurringError::NotFound(id))?;
        if matches!(
            template.status,
            TemplateStatus::Completed | TemplateStatus::Cancelled
        ) {
            return Err(RecurringError::InvalidStatus(template.status));
        }

        let cadence_changed = patch.frequency.is_some() || patch.interval.is_some();
        if let Some(name) = patch.name {
            template.name = name;
        }
        if let Some(frequency) = patch.frequency {
            template.frequency = frequency;
        }
        if let Some(interval) = patch.interval {
            template.interval = interval;
        }
        if let Some(end_rule) = patch.end_rule {
            template.end_rule = end_rule;
        }
        if let Some(lines) = patch.lines {
            template.lines = lines;
        }
        if cadence_changed {
            template.next_run_date = occurrence_date(
                template.start_date,
                template.frequency,
                template.interval,
                template.occurrence_count,
            );
        }
        template.updated_at = now;

        Ok(template.clone())
    }

    /// Pauses an Active template.
    pub async fn pause(&self, id: TemplateId) -> Result<RecurringTemplate, RecurringError> {
        self.set_status(id, TemplateStatus::Active, TemplateStatus::Paused)
            .await
    }

    /// Resumes a Paused template.
    pub async fn resume(&self, id: TemplateId) -> Result<RecurringTemplate, RecurringError> {
        self.set_status(id, TemplateStatus::Paused, TemplateStatus::Active)
            .await
    }

    /// Cancels a template. Terminal.
    pub async fn cancel(&self, id: TemplateId) -> Result<RecurringTemplate, RecurringError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;
        let template = state
            .templates
            .get_mut(&id)
            .ok_or(RecurringError::NotFound(id))?;
        if matches!(
            template.status,
            TemplateStatus::Completed | TemplateStatus::Cancelled
        ) {
            return Err(RecurringError::InvalidStatus(template.status));
        }
        template.status = TemplateStatus::Cancelled;
        template.updated_at = now;
        Ok(template.clone())
    }

    /// Fetches a template by id.
    pub async fn get_template(&self, id: TemplateId) -> Result<RecurringTemplate, RecurringError> {
        let state = self.store.read().await;
        state
            .templates
            .get(&id)
            .cloned()
            .ok_or(RecurringError::NotFound(id))
    }

    /// Templates due as of today, ordered by next-run date.
    pub async fn list_due(&self, company_id: CompanyId) -> Vec<RecurringTemplate> {
        let today = self.clock.today_in(self.config.time_zone);
        let state = self.store.read().await;
        let mut due: Vec<RecurringTemplate> = state
            .templates
            .values()
            .filter(|t| t.company_id == company_id && t.is_due(today))
            .cloned()
            .collect();
        due.sort_by_key(|t| t.next_run_date);
        due
    }

    /// One scheduler pass over every due template of a company.
    ///
    /// Templates are independent and restartable: a failure in one is
    /// reported and does not stop the others.
    pub async fn run_due(
        &self,
        company_id: CompanyId,
    ) -> Vec<(TemplateId, Result<RunOutcome, RecurringError>)> {
        let due = self.list_due(company_id).await;
        let mut results = Vec::with_capacity(due.len());
        for template in due {
            let outcome = self.run_once(template.id).await;
            results.push((template.id, outcome));
        }
        results
    }

    /// Processes one template, catching up every due occurrence.
    ///
    /// Per occurrence: skip if `(template, date)` was already generated,
    /// otherwise build the entry from the blueprint, submit it through the
    /// normal journal path, approve it as the template owner, and post it.
    /// The template advances only after the occurrence is handled, so a
    /// re-run after a crash cannot duplicate an entry.
    pub async fn run_once(&self, id: TemplateId) -> Result<RunOutcome, RecurringError> {
        let today = self.clock.today_in(self.config.time_zone);
        let mut posted = Vec::new();

        loop {
            let template = self.get_template(id).await?;
            if !template.is_due(today) {
                return Ok(RunOutcome { template, posted });
            }
            let due_date = template.next_run_date;

            let already_generated = {
                let state = self.store.read().await;
                state.generated_occurrences.contains(&(id, due_date))
            };

            if !already_generated {
                let entry = self.emit_occurrence(&template, due_date).await?;
                posted.push(entry);
            } else {
                tracing::debug!(
                    template = %template.name,
                    date = %due_date,
                    "occurrence already generated, advancing"
                );
            }

            self.advance(id, due_date).await?;
        }
    }

    /// Builds, submits, approves, and posts the entry for one occurrence.
    async fn emit_occurrence(
        &self,
        template: &RecurringTemplate,
        due_date: NaiveDate,
    ) -> Result<JournalEntry, RecurringError> {
        let lines: Vec<LineInput> = template
            .lines
            .iter()
            .map(|line| LineInput {
                account_id: line.account_id,
                description: line.description.clone(),
                reference: None,
                tracking_category_id: None,
                debit: line.debit,
                credit: line.credit,
                currency: template.currency.clone(),
                exchange_rate: None,
            })
            .collect();

        let entry = self
            .journal
            .create_entry(CreateEntryInput {
                company_id: template.company_id,
                entry_date: due_date,
                reference: Some(format!("Recurring: {} - {}", template.name, due_date)),
                memo: None,
                currency: template.currency.clone(),
                exchange_rate: None,
                is_adjusting: false,
                lines,
                created_by: template.created_by,
            })
            .await?;

        {
            let mut state = self.store.write().await;
            state.generated_occurrences.insert((template.id, due_date));
        }

        self.journal.submit_for_approval(entry.id).await?;
        self.journal.approve(entry.id, template.created_by).await?;
        let posted = self.engine.post(entry.id, template.created_by).await?;

        tracing::info!(
            template = %template.name,
            entry = %posted.entry_number,
            date = %due_date,
            "recurring entry posted"
        );
        Ok(posted)
    }

    /// Counts the occurrence and computes the next run date, transitioning
    /// to Completed when the end rule is reached.
    async fn advance(&self, id: TemplateId, due_date: NaiveDate) -> Result<(), RecurringError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;
        let template = state
            .templates
            .get_mut(&id)
            .ok_or(RecurringError::NotFound(id))?;

        template.occurrence_count += 1;
        template.last_run_date = Some(due_date);
        template.next_run_date = occurrence_date(
            template.start_date,
            template.frequency,
            template.interval,
            template.occurrence_count,
        );
        template.updated_at = now;

        let completed = match template.end_rule {
            EndRule::Never => false,
            EndRule::AfterOccurrences(n) => template.occurrence_count >= n,
            EndRule::OnDate(end) => template.next_run_date > end,
        };
        if completed {
            template.status = TemplateStatus::Completed;
            tracing::info!(template = %template.name, "recurring template completed");
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: TemplateId,
        from: TemplateStatus,
        to: TemplateStatus,
    ) -> Result<RecurringTemplate, RecurringError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;
        let template = state
            .templates
            .get_mut(&id)
            .ok_or(RecurringError::NotFound(id))?;
        if template.status != from {
            return Err(RecurringError::InvalidStatus(template.status));
        }
        template.status = to;
        template.updated_at = now;
        Ok(template.clone())
    }
}
