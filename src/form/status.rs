use futures::future::AbortHandle;
use serde::{Deserialize, Serialize};

use super::error::{FormError, FormResult};
use super::task::{CheckId, RunningCheck};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    #[default]
    NotValidated,
    Validating,
    Valid,
    Invalid,
}

impl ValidationStatus {
    pub fn from_outcome(valid: bool) -> Self {
        if valid { Self::Valid } else { Self::Invalid }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, Self::Valid | Self::Invalid)
    }

    pub fn is_undecided(self) -> bool {
        matches!(self, Self::NotValidated | Self::Validating)
    }

    /// Folds the statuses of several bindings or elements into one.
    ///
    /// `Invalid` dominates, then `Validating`, then `NotValidated`; an empty
    /// input is `Valid`.
    pub fn combine(statuses: impl IntoIterator<Item = Self>) -> Self {
        statuses
            .into_iter()
            .max_by_key(|status| match status {
                Self::Valid => 0,
                Self::NotValidated => 1,
                Self::Validating => 2,
                Self::Invalid => 3,
            })
            .unwrap_or(Self::Valid)
    }
}

pub(crate) fn transition(current: ValidationStatus, next: ValidationStatus) -> FormResult<()> {
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (ValidationStatus::NotValidated, ValidationStatus::Validating)
            | (ValidationStatus::Validating, ValidationStatus::Valid)
            | (ValidationStatus::Validating, ValidationStatus::Invalid)
            | (_, ValidationStatus::NotValidated)
    );
    if !allowed {
        return Err(FormError::InvalidStatusTransition {
            from: current,
            to: next,
        });
    }
    Ok(())
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Settlement {
    Applied(ValidationStatus),
    Superseded,
}

/// Status of one validator on one validation unit of a field.
///
/// `running` is present exactly while the status is `Validating`.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    status: ValidationStatus,
    running: Option<RunningCheck>,
}

impl Slot {
    pub(crate) fn status(&self) -> ValidationStatus {
        self.status
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.running.as_ref().is_some_and(RunningCheck::is_async)
    }

    /// Cancels in-flight work and returns to `NotValidated`.
    pub(crate) fn reset(&mut self) -> bool {
        self.running = None;
        let changed = self.status != ValidationStatus::NotValidated;
        self.status = ValidationStatus::NotValidated;
        changed
    }

    /// Supersedes any running check and starts `id`, unless the slot has
    /// already settled.
    pub(crate) fn begin(&mut self, id: CheckId) -> FormResult<bool> {
        if let Some(previous) = self.running.take() {
            tracing::trace!(check = previous.id.0, "superseding running check");
        }
        if self.status.is_settled() {
            return Ok(false);
        }
        transition(self.status, ValidationStatus::Validating)?;
        self.status = ValidationStatus::Validating;
        self.running = Some(RunningCheck::new(id));
        Ok(true)
    }

    pub(crate) fn attach(&mut self, id: CheckId, handle: AbortHandle) -> bool {
        match self.running.as_mut() {
            Some(running) if running.id == id => {
                running.attach(handle);
                true
            }
            _ => {
                handle.abort();
                false
            }
        }
    }

    pub(crate) fn settle(&mut self, id: CheckId, valid: bool) -> FormResult<Settlement> {
        if self.running.as_ref().map(|running| running.id) != Some(id) {
            return Ok(Settlement::Superseded);
        }
        let next = ValidationStatus::from_outcome(valid);
        transition(self.status, next)?;
        self.running = None;
        self.status = next;
        Ok(Settlement::Applied(next))
    }

    /// Overrides the status from outside the slot's own check.
    pub(crate) fn force(&mut self, status: ValidationStatus) -> bool {
        self.running = None;
        let changed = self.status != status;
        self.status = status;
        changed
    }
}
