use std::sync::Arc;

use super::config::LiveMode;
use super::controller::{
    FieldKey, FormController, FormState, SubmitHandler, read_lock, write_lock,
};
use super::error::FormResult;
use super::observer::FormEvent;
use super::registry::FieldRegistry;
use super::status::ValidationStatus;

/// Aggregate validity of a form at one point in time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormVerdict {
    Valid,
    /// Some binding has not settled yet.
    Undecided,
    /// The first field, in registration order, with an invalid binding.
    Invalid(FieldKey),
}

impl FormVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, FormVerdict::Valid)
    }
}

fn verdict_of(registry: &FieldRegistry) -> FormVerdict {
    for field in registry.iter() {
        for unit in field.active_units() {
            for binding in &field.bindings {
                let status = binding.slots[unit].status();
                if status == ValidationStatus::Invalid {
                    return FormVerdict::Invalid(field.key.clone());
                }
                if status.is_undecided() {
                    return FormVerdict::Undecided;
                }
            }
        }
    }
    FormVerdict::Valid
}

impl FormState {
    pub(super) fn aggregate(&mut self) -> FormVerdict {
        let verdict = verdict_of(&self.registry);
        self.first_invalid = match &verdict {
            FormVerdict::Invalid(field) => Some(field.clone()),
            FormVerdict::Valid | FormVerdict::Undecided => None,
        };
        verdict
    }
}

impl FormController {
    /// Installs the handler run once per successful submit request.
    pub fn on_submit<F>(&self, handler: F) -> FormResult<()>
    where
        F: Fn(&FormController) + Send + Sync + 'static,
    {
        let handler: SubmitHandler = Arc::new(handler);
        *write_lock(&self.submit_handler, "installing submit handler")? = Some(handler);
        Ok(())
    }

    /// Records a submit request and validates every field.
    ///
    /// The handler fires as soon as the form is valid, either right away or
    /// when the last pending check settles. Any value change withdraws the
    /// request.
    pub fn request_submit(&self) -> FormResult<()> {
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "requesting submit")?;
            state.submit_requested = true;
            if state.live == LiveMode::Submitted {
                state.live = LiveMode::Enabled;
                tracing::debug!("live validation enabled after first submit request");
            }
            state.refresh_gate(&mut events);
        }
        self.dispatch(events)?;
        self.validate_form()
    }

    pub fn verdict(&self) -> FormResult<FormVerdict> {
        Ok(write_lock(&self.state, "aggregating form validity")?.aggregate())
    }

    pub fn is_form_valid(&self) -> FormResult<bool> {
        Ok(self.verdict()?.is_valid())
    }

    /// Field recorded by the most recent aggregation as the first invalid one.
    pub fn first_invalid_field(&self) -> FormResult<Option<FieldKey>> {
        Ok(read_lock(&self.state, "reading first invalid field")?
            .first_invalid
            .clone())
    }

    pub fn is_submit_requested(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submit request")?.submit_requested)
    }

    pub fn is_submit_allowed(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submit gate")?.submit_allowed)
    }

    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(read_lock(&self.state, "reading submit count")?.submit_count)
    }

    /// Fires the submit handler if a request is standing and the form is
    /// valid, or moves focus to the first invalid field.
    ///
    /// The request flag is cleared under the lock before the handler runs, so
    /// concurrent settlements fire it at most once.
    pub(super) fn service_submit(&self) -> FormResult<()> {
        let mut events = Vec::new();
        let fire = {
            let mut state = write_lock(&self.state, "servicing submit request")?;
            if !state.submit_requested {
                return Ok(());
            }
            match state.aggregate() {
                FormVerdict::Valid => {
                    state.submit_requested = false;
                    state.submit_count += 1;
                    true
                }
                FormVerdict::Invalid(field) => {
                    tracing::debug!(field = %field, "submit blocked by invalid field");
                    events.push(FormEvent::Focus(Some(field)));
                    false
                }
                FormVerdict::Undecided => false,
            }
        };
        self.dispatch(events)?;
        if fire {
            self.fire_submit()?;
        }
        Ok(())
    }

    fn fire_submit(&self) -> FormResult<()> {
        let handler = read_lock(&self.submit_handler, "reading submit handler")?.clone();
        match handler {
            Some(handler) => {
                tracing::info!("form valid, running submit handler");
                handler(self);
            }
            None => tracing::info!("form valid, no submit handler installed"),
        }
        Ok(())
    }
}
