use super::config::{LiveMode, Trigger};
use super::controller::{FormController, read_lock, write_lock};
use super::error::{FormError, FormResult};
use super::registry::{Element, ElementKind};

impl FormController {
    pub fn live_mode(&self) -> FormResult<LiveMode> {
        Ok(read_lock(&self.state, "reading live mode")?.live)
    }

    pub fn set_live_mode(&self, mode: LiveMode) -> FormResult<()> {
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "changing live mode")?;
            state.live = mode;
            state.refresh_gate(&mut events);
        }
        self.dispatch(events)
    }

    pub fn set_value(&self, field: &str, index: usize, value: impl Into<String>) -> FormResult<()> {
        let value = value.into();
        self.apply_input(field, index, Trigger::Input, move |elements, index| {
            elements[index].value = value;
        })
    }

    /// Checks or unchecks a radio or checkbox member. Checking a radio
    /// unchecks the rest of its group.
    pub fn set_checked(&self, field: &str, index: usize, checked: bool) -> FormResult<()> {
        self.apply_input(field, index, Trigger::Change, move |elements, index| {
            if checked && elements[index].kind == ElementKind::Radio {
                for element in elements.iter_mut() {
                    element.checked = false;
                }
            }
            elements[index].checked = checked;
        })
    }

    pub fn set_selected<I, S>(&self, field: &str, index: usize, options: I) -> FormResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options.into_iter().map(Into::into).collect::<Vec<_>>();
        self.apply_input(field, index, Trigger::Change, move |elements, index| {
            elements[index].selected = options;
        })
    }

    /// Signals a committed change without altering the value.
    pub fn commit(&self, field: &str, index: usize) -> FormResult<()> {
        self.fire_trigger(field, index, Trigger::Change)
    }

    pub fn blur(&self, field: &str, index: usize) -> FormResult<()> {
        self.fire_trigger(field, index, Trigger::Blur)
    }

    /// Excluded elements are skipped by validation and aggregation.
    pub fn set_element_excluded(&self, field: &str, index: usize, excluded: bool) -> FormResult<()> {
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "toggling element exclusion")?;
            let target = state
                .registry
                .resolve_mut(field)
                .ok_or_else(|| FormError::UnknownField(field.to_owned()))?;
            let element = target
                .elements
                .get_mut(index)
                .ok_or_else(|| out_of_range(field, index))?;
            if element.excluded == excluded {
                return Ok(());
            }
            element.excluded = excluded;
            let unit = target.unit_of(index);
            target.reset_unit(unit, &mut events);
            state.refresh_gate(&mut events);
        }
        self.dispatch(events)
    }

    fn apply_input<F>(&self, field: &str, index: usize, trigger: Trigger, update: F) -> FormResult<()>
    where
        F: FnOnce(&mut [Element], usize),
    {
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "applying field input")?;
            let target = state
                .registry
                .resolve_mut(field)
                .ok_or_else(|| FormError::UnknownField(field.to_owned()))?;
            if index >= target.elements.len() {
                return Err(out_of_range(field, index));
            }
            update(&mut target.elements, index);
            let unit = target.unit_of(index);
            target.reset_unit(unit, &mut events);
            if state.submit_requested {
                tracing::debug!(field, "value changed, withdrawing submit request");
                state.submit_requested = false;
            }
            state.refresh_gate(&mut events);
        }
        self.dispatch(events)?;
        self.fire_trigger(field, index, trigger)
    }

    fn fire_trigger(&self, field: &str, index: usize, trigger: Trigger) -> FormResult<()> {
        let (key, grouped) = {
            let state = read_lock(&self.state, "resolving live trigger")?;
            let target = state
                .registry
                .resolve(field)
                .ok_or_else(|| FormError::UnknownField(field.to_owned()))?;
            if index >= target.elements.len() {
                return Err(out_of_range(field, index));
            }
            if !state.live.validates_on_trigger() || !target.triggers.contains(&trigger) {
                return Ok(());
            }
            (target.key.clone(), target.grouped)
        };
        tracing::trace!(field, index, ?trigger, "live trigger");
        if grouped {
            self.validate_key(&key)
        } else {
            self.validate_unit(&key, index)
        }
    }
}

fn out_of_range(field: &str, index: usize) -> FormError {
    FormError::ElementOutOfRange {
        field: field.to_owned(),
        index,
    }
}
