use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::AbortHandle;
use futures::task::Spawn;

use super::config::{FormConfig, LiveMode};
use super::error::{FormError, FormResult, ValidatorFault};
use super::observer::{FormEvent, FormObserver};
use super::registry::{Element, ElementKind, FieldRegistry};
use super::status::{Settlement, ValidationStatus};
use super::task::{BoxedCheckFuture, CheckId, panic_fault, spawn_check};
use super::validation::{BoundValidator, ValidationContext, ValidatorOutcome, ValidatorRegistry};

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(Arc<str>);

impl FieldKey {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValidatorName(Arc<str>);

impl ValidatorName {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ValidatorName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldSnapshot {
    pub key: FieldKey,
    pub elements: Vec<Element>,
    pub grouped: bool,
    pub enabled: bool,
    pub validators: Vec<ValidatorName>,
}

pub(super) type SubmitHandler = Arc<dyn Fn(&FormController) + Send + Sync>;

/// Addresses one slot: a validator binding on one validation unit of a field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct BindingRef {
    pub(super) field: FieldKey,
    pub(super) unit: usize,
    pub(super) binding: usize,
}

struct PreparedCheck {
    id: CheckId,
    validator: ValidatorName,
    check: Arc<dyn BoundValidator>,
    kind: ElementKind,
    elements: Vec<Element>,
    value: String,
}

pub(super) struct FormState {
    pub(super) registry: FieldRegistry,
    pub(super) live: LiveMode,
    pub(super) submit_requested: bool,
    pub(super) submit_allowed: bool,
    pub(super) submit_count: u32,
    pub(super) first_invalid: Option<FieldKey>,
    next_check: u64,
}

impl FormState {
    fn allocate_check(&mut self) -> CheckId {
        self.next_check += 1;
        CheckId(self.next_check)
    }

    pub(super) fn refresh_gate(&mut self, events: &mut Vec<FormEvent>) {
        let allowed = self.live == LiveMode::Disabled
            || !self.registry.active_statuses().any(|status| {
                matches!(
                    status,
                    ValidationStatus::Validating | ValidationStatus::Invalid
                )
            });
        if allowed != self.submit_allowed {
            self.submit_allowed = allowed;
            events.push(FormEvent::SubmitGate(allowed));
        }
    }

    fn begin_check(
        &mut self,
        target: &BindingRef,
        events: &mut Vec<FormEvent>,
    ) -> FormResult<Option<PreparedCheck>> {
        let id = self.allocate_check();
        let Some(field) = self.registry.resolve_mut(target.field.as_str()) else {
            return Ok(None);
        };
        if !field.enabled || target.unit >= field.units() || field.is_unit_excluded(target.unit)
        {
            return Ok(None);
        }
        let key = field.key.clone();
        let kind = field.kind();
        let elements = field.unit_elements(target.unit).to_vec();
        let value = field.unit_value(target.unit);
        let Some(binding) = field.bindings.get_mut(target.binding) else {
            return Ok(None);
        };
        let Some(slot) = binding.slots.get_mut(target.unit) else {
            return Ok(None);
        };

        let before = slot.status();
        if !slot.begin(id)? {
            return Ok(None);
        }
        if before != ValidationStatus::Validating {
            events.push(FormEvent::status(
                &key,
                Some(&binding.name),
                ValidationStatus::Validating,
            ));
        }
        tracing::debug!(field = %key, validator = %binding.name, unit = target.unit, check = id.0, "starting validator check");

        let prepared = PreparedCheck {
            id,
            validator: binding.name.clone(),
            check: binding.check.clone(),
            kind,
            elements,
            value,
        };
        self.refresh_gate(events);
        Ok(Some(prepared))
    }

    fn settle(
        &mut self,
        target: &BindingRef,
        id: CheckId,
        result: Result<bool, ValidatorFault>,
        events: &mut Vec<FormEvent>,
    ) -> FormResult<Option<ValidationStatus>> {
        let Some(field) = self.registry.resolve_mut(target.field.as_str()) else {
            return Ok(None);
        };
        let key = field.key.clone();
        let Some(binding) = field.bindings.get_mut(target.binding) else {
            return Ok(None);
        };
        let Some(slot) = binding.slots.get_mut(target.unit) else {
            return Ok(None);
        };

        let (valid, fault) = match result {
            Ok(valid) => (valid, None),
            Err(fault) => (false, Some(fault)),
        };
        match slot.settle(id, valid)? {
            Settlement::Superseded => {
                tracing::trace!(field = %key, validator = %binding.name, check = id.0, "discarding superseded validator result");
                Ok(None)
            }
            Settlement::Applied(status) => {
                if let Some(fault) = fault {
                    tracing::warn!(field = %key, validator = %binding.name, %fault, "validator fault, marking binding invalid");
                }
                tracing::debug!(field = %key, validator = %binding.name, check = id.0, ?status, "validator check settled");
                events.push(FormEvent::status(&key, Some(&binding.name), status));
                self.refresh_gate(events);
                Ok(Some(status))
            }
        }
    }

    fn attach(&mut self, target: &BindingRef, id: CheckId, handle: AbortHandle) {
        let slot = self
            .registry
            .resolve_mut(target.field.as_str())
            .and_then(|field| field.bindings.get_mut(target.binding))
            .and_then(|binding| binding.slots.get_mut(target.unit));
        match slot {
            Some(slot) => {
                slot.attach(id, handle);
            }
            None => handle.abort(),
        }
    }

    fn force(
        &mut self,
        name: &str,
        validator: &str,
        status: ValidationStatus,
        events: &mut Vec<FormEvent>,
    ) -> FormResult<()> {
        let Some(field) = self.registry.resolve_mut(name) else {
            tracing::trace!(field = name, validator, "ignoring forced status for unregistered field");
            return Ok(());
        };
        let key = field.key.clone();
        let Some(binding) = field
            .bindings
            .iter_mut()
            .find(|binding| binding.name.as_str() == validator)
        else {
            tracing::trace!(field = name, validator, "ignoring forced status for unbound validator");
            return Ok(());
        };
        if status == ValidationStatus::Validating {
            return Err(FormError::InvalidStatusTransition {
                from: ValidationStatus::combine(binding.slots.iter().map(|slot| slot.status())),
                to: status,
            });
        }

        let mut changed = false;
        for slot in &mut binding.slots {
            changed |= slot.force(status);
        }
        if changed {
            tracing::debug!(field = %key, validator, ?status, "forced validator status");
            events.push(FormEvent::status(&key, Some(&binding.name), status));
        }
        self.refresh_gate(events);
        Ok(())
    }
}

#[derive(Clone)]
pub struct FormController {
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) spawner: Arc<dyn Spawn + Send + Sync>,
    pub(super) observers: Arc<RwLock<Vec<Arc<dyn FormObserver>>>>,
    pub(super) submit_handler: Arc<RwLock<Option<SubmitHandler>>>,
}

impl FormController {
    /// Resolves `config` against `elements` and builds the validation state.
    ///
    /// Fields without elements and validators that are unknown or
    /// misconfigured are dropped. `spawner` runs asynchronous checks.
    pub fn new<S>(
        config: &FormConfig,
        elements: &[Element],
        validators: &ValidatorRegistry,
        spawner: S,
    ) -> Self
    where
        S: Spawn + Send + Sync + 'static,
    {
        let registry = FieldRegistry::build(config, elements, validators);
        Self {
            state: Arc::new(RwLock::new(FormState {
                registry,
                live: config.live,
                submit_requested: false,
                submit_allowed: true,
                submit_count: 0,
                first_invalid: None,
                next_check: 0,
            })),
            spawner: Arc::new(spawner),
            observers: Arc::new(RwLock::new(Vec::new())),
            submit_handler: Arc::new(RwLock::new(None)),
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn FormObserver>) -> FormResult<()> {
        write_lock(&self.observers, "registering form observer")?.push(observer);
        Ok(())
    }

    pub fn validate_form(&self) -> FormResult<()> {
        let keys = read_lock(&self.state, "listing fields for form validation")?
            .registry
            .iter()
            .filter(|field| field.enabled)
            .map(|field| field.key.clone())
            .collect::<Vec<_>>();
        for key in keys {
            self.validate_key(&key)?;
        }
        self.service_submit()
    }

    pub fn validate_field(&self, name: &str) -> FormResult<()> {
        let key = read_lock(&self.state, "resolving field for validation")?
            .registry
            .resolve(name)
            .map(|field| field.key.clone());
        match key {
            Some(key) => self.validate_key(&key),
            None => {
                tracing::debug!(field = name, "skipping validation of unregistered field");
                Ok(())
            }
        }
    }

    pub fn reset_form(&self, clear_values: bool) -> FormResult<()> {
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "resetting form")?;
            for field in state.registry.iter_mut() {
                field.reset_all(&mut events);
                if clear_values {
                    field.clear_values();
                }
            }
            state.first_invalid = None;
            state.submit_requested = false;
            state.refresh_gate(&mut events);
        }
        events.push(FormEvent::Focus(None));
        self.dispatch(events)
    }

    pub fn set_field_enabled(&self, name: &str, enabled: bool) -> FormResult<()> {
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state, "toggling field validators")?;
            let field = state
                .registry
                .resolve_mut(name)
                .ok_or_else(|| FormError::UnknownField(name.to_owned()))?;
            field.enabled = enabled;
            field.reset_all(&mut events);
            state.refresh_gate(&mut events);
        }
        self.dispatch(events)
    }

    /// Sets `validator` on every unit of `field` to `status`, bypassing that
    /// binding's own check. Used by validators that settle a paired field.
    pub fn force_status(
        &self,
        field: &str,
        validator: &str,
        status: ValidationStatus,
    ) -> FormResult<()> {
        let mut events = Vec::new();
        write_lock(&self.state, "forcing validator status")?
            .force(field, validator, status, &mut events)?;
        self.dispatch(events)
    }

    pub fn status(&self, field: &str, validator: &str) -> FormResult<Option<ValidationStatus>> {
        let state = read_lock(&self.state, "reading validator status")?;
        Ok(state
            .registry
            .resolve(field)
            .and_then(|field| field.binding(validator))
            .map(|binding| ValidationStatus::combine(binding.slots.iter().map(|slot| slot.status()))))
    }

    pub fn element_status(
        &self,
        field: &str,
        index: usize,
        validator: &str,
    ) -> FormResult<Option<ValidationStatus>> {
        let state = read_lock(&self.state, "reading element status")?;
        let Some(field) = state.registry.resolve(field) else {
            return Ok(None);
        };
        if index >= field.elements.len() {
            return Ok(None);
        }
        let unit = field.unit_of(index);
        Ok(field
            .binding(validator)
            .and_then(|binding| binding.slots.get(unit))
            .map(|slot| slot.status()))
    }

    pub fn field_status(&self, field: &str) -> FormResult<Option<ValidationStatus>> {
        let state = read_lock(&self.state, "reading field status")?;
        Ok(state.registry.resolve(field).map(|field| {
            ValidationStatus::combine(
                field
                    .bindings
                    .iter()
                    .flat_map(|binding| binding.slots.iter().map(|slot| slot.status())),
            )
        }))
    }

    pub fn is_field_valid(&self, field: &str) -> FormResult<bool> {
        Ok(self.field_status(field)? == Some(ValidationStatus::Valid))
    }

    /// Messages of the field's invalid bindings, in binding order.
    pub fn messages(&self, field: &str) -> FormResult<Vec<String>> {
        let state = read_lock(&self.state, "reading field messages")?;
        let mut messages: Vec<String> = Vec::new();
        if let Some(field) = state.registry.resolve(field) {
            for binding in &field.bindings {
                let invalid = binding
                    .slots
                    .iter()
                    .any(|slot| slot.status() == ValidationStatus::Invalid);
                if invalid && !messages.contains(&binding.message) {
                    messages.push(binding.message.clone());
                }
            }
        }
        Ok(messages)
    }

    pub fn field_value(&self, field: &str) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading field value")?
            .registry
            .resolve(field)
            .map(|field| field.unit_value(0)))
    }

    pub fn field(&self, field: &str) -> FormResult<Option<FieldSnapshot>> {
        Ok(read_lock(&self.state, "reading field snapshot")?
            .registry
            .resolve(field)
            .map(|field| FieldSnapshot {
                key: field.key.clone(),
                elements: field.elements.clone(),
                grouped: field.grouped,
                enabled: field.enabled,
                validators: field
                    .bindings
                    .iter()
                    .map(|binding| binding.name.clone())
                    .collect(),
            }))
    }

    pub fn field_names(&self) -> FormResult<Vec<FieldKey>> {
        Ok(read_lock(&self.state, "listing field names")?
            .registry
            .iter()
            .map(|field| field.key.clone())
            .collect())
    }

    pub fn pending_checks(&self) -> FormResult<usize> {
        Ok(read_lock(&self.state, "counting pending checks")?
            .registry
            .pending_checks())
    }

    pub(super) fn validate_key(&self, key: &FieldKey) -> FormResult<()> {
        let units = read_lock(&self.state, "reading field units")?
            .registry
            .resolve(key.as_str())
            .map_or(0, |field| field.units());
        for unit in 0..units {
            self.validate_unit(key, unit)?;
        }
        Ok(())
    }

    pub(super) fn validate_unit(&self, key: &FieldKey, unit: usize) -> FormResult<()> {
        let bindings = {
            let state = read_lock(&self.state, "reading field bindings")?;
            match state.registry.resolve(key.as_str()) {
                Some(field)
                    if field.enabled && unit < field.units() && !field.is_unit_excluded(unit) =>
                {
                    field.bindings.len()
                }
                _ => return Ok(()),
            }
        };
        for binding in 0..bindings {
            self.run_check(&BindingRef {
                field: key.clone(),
                unit,
                binding,
            })?;
        }
        Ok(())
    }

    fn run_check(&self, target: &BindingRef) -> FormResult<()> {
        let mut events = Vec::new();
        let prepared =
            write_lock(&self.state, "starting validator check")?.begin_check(target, &mut events)?;
        self.dispatch(events)?;
        let Some(prepared) = prepared else {
            return Ok(());
        };

        let ctx = ValidationContext {
            controller: self,
            field: &target.field,
            validator: &prepared.validator,
            kind: prepared.kind,
            elements: &prepared.elements,
            value: &prepared.value,
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| prepared.check.run(&ctx)))
            .unwrap_or_else(|payload| Err(panic_fault(payload)));
        match outcome {
            Ok(ValidatorOutcome::Ready(valid)) => {
                self.settle(target, prepared.id, Ok(valid))?;
            }
            Ok(ValidatorOutcome::Pending(check)) => self.track(target, prepared.id, check)?,
            Err(fault) => {
                self.settle(target, prepared.id, Err(fault))?;
            }
        }
        Ok(())
    }

    fn track(&self, target: &BindingRef, id: CheckId, check: BoxedCheckFuture) -> FormResult<()> {
        let controller = self.clone();
        let settle_target = target.clone();
        let spawned = spawn_check(self.spawner.as_ref(), check, move |result| {
            if let Err(error) = controller.settle_async(&settle_target, id, result) {
                tracing::error!(%error, "failed to apply asynchronous validator result");
            }
        });
        match spawned {
            Ok(handle) => {
                write_lock(&self.state, "tracking pending validator check")?
                    .attach(target, id, handle);
            }
            Err(error) => {
                self.settle(target, id, Err(ValidatorFault::Spawn(error.to_string())))?;
            }
        }
        Ok(())
    }

    fn settle(
        &self,
        target: &BindingRef,
        id: CheckId,
        result: Result<bool, ValidatorFault>,
    ) -> FormResult<Option<ValidationStatus>> {
        let mut events = Vec::new();
        let applied = write_lock(&self.state, "applying validator result")?
            .settle(target, id, result, &mut events)?;
        self.dispatch(events)?;
        Ok(applied)
    }

    pub(super) fn settle_async(
        &self,
        target: &BindingRef,
        id: CheckId,
        result: Result<bool, ValidatorFault>,
    ) -> FormResult<()> {
        if self.settle(target, id, result)? == Some(ValidationStatus::Valid) {
            self.service_submit()?;
        }
        Ok(())
    }

    pub(super) fn dispatch(&self, events: Vec<FormEvent>) -> FormResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let observers = read_lock(&self.observers, "reading form observers")?.clone();
        for event in &events {
            for observer in &observers {
                event.deliver(observer.as_ref());
            }
        }
        Ok(())
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
