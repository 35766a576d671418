use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::config::{FormConfig, Trigger};
use super::controller::{FieldKey, ValidatorName};
use super::observer::FormEvent;
use super::status::{Slot, ValidationStatus};
use super::validation::{BoundValidator, ValidatorRegistry};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Password,
    Email,
    Number,
    TextArea,
    Radio,
    Checkbox,
    Select,
    File,
    Hidden,
}

impl ElementKind {
    /// Radio and checkbox groups are scored as one unit regardless of size.
    pub fn is_choice(self) -> bool {
        matches!(self, ElementKind::Radio | ElementKind::Checkbox)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub excluded: bool,
}

impl Element {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: String::new(),
            checked: false,
            selected: Vec::new(),
            excluded: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Text)
    }

    pub fn radio(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Radio).with_value(value)
    }

    pub fn checkbox(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Checkbox).with_value(value)
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Select)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    /// The value a validator sees for this element.
    pub fn current_value(&self) -> &str {
        match self.kind {
            ElementKind::Radio | ElementKind::Checkbox => {
                if self.checked {
                    &self.value
                } else {
                    ""
                }
            }
            ElementKind::Select => self.selected.first().map(String::as_str).unwrap_or(""),
            _ => &self.value,
        }
    }

    /// Number of chosen entries: a checked box counts once, a select counts
    /// each selected option.
    pub fn choice_count(&self) -> usize {
        match self.kind {
            ElementKind::Radio | ElementKind::Checkbox => usize::from(self.checked),
            ElementKind::Select => self.selected.len(),
            _ => 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        match self.kind {
            ElementKind::Radio | ElementKind::Checkbox => self.checked = false,
            ElementKind::Select => self.selected.clear(),
            _ => self.value.clear(),
        }
    }
}

pub(crate) struct ValidatorBinding {
    pub(crate) name: ValidatorName,
    pub(crate) message: String,
    pub(crate) check: Arc<dyn BoundValidator>,
    pub(crate) slots: Vec<Slot>,
}

pub(crate) struct Field {
    pub(crate) key: FieldKey,
    pub(crate) elements: Vec<Element>,
    pub(crate) grouped: bool,
    pub(crate) enabled: bool,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) bindings: Vec<ValidatorBinding>,
}

impl Field {
    pub(crate) fn kind(&self) -> ElementKind {
        self.elements[0].kind
    }

    pub(crate) fn units(&self) -> usize {
        if self.grouped { 1 } else { self.elements.len() }
    }

    pub(crate) fn unit_of(&self, element: usize) -> usize {
        if self.grouped { 0 } else { element }
    }

    pub(crate) fn unit_elements(&self, unit: usize) -> &[Element] {
        if self.grouped {
            &self.elements
        } else {
            &self.elements[unit..=unit]
        }
    }

    pub(crate) fn unit_value(&self, unit: usize) -> String {
        self.unit_elements(unit)
            .iter()
            .map(Element::current_value)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
            .to_owned()
    }

    pub(crate) fn is_unit_excluded(&self, unit: usize) -> bool {
        self.unit_elements(unit).iter().all(|element| element.excluded)
    }

    /// Units taking part in validation and aggregation.
    pub(crate) fn active_units(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.units()).filter(move |unit| self.enabled && !self.is_unit_excluded(*unit))
    }

    pub(crate) fn binding(&self, validator: &str) -> Option<&ValidatorBinding> {
        self.bindings
            .iter()
            .find(|binding| binding.name.as_str() == validator)
    }

    pub(crate) fn reset_unit(&mut self, unit: usize, events: &mut Vec<FormEvent>) {
        let mut changed = false;
        for binding in &mut self.bindings {
            if let Some(slot) = binding.slots.get_mut(unit) {
                changed |= slot.reset();
            }
        }
        if changed {
            events.push(FormEvent::status(&self.key, None, ValidationStatus::NotValidated));
        }
    }

    pub(crate) fn reset_all(&mut self, events: &mut Vec<FormEvent>) {
        for unit in 0..self.units() {
            self.reset_unit(unit, events);
        }
    }

    pub(crate) fn clear_values(&mut self) {
        for element in &mut self.elements {
            element.clear();
        }
    }
}

/// Fields in registration order, resolved once from configuration.
#[derive(Default)]
pub(crate) struct FieldRegistry {
    fields: Vec<Field>,
    index: BTreeMap<FieldKey, usize>,
}

impl FieldRegistry {
    pub(crate) fn build(
        config: &FormConfig,
        elements: &[Element],
        validators: &ValidatorRegistry,
    ) -> Self {
        let mut registry = Self::default();
        for field_config in &config.fields {
            if registry.resolve(&field_config.name).is_some() {
                tracing::warn!(field = %field_config.name, "ignoring duplicate field configuration");
                continue;
            }

            let selector = field_config
                .selector
                .as_deref()
                .unwrap_or(&field_config.name);
            let members = elements
                .iter()
                .filter(|element| element.name == selector && element.kind != ElementKind::Hidden)
                .cloned()
                .collect::<Vec<_>>();
            if members.is_empty() {
                tracing::debug!(field = %field_config.name, selector, "dropping field without elements");
                continue;
            }

            let kind = members[0].kind;
            let grouped = members.len() == 1 || kind.is_choice();
            let units = if grouped { 1 } else { members.len() };
            let field_message = field_config
                .message
                .as_deref()
                .unwrap_or(&config.message);

            let mut bindings: Vec<ValidatorBinding> = Vec::new();
            for spec in &field_config.validators {
                if bindings.iter().any(|binding| binding.name.as_str() == spec.name) {
                    tracing::warn!(field = %field_config.name, validator = %spec.name, "ignoring duplicate validator");
                    continue;
                }
                match validators.bind(&spec.name, &spec.options) {
                    None => {
                        tracing::warn!(field = %field_config.name, validator = %spec.name, "dropping unregistered validator");
                    }
                    Some(Err(error)) => {
                        tracing::warn!(field = %field_config.name, validator = %spec.name, %error, "dropping validator with invalid options");
                    }
                    Some(Ok(check)) => bindings.push(ValidatorBinding {
                        name: ValidatorName::new(spec.name.as_str()),
                        message: spec
                            .message
                            .clone()
                            .unwrap_or_else(|| field_message.to_owned()),
                        check,
                        slots: (0..units).map(|_| Slot::default()).collect(),
                    }),
                }
            }

            let triggers = field_config
                .trigger
                .clone()
                .or_else(|| config.trigger.clone())
                .unwrap_or_else(|| vec![Trigger::default_for(kind)]);

            let key = FieldKey::new(field_config.name.as_str());
            registry.index.insert(key.clone(), registry.fields.len());
            registry.fields.push(Field {
                key,
                elements: members,
                grouped,
                enabled: field_config.enabled,
                triggers,
                bindings,
            });
        }
        registry
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&Field> {
        let position = *self.index.get(name)?;
        self.fields.get(position)
    }

    pub(crate) fn resolve_mut(&mut self, name: &str) -> Option<&mut Field> {
        let position = *self.index.get(name)?;
        self.fields.get_mut(position)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Statuses of every binding slot that takes part in aggregation.
    pub(crate) fn active_statuses(&self) -> impl Iterator<Item = ValidationStatus> + '_ {
        self.fields.iter().flat_map(|field| {
            field.active_units().flat_map(move |unit| {
                field
                    .bindings
                    .iter()
                    .map(move |binding| binding.slots[unit].status())
            })
        })
    }

    pub(crate) fn pending_checks(&self) -> usize {
        self.fields
            .iter()
            .flat_map(|field| field.bindings.iter())
            .flat_map(|binding| binding.slots.iter())
            .filter(|slot| slot.has_pending())
            .count()
    }
}
