use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::controller::{FieldKey, FormController, ValidatorName};
use super::error::{FormResult, ValidatorFault};
use super::registry::{Element, ElementKind};
use super::status::ValidationStatus;
use super::task::BoxedCheckFuture;

pub enum ValidatorOutcome {
    Ready(bool),
    Pending(BoxedCheckFuture),
}

impl ValidatorOutcome {
    pub fn pending<F>(check: F) -> Self
    where
        F: Future<Output = Result<bool, ValidatorFault>> + Send + 'static,
    {
        Self::Pending(Box::pin(check))
    }
}

impl From<bool> for ValidatorOutcome {
    fn from(valid: bool) -> Self {
        Self::Ready(valid)
    }
}

pub type ValidatorResult = Result<ValidatorOutcome, ValidatorFault>;

/// A stateless check run against one validation unit of a field.
///
/// `Options` is deserialized once, when the form is built, from the
/// validator's configuration entry.
pub trait Validator: Send + Sync + 'static {
    type Options: DeserializeOwned + Send + Sync + 'static;

    fn validate(&self, ctx: &ValidationContext<'_>, options: &Self::Options) -> ValidatorResult;
}

/// Options type for validators that take no configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct NoOptions {}

pub struct FnValidator<F> {
    check: F,
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&ValidationContext<'_>) -> ValidatorResult + Send + Sync + 'static,
{
    type Options = NoOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, _options: &NoOptions) -> ValidatorResult {
        (self.check)(ctx)
    }
}

pub struct ValidationContext<'a> {
    pub(crate) controller: &'a FormController,
    pub(crate) field: &'a FieldKey,
    pub(crate) validator: &'a ValidatorName,
    pub(crate) kind: ElementKind,
    pub(crate) elements: &'a [Element],
    pub(crate) value: &'a str,
}

impl ValidationContext<'_> {
    pub fn field(&self) -> &FieldKey {
        self.field
    }

    pub fn validator(&self) -> &ValidatorName {
        self.validator
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        self.value
    }

    /// Elements of the unit being validated: the whole group for grouped
    /// fields, a single element otherwise.
    pub fn elements(&self) -> &[Element] {
        self.elements
    }

    pub fn choice_count(&self) -> usize {
        self.elements.iter().map(Element::choice_count).sum()
    }

    pub fn field_value(&self, field: &str) -> FormResult<Option<String>> {
        self.controller.field_value(field)
    }

    pub fn force_status(
        &self,
        field: &str,
        validator: &str,
        status: ValidationStatus,
    ) -> FormResult<()> {
        self.controller.force_status(field, validator, status)
    }
}

pub(crate) trait BoundValidator: Send + Sync {
    fn run(&self, ctx: &ValidationContext<'_>) -> ValidatorResult;
}

struct Bound<V: Validator> {
    validator: Arc<V>,
    options: V::Options,
}

impl<V: Validator> BoundValidator for Bound<V> {
    fn run(&self, ctx: &ValidationContext<'_>) -> ValidatorResult {
        self.validator.validate(ctx, &self.options)
    }
}

trait ErasedValidator: Send + Sync {
    fn bind(&self, options: &Map<String, Value>) -> serde_json::Result<Arc<dyn BoundValidator>>;
}

struct Registered<V>(Arc<V>);

impl<V: Validator> ErasedValidator for Registered<V> {
    fn bind(&self, options: &Map<String, Value>) -> serde_json::Result<Arc<dyn BoundValidator>> {
        let options = serde_json::from_value::<V::Options>(Value::Object(options.clone()))?;
        Ok(Arc::new(Bound {
            validator: self.0.clone(),
            options,
        }))
    }
}

/// Validators addressable by name from configuration.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Arc<dyn ErasedValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V>(&mut self, name: impl Into<String>, validator: V) -> &mut Self
    where
        V: Validator,
    {
        self.validators
            .insert(name.into(), Arc::new(Registered(Arc::new(validator))));
        self
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&ValidationContext<'_>) -> ValidatorResult + Send + Sync + 'static,
    {
        self.register(name, FnValidator { check })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    pub(crate) fn bind(
        &self,
        name: &str,
        options: &Map<String, Value>,
    ) -> Option<serde_json::Result<Arc<dyn BoundValidator>>> {
        self.validators
            .get(name)
            .map(|validator| validator.bind(options))
    }
}
