pub mod form;
pub mod validators;

#[cfg(test)]
pub(crate) mod testing;

pub use form::{
    Element, ElementKind, FieldConfig, FormConfig, FormController, FormError, FormObserver,
    FormResult, FormVerdict, LiveMode, Trigger, ValidationStatus, ValidatorRegistry,
    ValidatorSpec,
};
