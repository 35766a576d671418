mod config;
mod controller;
mod error;
mod live;
mod observer;
mod registry;
mod status;
mod submit;
mod task;
mod validation;


pub use config::{DEFAULT_MESSAGE, FieldConfig, FormConfig, LiveMode, Trigger, ValidatorSpec};
pub use controller::{FieldKey, FieldSnapshot, FormController, ValidatorName};
pub use error::{FormError, FormResult, ValidatorFault};
pub use observer::FormObserver;
pub use registry::{Element, ElementKind};
pub use status::ValidationStatus;
pub use submit::FormVerdict;
pub use task::{BoxedCheckFuture, CheckId};
pub use validation::{
    FnValidator, NoOptions, ValidationContext, Validator, ValidatorOutcome, ValidatorRegistry,
    ValidatorResult,
};
