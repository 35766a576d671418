use super::controller::{FieldKey, ValidatorName};
use super::status::ValidationStatus;

/// Presentation-side collaborator notified by the controller.
///
/// Callbacks run after the controller has released its state lock, so an
/// observer may query the controller from inside them.
pub trait FormObserver: Send + Sync + 'static {
    fn on_status_changed(
        &self,
        _field: &FieldKey,
        _validator: Option<&ValidatorName>,
        _status: ValidationStatus,
    ) {
    }

    fn on_submit_gate_changed(&self, _allowed: bool) {}

    fn on_focus_target(&self, _field: Option<&FieldKey>) {}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum FormEvent {
    Status {
        field: FieldKey,
        validator: Option<ValidatorName>,
        status: ValidationStatus,
    },
    SubmitGate(bool),
    Focus(Option<FieldKey>),
}

impl FormEvent {
    pub(crate) fn status(
        field: &FieldKey,
        validator: Option<&ValidatorName>,
        status: ValidationStatus,
    ) -> Self {
        FormEvent::Status {
            field: field.clone(),
            validator: validator.cloned(),
            status,
        }
    }

    pub(crate) fn deliver(&self, observer: &dyn FormObserver) {
        match self {
            FormEvent::Status {
                field,
                validator,
                status,
            } => observer.on_status_changed(field, validator.as_ref(), *status),
            FormEvent::SubmitGate(allowed) => observer.on_submit_gate_changed(*allowed),
            FormEvent::Focus(field) => observer.on_focus_target(field.as_ref()),
        }
    }
}
