use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::task::{FutureObj, Spawn, SpawnError, noop_waker_ref};

use crate::form::{
    Element, FieldConfig, FieldKey, FormConfig, FormController, FormObserver, NoOptions,
    ValidationContext, ValidationStatus, Validator, ValidatorFault, ValidatorName,
    ValidatorOutcome, ValidatorRegistry, ValidatorResult,
};

/// Single-threaded executor polled explicitly by the test.
#[derive(Clone, Default)]
pub(crate) struct ManualExecutor {
    queue: Arc<Mutex<Vec<FutureObj<'static, ()>>>>,
}

impl Spawn for ManualExecutor {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.queue.lock().expect("executor queue").push(future);
        Ok(())
    }
}

impl ManualExecutor {
    /// Polls queued tasks until none completes and none is spawned.
    pub(crate) fn run_until_stalled(&self) -> usize {
        let mut completed = 0;
        loop {
            let tasks = std::mem::take(&mut *self.queue.lock().expect("executor queue"));
            if tasks.is_empty() {
                return completed;
            }
            let mut cx = Context::from_waker(noop_waker_ref());
            let mut pending = Vec::new();
            let mut progressed = false;
            for mut task in tasks {
                match task.poll_unpin(&mut cx) {
                    Poll::Ready(()) => {
                        completed += 1;
                        progressed = true;
                    }
                    Poll::Pending => pending.push(task),
                }
            }
            let mut queue = self.queue.lock().expect("executor queue");
            progressed |= !queue.is_empty();
            pending.append(&mut *queue);
            *queue = pending;
            if !progressed {
                return completed;
            }
        }
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.lock().expect("executor queue").len()
    }
}

type Resolver = oneshot::Sender<Result<bool, ValidatorFault>>;

/// Asynchronous validator whose checks are settled by the test, in start
/// order.
#[derive(Clone, Default)]
pub(crate) struct PendingChecks {
    started: Arc<AtomicUsize>,
    checks: Arc<Mutex<Vec<(String, Option<Resolver>)>>>,
}

impl PendingChecks {
    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn value(&self, check: usize) -> String {
        self.checks.lock().expect("pending checks")[check].0.clone()
    }

    /// Returns false when the check was cancelled before it could settle.
    pub(crate) fn resolve(&self, check: usize, result: Result<bool, ValidatorFault>) -> bool {
        let sender = self.checks.lock().expect("pending checks")[check]
            .1
            .take()
            .expect("check resolved twice");
        sender.send(result).is_ok()
    }
}

impl Validator for PendingChecks {
    type Options = NoOptions;

    fn validate(&self, ctx: &ValidationContext<'_>, _options: &NoOptions) -> ValidatorResult {
        let (sender, receiver) = oneshot::channel();
        self.started.fetch_add(1, Ordering::SeqCst);
        self.checks
            .lock()
            .expect("pending checks")
            .push((ctx.value().to_owned(), Some(sender)));
        Ok(ValidatorOutcome::pending(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(ValidatorFault::Message("check dropped".into())))
        }))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Observed {
    Status(String, Option<String>, ValidationStatus),
    Gate(bool),
    Focus(Option<String>),
}

#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<Observed>>,
}

impl Recorder {
    pub(crate) fn take(&self) -> Vec<Observed> {
        std::mem::take(&mut *self.events.lock().expect("recorded events"))
    }
}

impl FormObserver for Recorder {
    fn on_status_changed(
        &self,
        field: &FieldKey,
        validator: Option<&ValidatorName>,
        status: ValidationStatus,
    ) {
        self.events.lock().expect("recorded events").push(Observed::Status(
            field.to_string(),
            validator.map(ToString::to_string),
            status,
        ));
    }

    fn on_submit_gate_changed(&self, allowed: bool) {
        self.events
            .lock()
            .expect("recorded events")
            .push(Observed::Gate(allowed));
    }

    fn on_focus_target(&self, field: Option<&FieldKey>) {
        self.events
            .lock()
            .expect("recorded events")
            .push(Observed::Focus(field.map(ToString::to_string)));
    }
}

/// Builds a one-field form over the built-ins, validates it and returns the
/// field status.
pub(crate) fn validate_once(field: FieldConfig, elements: Vec<Element>) -> ValidationStatus {
    let name = field.name.clone();
    let controller = FormController::new(
        &FormConfig::new().field(field),
        &elements,
        &ValidatorRegistry::with_builtins(),
        ManualExecutor::default(),
    );
    controller.validate_field(&name).expect("validate field");
    controller
        .field_status(&name)
        .expect("field status")
        .expect("field registered")
}
