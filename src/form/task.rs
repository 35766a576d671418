use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture, FutureExt};
use futures::task::{Spawn, SpawnError, SpawnExt};

use super::error::ValidatorFault;

pub type BoxedCheckFuture = BoxFuture<'static, Result<bool, ValidatorFault>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CheckId(pub u64);

/// Handle to the check currently owning a binding slot.
///
/// Dropping the handle cancels the asynchronous work behind it. Cancelling is
/// idempotent and a no-op once the work has settled.
#[derive(Debug)]
pub(crate) struct RunningCheck {
    pub(crate) id: CheckId,
    abort: Option<AbortHandle>,
}

impl RunningCheck {
    pub(crate) fn new(id: CheckId) -> Self {
        Self { id, abort: None }
    }

    pub(crate) fn is_async(&self) -> bool {
        self.abort.is_some()
    }

    pub(crate) fn attach(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.abort.replace(handle) {
            previous.abort();
        }
    }

    pub(crate) fn cancel(&self) {
        if let Some(handle) = &self.abort {
            handle.abort();
        }
    }
}

impl Drop for RunningCheck {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawns an asynchronous check whose completion is delivered at most once.
///
/// `on_settle` is not called when the returned handle is aborted before the
/// check produces a result.
pub(crate) fn spawn_check<F>(
    spawner: &(dyn Spawn + Send + Sync),
    check: BoxedCheckFuture,
    on_settle: F,
) -> Result<AbortHandle, SpawnError>
where
    F: FnOnce(Result<bool, ValidatorFault>) + Send + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    let guarded = AssertUnwindSafe(check).catch_unwind();
    let task = Abortable::new(guarded, registration).map(move |result| match result {
        Ok(Ok(outcome)) => on_settle(outcome),
        Ok(Err(payload)) => on_settle(Err(panic_fault(payload))),
        Err(Aborted) => tracing::trace!("validator check aborted before settling"),
    });
    spawner.spawn(task)?;
    Ok(handle)
}

pub(crate) fn panic_fault(payload: Box<dyn Any + Send>) -> ValidatorFault {
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    ValidatorFault::Panicked(message)
}
