use std::sync::{Arc, Mutex, Once};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::task::{FutureObj, Spawn, SpawnError, noop_waker_ref};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into()),
            )
            .with_test_writer()
            .try_init();
    });
}

#[derive(Clone, Default)]
pub struct ManualExecutor {
    queue: Arc<Mutex<Vec<FutureObj<'static, ()>>>>,
}

impl Spawn for ManualExecutor {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.queue.lock().expect("executor queue").push(future);
        Ok(())
    }
}

impl ManualExecutor {
    pub fn run_until_stalled(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.queue.lock().expect("executor queue"));
            if tasks.is_empty() {
                return;
            }
            let mut cx = Context::from_waker(noop_waker_ref());
            let mut pending = Vec::new();
            let mut progressed = false;
            for mut task in tasks {
                match task.poll_unpin(&mut cx) {
                    Poll::Ready(()) => progressed = true,
                    Poll::Pending => pending.push(task),
                }
            }
            let mut queue = self.queue.lock().expect("executor queue");
            progressed |= !queue.is_empty();
            pending.append(&mut *queue);
            *queue = pending;
            if !progressed {
                return;
            }
        }
    }
}
