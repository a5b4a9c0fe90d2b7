//! Single-flight assembly worker.
//!
//! Assembly is heavy, so it runs on a dedicated thread that owns its own
//! [`Session`]. The kernel is created on that thread and never leaves it.
//! Requests are queued and processed one at a time; callers await their
//! reply on a oneshot channel.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use arbor_kernel::SolidKernel;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{ArborError, Stage};
use crate::protocol::{Request, Response};
use crate::session::Session;

struct Job {
    ticket: u64,
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Handle to the worker thread. Dropping it stops the worker after the
/// queued jobs drain.
pub struct AssemblyWorker {
    tx: Option<mpsc::UnboundedSender<Job>>,
    handle: Option<JoinHandle<()>>,
    next_ticket: AtomicU64,
    cancelled: Arc<AtomicU64>,
}

/// A submitted request awaiting its reply.
#[must_use = "the reply is only observable through `wait`"]
pub struct Pending {
    ticket: u64,
    stage: Stage,
    rx: oneshot::Receiver<Response>,
}

impl Pending {
    /// Ticket assigned at submission. Tickets increase monotonically.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Wait for the reply.
    pub async fn wait(self) -> Response {
        match self.rx.await {
            Ok(response) => response,
            Err(_) => Response::from_error(&ArborError::WorkerGone { stage: self.stage }),
        }
    }
}

impl AssemblyWorker {
    /// Start a worker whose session uses kernel `K`.
    pub fn spawn<K: SolidKernel + 'static>() -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicU64::new(0));
        let watermark = Arc::clone(&cancelled);
        let handle = thread::Builder::new()
            .name("arbor-assembly".into())
            .spawn(move || run::<K>(rx, watermark))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            next_ticket: AtomicU64::new(1),
            cancelled,
        })
    }

    /// Queue a request.
    pub fn submit(&self, request: Request) -> Pending {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let stage = request.stage();
        let (reply, rx) = oneshot::channel();
        let job = Job {
            ticket,
            request,
            reply,
        };
        match &self.tx {
            // A closed queue drops the job and its reply sender, which the
            // caller observes as `WorkerGone`.
            Some(tx) => {
                if tx.send(job).is_err() {
                    warn!(ticket, "assembly worker is gone");
                }
            }
            None => drop(job),
        }
        Pending { ticket, stage, rx }
    }

    /// Queue a request and wait for its reply.
    pub async fn request(&self, request: Request) -> Response {
        self.submit(request).wait().await
    }

    /// Cancel every request submitted so far.
    ///
    /// Queued requests are answered with a cancellation error without
    /// running. A request already running completes, but its result is
    /// discarded and replaced with the same error.
    pub fn cancel_pending(&self) {
        let last = self.next_ticket.load(Ordering::SeqCst).saturating_sub(1);
        let prev = self.cancelled.fetch_max(last, Ordering::SeqCst);
        debug!(through = last, previous = prev, "cancelled pending requests");
    }

    /// Stop accepting requests and wait for the worker to drain.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("assembly worker panicked");
            }
        }
    }
}

impl Drop for AssemblyWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<K: SolidKernel>(mut rx: mpsc::UnboundedReceiver<Job>, cancelled: Arc<AtomicU64>) {
    let mut session = Session::<K>::new();
    let is_cancelled = |ticket: u64| ticket <= cancelled.load(Ordering::SeqCst);

    while let Some(job) = rx.blocking_recv() {
        let stage = job.request.stage();
        let is_generate = matches!(job.request, Request::Generate(_));

        let response = if is_cancelled(job.ticket) {
            debug!(ticket = job.ticket, "skipping cancelled request");
            Response::from_error(&ArborError::Cancelled { stage })
        } else {
            let response = session.handle(job.request);
            if is_cancelled(job.ticket) {
                debug!(ticket = job.ticket, "discarding result of cancelled request");
                if is_generate {
                    session.clear();
                }
                Response::from_error(&ArborError::Cancelled { stage })
            } else {
                response
            }
        };

        // The caller may have stopped waiting.
        let _ = job.reply.send(response);
    }
    debug!("assembly worker stopped");
}
