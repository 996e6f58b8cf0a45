//! Acceptor and Accept Loop
//!
//! The acceptor owns one bound listener, the handler factory and the session
//! registry. `start` spawns the accept loop; `stop` halts it and cancels
//! every registered session.
//!
//! ## Accept Loop
//!
//! ```text
//! loop:
//!   accept() ──stop requested──> exit (expected)
//!      │    ──error──────────> log, exit (no retry)
//!      ▼
//!   make_handler() -> Session -> at_session_start(peer)
//!      │ refused / panicked ──> drop the connection, keep accepting
//!      ▼
//!   lock registry, sweep closed sessions
//!   spawn session task, register it
//! ```
//!
//! Handler code never runs while the registry mutex is held. The registry is
//! only changed under that mutex: by the accept loop when a session is
//! admitted and by `stop` when it is drained. A session started after `stop`
//! was requested is canceled at once instead of registered.

use crate::acceptor::SessionRegistry;
use crate::handler::SharedHandlerFactory;
use crate::session::{Session, SessionConfig, SessionHandle};
use crate::stats::ServerStats;
use crate::transport::{Endpoint, Listener, SessionStream};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, trace, warn, Instrument, Span};

/// Accepts connections on one listener and tracks their sessions.
pub struct Acceptor {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    listener: Listener,
    endpoint: Endpoint,
    factory: SharedHandlerFactory,
    registry: Mutex<SessionRegistry>,
    /// Sessions drained by `stop` whose teardown `shutdown` still awaits
    draining: Mutex<Vec<SessionHandle>>,
    stop: watch::Sender<bool>,
    next_id: AtomicU64,
    config: SessionConfig,
    stats: Arc<ServerStats>,
    span: Span,
}

impl Acceptor {
    /// Wraps a bound listener. Accepting does not begin until [`Acceptor::start`].
    ///
    /// # Arguments
    ///
    /// * `listener` - A bound, listening socket
    /// * `factory` - Makes one handler per accepted connection
    /// * `config` - Buffer sizing applied to every session
    /// * `stats` - Shared server statistics
    /// * `parent` - Span the acceptor's own span is attached to
    pub fn new(
        listener: Listener,
        factory: SharedHandlerFactory,
        config: SessionConfig,
        stats: Arc<ServerStats>,
        parent: &Span,
    ) -> io::Result<Self> {
        let endpoint = listener.local_endpoint()?;
        let span = info_span!(parent: parent, "acceptor", endpoint = %endpoint);
        let (stop, _) = watch::channel(false);

        span.in_scope(|| trace!("construct acceptor"));

        Ok(Self {
            shared: Arc::new(Shared {
                listener,
                endpoint,
                factory,
                registry: Mutex::new(SessionRegistry::new()),
                draining: Mutex::new(Vec::new()),
                stop,
                next_id: AtomicU64::new(1),
                config,
                stats,
                span,
            }),
            task: Mutex::new(None),
        })
    }

    /// The endpoint the listener is bound to.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.shared.stats
    }

    /// Number of registry entries, including closed sessions not yet swept.
    pub fn session_count(&self) -> usize {
        lock(&self.shared.registry).len()
    }

    /// Spawns the accept loop on the current Tokio runtime.
    ///
    /// Has no effect if already started. After [`Acceptor::stop`] the loop
    /// exits immediately; an acceptor cannot be restarted.
    pub fn start(&self) {
        let mut task = lock(&self.task);
        if task.is_some() {
            self.shared
                .span
                .in_scope(|| warn!("acceptor already started"));
            return;
        }

        let stop_rx = self.shared.stop.subscribe();
        let span = self.shared.span.clone();
        *task = Some(tokio::spawn(
            accept_loop(Arc::clone(&self.shared), stop_rx).instrument(span),
        ));
    }

    /// Cancels the pending accept. Does not wait.
    pub fn stop_accepting(&self) {
        self.shared.span.in_scope(|| trace!("stop accepting"));
        self.shared.stop.send_replace(true);
    }

    /// Requests cancellation of every registered session and clears the
    /// registry. Does not wait for teardown.
    ///
    /// The drained handles are also kept until [`Acceptor::shutdown`] has
    /// waited for them.
    pub fn close_all_sessions(&self) -> Vec<SessionHandle> {
        let sessions = lock(&self.shared.registry).close_all();
        lock(&self.shared.draining).extend(sessions.iter().cloned());

        self.shared
            .span
            .in_scope(|| debug!(sessions = sessions.len(), "close all sessions"));
        sessions
    }

    /// Stops accepting, then closes all sessions.
    pub fn stop(&self) {
        self.stop_accepting();
        self.close_all_sessions();
    }

    /// Like [`Acceptor::stop`], but waits for the accept loop to exit and
    /// for every session to finish its teardown, including sessions drained
    /// by an earlier `stop`.
    pub async fn shutdown(&self) {
        self.stop_accepting();

        let task = lock(&self.task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "accept task failed");
            }
        }

        self.close_all_sessions();

        let sessions = std::mem::take(&mut *lock(&self.shared.draining));
        for session in &sessions {
            session.closed().await;
        }

        self.shared
            .span
            .in_scope(|| info!(sessions = sessions.len(), "acceptor shut down"));
    }
}

impl Drop for Acceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    /// Turns an accepted socket into a running, registered session.
    fn admit(&self, stream: SessionStream, peer: String) {
        debug!(peer = %peer, "accept new connection");

        let handle = SessionHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed), peer);
        let span = info_span!("session", id = handle.id(), peer = %handle.peer());

        let started = span.in_scope(|| {
            panic::catch_unwind(AssertUnwindSafe(|| {
                let mut session = Session::new(
                    stream,
                    self.factory.make_handler(),
                    handle.clone(),
                    self.config,
                    Arc::clone(&self.stats),
                );
                session.start().map(|()| session)
            }))
        });

        let session = match started {
            Ok(Ok(session)) => session,
            Ok(Err(_)) => return,
            Err(_) => {
                error!(peer = %handle.peer(), "handler panicked while starting session, dropping connection");
                return;
            }
        };

        {
            let mut registry = lock(&self.registry);
            if *self.stop.borrow() {
                debug!(peer = %handle.peer(), "acceptor stopping, canceling new session");
                handle.begin_closing();
                lock(&self.draining).push(handle);
            } else {
                let pruned = registry.sweep();
                if pruned > 0 {
                    trace!(pruned, "removed closed sessions");
                }

                registry.insert(handle);
                debug!(sessions = registry.len(), "sessions opened");
            }
        }

        tokio::spawn(session.run().instrument(span));
    }
}

async fn accept_loop(shared: Arc<Shared>, mut stop_rx: watch::Receiver<bool>) {
    info!("start accepting");

    loop {
        let accepted = tokio::select! {
            biased;
            _ = stop_rx.wait_for(|stopped| *stopped) => {
                debug!("accepting canceled");
                break;
            }
            accepted = shared.listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => shared.admit(stream, peer),
            Err(e) => {
                error!(error = %e, "accept failed, no longer accepting");
                break;
            }
        }
    }

    debug!("accept loop finished");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
