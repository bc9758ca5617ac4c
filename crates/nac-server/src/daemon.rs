//! Supervised daemon lifecycle
//!
//! A daemon wraps one long-running [`EntryPoint`] (a listener loop) with a
//! `Stopped -> Starting -> Running -> Stopping -> Stopped` state machine that
//! can be driven from any task:
//!
//! - [`Daemon::start`] hands a fresh [`CancellationToken`] to the
//!   supervision loop over a one-slot command channel.
//! - [`Daemon::stop`] cancels that token and waits on the state channel for
//!   the run cycle to finish.
//! - [`Daemon::restart`] stops and, only if that succeeded, starts again.
//!
//! The supervision loop outlives individual runs. Between runs it waits for
//! the next start command; a run that ends on its own (bind failure, panic)
//! leaves the daemon stopped until someone starts it again.
//!
//! [`DaemonHost`] owns a set of named daemons and exposes them through the
//! [`DaemonControl`] surface.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaemonError {
    #[error("Daemon not found: {0}")]
    NotFound(String),
    #[error("Daemon already registered: {0}")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Stopped,
    /// A run cycle is executing but has not reported ready yet
    Starting,
    Running,
    Stopping,
}

/// Body of a daemon run cycle.
///
/// `run` should return promptly once the context is cancelled and call
/// [`DaemonContext::mark_running`] once it is ready to serve.
#[async_trait]
pub trait EntryPoint: Send + Sync + 'static {
    async fn run(&self, ctx: DaemonContext);
}

/// Per-run handle passed to an [`EntryPoint`]
pub struct DaemonContext {
    name: Arc<str>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<DaemonState>>,
}

impl DaemonContext {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once this run has been asked to stop
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Report the daemon as running. Ignored once the run is cancelled.
    pub fn mark_running(&self) {
        let cancel = &self.cancel;
        self.state.send_if_modified(|state| {
            if *state == DaemonState::Starting && !cancel.is_cancelled() {
                *state = DaemonState::Running;
                true
            } else {
                false
            }
        });
    }
}

/// Cloneable handle to one supervised daemon
#[derive(Clone)]
pub struct Daemon {
    name: Arc<str>,
    commands: mpsc::Sender<CancellationToken>,
    state: Arc<watch::Sender<DaemonState>>,
    active: Arc<Mutex<Option<CancellationToken>>>,
    root: CancellationToken,
}

impl Daemon {
    /// Spawn the supervision loop for `entry`.
    ///
    /// The daemon starts out stopped. Cancelling `root` ends every run and
    /// the loop itself.
    pub fn spawn(
        name: impl Into<String>,
        entry: Arc<dyn EntryPoint>,
        root: &CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let name: Arc<str> = Arc::from(name.into());
        let (commands, receiver) = mpsc::channel(1);
        let (state, _) = watch::channel(DaemonState::Stopped);
        let state = Arc::new(state);

        let task = tokio::spawn(supervise(
            name.clone(),
            entry,
            receiver,
            state.clone(),
            root.clone(),
        ));

        let daemon = Daemon {
            name,
            commands,
            state,
            active: Arc::new(Mutex::new(None)),
            root: root.clone(),
        };
        (daemon, task)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> DaemonState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == DaemonState::Running
    }

    pub fn subscribe(&self) -> watch::Receiver<DaemonState> {
        self.state.subscribe()
    }

    /// Wait until the daemon reaches `target`. Returns false on timeout.
    pub async fn wait_for(&self, target: DaemonState, timeout: Duration) -> bool {
        let mut state = self.state.subscribe();
        let reached = matches!(
            tokio::time::timeout(timeout, state.wait_for(|s| *s == target)).await,
            Ok(Ok(_))
        );
        reached
    }

    /// Request a new run cycle. No-op while running, stopping or already
    /// starting.
    pub fn start(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if self.state() != DaemonState::Stopped {
            debug!(daemon = %self.name, state = ?self.state(), "Start ignored");
            return;
        }
        if active.as_ref().is_some_and(|token| !token.is_cancelled()) {
            debug!(daemon = %self.name, "Start already in progress");
            return;
        }

        let token = self.root.child_token();
        match self.commands.try_send(token.clone()) {
            Ok(()) => {
                *active = Some(token);
                debug!(daemon = %self.name, "Start requested");
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(daemon = %self.name, "Start already pending");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(daemon = %self.name, "Supervisor has exited, cannot start");
            }
        }
    }

    /// Cancel the current run and wait up to `timeout` for it to finish.
    ///
    /// A run that has begun but not yet marked itself running is waited
    /// for like any other. Returns true once stopped (immediately if no run
    /// had begun). On
    /// timeout the run is left in place and false is returned; the daemon
    /// stays in `Stopping`.
    pub async fn stop(&self, timeout: Duration) -> bool {
        let token = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
        }

        self.state.send_if_modified(|state| {
            if matches!(*state, DaemonState::Starting | DaemonState::Running) {
                *state = DaemonState::Stopping;
                true
            } else {
                false
            }
        });

        if self.wait_for(DaemonState::Stopped, timeout).await {
            true
        } else {
            warn!(daemon = %self.name, timeout_secs = timeout.as_secs_f64(), "Daemon did not stop in time");
            false
        }
    }

    /// Stop, then start again if the stop succeeded
    pub async fn restart(&self, timeout: Duration) -> bool {
        if !self.stop(timeout).await {
            return false;
        }
        self.start();
        true
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

async fn supervise(
    name: Arc<str>,
    entry: Arc<dyn EntryPoint>,
    mut commands: mpsc::Receiver<CancellationToken>,
    state: Arc<watch::Sender<DaemonState>>,
    root: CancellationToken,
) {
    loop {
        let token = tokio::select! {
            biased;
            _ = root.cancelled() => break,
            command = commands.recv() => match command {
                Some(token) => token,
                None => break,
            },
        };
        // Checked under the state lock so a concurrent stop either sees
        // Starting or has already withdrawn the token
        let begun = state.send_if_modified(|s| {
            if token.is_cancelled() {
                false
            } else {
                *s = DaemonState::Starting;
                true
            }
        });
        if !begun {
            debug!(daemon = %name, "Start withdrawn before the run began");
            continue;
        }

        info!(daemon = %name, "Daemon starting");
        let ctx = DaemonContext {
            name: name.clone(),
            cancel: token.clone(),
            state: state.clone(),
        };
        let run = {
            let entry = entry.clone();
            tokio::spawn(async move { entry.run(ctx).await })
        };
        match run.await {
            Ok(()) => info!(daemon = %name, "Daemon stopped"),
            Err(err) => error!(daemon = %name, error = %err, "Daemon run failed"),
        }

        token.cancel();
        state.send_if_modified(|s| std::mem::replace(s, DaemonState::Stopped) != DaemonState::Stopped);
    }
    debug!(daemon = %name, "Supervisor exiting");
}

/// Control surface for the portal UI or CLI
#[async_trait]
pub trait DaemonControl: Send + Sync {
    /// Registered daemon names, sorted
    fn names(&self) -> Vec<String>;

    fn is_running(&self, name: &str) -> Result<bool, DaemonError>;

    fn start(&self, name: &str) -> Result<(), DaemonError>;

    async fn stop(&self, name: &str, timeout: Duration) -> Result<bool, DaemonError>;

    async fn restart(&self, name: &str, timeout: Duration) -> Result<bool, DaemonError>;
}

/// Owns the named daemons of one process
pub struct DaemonHost {
    root: CancellationToken,
    daemons: BTreeMap<String, Daemon>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl DaemonHost {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            daemons: BTreeMap::new(),
            tasks: Vec::new(),
        }
    }

    /// Register `entry` under `name` and spawn its supervision loop.
    ///
    /// The daemon is not started.
    pub fn register<E: EntryPoint>(
        &mut self,
        name: impl Into<String>,
        entry: E,
    ) -> Result<Daemon, DaemonError> {
        let name = name.into();
        if self.daemons.contains_key(&name) {
            return Err(DaemonError::DuplicateName(name));
        }
        let (daemon, task) = Daemon::spawn(name.clone(), Arc::new(entry), &self.root);
        self.daemons.insert(name.clone(), daemon.clone());
        self.tasks.push((name, task));
        Ok(daemon)
    }

    pub fn daemon(&self, name: &str) -> Result<&Daemon, DaemonError> {
        self.daemons
            .get(name)
            .ok_or_else(|| DaemonError::NotFound(name.to_string()))
    }

    pub fn start_all(&self) {
        for daemon in self.daemons.values() {
            daemon.start();
        }
    }

    /// Stop every daemon, end the supervision loops and wait for them.
    ///
    /// Returns false if anything was still running when `timeout` elapsed.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        info!(daemons = self.daemons.len(), "Shutting down daemons");
        self.root.cancel();

        let mut clean = true;
        for (name, task) in self.tasks {
            match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(daemon = %name, error = %err, "Supervisor failed");
                    clean = false;
                }
                Err(_) => {
                    warn!(daemon = %name, "Daemon still running at shutdown deadline");
                    clean = false;
                }
            }
        }
        clean
    }
}

impl Default for DaemonHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DaemonControl for DaemonHost {
    fn names(&self) -> Vec<String> {
        self.daemons.keys().cloned().collect()
    }

    fn is_running(&self, name: &str) -> Result<bool, DaemonError> {
        Ok(self.daemon(name)?.is_running())
    }

    fn start(&self, name: &str) -> Result<(), DaemonError> {
        self.daemon(name)?.start();
        Ok(())
    }

    async fn stop(&self, name: &str, timeout: Duration) -> Result<bool, DaemonError> {
        let daemon = self.daemon(name)?;
        Ok(daemon.stop(timeout).await)
    }

    async fn restart(&self, name: &str, timeout: Duration) -> Result<bool, DaemonError> {
        let daemon = self.daemon(name)?;
        Ok(daemon.restart(timeout).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    /// Marks running and waits for cancellation
    struct Idle {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EntryPoint for Idle {
        async fn run(&self, ctx: DaemonContext) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            ctx.mark_running();
            ctx.cancelled().await;
        }
    }

    /// Ignores cancellation
    struct Stubborn;

    #[async_trait]
    impl EntryPoint for Stubborn {
        async fn run(&self, ctx: DaemonContext) {
            ctx.mark_running();
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }

    struct Panics {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EntryPoint for Panics {
        async fn run(&self, ctx: DaemonContext) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            ctx.mark_running();
            panic!("listener blew up");
        }
    }

    async fn wait_for_runs(runs: &AtomicUsize, expected: usize) {
        let deadline = Instant::now() + WAIT;
        while runs.load(Ordering::SeqCst) < expected {
            assert!(Instant::now() < deadline, "run {} never began", expected);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn idle() -> (Idle, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (Idle { runs: runs.clone() }, runs)
    }

    #[tokio::test]
    async fn test_start_stop_restart() {
        let (entry, runs) = idle();
        let mut host = DaemonHost::new();
        let daemon = host.register("idle", entry).unwrap();
        assert_eq!(daemon.state(), DaemonState::Stopped);

        daemon.start();
        assert!(daemon.wait_for(DaemonState::Running, WAIT).await);

        daemon.start();
        assert!(daemon.stop(WAIT).await);
        assert_eq!(daemon.state(), DaemonState::Stopped);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        assert!(daemon.restart(WAIT).await);
        assert!(daemon.wait_for(DaemonState::Running, WAIT).await);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        assert!(daemon.restart(WAIT).await);
        assert!(daemon.wait_for(DaemonState::Running, WAIT).await);
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        assert!(host.shutdown(WAIT).await);
    }

    #[tokio::test]
    async fn test_stop_when_stopped_succeeds() {
        let (entry, runs) = idle();
        let mut host = DaemonHost::new();
        let daemon = host.register("idle", entry).unwrap();
        assert!(daemon.stop(Duration::from_millis(10)).await);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_timeout_leaves_daemon_stopping() {
        let mut host = DaemonHost::new();
        let daemon = host.register("stubborn", Stubborn).unwrap();
        daemon.start();
        assert!(daemon.wait_for(DaemonState::Running, WAIT).await);

        assert!(!daemon.stop(Duration::from_millis(50)).await);
        assert_eq!(daemon.state(), DaemonState::Stopping);
        assert!(!daemon.restart(Duration::from_millis(50)).await);

        assert!(!host.shutdown(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn test_panic_ends_run_without_restart() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut host = DaemonHost::new();
        let daemon = host.register("panics", Panics { runs: runs.clone() }).unwrap();

        daemon.start();
        wait_for_runs(&runs, 1).await;
        assert!(daemon.wait_for(DaemonState::Stopped, WAIT).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!daemon.is_running());

        daemon.start();
        wait_for_runs(&runs, 2).await;
        assert!(daemon.wait_for(DaemonState::Stopped, WAIT).await);
        assert!(host.shutdown(WAIT).await);
    }

    #[tokio::test]
    async fn test_control_surface_by_name() {
        let (first, _) = idle();
        let (second, _) = idle();
        let mut host = DaemonHost::new();
        host.register("radius-authorization", first).unwrap();
        host.register("dns-redirect", second).unwrap();
        assert_eq!(
            host.register("dns-redirect", Stubborn).unwrap_err(),
            DaemonError::DuplicateName("dns-redirect".to_string())
        );
        assert_eq!(host.names(), vec!["dns-redirect", "radius-authorization"]);

        host.start_all();
        assert!(host.daemon("dns-redirect").unwrap().wait_for(DaemonState::Running, WAIT).await);
        assert!(host.is_running("dns-redirect").unwrap());

        assert!(DaemonControl::stop(&host, "dns-redirect", WAIT).await.unwrap());
        assert!(!host.is_running("dns-redirect").unwrap());

        assert_eq!(
            host.is_running("ftp").unwrap_err(),
            DaemonError::NotFound("ftp".to_string())
        );
        assert!(DaemonControl::restart(&host, "ftp", WAIT).await.is_err());

        assert!(host.shutdown(WAIT).await);
    }

    /// Takes a while to become ready and ignores cancellation until then
    struct SlowStart {
        alive: Arc<AtomicBool>,
    }

    #[async_trait]
    impl EntryPoint for SlowStart {
        async fn run(&self, ctx: DaemonContext) {
            self.alive.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            ctx.mark_running();
            ctx.cancelled().await;
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_stop_waits_for_run_not_yet_ready() {
        let alive = Arc::new(AtomicBool::new(false));
        let mut host = DaemonHost::new();
        let daemon = host
            .register("slow", SlowStart { alive: alive.clone() })
            .unwrap();

        daemon.start();
        assert!(daemon.wait_for(DaemonState::Starting, WAIT).await);
        assert!(alive.load(Ordering::SeqCst));

        assert!(!daemon.stop(Duration::from_millis(50)).await);
        assert_eq!(daemon.state(), DaemonState::Stopping);
        assert!(alive.load(Ordering::SeqCst));

        assert!(daemon.stop(WAIT).await);
        assert!(!alive.load(Ordering::SeqCst));
        assert_eq!(daemon.state(), DaemonState::Stopped);
        assert!(host.shutdown(WAIT).await);
    }

    #[tokio::test]
    async fn test_stop_before_run_begins_withdraws_start() {
        let (entry, runs) = idle();
        let mut host = DaemonHost::new();
        let daemon = host.register("idle", entry).unwrap();

        daemon.start();
        assert!(daemon.stop(WAIT).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!daemon.is_running());

        daemon.start();
        assert!(daemon.wait_for(DaemonState::Running, WAIT).await);
        assert!(runs.load(Ordering::SeqCst) >= 1);
        assert!(host.shutdown(WAIT).await);
    }
}
