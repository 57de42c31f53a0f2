//! Ingester lifecycle.
//!
//! ```text
//! Idle -> Loading -> Bound -> Listening -> Stopping -> Stopped
//!            |                                |
//!            +-----------> Failed <-----------+
//! ```

use core::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use fgfs_registry::VariableRegistry;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::binder::{BindReport, BoundFields, VariableBinder};
use crate::config::BridgeConfig;
use crate::counters::IngestCounters;
use crate::decoder::FrameDecoder;
use crate::descriptor::FieldMap;
use crate::error::{SupervisorError, SupervisorResult};
use crate::listener::{ListenerHandle, StreamListener};
use crate::status::StatusSnapshot;

/// Lifecycle state of a [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Created, nothing loaded.
    #[default]
    Idle,
    /// Reading the descriptor.
    Loading,
    /// Descriptor loaded and fields bound.
    Bound,
    /// Receive worker running.
    Listening,
    /// Waiting for the worker to exit.
    Stopping,
    /// Worker gone, resources released.
    Stopped,
    /// Terminal failure.
    Failed,
}

impl LifecycleState {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Loading => "loading",
            LifecycleState::Bound => "bound",
            LifecycleState::Listening => "listening",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Drives one ingester from descriptor load to shutdown.
///
/// Dropping a listening supervisor raises the worker's stop flag but does
/// not wait for it; call [`Supervisor::stop`] for an orderly shutdown.
pub struct Supervisor {
    config: BridgeConfig,
    registry: Arc<dyn VariableRegistry>,
    state: LifecycleState,
    fields: Arc<FieldMap>,
    bindings: BoundFields,
    report: BindReport,
    counters: Arc<IngestCounters>,
    listener: Option<ListenerHandle>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state)
            .field("descriptor", &self.config.descriptor_path())
            .field("fields", &self.fields.len())
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Create an idle supervisor writing into `registry`.
    #[must_use]
    pub fn new(config: BridgeConfig, registry: Arc<dyn VariableRegistry>) -> Self {
        Self {
            config,
            registry,
            state: LifecycleState::Idle,
            fields: Arc::new(FieldMap::default()),
            bindings: BoundFields::default(),
            report: BindReport::default(),
            counters: Arc::new(IngestCounters::new()),
            listener: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Field map; empty until [`Supervisor::load`] succeeds.
    #[must_use]
    pub fn fields(&self) -> &Arc<FieldMap> {
        &self.fields
    }

    /// Warnings from the last bind pass.
    #[must_use]
    pub fn bind_report(&self) -> &BindReport {
        &self.report
    }

    /// Shared ingestion counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<IngestCounters> {
        &self.counters
    }

    /// Address the worker receives on, while listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    /// Separator in effect: the descriptor's `var_separator`, else the
    /// configured one.
    #[must_use]
    pub fn separator(&self) -> char {
        self.fields.separator().unwrap_or(self.config.separator)
    }

    /// Load the descriptor and bind its fields. `Idle -> Loading -> Bound`.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Descriptor`] and moves to `Failed` if the
    /// descriptor is unusable, or [`SupervisorError::InvalidState`] when not
    /// idle.
    pub fn load(&mut self) -> SupervisorResult<()> {
        self.expect_state("load", LifecycleState::Idle)?;
        self.state = LifecycleState::Loading;

        let path = self.config.descriptor_path();
        let fields = match FieldMap::load(&path) {
            Ok(fields) => Arc::new(fields),
            Err(err) => {
                error!(path = %path.display(), error = %err, "cannot load protocol descriptor");
                self.state = LifecycleState::Failed;
                return Err(err.into());
            }
        };

        let (bindings, report) = VariableBinder::bind(fields.as_ref(), self.registry.as_ref());
        info!(
            path = %path.display(),
            properties = fields.len(),
            bound = bindings.bound_count(),
            unbound = bindings.unbound_count(),
            defective = fields.defective_count(),
            "protocol descriptor bound"
        );

        self.fields = fields;
        self.bindings = bindings;
        self.report = report;
        self.state = LifecycleState::Bound;
        Ok(())
    }

    /// Bind the socket and start the receive worker. `Bound -> Listening`.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Listener`] if the socket or worker cannot
    /// be set up; the supervisor stays `Bound` so the call may be retried.
    pub fn start(&mut self) -> SupervisorResult<()> {
        self.expect_state("start", LifecycleState::Bound)?;

        let listener = StreamListener::bind(self.config.listener_settings()).inspect_err(|err| {
            warn!(error = %err, "cannot start generic protocol listener");
        })?;
        let decoder = FrameDecoder::new(
            Arc::clone(&self.fields),
            self.bindings.clone(),
            self.separator(),
            Arc::clone(&self.counters),
        );
        let handle = listener.spawn(decoder)?;

        info!(local_addr = %handle.local_addr(), "listening for generic protocol frames");
        self.listener = Some(handle);
        self.state = LifecycleState::Listening;
        Ok(())
    }

    /// Load then start.
    ///
    /// # Errors
    ///
    /// See [`Supervisor::load`] and [`Supervisor::start`].
    pub fn run(&mut self) -> SupervisorResult<()> {
        self.load()?;
        self.start()
    }

    /// Stop the worker and release resources.
    ///
    /// From `Listening` this waits up to the configured shutdown deadline.
    /// From `Idle`, `Loading` or `Bound` it moves straight to `Stopped`.
    /// Stopping a stopped or failed supervisor does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::ShutdownTimeout`] and moves to `Failed` if
    /// the worker misses the deadline.
    pub fn stop(&mut self) -> SupervisorResult<()> {
        match self.state {
            LifecycleState::Stopped | LifecycleState::Failed => Ok(()),
            LifecycleState::Idle | LifecycleState::Loading | LifecycleState::Bound => {
                self.state = LifecycleState::Stopped;
                info!("supervisor stopped before listening");
                Ok(())
            }
            LifecycleState::Listening => {
                self.state = LifecycleState::Stopping;
                let result = match self.listener.take() {
                    Some(handle) => handle.stop(self.config.shutdown_timeout()),
                    None => Ok(()),
                };
                match result {
                    Ok(()) => {
                        self.state = LifecycleState::Stopped;
                        Ok(())
                    }
                    Err(err) => {
                        error!(error = %err, "supervisor failed to stop");
                        self.state = LifecycleState::Failed;
                        Err(err)
                    }
                }
            }
            LifecycleState::Stopping => Err(SupervisorError::InvalidState {
                operation: "stop",
                state: self.state,
            }),
        }
    }

    /// Point-in-time status.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::new(
            self.state,
            &self.fields,
            &self.bindings,
            self.counters.snapshot(),
        )
    }

    fn expect_state(&self, operation: &'static str, expected: LifecycleState) -> SupervisorResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SupervisorError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgfs_registry::MemoryRegistry;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn supervisor(xml_file: &str) -> Result<Supervisor, Box<dyn std::error::Error>> {
        let config = BridgeConfig::builder()
            .host("127.0.0.1")
            .port(0)
            .fg_root("/nonexistent/fgfs-root")
            .xml_file(xml_file)
            .build()?;
        Ok(Supervisor::new(config, Arc::new(MemoryRegistry::new())))
    }

    #[test]
    fn test_missing_descriptor_fails() -> TestResult {
        let mut sup = supervisor("missing.xml")?;
        let err = sup.run().err().ok_or("run should fail")?;
        assert!(matches!(err, SupervisorError::Descriptor(_)));
        assert_eq!(sup.state(), LifecycleState::Failed);
        assert!(sup.local_addr().is_none());

        sup.stop()?;
        assert_eq!(sup.state(), LifecycleState::Failed);
        Ok(())
    }

    #[test]
    fn test_wrong_state_rejected() -> TestResult {
        let mut sup = supervisor("missing.xml")?;
        assert!(matches!(
            sup.start(),
            Err(SupervisorError::InvalidState {
                operation: "start",
                state: LifecycleState::Idle,
            })
        ));
        assert_eq!(sup.state(), LifecycleState::Idle);
        Ok(())
    }

    #[test]
    fn test_stop_when_idle() -> TestResult {
        let mut sup = supervisor("missing.xml")?;
        sup.stop()?;
        assert_eq!(sup.state(), LifecycleState::Stopped);
        assert!(sup.load().is_err());
        Ok(())
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LifecycleState::Listening.to_string(), "listening");
        assert!(LifecycleState::Failed.is_terminal());
        assert!(!LifecycleState::Bound.is_terminal());
    }
}
