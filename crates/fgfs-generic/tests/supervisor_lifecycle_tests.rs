//! Lifecycle tests for `Supervisor`: state transitions, retry after a failed
//! start, and shutdown against a worker that will not stop in time.

use std::net::UdpSocket;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use fgfs_generic::{BridgeConfig, LifecycleState, Supervisor, SupervisorError};
use fgfs_registry::{MemoryRegistry, RegistryResult, Slot, Value, ValueKind, VariableRegistry};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn config(host: &str, shutdown_timeout_ms: u64) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    Ok(BridgeConfig::builder()
        .host(host)
        .port(0)
        .fg_root(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
        .xml_file("fixgw.xml")
        .receive_timeout_ms(50)
        .shutdown_timeout_ms(shutdown_timeout_ms)
        .build()?)
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[test]
fn load_start_stop_walks_every_state() -> TestResult {
    let mut sup = Supervisor::new(config("127.0.0.1", 2000)?, Arc::new(MemoryRegistry::new()));
    assert_eq!(sup.state(), LifecycleState::Idle);

    sup.load()?;
    assert_eq!(sup.state(), LifecycleState::Bound);
    assert_eq!(sup.fields().len(), 6);
    // Empty registry: every keyed field is reported.
    assert_eq!(sup.bind_report().warnings.len(), 6);

    sup.start()?;
    assert_eq!(sup.state(), LifecycleState::Listening);
    assert!(sup.local_addr().is_some());

    sup.stop()?;
    assert_eq!(sup.state(), LifecycleState::Stopped);
    assert!(sup.local_addr().is_none());

    // Idempotent once stopped.
    sup.stop()?;
    assert_eq!(sup.state(), LifecycleState::Stopped);
    Ok(())
}

#[test]
fn wrong_root_fails_before_binding() -> TestResult {
    let config = BridgeConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .fg_root(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
        .xml_file("wrong_root.xml")
        .build()?;
    let mut sup = Supervisor::new(config, Arc::new(MemoryRegistry::new()));

    assert!(matches!(sup.run(), Err(SupervisorError::Descriptor(_))));
    assert_eq!(sup.state(), LifecycleState::Failed);
    assert!(sup.fields().is_empty());
    assert!(sup.local_addr().is_none());
    Ok(())
}

#[test]
fn failed_start_stays_bound() -> TestResult {
    let mut sup = Supervisor::new(
        config("no such host.invalid", 2000)?,
        Arc::new(MemoryRegistry::new()),
    );
    sup.load()?;

    assert!(matches!(sup.start(), Err(SupervisorError::Listener(_))));
    assert_eq!(sup.state(), LifecycleState::Bound);

    sup.stop()?;
    assert_eq!(sup.state(), LifecycleState::Stopped);
    Ok(())
}

#[test]
fn status_reports_binding_counts() -> TestResult {
    let registry = Arc::new(MemoryRegistry::new());
    registry.define("ALT", ValueKind::Float)?;
    registry.define("VS", ValueKind::Float)?;

    let mut sup = Supervisor::new(config("127.0.0.1", 2000)?, registry);
    sup.load()?;

    let status = sup.status();
    assert_eq!(status.properties, 6);
    assert_eq!(status.bound, 2);
    assert_eq!(status.unbound, 4);
    assert_eq!(status.defective, 1);
    assert_eq!(status.messages.received, 0);
    assert_eq!(status.messages.sent, 0);
    assert_eq!(status.state, LifecycleState::Bound);
    Ok(())
}

// ─── Shutdown deadline ───────────────────────────────────────────────────────

#[test]
fn idle_worker_stops_well_before_its_read_timeout() -> TestResult {
    let config = BridgeConfig::builder()
        .host("0.0.0.0")
        .port(0)
        .fg_root(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
        .xml_file("fixgw.xml")
        .receive_timeout_ms(3000)
        .shutdown_timeout_ms(3000)
        .build()?;
    let mut sup = Supervisor::new(config, Arc::new(MemoryRegistry::new()));
    sup.run()?;
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    sup.stop()?;
    assert_eq!(sup.state(), LifecycleState::Stopped);
    assert!(started.elapsed() < Duration::from_millis(2500));
    Ok(())
}

/// A slot whose `set` blocks until the test opens the gate.
#[derive(Debug)]
struct GatedSlot {
    entered: Sender<()>,
    gate: Receiver<()>,
}

impl Slot for GatedSlot {
    fn key(&self) -> &str {
        "ALT"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Float
    }

    fn get(&self) -> Value {
        Value::Float(0.0)
    }

    fn set(&self, _value: Value) -> RegistryResult<()> {
        self.entered.try_send(()).ok();
        self.gate.recv().ok();
        Ok(())
    }
}

struct GatedRegistry {
    slot: Arc<GatedSlot>,
}

impl VariableRegistry for GatedRegistry {
    fn get(&self, key: &str) -> Option<Arc<dyn Slot>> {
        (key == "ALT").then(|| Arc::clone(&self.slot) as Arc<dyn Slot>)
    }
}

#[test]
fn unresponsive_worker_fails_after_deadline() -> TestResult {
    let (entered_tx, entered_rx) = channel::bounded(1);
    let (gate_tx, gate_rx) = channel::bounded(1);
    let registry = Arc::new(GatedRegistry {
        slot: Arc::new(GatedSlot {
            entered: entered_tx,
            gate: gate_rx,
        }),
    });

    let mut sup = Supervisor::new(config("127.0.0.1", 100)?, registry);
    sup.run()?;
    let target = sup.local_addr().ok_or("listener has no address")?;

    let client = UdpSocket::bind("127.0.0.1:0")?;
    client.send_to(b"1500\n", target)?;
    entered_rx.recv_timeout(Duration::from_secs(5))?;

    let result = sup.stop();
    assert!(matches!(
        result,
        Err(SupervisorError::ShutdownTimeout(deadline)) if deadline == Duration::from_millis(100)
    ));
    assert_eq!(sup.state(), LifecycleState::Failed);

    // Failed is terminal; stopping again is a no-op.
    sup.stop()?;
    assert_eq!(sup.state(), LifecycleState::Failed);

    // Let the detached worker finish.
    gate_tx.send(())?;
    Ok(())
}
