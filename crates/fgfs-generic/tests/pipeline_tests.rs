//! End-to-end tests: real loopback UDP into a `MemoryRegistry`.
//!
//! Each test runs a supervisor against the bundled `fixgw.xml` descriptor:
//!
//! | pos | key  | conversion      |
//! |-----|------|-----------------|
//! | 0   | ALT  | none            |
//! | 1   | IAS  | none            |
//! | 2   | OAT  | ftoc            |
//! | 3   | ALTM | multiply 0.3048 |
//! | 4   | ROLL | none (unbound)  |
//! | 5   | VS   | unknown (defective) |

use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fgfs_generic::{BindingWarning, BridgeConfig, LifecycleState, Supervisor};
use fgfs_registry::{MemoryRegistry, Value, ValueKind};

type TestResult = Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ─────────────────────────────────────────────────────────────────

struct Harness {
    registry: Arc<MemoryRegistry>,
    supervisor: Supervisor,
    target: SocketAddr,
    client: UdpSocket,
}

impl Harness {
    fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Arc::new(MemoryRegistry::new());
        for key in ["ALT", "IAS", "OAT", "ALTM", "VS"] {
            registry.define(key, ValueKind::Float)?;
        }

        let config = BridgeConfig::builder()
            .host("127.0.0.1")
            .port(0)
            .fg_root(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
            .xml_file("fixgw.xml")
            .receive_timeout_ms(50)
            .shutdown_timeout_ms(2000)
            .build()?;

        let mut supervisor = Supervisor::new(config, registry.clone());
        supervisor.run()?;
        let target = supervisor.local_addr().ok_or("listener has no address")?;
        let client = UdpSocket::bind("127.0.0.1:0")?;

        Ok(Self {
            registry,
            supervisor,
            target,
            client,
        })
    }

    fn send(&self, bytes: &[u8]) -> TestResult {
        self.client.send_to(bytes, self.target)?;
        Ok(())
    }

    fn wait_for_frames(&self, frames: u64) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.supervisor.counters().frames_received() >= frames {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn float(&self, key: &str) -> Option<f64> {
        self.registry.value(key).and_then(|v| v.as_f64())
    }
}

fn close(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|v| (v - expected).abs() < 1e-6)
}

// ─── Framing over the wire ───────────────────────────────────────────────────

#[test]
fn frame_split_across_datagrams_is_applied_once() -> TestResult {
    let mut h = Harness::start()?;
    assert_eq!(h.supervisor.state(), LifecycleState::Listening);
    assert_eq!(
        h.supervisor.bind_report().warnings,
        vec![BindingWarning {
            position: 4,
            key: "ROLL".to_string(),
        }]
    );

    h.send(b"1500,12")?;
    h.send(b"0,212,1000,5,7\n")?;
    assert!(h.wait_for_frames(1), "frame never arrived");

    assert!(close(h.float("ALT"), 1500.0));
    assert!(close(h.float("IAS"), 120.0));
    assert!(close(h.float("OAT"), 100.0));
    assert!(close(h.float("ALTM"), 304.8));
    // Defective conversion: never written.
    assert_eq!(h.registry.value("VS"), Some(Value::Float(0.0)));

    h.supervisor.stop()?;
    let status = h.supervisor.status();
    assert_eq!(status.messages.received, 1);
    assert_eq!(status.counters.datagrams_received, 2);
    assert_eq!(status.state, LifecycleState::Stopped);
    Ok(())
}

#[test]
fn several_frames_in_one_datagram_apply_in_order() -> TestResult {
    let mut h = Harness::start()?;
    h.send(b"1,2,32,0\n3,4,212,10\n")?;
    assert!(h.wait_for_frames(2), "frames never arrived");

    assert!(close(h.float("ALT"), 3.0));
    assert!(close(h.float("IAS"), 4.0));
    assert!(close(h.float("OAT"), 100.0));
    assert!(close(h.float("ALTM"), 3.048));
    h.supervisor.stop()?;
    Ok(())
}

#[test]
fn short_frame_updates_only_leading_fields() -> TestResult {
    let mut h = Harness::start()?;
    h.send(b"100,90,50,1000\n")?;
    h.send(b"500\n")?;
    assert!(h.wait_for_frames(2), "frames never arrived");

    assert!(close(h.float("ALT"), 500.0));
    assert!(close(h.float("IAS"), 90.0));
    assert!(close(h.float("OAT"), 10.0));
    assert!(close(h.float("ALTM"), 304.8));
    h.supervisor.stop()?;
    Ok(())
}

#[test]
fn non_numeric_converted_field_keeps_previous_value() -> TestResult {
    let mut h = Harness::start()?;
    h.send(b"100,100,212,10\n")?;
    h.send(b"200,110,warm,20\n")?;
    assert!(h.wait_for_frames(2), "frames never arrived");

    assert!(close(h.float("OAT"), 100.0));
    assert!(close(h.float("ALT"), 200.0));
    assert!(close(h.float("IAS"), 110.0));
    assert!(close(h.float("ALTM"), 6.096));

    h.supervisor.stop()?;
    assert_eq!(h.supervisor.status().counters.conversion_errors, 1);
    Ok(())
}

#[test]
fn invalid_utf8_frame_is_counted_and_skipped() -> TestResult {
    let mut h = Harness::start()?;
    h.send(b"\xff\xfe\n42\n")?;
    assert!(h.wait_for_frames(2), "frames never arrived");

    assert!(close(h.float("ALT"), 42.0));
    h.supervisor.stop()?;
    let counters = h.supervisor.status().counters;
    assert_eq!(counters.frames_received, 2);
    assert_eq!(counters.malformed_frames, 1);
    Ok(())
}

#[test]
fn surplus_values_are_ignored() -> TestResult {
    let mut h = Harness::start()?;
    h.send(b"1,2,32,0,5,6,7,8,9\n")?;
    assert!(h.wait_for_frames(1), "frame never arrived");

    assert!(close(h.float("ALT"), 1.0));
    h.supervisor.stop()?;
    assert_eq!(h.supervisor.status().counters.fields_written, 4);
    Ok(())
}
