//! UDP endpoint and receive worker.
//!
//! The worker is a dedicated named thread. Its only blocking point is a
//! `recv` bounded by the socket read timeout, so it observes the stop flag at
//! least once per timeout interval.

use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, error, info, warn};

use crate::decoder::FrameDecoder;
use crate::error::{ListenerError, SupervisorError};
use crate::framing::FrameAssembler;

/// Name given to the receive worker thread.
pub const WORKER_THREAD_NAME: &str = "fgfs-udp-rx";

/// Socket and loop parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    /// Host or address to bind.
    pub host: String,
    /// UDP port; 0 picks an ephemeral port.
    pub port: u16,
    /// Socket read timeout; bounds how long a stop request can go unseen.
    pub receive_timeout: Duration,
    /// Bytes requested per `recv`.
    pub recv_buffer_size: usize,
    /// Longest accepted frame.
    pub max_frame_len: usize,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5500,
            receive_timeout: Duration::from_secs(2),
            recv_buffer_size: 1024,
            max_frame_len: crate::framing::DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// A bound UDP endpoint that has not started receiving yet.
#[derive(Debug)]
pub struct StreamListener {
    socket: UdpSocket,
    local_addr: SocketAddr,
    settings: ListenerSettings,
}

impl StreamListener {
    /// Bind the endpoint with address reuse and broadcast reception enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Resolve`] when the host does not resolve and
    /// [`ListenerError::Bind`] when socket setup fails.
    pub fn bind(settings: ListenerSettings) -> Result<Self, ListenerError> {
        let endpoint = format!("{}:{}", settings.host, settings.port);
        let addr = (settings.host.as_str(), settings.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ListenerError::Resolve(endpoint))?;

        let socket = open_socket(addr, settings.receive_timeout)
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        info!(%local_addr, "bound generic protocol listener");
        Ok(Self {
            socket,
            local_addr,
            settings,
        })
    }

    /// Address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the receive worker, handing it the socket and the decoder.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Spawn`] if the thread cannot be created.
    pub fn spawn(self, decoder: FrameDecoder) -> Result<ListenerHandle, ListenerError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let local_addr = self.local_addr;

        let worker_cancel = Arc::clone(&cancel);
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let socket = self.socket;
                receive_loop(
                    |buf| socket.recv(buf),
                    &self.settings,
                    &decoder,
                    &worker_cancel,
                );
                if done_tx.send(()).is_err() {
                    debug!("supervisor stopped waiting for the receive worker");
                }
            })
            .map_err(ListenerError::Spawn)?;

        Ok(ListenerHandle {
            cancel,
            done: done_rx,
            thread: Some(thread),
            local_addr,
        })
    }
}

fn open_socket(addr: SocketAddr, timeout: Duration) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    if addr.is_ipv4() {
        socket.set_broadcast(true)?;
    }
    socket.set_read_timeout(Some(timeout))?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

/// Receive until `cancel` is raised, feeding every datagram through the
/// assembler into `decoder`.
///
/// `recv` is one bounded-timeout read. Timeouts and interrupts only re-check
/// the flag; other errors are counted and the loop carries on.
fn receive_loop<F>(
    mut recv: F,
    settings: &ListenerSettings,
    decoder: &FrameDecoder,
    cancel: &AtomicBool,
) where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let counters = Arc::clone(decoder.counters());
    let mut buf = vec![0u8; settings.recv_buffer_size.max(1)];
    let mut assembler = FrameAssembler::new(settings.max_frame_len);
    let mut reported_error = false;

    debug!("receive worker started");
    while !cancel.load(Ordering::Acquire) {
        match recv(&mut buf) {
            // A stop request may have woken us with an empty datagram.
            Ok(_) if cancel.load(Ordering::Acquire) => break,
            Ok(len) => {
                counters.record_datagram(len);
                let Some(data) = buf.get(..len) else {
                    continue;
                };
                assembler.push(data, |event| {
                    decoder.dispatch(event);
                });
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                counters.inc_receive_error();
                if reported_error {
                    debug!("generic protocol receive error: {e}");
                } else {
                    warn!("generic protocol receive error: {e}");
                    reported_error = true;
                }
            }
        }
    }
    debug!(
        frames = counters.frames_received(),
        pending = assembler.pending(),
        "receive worker exiting"
    );
}

/// Send an empty datagram to the worker's socket so a blocked `recv`
/// returns without waiting out the read timeout.
fn wake(local_addr: SocketAddr) -> io::Result<()> {
    let target = match local_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), local_addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), local_addr.port())
        }
        _ => local_addr,
    };
    let bind: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    UdpSocket::bind(bind)?.send_to(&[], target)?;
    Ok(())
}

/// Owner-side handle to a running receive worker.
#[derive(Debug)]
pub struct ListenerHandle {
    cancel: Arc<AtomicBool>,
    done: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl ListenerHandle {
    /// Address the worker receives on.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Raise the stop flag without waiting.
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the worker and wait up to `deadline` for it to exit.
    ///
    /// The worker is woken with an empty datagram; if that cannot be sent it
    /// still sees the stop flag within one read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::ShutdownTimeout`] when the worker is still
    /// running at the deadline. The thread is detached in that case.
    pub fn stop(mut self, deadline: Duration) -> Result<(), SupervisorError> {
        self.request_stop();
        if let Err(e) = wake(self.local_addr) {
            debug!("cannot wake receive worker, waiting for its read timeout: {e}");
        }

        match self.done.recv_timeout(deadline) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(thread) = self.thread.take()
                    && thread.join().is_err()
                {
                    error!("receive worker panicked");
                }
                info!("generic protocol listener stopped");
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                error!(?deadline, "receive worker did not stop in time, detaching it");
                drop(self.thread.take());
                Err(SupervisorError::ShutdownTimeout(deadline))
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.request_stop();
    }
}
