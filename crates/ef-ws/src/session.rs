//! WebSocket session driver
//!
//! One `Session` per upgraded connection. Running it:
//!
//! - spawns the liveness prober as its own task,
//! - streams the event frames to the peer, one per emit interval,
//! - reads inbound frames, extending the read deadline on every pong,
//! - tears everything down as soon as either side of the connection fails.
//!
//! The emit loop and the read loop run concurrently inside the session's
//! task; the prober runs beside them. They share the frame writer and a
//! one-shot cancellation signal.

use std::fmt::{self, Display};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::Message;
use ef_core::SessionConfig;
use futures::{Sink, Stream, StreamExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::payload;
use crate::prober::{self, ProbeReport};
use crate::writer::FrameWriter;
use crate::WsError;

/// Timing of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Deadline for writing one frame
    pub write_wait: Duration,
    /// Read deadline window, renewed by every pong
    pub pong_wait: Duration,
    /// Delay between two pings
    pub ping_period: Duration,
    /// Delay between two event frames
    pub emit_interval: Duration,
}

impl SessionTiming {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            write_wait: config.write_wait(),
            pong_wait: config.pong_wait(),
            ping_period: config.ping_period(),
            emit_interval: config.emit_interval(),
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Why a session ended
#[derive(Debug)]
pub enum SessionEnd {
    /// Writing an event frame failed
    SendFailed(WsError),
    /// The peer sent a close frame or the stream ended
    PeerClosed,
    /// No pong arrived within the read deadline
    ReadDeadlineElapsed,
    /// Reading from the connection failed
    ReadFailed(String),
    /// The cancellation signal was fired from outside the session
    Cancelled,
}

impl Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed(e) => write!(f, "send failed: {}", e),
            Self::PeerClosed => write!(f, "closed by peer"),
            Self::ReadDeadlineElapsed => write!(f, "read deadline elapsed"),
            Self::ReadFailed(e) => write!(f, "read failed: {}", e),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Rolling read deadline
#[derive(Debug)]
pub struct ReadDeadline {
    at: Mutex<Instant>,
}

impl ReadDeadline {
    pub fn new(window: Duration) -> Self {
        Self {
            at: Mutex::new(Instant::now() + window),
        }
    }

    /// Move the deadline to `now + window`
    pub fn extend(&self, window: Duration) -> Instant {
        let next = Instant::now() + window;
        let mut at = self.at.lock().unwrap_or_else(|e| e.into_inner());
        *at = next;
        next
    }

    pub fn instant(&self) -> Instant {
        *self.at.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// State of one upgraded connection
pub struct Session<S> {
    id: String,
    writer: Arc<FrameWriter<S>>,
    cancel: CancelSignal,
    read_deadline: ReadDeadline,
    timing: SessionTiming,
}

impl<S> Session<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    /// Create a session over the write half of a connection
    pub fn new(sink: S, timing: SessionTiming) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            writer: Arc::new(FrameWriter::new(sink, timing.write_wait)),
            cancel: CancelSignal::new(),
            read_deadline: ReadDeadline::new(timing.pong_wait),
            timing,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle to the session's cancellation signal
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Drive the session until it ends.
    ///
    /// `inbound` is the read half of the same connection. On return the
    /// writer is closed, the prober has stopped and the cancellation signal
    /// has fired.
    pub async fn run<R, E>(self, inbound: R) -> SessionEnd
    where
        R: Stream<Item = std::result::Result<Message, E>> + Unpin,
        E: Display,
    {
        info!(session_id = %self.id, "Session started");

        let prober = tokio::spawn(prober::run(
            self.writer.clone(),
            self.cancel.clone(),
            self.timing.ping_period,
            self.id.clone(),
        ));

        let (emitted, read) = tokio::join!(self.emit_loop(), self.read_loop(inbound));

        self.cancel.fire();
        self.writer.close().await;

        let probes = match prober.await {
            Ok(report) => report,
            Err(e) => {
                warn!(session_id = %self.id, "Prober task failed: {}", e);
                ProbeReport::default()
            }
        };

        let end = emitted.or(read).unwrap_or(SessionEnd::Cancelled);

        info!(
            session_id = %self.id,
            reason = %end,
            frames_sent = self.writer.frames_sent(),
            pings_sent = probes.sent,
            pings_failed = probes.failed,
            "Session ended"
        );

        end
    }

    /// Send the event frames in order, forever, until a send fails or the
    /// session is cancelled.
    async fn emit_loop(&self) -> Option<SessionEnd> {
        for frame in payload::event_cycle() {
            if self.cancel.is_fired() {
                return None;
            }

            let sent = match frame.to_json() {
                Ok(text) => self.writer.send_text(text).await,
                Err(e) => Err(e.into()),
            };

            if let Err(e) = sent {
                warn!(session_id = %self.id, "Event send failed: {}", e);
                self.writer.mark_closed();
                self.cancel.fire();
                return Some(SessionEnd::SendFailed(e));
            }

            tokio::select! {
                _ = tokio::time::sleep(self.timing.emit_interval) => {}
                _ = self.cancel.cancelled() => return None,
            }
        }

        None
    }

    /// Read inbound frames until the peer goes away or the read deadline
    /// lapses. Pongs extend the deadline; everything else is ignored.
    async fn read_loop<R, E>(&self, mut inbound: R) -> Option<SessionEnd>
    where
        R: Stream<Item = std::result::Result<Message, E>> + Unpin,
        E: Display,
    {
        loop {
            let deadline = self.read_deadline.instant();

            let next = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                next = timeout_at(deadline, inbound.next()) => next,
            };

            let end = match next {
                Ok(Some(Ok(Message::Pong(_)))) => {
                    self.read_deadline.extend(self.timing.pong_wait);
                    debug!(session_id = %self.id, "Pong received");
                    continue;
                }
                Ok(Some(Ok(Message::Close(frame)))) => {
                    debug!(session_id = %self.id, "Close frame received: {:?}", frame);
                    SessionEnd::PeerClosed
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => SessionEnd::ReadFailed(e.to_string()),
                Ok(None) => SessionEnd::PeerClosed,
                Err(_) => SessionEnd::ReadDeadlineElapsed,
            };

            self.cancel.fire();
            return Some(end);
        }
    }
}
