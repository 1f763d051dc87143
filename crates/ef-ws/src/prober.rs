//! Liveness prober
//!
//! Sends an empty ping on a fixed period for as long as the session lives.
//! The peer's pongs are handled by the session's read loop, which extends
//! the read deadline. A failed ping is only logged: the emit loop's own
//! send failures are what end a session.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::Sink;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::cancel::CancelSignal;
use crate::writer::FrameWriter;

/// Ping counts for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub sent: u64,
    pub failed: u64,
}

/// Ping the peer every `period` until `cancel` fires.
///
/// The first ping goes out one full period after start.
pub async fn run<S>(
    writer: Arc<FrameWriter<S>>,
    cancel: CancelSignal,
    period: Duration,
    session_id: String,
) -> ProbeReport
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut report = ProbeReport::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match writer.send_ping().await {
                    Ok(()) => {
                        report.sent += 1;
                        debug!(session_id = %session_id, "Ping sent");
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(session_id = %session_id, "Ping failed: {}", e);
                    }
                }
            }
        }
    }

    debug!(
        session_id = %session_id,
        sent = report.sent,
        failed = report.failed,
        "Prober stopped"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::channel::mpsc;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Sink whose transport is already gone
    struct BrokenSink;

    impl Sink<Message> for BrokenSink {
        type Error = std::io::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_cadence() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let writer = Arc::new(FrameWriter::new(tx, Duration::from_secs(10)));
        let cancel = CancelSignal::new();
        let start = Instant::now();

        let prober = tokio::spawn(run(
            writer.clone(),
            cancel.clone(),
            Duration::from_secs(54),
            "test".to_string(),
        ));

        for n in 1..=3u64 {
            assert_eq!(rx.next().await, Some(Message::Ping(Default::default())));
            assert_eq!(start.elapsed(), Duration::from_secs(54 * n));
        }

        cancel.fire();
        let report = prober.await.unwrap();
        assert_eq!(report, ProbeReport { sent: 3, failed: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_tick() {
        let (tx, _rx) = mpsc::unbounded::<Message>();
        let writer = Arc::new(FrameWriter::new(tx, Duration::from_secs(10)));
        let cancel = CancelSignal::new();
        let start = Instant::now();

        let prober = tokio::spawn(run(
            writer.clone(),
            cancel.clone(),
            Duration::from_secs(54),
            "test".to_string(),
        ));

        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.fire();

        let report = prober.await.unwrap();
        assert_eq!(report, ProbeReport::default());
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(writer.frames_sent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ping_keeps_probing() {
        let writer = Arc::new(FrameWriter::new(BrokenSink, Duration::from_secs(10)));
        let cancel = CancelSignal::new();

        let prober = tokio::spawn(run(
            writer,
            cancel.clone(),
            Duration::from_secs(54),
            "test".to_string(),
        ));

        // ticks at 54s and 108s both fail, the loop keeps going
        tokio::time::sleep(Duration::from_secs(110)).await;
        assert!(!prober.is_finished());

        cancel.fire();
        let report = prober.await.unwrap();
        assert_eq!(report, ProbeReport { sent: 0, failed: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_stop_once_writer_closed() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let writer = Arc::new(FrameWriter::new(tx, Duration::from_secs(10)));
        let cancel = CancelSignal::new();

        let prober = tokio::spawn(run(
            writer.clone(),
            cancel.clone(),
            Duration::from_secs(54),
            "test".to_string(),
        ));

        writer.close().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.fire();

        let report = prober.await.unwrap();
        assert_eq!(report, ProbeReport { sent: 0, failed: 1 });
        assert_eq!(rx.next().await, Some(Message::Close(None)));
        assert_eq!(rx.next().await, None);
    }
}
