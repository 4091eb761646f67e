//! Async driver for a [`Client`].
//!
//! The client itself is synchronous.  [`SessionRunner`] owns it together with
//! the transport's event receiver and waits on three things at once:
//!
//! - the next [`TransportEvent`], handed to [`Client::handle`];
//! - the client's next timer deadline (ping, resize debounce), which triggers
//!   [`Client::poll_timers`];
//! - a shutdown future (Ctrl+C in the binary).
//!
//! Everything runs on one task, so the client never needs a lock.

use std::future::Future;
use std::time::Instant;

use anyhow::bail;
use tokio::sync::mpsc;
use tokio::time;
use tracing::info;

use crate::application::{Client, TransportEvent};

/// Owns a client and feeds it transport events and timer ticks.
pub struct SessionRunner {
    client: Client,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl SessionRunner {
    pub fn new(client: Client, events: mpsc::UnboundedReceiver<TransportEvent>) -> Self {
        Self { client, events }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Drives the client until `shutdown` completes, then disconnects it.
    ///
    /// Queued transport events are handled before the shutdown is observed.
    ///
    /// # Errors
    ///
    /// Fails if the transport's event channel closes, which means the
    /// transport was dropped while the session was still running.
    pub async fn run_until<F>(&mut self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let deadline = self.client.next_deadline();
            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(event) => self.client.handle(event),
                    None => bail!("transport event channel closed"),
                },
                _ = sleep_until(deadline) => self.client.poll_timers(Instant::now()),
                _ = &mut shutdown => {
                    info!("shutting down session");
                    self.client.disconnect(false);
                    self.client.destroy();
                    return Ok(());
                }
            }
        }
    }
}

/// Sleeps until `deadline`, or forever if there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;
    use xpra_core::ServerPacket;

    use crate::application::{ClientEvent, Collaborators, ConfigOverrides, EventKind, SessionState};
    use crate::infrastructure::input_translation::{XpraKeyboard, XpraMouse};
    use crate::infrastructure::renderer::mock::RecordingRendererFactory;
    use crate::infrastructure::transport::mock::MockTransport;

    fn client(transport: &MockTransport) -> Client {
        Client::new(
            ConfigOverrides::default(),
            Collaborators {
                transport: Box::new(transport.clone()),
                keyboard: Box::new(XpraKeyboard::new()),
                mouse: Box::new(XpraMouse::new()),
                renderers: Box::new(RecordingRendererFactory::new()),
            },
        )
    }

    #[tokio::test]
    async fn test_runner_handles_queued_events_before_shutdown() {
        // Arrange
        let transport = MockTransport::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut runner = SessionRunner::new(client(&transport), rx);
        runner.client_mut().connect(&ConfigOverrides::default());
        tx.send(TransportEvent::Open).unwrap();
        tx.send(TransportEvent::Packet(ServerPacket::StartupComplete)).unwrap();

        let connected = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&connected);
        runner.client_mut().on(EventKind::State, move |e| {
            if *e == ClientEvent::State(SessionState::Connected) {
                *flag.lock().unwrap() = true;
            }
        });

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        stop_tx.send(()).unwrap();

        // Act
        runner
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await
            .unwrap();

        // Assert
        assert!(*connected.lock().unwrap());
        assert_eq!(runner.client().state(), SessionState::Disconnected);
        assert_eq!(transport.sent_names(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_runner_fails_when_transport_channel_closes() {
        let transport = MockTransport::new();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(tx);
        let mut runner = SessionRunner::new(client(&transport), rx);

        let result = runner.run_until(std::future::pending()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sleep_until_past_deadline_returns_immediately() {
        time::timeout(
            std::time::Duration::from_secs(1),
            sleep_until(Some(Instant::now())),
        )
        .await
        .unwrap();
    }
}
