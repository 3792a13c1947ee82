//! Signal handling for capture mode

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Interrupt handler for the capture loop.
///
/// SIGINT and SIGTERM each become one message on the channel, so the loop
/// can treat the first interrupt as a graceful stop and a repeat as a hard
/// abort.
pub struct ShutdownSignal {
    receiver: mpsc::Receiver<()>,
}

impl ShutdownSignal {
    /// Install SIGINT and SIGTERM handlers
    pub fn install() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(4);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            loop {
                if sigint.recv().await.is_none() {
                    break;
                }
                if tx_int.send(()).await.is_err() {
                    break;
                }
            }
        });

        let tx_term = tx;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            loop {
                if sigterm.recv().await.is_none() {
                    break;
                }
                if tx_term.send(()).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self { receiver: rx })
    }

    /// Wait for the next interrupt
    pub async fn recv(&mut self) -> Option<()> {
        self.receiver.recv().await
    }
}
