use std::sync::Arc;

use futures_lite::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::contract::{WaveContract, WaveEventStream};

use super::waves::{Wave, WaveLog};

/// Live `NewWave` listener. Dropping it stops delivery, `unsubscribe` also
/// waits until the forwarding task has exited.
pub struct WaveSubscription {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    // Handle the listener was registered through, torn down with it.
    contract: Arc<dyn WaveContract>,
}

impl WaveSubscription {
    pub(super) fn spawn(
        contract: Arc<dyn WaveContract>,
        events: WaveEventStream,
        waves: WaveLog,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(forward_new_waves(events, waves, shutdown_rx));

        tracing::info!("Subscribed to NewWave events on {}", contract.address());

        Self {
            shutdown,
            task: Some(task),
            contract,
        }
    }

    pub async fn unsubscribe(mut self) {
        let _ = self.shutdown.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("NewWave listener ended abnormally: {e}");
            }
        }

        tracing::info!("Unsubscribed from NewWave events on {}", self.contract.address());
    }
}

impl Drop for WaveSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown.send(true);
            task.abort();
        }
    }
}

async fn forward_new_waves(
    mut events: WaveEventStream,
    waves: WaveLog,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                return;
            }
            next = events.next() => {
                let Some(raw) = next else {
                    tracing::warn!("NewWave stream ended");
                    return;
                };

                tracing::info!("NewWave from {} at {}: {}", raw.waver, raw.timestamp, raw.message);

                match Wave::try_from(raw) {
                    Ok(wave) => waves.append(wave).await,
                    Err(e) => tracing::error!("Failed to process NewWave event: {e}"),
                }
            }
        }
    }
}
