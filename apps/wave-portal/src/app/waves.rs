use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};

use crate::contract::RawWave;
use crate::error::WaveError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    pub address: Address,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl TryFrom<RawWave> for Wave {
    type Error = WaveError;

    fn try_from(raw: RawWave) -> Result<Self, Self::Error> {
        let timestamp = i64::try_from(raw.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| {
                WaveError::Decode(format!("timestamp out of range: {}", raw.timestamp))
            })?;

        Ok(Self {
            address: raw.waver,
            timestamp,
            message: raw.message,
        })
    }
}

/// Waves shown on the page, historical ones first. Entries are never edited
/// or removed: the list is either replaced wholesale or appended to.
#[derive(Clone)]
pub struct WaveLog {
    waves: Arc<Mutex<Vec<Wave>>>,
    // Bumped on every change so subscribers never miss one.
    version: Arc<watch::Sender<u64>>,
}

impl Default for WaveLog {
    fn default() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            waves: Arc::default(),
            version: Arc::new(version),
        }
    }
}

impl WaveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, waves: Vec<Wave>) {
        *self.waves.lock().await = waves;
        self.version.send_modify(|v| *v += 1);
    }

    pub async fn append(&self, wave: Wave) {
        self.waves.lock().await.push(wave);
        self.version.send_modify(|v| *v += 1);
    }

    pub async fn snapshot(&self) -> Vec<Wave> {
        self.waves.lock().await.clone()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.waves.lock().await.len()
    }

    /// Change feed. `changed()` resolves once for any number of `replace` or
    /// `append` calls made since the receiver last looked.
    pub fn subscribe_updates(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}
