use std::fmt::Write;
use std::sync::Arc;

use alloy::primitives::Address;

use super::subscription::WaveSubscription;
use super::waves::Wave;
use super::WaveApp;

const HEADER: &str = "👋 WELCOME!";
const BIO: &str = "イーサリアムウォレットを接続して、「👋(wave)」を送ってください✨";

/// Mounted page. Owns the app state and, while mounted, the `NewWave`
/// listener.
pub struct Page {
    app: Arc<WaveApp>,
    subscription: Option<WaveSubscription>,
}

impl Page {
    /// Checks the wallet, loads the wave history and starts listening for new
    /// waves, in that order.
    pub async fn mount(app: WaveApp) -> Self {
        app.check_existing_connection().await;
        app.fetch_all_waves().await;
        let subscription = app.subscribe_new_waves().await;

        Self {
            app: Arc::new(app),
            subscription,
        }
    }

    pub fn app(&self) -> &Arc<WaveApp> {
        &self.app
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    pub async fn render(&self) -> String {
        let account = self.app.current_account().await;
        tracing::debug!("currentAccount: {:?}", account);

        let alert = self.app.take_alert().await;
        let waves = self.app.waves().snapshot().await;

        render_page(account, alert.as_deref(), &waves)
    }

    pub async fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }
    }
}

pub fn render_page(account: Option<Address>, alert: Option<&str>, waves: &[Wave]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{HEADER}");
    let _ = writeln!(out, "{BIO}");
    let _ = writeln!(out);

    let connect = match account {
        Some(_) => "[ Wallet Connected ]",
        None => "[ Connect Wallet ]",
    };
    let _ = writeln!(out, "[ Wave at Me ]  {connect}");

    if let Some(account) = account {
        let _ = writeln!(out, "Account: {account}");
    }
    if let Some(alert) = alert {
        let _ = writeln!(out, "! {alert}");
    }

    for wave in waves {
        let _ = writeln!(out);
        let _ = writeln!(out, "Address: {}", wave.address);
        let _ = writeln!(out, "Time:    {}", wave.timestamp.to_rfc3339());
        let _ = writeln!(out, "Message: {}", wave.message);
    }

    out
}
