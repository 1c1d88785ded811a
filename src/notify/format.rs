//! Telegram HTML rendering of watch notifications.

use super::{Notification, NotificationKind};

/// Renders [`Notification`]s as Telegram HTML messages.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    explorer_url: String,
}

impl MessageFormatter {
    /// Creates a formatter linking transactions under `explorer_url`
    /// (e.g. `https://solscan.io`).
    #[must_use]
    pub fn new(explorer_url: &str) -> Self {
        Self {
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
        }
    }

    /// Explorer URL of a transaction.
    #[must_use]
    pub fn tx_url(&self, signature: &str) -> String {
        format!("{}/tx/{signature}", self.explorer_url)
    }

    /// Renders one notification.
    #[must_use]
    pub fn render(&self, notification: &Notification) -> String {
        let label = escape_html(&notification.rule_label);
        let address = escape_html(notification.address.as_str());
        match &notification.kind {
            NotificationKind::Armed => format!(
                "⚠️ [{label}] Transfer detected\n💰 Address:\n<code>{address}</code>\n⏳ Waiting for mint..."
            ),
            NotificationKind::MintFound { mint, signature } => format!(
                "⚡️ [{label}] Mint detected!\n🪙 Mint: <code>{}</code>\n🔗 <a href=\"{}\">Open in explorer</a>",
                escape_html(mint),
                escape_html(&self.tx_url(signature)),
            ),
            NotificationKind::TimedOut => format!(
                "⏱ [{label}] Timer expired, no mint for\n<code>{address}</code>"
            ),
            NotificationKind::WatchFailed { reason } => format!(
                "❌ [{label}] Watch for <code>{address}</code> ended: {}",
                escape_html(reason)
            ),
        }
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new("https://solscan.io")
    }
}

/// Escapes the characters Telegram's HTML parse mode reserves.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
