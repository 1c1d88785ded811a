//! Operator chat commands.

use crate::domain::AccountAddress;
use crate::notify::format::escape_html;
use crate::service::WatchService;

/// Command accepted from the operator chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// `/watches`: list live watches.
    ListWatches,
    /// `/cancel <address>`: cancel one watch.
    Cancel(String),
    /// `/cancel_all`: cancel every watch.
    CancelAll,
    /// `/cancel` without an argument, or an unknown `/command`.
    Help,
}

impl OperatorCommand {
    /// Parses a message text. Returns `None` for anything that is not a
    /// slash command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        // Group chats address commands as `/cmd@bot_name`.
        let name = head.split('@').next().unwrap_or(head);
        Some(match name {
            "watches" => Self::ListWatches,
            "cancel_all" => Self::CancelAll,
            "cancel" => match words.next() {
                Some(address) => Self::Cancel(address.to_string()),
                None => Self::Help,
            },
            _ => Self::Help,
        })
    }

    /// Runs the command and returns the HTML reply.
    pub async fn execute(&self, service: &WatchService) -> String {
        match self {
            Self::ListWatches => {
                let watches = service.list().await;
                if watches.is_empty() {
                    return "No active watches.".to_string();
                }
                let mut reply = format!("👀 Active watches: {}", watches.len());
                for watch in watches {
                    reply.push_str(&format!(
                        "\n<code>{}</code> [{}] until {}",
                        watch.address,
                        escape_html(&watch.rule_label),
                        watch.deadline.format("%Y-%m-%d %H:%M UTC")
                    ));
                }
                reply
            }
            Self::Cancel(raw) => {
                let address = match AccountAddress::parse(raw) {
                    Ok(address) => address,
                    Err(_) => return format!("Invalid address <code>{}</code>", escape_html(raw)),
                };
                match service.cancel(&address).await {
                    Ok(summary) => format!(
                        "🛑 Watch cancelled for <code>{}</code> [{}]",
                        summary.address,
                        escape_html(&summary.rule_label)
                    ),
                    Err(_) => format!("No active watch for <code>{address}</code>"),
                }
            }
            Self::CancelAll => {
                let count = service.cancel_all().await;
                format!("🛑 Cancelled {count} watch(es)")
            }
            Self::Help => {
                "Commands: /watches, /cancel &lt;address&gt;, /cancel_all".to_string()
            }
        }
    }
}
