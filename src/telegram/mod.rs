//! Telegram integration: trigger intake, operator commands and delivery.
//!
//! [`TelegramPoller`] long-polls `getUpdates` and routes each message
//! either to the operator command set (when it comes from the operator
//! chat and starts with `/`) or to the trigger classifier.
//! [`TelegramClient`] doubles as the [`crate::notify::NotificationSink`].

pub mod client;
pub mod commands;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

pub use client::TelegramClient;
pub use commands::OperatorCommand;
pub use types::{Message, Update};

use crate::service::{TriggerOutcome, WatchService};

/// Pause after a failed poll before retrying.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// What the poller did with one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// The message went through the trigger classifier.
    Trigger(TriggerOutcome),
    /// An operator command ran; the reply went to the operator chat.
    Command(String),
    /// The update carried no usable text.
    Skipped,
}

/// Inbound loop over the Bot API.
#[derive(Debug)]
pub struct TelegramPoller {
    client: Arc<TelegramClient>,
    service: Arc<WatchService>,
    operator_chat_id: Option<i64>,
}

impl TelegramPoller {
    /// Creates a poller.
    #[must_use]
    pub fn new(
        client: Arc<TelegramClient>,
        service: Arc<WatchService>,
        operator_chat_id: Option<i64>,
    ) -> Self {
        Self {
            client,
            service,
            operator_chat_id,
        }
    }

    /// Polls forever. Poll failures are logged and retried after a pause.
    pub async fn run(self) {
        let mut offset: Option<i64> = None;
        tracing::info!(operator_commands = self.operator_chat_id.is_some(), "telegram polling started");
        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!(error = %e, "telegram poll failed; retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };
            for update in updates {
                offset = Some(update.update_id.saturating_add(1));
                let action = dispatch_update(&update, &self.service, self.operator_chat_id).await;
                tracing::debug!(update_id = update.update_id, ?action, "update handled");
            }
        }
    }
}

/// Routes one update to the command set or the classifier.
pub async fn dispatch_update(
    update: &Update,
    service: &WatchService,
    operator_chat_id: Option<i64>,
) -> UpdateAction {
    let Some(message) = update.message() else {
        return UpdateAction::Skipped;
    };

    if operator_chat_id.is_some_and(|id| id == message.chat.id)
        && let Some(command) = message.body().and_then(OperatorCommand::parse)
    {
        let reply = command.execute(service).await;
        service
            .notifier()
            .send_text(&message.chat.id.to_string(), reply.clone());
        return UpdateAction::Command(reply);
    }

    match message.to_inbound() {
        Some(inbound) => UpdateAction::Trigger(service.handle_message(&inbound).await),
        None => UpdateAction::Skipped,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::types::Chat;
    use super::*;
    use crate::api::testing::test_state;

    const ADDR: &str = "ABC123defGHJK456mnpqRSTU789vwxyzABCDEFGH";
    const OPERATOR: i64 = 777;

    fn update(chat: i64, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                chat: Chat { id: chat },
                text: Some(text.to_string()),
                ..Message::default()
            }),
            channel_post: None,
        }
    }

    #[tokio::test]
    async fn transfer_message_arms_watch() {
        let (state, _peers) = test_state();
        let text = format!("Exchange Hot Wallet · SOL 99.99 https://solscan.io/account/{ADDR}");
        let action = dispatch_update(&update(-1001, &text), &state.watch_service, Some(OPERATOR)).await;
        assert!(matches!(action, UpdateAction::Trigger(TriggerOutcome::Armed { .. })));
    }

    #[tokio::test]
    async fn commands_only_from_operator_chat() {
        let (state, _peers) = test_state();

        let action = dispatch_update(&update(OPERATOR, "/watches"), &state.watch_service, Some(OPERATOR)).await;
        assert_eq!(action, UpdateAction::Command("No active watches.".to_string()));

        let action = dispatch_update(&update(5, "/watches"), &state.watch_service, Some(OPERATOR)).await;
        assert_eq!(action, UpdateAction::Trigger(TriggerOutcome::Ignored));

        let action = dispatch_update(&update(OPERATOR, "/watches"), &state.watch_service, None).await;
        assert_eq!(action, UpdateAction::Trigger(TriggerOutcome::Ignored));
    }

    #[tokio::test]
    async fn empty_update_is_skipped() {
        let (state, _peers) = test_state();
        let action = dispatch_update(&Update::default(), &state.watch_service, None).await;
        assert_eq!(action, UpdateAction::Skipped);
    }
}
