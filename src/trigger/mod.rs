//! Trigger classification: inbound message → (address, rule).
//!
//! A single [`TriggerClassifier`] consumes the whole rule table. The first
//! rule whose counterparty marker and amount both appear in the message
//! wins; the watched address comes from an explorer `/account/<address>`
//! link, preferring structured hyperlink entities (the last qualifying one)
//! over links written out in the text.

use regex::Regex;

use crate::domain::{AccountAddress, Rule};
use crate::error::WatchError;

/// Explorer account link, capturing a base-58 address of 32–44 characters
/// that is not followed by further alphanumerics.
const ACCOUNT_LINK_PATTERN: &str =
    r"/account/([1-9A-HJ-NP-Za-km-z]{32,44})(?:[^0-9A-Za-z]|$)";

/// Platform-neutral inbound notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Originating chat, when known.
    pub chat_id: Option<i64>,
    /// Message text (or caption).
    pub text: String,
    /// Targets of structured hyperlink entities, in message order.
    pub links: Vec<String>,
}

impl InboundMessage {
    /// Plain-text message without entities.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            text: text.into(),
            links: Vec::new(),
        }
    }
}

/// A classified trigger ready to arm a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Address to watch.
    pub address: AccountAddress,
    /// Rule that matched.
    pub rule: Rule,
}

/// Matches inbound messages against the rule table.
#[derive(Debug, Clone)]
pub struct TriggerClassifier {
    rules: Vec<Rule>,
    account_link: Regex,
}

impl TriggerClassifier {
    /// Builds a classifier over `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidRule`] if any rule fails validation or
    /// two rules share a label.
    pub fn new(rules: Vec<Rule>) -> Result<Self, WatchError> {
        for (i, rule) in rules.iter().enumerate() {
            rule.validate()?;
            if rules.iter().skip(i + 1).any(|other| other.label == rule.label) {
                return Err(WatchError::InvalidRule(format!(
                    "duplicate rule label {}",
                    rule.label
                )));
            }
        }
        let account_link = Regex::new(ACCOUNT_LINK_PATTERN)
            .map_err(|e| WatchError::Internal(format!("account link pattern: {e}")))?;
        Ok(Self {
            rules,
            account_link,
        })
    }

    /// The rule table, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classifies `message`; `None` means "not a trigger" and is never an
    /// error.
    #[must_use]
    pub fn classify(&self, message: &InboundMessage) -> Option<Trigger> {
        let rule = self.rules.iter().find(|rule| rule.matches(&message.text))?;
        let address = self.extract_address(message)?;
        Some(Trigger {
            address,
            rule: rule.clone(),
        })
    }

    /// Extracts the watched address from hyperlink entities (last match
    /// wins) or, failing that, from the first link in the text.
    #[must_use]
    pub fn extract_address(&self, message: &InboundMessage) -> Option<AccountAddress> {
        message
            .links
            .iter()
            .filter_map(|link| self.address_in(link))
            .last()
            .or_else(|| self.address_in(&message.text))
    }

    fn address_in(&self, haystack: &str) -> Option<AccountAddress> {
        self.account_link
            .captures_iter(haystack)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| AccountAddress::parse(m.as_str()).ok())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::rule::tests::make_rule;

    const ADDR_A: &str = "ABC123defGHJK456mnpqRSTU789vwxyzABCDEFGH";
    const ADDR_B: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn classifier() -> TriggerClassifier {
        let mut silent = make_rule("Binance 99", 6);
        silent.match_text = "Desk 50 · SOL".to_string();
        silent.amount = "68.99".to_string();
        silent.announce_armed = false;
        let Ok(c) = TriggerClassifier::new(vec![make_rule("Kucoin 1", 20), silent]) else {
            panic!("valid rules rejected");
        };
        c
    }

    #[test]
    fn test_addresses_are_valid() {
        assert_eq!(ADDR_A.len(), 40);
        assert!(AccountAddress::parse(ADDR_A).is_ok());
        assert!(AccountAddress::parse(ADDR_B).is_ok());
    }

    #[test]
    fn classifies_text_link() {
        let msg = InboundMessage::text(format!(
            "Exchange Hot Wallet · SOL sent 99.99 SOL\nhttps://solscan.io/account/{ADDR_A}"
        ));
        let Some(trigger) = classifier().classify(&msg) else {
            panic!("expected trigger");
        };
        assert_eq!(trigger.address.as_str(), ADDR_A);
        assert_eq!(trigger.rule.label, "Kucoin 1");
    }

    #[test]
    fn second_rule_matches_its_own_text() {
        let msg = InboundMessage::text(format!(
            "Desk 50 · SOL sent 68.99 SOL https://solscan.io/account/{ADDR_B}"
        ));
        let Some(trigger) = classifier().classify(&msg) else {
            panic!("expected trigger");
        };
        assert_eq!(trigger.rule.label, "Binance 99");
        assert!(!trigger.rule.announce_armed);
    }

    #[test]
    fn last_entity_link_wins() {
        let msg = InboundMessage {
            chat_id: Some(1),
            text: "Exchange Hot Wallet · SOL sent 99.99 SOL to wallet".to_string(),
            links: vec![
                format!("https://solscan.io/account/{ADDR_A}"),
                "https://solscan.io/tx/abc".to_string(),
                format!("https://solscan.io/account/{ADDR_B}"),
            ],
        };
        let Some(addr) = classifier().extract_address(&msg) else {
            panic!("expected address");
        };
        assert_eq!(addr.as_str(), ADDR_B);
    }

    #[test]
    fn entity_link_preferred_over_text() {
        let msg = InboundMessage {
            chat_id: None,
            text: format!("see https://solscan.io/account/{ADDR_A}"),
            links: vec![format!("https://solscan.io/account/{ADDR_B}")],
        };
        let addr = classifier().extract_address(&msg);
        assert_eq!(addr.map(String::from), Some(ADDR_B.to_string()));
    }

    #[test]
    fn no_rule_or_no_address_is_ignored() {
        let c = classifier();
        assert!(c.classify(&InboundMessage::text("hello world")).is_none());
        assert!(
            c.classify(&InboundMessage::text("Exchange Hot Wallet · SOL 99.99 no link"))
                .is_none()
        );
    }

    #[test]
    fn overlong_address_is_rejected() {
        let msg = InboundMessage::text(format!(
            "Exchange Hot Wallet · SOL 99.99 https://solscan.io/account/{ADDR_B}xyz"
        ));
        assert!(classifier().classify(&msg).is_none());
    }

    #[test]
    fn duplicate_labels_rejected() {
        let rules = vec![make_rule("same", 1), make_rule("same", 2)];
        assert!(TriggerClassifier::new(rules).is_err());
    }
}
