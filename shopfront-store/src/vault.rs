use shopfront_core::{CardDetails, CardVault, CoreError, CoreResult};
use shopfront_shared::Masked;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

struct VaultedCard {
    number: Masked<String>,
    expiry_date: String,
    name_on_card: String,
}

/// Process-local card vault. Hands out opaque `tok_...` tokens; the CVV is dropped on intake.
#[derive(Default)]
pub struct InMemoryCardVault {
    cards: RwLock<HashMap<String, VaultedCard>>,
}

impl InMemoryCardVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.cards
            .read()
            .map(|cards| cards.contains_key(token))
            .unwrap_or(false)
    }

    /// Expiry and cardholder name for a token
    pub fn describe(&self, token: &str) -> Option<(String, String)> {
        let cards = self.cards.read().ok()?;
        cards
            .get(token)
            .map(|card| (card.expiry_date.clone(), card.name_on_card.clone()))
    }

    /// Last four digits of the vaulted number, for receipts and support lookups.
    pub fn last_four(&self, token: &str) -> Option<String> {
        let cards = self.cards.read().ok()?;
        let number = cards.get(token)?.number.expose();
        let start = number.len().checked_sub(4)?;
        number.get(start..).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.cards.read().map(|cards| cards.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CardVault for InMemoryCardVault {
    fn tokenize(&self, card: CardDetails) -> CoreResult<String> {
        let number = card.normalized_number();
        if number.is_empty() {
            return Err(CoreError::VaultError("card number is empty".to_string()));
        }

        let token = format!("tok_{}", Uuid::new_v4().simple());
        let mut cards = self
            .cards
            .write()
            .map_err(|_| CoreError::VaultError("vault lock poisoned".to_string()))?;
        cards.insert(
            token.clone(),
            VaultedCard {
                number: Masked::new(number),
                expiry_date: card.expiry_date,
                name_on_card: card.name_on_card,
            },
        );
        tracing::debug!("Vaulted card as {}", token);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_issues_unique_tokens() {
        let vault = InMemoryCardVault::new();
        let card = CardDetails::new("4111 1111 1111 1111", "09/27", "123", "Jane Doe");

        let first = vault.tokenize(card.clone()).unwrap();
        let second = vault.tokenize(card).unwrap();

        assert!(first.starts_with("tok_"));
        assert_ne!(first, second);
        assert_eq!(vault.len(), 2);
        assert!(vault.contains(&first));
        assert_eq!(
            vault.describe(&first),
            Some(("09/27".to_string(), "Jane Doe".to_string()))
        );
        assert_eq!(vault.last_four(&first).as_deref(), Some("1111"));
        assert_eq!(vault.last_four("tok_unknown"), None);
    }

    #[test]
    fn test_token_does_not_leak_card_number() {
        let vault = InMemoryCardVault::new();
        let token = vault
            .tokenize(CardDetails::new("4111111111111111", "09/27", "123", "Jane Doe"))
            .unwrap();
        assert!(!token.contains("4111"));
    }

    #[test]
    fn test_empty_card_is_refused() {
        let vault = InMemoryCardVault::new();
        let result = vault.tokenize(CardDetails::default());

        assert!(matches!(result, Err(CoreError::VaultError(_))));
        assert!(vault.is_empty());
    }
}
