//! Per-chat conversation state, held in an explicit store rather than
//! scattered handler-local state.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Where a chat currently is inside a multi-step flow. Absence from the
/// store means idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Registration: waiting for the fiscal code to link the account.
    AwaitingFiscalCode,
    /// Service creation: a type was requested via inline keyboard.
    AwaitingServiceType,
    /// Service creation: waiting for the name of a brand-new type.
    AwaitingNewTypeName,
    /// Service creation: type chosen, waiting for the service name.
    AwaitingServiceName { type_id: Option<Uuid> },
    /// Service creation: waiting for the date (GG/MM/AAAA).
    AwaitingServiceDate {
        type_id: Option<Uuid>,
        name: String,
    },
    /// Service creation: waiting for the time (HH:MM).
    AwaitingServiceTime {
        type_id: Option<Uuid>,
        name: String,
        date: NaiveDate,
    },
}

/// Conversation states keyed by chat id.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    states: Arc<RwLock<HashMap<i64, ConversationState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat_id: i64) -> Option<ConversationState> {
        self.states.read().await.get(&chat_id).cloned()
    }

    pub async fn set(&self, chat_id: i64, state: ConversationState) {
        self.states.write().await.insert(chat_id, state);
    }

    /// Back to idle. Safe to call from any step, including idle.
    pub async fn clear(&self, chat_id: i64) {
        self.states.write().await.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_round_trip() {
        let store = SessionStore::new();
        assert_eq!(store.get(1).await, None);

        store.set(1, ConversationState::AwaitingFiscalCode).await;
        assert_eq!(store.get(1).await, Some(ConversationState::AwaitingFiscalCode));

        // Other chats are independent.
        assert_eq!(store.get(2).await, None);

        store.clear(1).await;
        assert_eq!(store.get(1).await, None);
    }

    #[tokio::test]
    async fn set_overwrites_previous_state() {
        let store = SessionStore::new();
        store.set(7, ConversationState::AwaitingServiceType).await;
        store
            .set(
                7,
                ConversationState::AwaitingServiceName { type_id: None },
            )
            .await;

        assert_eq!(
            store.get(7).await,
            Some(ConversationState::AwaitingServiceName { type_id: None })
        );
    }
}
