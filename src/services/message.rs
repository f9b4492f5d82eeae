use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use super::{booking_party, Party};
use crate::auth::CurrentUser;
use crate::database::repository::{BookingRepository, MessageRepository};
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{Booking, Message, NewMessage, SendMessageRequest};

/// Per-booking conversation between client and provider.
#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn Store>,
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn send(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
        request: SendMessageRequest,
    ) -> Result<Message, ApiError> {
        request.validate()?;
        let content = request.content.trim().to_string();
        if content.is_empty() {
            return Err(ApiError::validation_field("content", "Message cannot be empty"));
        }

        let booking = self.booking(booking_id).await?;
        let (party, provider) = booking_party(self.store.as_ref(), caller, &booking).await?;
        let receiver_id = match party {
            Party::Client => provider.user_id,
            Party::Provider => booking.client_id,
            Party::Admin => return Err(ApiError::access_denied("conversation")),
        };

        let message = self
            .store
            .create_message(NewMessage {
                booking_id,
                sender_id: caller.id,
                receiver_id,
                content,
            })
            .await?;
        debug!(message_id = %message.id, booking_id = %booking_id, "Message sent");
        Ok(message)
    }

    pub async fn list(
        &self,
        caller: &CurrentUser,
        booking_id: Uuid,
    ) -> Result<Vec<Message>, ApiError> {
        let booking = self.booking(booking_id).await?;
        if let (Party::Admin, _) = booking_party(self.store.as_ref(), caller, &booking).await? {
            return Err(ApiError::access_denied("conversation"));
        }
        self.store.messages_for_booking(booking_id).await
    }

    pub async fn mark_read(&self, caller: &CurrentUser, id: Uuid) -> Result<Message, ApiError> {
        let message = self
            .store
            .find_message(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Message"))?;
        if message.receiver_id != caller.id {
            return Err(ApiError::access_denied("message"));
        }
        if message.is_read {
            return Ok(message);
        }
        self.store
            .mark_message_read(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Message"))
    }

    async fn booking(&self, id: Uuid) -> Result<Booking, ApiError> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking"))
    }
}
