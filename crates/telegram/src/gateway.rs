//! teloxide-backed implementation of the `Gateway` contract.

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, Bot, RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{
            ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, Recipient,
        },
    },
};

use crossfeed_gateway::{
    ActionButton, AdminRole, ChannelAdmin, ChannelIdentity, Gateway, GatewayError,
    error::Result,
};

/// The production gateway: every call goes straight to the Bot API.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn map_request_error(handle: Option<&str>, e: RequestError) -> GatewayError {
    match e {
        RequestError::Api(ApiError::ChatNotFound) => {
            GatewayError::not_found(handle.unwrap_or_default())
        },
        RequestError::Api(ApiError::NotEnoughRightsToPostMessages) => GatewayError::Forbidden,
        other => GatewayError::external("telegram request failed", other),
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn resolve_channel(&self, handle: &str) -> Result<ChannelIdentity> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{handle}")))
            .await
            .map_err(|e| map_request_error(Some(handle), e))?;

        if !chat.is_channel() {
            return Err(GatewayError::not_a_channel(handle));
        }

        Ok(ChannelIdentity {
            id: chat.id.0,
            handle: chat.username().map(str::to_string),
            title: chat.title().unwrap_or(handle).to_string(),
        })
    }

    async fn list_administrators(&self, channel_id: i64) -> Result<Vec<ChannelAdmin>> {
        let members = self
            .bot
            .get_chat_administrators(ChatId(channel_id))
            .await
            .map_err(|e| map_request_error(None, e))?;

        Ok(members
            .into_iter()
            .map(|m| ChannelAdmin {
                user_id: m.user.id.0 as i64,
                username: m.user.username.clone(),
                role: if m.kind.is_owner() {
                    AdminRole::Creator
                } else {
                    AdminRole::Administrator
                },
                is_bot: m.user.is_bot,
            })
            .collect())
    }

    async fn member_count(&self, channel_id: i64) -> Result<u32> {
        self.bot
            .get_chat_member_count(ChatId(channel_id))
            .await
            .map_err(|e| map_request_error(None, e))
    }

    async fn deliver_content(
        &self,
        source_channel_id: i64,
        target_channel_id: i64,
        message_id: i32,
    ) -> Result<()> {
        self.bot
            .forward_message(
                ChatId(target_channel_id),
                ChatId(source_channel_id),
                MessageId(message_id),
            )
            .await
            .map_err(|e| map_request_error(None, e))?;
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: i64,
        text: &str,
        actions: Option<Vec<ActionButton>>,
    ) -> Result<()> {
        let request = self.bot.send_message(ChatId(user_id), text);
        let request = match actions {
            Some(actions) => {
                let row: Vec<InlineKeyboardButton> = actions
                    .into_iter()
                    .map(|a| InlineKeyboardButton::callback(a.label, a.token))
                    .collect();
                request.reply_markup(InlineKeyboardMarkup::new(vec![row]))
            },
            None => request,
        };
        request.await.map_err(|e| map_request_error(None, e))?;
        Ok(())
    }
}
