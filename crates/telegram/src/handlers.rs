//! Menu, text-flow and callback handlers.
//!
//! Everything here is thin glue: it parses what the user pressed or typed,
//! calls the membership workflow or the relay engine, and renders the result
//! as inline-keyboard menus. All state lives in the store and the flow
//! tracker.

use std::sync::{Arc, LazyLock};

use {
    regex::Regex,
    teloxide::{
        ApiError, Bot, RequestError,
        payloads::{EditMessageTextSetters, SendMessageSetters},
        prelude::*,
        types::{
            CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageId,
        },
    },
    tracing::{debug, warn},
};

use {
    crossfeed_gateway::{Gateway, PostEvent},
    crossfeed_relay::RelayEngine,
    crossfeed_store::{Store, User},
    crossfeed_workflow::{ActionToken, Flow, FlowStore, InviteOutcome, MembershipWorkflow},
};

use crate::error::Result;

/// Shared context handed to each update handler.
pub struct BotContext {
    pub bot: Bot,
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn Gateway>,
    pub workflow: Arc<MembershipWorkflow>,
    pub relay: Arc<RelayEngine>,
    pub flows: Arc<dyn FlowStore>,
}

#[allow(clippy::unwrap_used)] // the pattern is a constant
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:@|t\.me/)([A-Za-z][A-Za-z0-9_]{3,31})").unwrap());

/// Extract a channel handle from free text: `@name` or a t.me link.
fn extract_handle(text: &str) -> Option<&str> {
    HANDLE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn parse_id(data: &str, prefix: &str) -> Option<i64> {
    data.strip_prefix(prefix)?.parse().ok()
}

fn parse_pair(data: &str, prefix: &str) -> Option<(i64, i64)> {
    let rest = data.strip_prefix(prefix)?;
    let (group, channel) = rest.split_once('_')?;
    Some((group.parse().ok()?, channel.parse().ok()?))
}

fn is_not_modified(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

fn back_button(target: &str) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback("↩️ Back", target.to_string())]
}

fn channel_link(handle: Option<&str>, id: i64) -> String {
    match handle {
        Some(h) => format!("https://t.me/{h}"),
        None => id.to_string(),
    }
}

/// Edit a menu message in place, tolerating "message is not modified".
async fn safe_edit(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    text: String,
    markup: InlineKeyboardMarkup,
) {
    let result = bot
        .edit_message_text(chat, message_id, text)
        .reply_markup(markup)
        .await;
    if let Err(e) = result
        && !is_not_modified(&e)
    {
        warn!(error = %e, "failed to edit menu message");
    }
}

impl BotContext {
    /// Render a menu either by editing the pressed message or, when the
    /// original message is inaccessible, by sending a fresh one.
    async fn render(
        &self,
        fallback_chat: ChatId,
        target: Option<(ChatId, MessageId)>,
        text: String,
        markup: InlineKeyboardMarkup,
    ) {
        match target {
            Some((chat, message_id)) => {
                safe_edit(&self.bot, chat, message_id, text, markup).await;
            },
            None => {
                if let Err(e) = self
                    .bot
                    .send_message(fallback_chat, text)
                    .reply_markup(markup)
                    .await
                {
                    warn!(error = %e, "failed to send menu message");
                }
            },
        }
    }

    /// Main menu. Reaching it always clears the user's conversation flow.
    async fn main_menu(&self, user_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        self.flows.clear(user_id);

        let owns_groups = !self.store.groups_owned_by(user_id).await?.is_empty();
        let mut participates = false;
        for channel in self.store.channels_owned_by(user_id).await? {
            if !self
                .store
                .accepted_memberships_for_channel(channel.id)
                .await?
                .is_empty()
            {
                participates = true;
                break;
            }
        }

        let mut rows = Vec::new();
        if owns_groups {
            rows.push(vec![InlineKeyboardButton::callback(
                "🛠 My groups",
                "my_groups".to_string(),
            )]);
        }
        rows.push(vec![InlineKeyboardButton::callback(
            "➕ Create group",
            "create_group".to_string(),
        )]);
        rows.push(vec![InlineKeyboardButton::callback(
            "📋 My channels",
            "my_channels".to_string(),
        )]);
        rows.push(vec![InlineKeyboardButton::callback(
            "🌐 Explore groups",
            "explore".to_string(),
        )]);
        if participates {
            rows.push(vec![InlineKeyboardButton::callback(
                "🚪 Leave group",
                "leave_menu".to_string(),
            )]);
        }
        rows.push(vec![InlineKeyboardButton::callback(
            "❓ Help",
            "help".to_string(),
        )]);

        Ok(("Pick an option:".to_string(), InlineKeyboardMarkup::new(rows)))
    }

    async fn my_groups_menu(&self, user_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        let groups = self.store.groups_owned_by(user_id).await?;
        if groups.is_empty() {
            return Ok((
                "🚫 You have not created any groups yet.".to_string(),
                InlineKeyboardMarkup::new(vec![back_button("start")]),
            ));
        }
        let mut rows: Vec<Vec<InlineKeyboardButton>> = groups
            .iter()
            .map(|g| {
                vec![InlineKeyboardButton::callback(
                    g.name.clone(),
                    format!("manage_{}", g.id),
                )]
            })
            .collect();
        rows.push(back_button("start"));
        Ok(("📂 Your groups:".to_string(), InlineKeyboardMarkup::new(rows)))
    }

    async fn manage_group_menu(&self, group_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        let Some(group) = self.store.get_group(group_id).await? else {
            return Ok((
                "⚠️ This group no longer exists.".to_string(),
                InlineKeyboardMarkup::new(vec![back_button("my_groups")]),
            ));
        };

        let members = self.store.accepted_memberships_in_group(group_id).await?;
        let mut text = format!("🎯 {}\n\n📢 Member channels:", group.name);
        if members.is_empty() {
            text.push_str("\n(no channels yet)");
        } else {
            for membership in &members {
                if let Some(ch) = self.store.get_channel(membership.channel_id).await? {
                    text.push_str(&format!(
                        "\n• {} — {}",
                        ch.title,
                        channel_link(ch.handle.as_deref(), ch.id)
                    ));
                }
            }
        }

        let rows = vec![
            vec![InlineKeyboardButton::callback(
                "➕ Invite channel",
                format!("invite_{group_id}"),
            )],
            vec![InlineKeyboardButton::callback(
                "🗑 Remove channel",
                format!("remove_{group_id}"),
            )],
            vec![InlineKeyboardButton::callback(
                "🗑❌ Delete group",
                format!("delete_{group_id}"),
            )],
            back_button("my_groups"),
        ];
        Ok((text, InlineKeyboardMarkup::new(rows)))
    }

    async fn explore_menu(&self) -> Result<(String, InlineKeyboardMarkup)> {
        let groups = self.store.list_groups().await?;
        if groups.is_empty() {
            return Ok((
                "🌍 There are no public groups yet.".to_string(),
                InlineKeyboardMarkup::new(vec![back_button("start")]),
            ));
        }
        let mut rows = Vec::new();
        for group in &groups {
            let count = self
                .store
                .accepted_memberships_in_group(group.id)
                .await?
                .len();
            rows.push(vec![InlineKeyboardButton::callback(
                format!("{} ({count})", group.name),
                format!("view_{}", group.id),
            )]);
        }
        rows.push(back_button("start"));
        Ok(("🌐 Public groups:".to_string(), InlineKeyboardMarkup::new(rows)))
    }

    async fn view_group_menu(&self, group_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        let Some(group) = self.store.get_group(group_id).await? else {
            return Ok((
                "⚠️ This group no longer exists.".to_string(),
                InlineKeyboardMarkup::new(vec![back_button("explore")]),
            ));
        };
        let mut text = format!("📁 {}\nChannels:", group.name);
        for membership in self.store.accepted_memberships_in_group(group_id).await? {
            if let Some(ch) = self.store.get_channel(membership.channel_id).await? {
                let subs = match self.gateway.member_count(ch.id).await {
                    Ok(n) => n.to_string(),
                    Err(_) => "?".to_string(),
                };
                text.push_str(&format!(
                    "\n- {} — {} ({subs} subscribers)",
                    ch.title,
                    channel_link(ch.handle.as_deref(), ch.id)
                ));
            }
        }
        let rows = vec![
            vec![InlineKeyboardButton::callback(
                "📩 Request to join",
                format!("join_{group_id}"),
            )],
            back_button("explore"),
        ];
        Ok((text, InlineKeyboardMarkup::new(rows)))
    }

    async fn remove_channel_menu(&self, group_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        let members = self.store.accepted_memberships_in_group(group_id).await?;
        if members.is_empty() {
            return Ok((
                "🚫 No channels to remove.".to_string(),
                InlineKeyboardMarkup::new(vec![back_button(&format!("manage_{group_id}"))]),
            ));
        }
        let mut rows = Vec::new();
        for membership in &members {
            let label = match self.store.get_channel(membership.channel_id).await? {
                Some(ch) => ch.title,
                None => membership.channel_id.to_string(),
            };
            rows.push(vec![InlineKeyboardButton::callback(
                label,
                format!("removeok_{group_id}_{}", membership.channel_id),
            )]);
        }
        rows.push(back_button(&format!("manage_{group_id}")));
        Ok((
            "Pick a channel to remove:".to_string(),
            InlineKeyboardMarkup::new(rows),
        ))
    }

    async fn leave_menu(&self, user_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        let mut rows = Vec::new();
        for channel in self.store.channels_owned_by(user_id).await? {
            for membership in self
                .store
                .accepted_memberships_for_channel(channel.id)
                .await?
            {
                let group_name = match self.store.get_group(membership.group_id).await? {
                    Some(g) => g.name,
                    None => membership.group_id.to_string(),
                };
                rows.push(vec![InlineKeyboardButton::callback(
                    format!("{group_name} — {}", channel.title),
                    format!("leaveok_{}_{}", membership.group_id, channel.id),
                )]);
            }
        }
        if rows.is_empty() {
            return Ok((
                "🚫 None of your channels participate in a group.".to_string(),
                InlineKeyboardMarkup::new(vec![back_button("start")]),
            ));
        }
        rows.push(back_button("start"));
        Ok((
            "Pick the group to leave:".to_string(),
            InlineKeyboardMarkup::new(rows),
        ))
    }

    async fn my_channels_menu(&self, user_id: i64) -> Result<(String, InlineKeyboardMarkup)> {
        let channels = self.store.channels_owned_by(user_id).await?;
        let markup = InlineKeyboardMarkup::new(vec![back_button("start")]);
        if channels.is_empty() {
            return Ok(("🚫 You have no channels on record.".to_string(), markup));
        }
        let mut text = "📋 Your channels:".to_string();
        for ch in channels {
            let auth = if ch.authenticated { "✅" } else { "◻️" };
            text.push_str(&format!(
                "\n{auth} {} — {}",
                ch.title,
                channel_link(ch.handle.as_deref(), ch.id)
            ));
        }
        Ok((text, markup))
    }
}

fn help_text() -> String {
    "👋 Channel federation bot\n\n\
     • /start or ❓ Help: this menu\n\
     • Create a group and invite channels by @handle or t.me link\n\
     • Explore public groups and request to join\n\
     • Remove channels, leave groups, delete your groups\n\
     • Posts replicate automatically between accepted member channels\n\n\
     ➡️ Send /start any time to come back here."
        .to_string()
}

/// Handle one free-text or command message in a private chat.
pub async fn handle_message(ctx: &BotContext, msg: Message) -> Result<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = User {
        id: from.id.0 as i64,
        username: from.username.clone(),
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with("/start") {
        ctx.store.upsert_user(&user).await?;
        let (menu_text, markup) = ctx.main_menu(user.id).await?;
        ctx.bot
            .send_message(msg.chat.id, menu_text)
            .reply_markup(markup)
            .await
            .map_err(crate::error::Error::from)?;
        return Ok(());
    }
    if text.starts_with("/help") {
        ctx.bot
            .send_message(msg.chat.id, help_text())
            .await
            .map_err(crate::error::Error::from)?;
        return Ok(());
    }

    // Free text only means something mid-flow.
    let reply = match ctx.flows.consume(user.id) {
        Some(Flow::AwaitingGroupName) => {
            let name = text.trim();
            if name.is_empty() {
                "⚠️ The group name cannot be empty. Start again from the menu.".to_string()
            } else {
                match ctx.workflow.create_group(&user, name).await {
                    Ok(group) => format!("✅ Group \"{}\" created!", group.name),
                    Err(e) => format!("❌ {e}"),
                }
            }
        },
        Some(Flow::AwaitingChannelInvite { group_id }) => match extract_handle(text) {
            None => "❌ Send a valid @handle or t.me link.".to_string(),
            Some(handle) => match ctx.workflow.invite_channel(&user, group_id, handle).await {
                Ok(InviteOutcome::AcceptedDirectly { channel }) => {
                    format!("✅ Your channel \"{}\" joined the group.", channel.title)
                },
                Ok(InviteOutcome::PendingApproval { channel }) => format!(
                    "✅ Invite sent to \"{}\". It now needs to accept!",
                    channel.title
                ),
                Err(e) => format!("❌ {e}"),
            },
        },
        None => {
            debug!(user_id = user.id, "free text outside any flow, ignoring");
            return Ok(());
        },
    };

    ctx.bot
        .send_message(msg.chat.id, reply)
        .reply_markup(InlineKeyboardMarkup::new(vec![back_button("start")]))
        .await
        .map_err(crate::error::Error::from)?;
    Ok(())
}

/// Handle a post published in a channel: authenticate the channel, then
/// relay. Delivery failures stay inside the relay report and are never
/// surfaced to the channel.
pub async fn handle_channel_post(ctx: Arc<BotContext>, msg: Message) {
    if !msg.chat.is_channel() {
        return;
    }
    let channel_id = msg.chat.id.0;

    if let Err(e) = ctx
        .workflow
        .authenticate_channel(
            channel_id,
            msg.chat.username().map(str::to_string),
            msg.chat.title().unwrap_or_default(),
        )
        .await
    {
        warn!(channel_id, error = %e, "channel authentication failed");
    }

    let post = PostEvent {
        channel_id,
        message_id: msg.id.0,
        album_id: msg.media_group_id().map(str::to_string),
        sequence_id: msg.id.0 as i64,
    };
    match ctx.relay.handle_post(post).await {
        Ok(Some(report)) => {
            debug!(
                channel_id,
                delivered = report.delivered,
                failed = report.failures.len(),
                "relay report"
            );
        },
        Ok(None) => {}, // buffered album part; the flush owner reports
        Err(e) => warn!(channel_id, error = %e, "relay failed"),
    }
}

/// Handle an inline-keyboard press: menu navigation, flow starts, and the
/// Accept/Decline action tokens.
pub async fn handle_callback(ctx: &BotContext, query: CallbackQuery) -> Result<()> {
    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let user = User {
        id: query.from.id.0 as i64,
        username: query.from.username.clone(),
    };
    let fallback_chat = ChatId(user.id);
    let target = query
        .message
        .as_ref()
        .map(|m| (m.chat().id, m.id()));

    debug!(user_id = user.id, data, "callback received");

    // Accept/Decline tokens first; they are self-describing.
    if let Some(token) = ActionToken::decode(data) {
        let _ = ctx.bot.answer_callback_query(&query.id).await;
        let text = match ctx.workflow.respond(user.id, &token).await {
            Ok(outcome) => {
                let verb = match outcome.decision {
                    crossfeed_workflow::Decision::Accept => "accepted into",
                    crossfeed_workflow::Decision::Decline => "declined for",
                };
                format!(
                    "Channel \"{}\" {verb} the group \"{}\".",
                    outcome.channel.title, outcome.group.name
                )
            },
            Err(e) => format!("❌ {e}"),
        };
        let markup = InlineKeyboardMarkup::new(vec![back_button("start")]);
        ctx.render(fallback_chat, target, text, markup).await;
        return Ok(());
    }

    let (text, markup) = match data {
        "start" => ctx.main_menu(user.id).await?,
        "help" => (
            help_text(),
            InlineKeyboardMarkup::new(vec![back_button("start")]),
        ),
        "create_group" => {
            ctx.flows.begin(user.id, Flow::AwaitingGroupName);
            (
                "📌 Type the name of the new group:".to_string(),
                InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                    "↩️ Cancel",
                    "start".to_string(),
                )]]),
            )
        },
        "my_channels" => ctx.my_channels_menu(user.id).await?,
        "my_groups" => ctx.my_groups_menu(user.id).await?,
        "explore" => ctx.explore_menu().await?,
        "leave_menu" => ctx.leave_menu(user.id).await?,
        _ => {
            if let Some(group_id) = parse_id(data, "manage_") {
                ctx.manage_group_menu(group_id).await?
            } else if let Some(group_id) = parse_id(data, "invite_") {
                ctx.flows
                    .begin(user.id, Flow::AwaitingChannelInvite { group_id });
                (
                    "📥 Send the channel's @handle or t.me link:".to_string(),
                    InlineKeyboardMarkup::new(vec![back_button(&format!("manage_{group_id}"))]),
                )
            } else if let Some((group_id, channel_id)) = parse_pair(data, "removeok_") {
                match ctx.workflow.remove_channel(user.id, group_id, channel_id).await {
                    Ok(()) => ctx.manage_group_menu(group_id).await?,
                    Err(e) => (
                        format!("❌ {e}"),
                        InlineKeyboardMarkup::new(vec![back_button("my_groups")]),
                    ),
                }
            } else if let Some(group_id) = parse_id(data, "remove_") {
                ctx.remove_channel_menu(group_id).await?
            } else if let Some(group_id) = parse_id(data, "deleteok_") {
                match ctx.workflow.delete_group(user.id, group_id).await {
                    Ok(()) => ctx.my_groups_menu(user.id).await?,
                    Err(e) => (
                        format!("❌ {e}"),
                        InlineKeyboardMarkup::new(vec![back_button("my_groups")]),
                    ),
                }
            } else if let Some(group_id) = parse_id(data, "delete_") {
                // Irreversible — ask first.
                (
                    "⚠️ Delete this group and all its memberships?".to_string(),
                    InlineKeyboardMarkup::new(vec![
                        vec![InlineKeyboardButton::callback(
                            "✅ Yes, delete",
                            format!("deleteok_{group_id}"),
                        )],
                        vec![InlineKeyboardButton::callback(
                            "❌ No",
                            format!("manage_{group_id}"),
                        )],
                    ]),
                )
            } else if let Some(group_id) = parse_id(data, "view_") {
                ctx.view_group_menu(group_id).await?
            } else if let Some(group_id) = parse_id(data, "join_") {
                let text = match pick_own_channel(ctx, user.id).await? {
                    None => {
                        "❌ You have no authenticated channel. Post through the bot first."
                            .to_string()
                    },
                    Some(channel_id) => {
                        match ctx.workflow.request_join(&user, channel_id, group_id).await {
                            Ok(()) => "✅ Request sent to the group owner.".to_string(),
                            Err(e) => format!("❌ {e}"),
                        }
                    },
                };
                (text, InlineKeyboardMarkup::new(vec![back_button("explore")]))
            } else if let Some((group_id, channel_id)) = parse_pair(data, "leaveok_") {
                match ctx.workflow.remove_channel(user.id, group_id, channel_id).await {
                    Ok(()) => ctx.leave_menu(user.id).await?,
                    Err(e) => (
                        format!("❌ {e}"),
                        InlineKeyboardMarkup::new(vec![back_button("start")]),
                    ),
                }
            } else {
                let _ = ctx
                    .bot
                    .answer_callback_query(&query.id)
                    .text("❌ Unknown action.")
                    .show_alert(true)
                    .await;
                return Ok(());
            }
        },
    };

    // Dismiss the loading spinner.
    let _ = ctx.bot.answer_callback_query(&query.id).await;
    ctx.render(fallback_chat, target, text, markup).await;
    Ok(())
}

/// The channel a join request is filed for: the user's first authenticated
/// channel.
async fn pick_own_channel(ctx: &BotContext, user_id: i64) -> Result<Option<i64>> {
    let channel = ctx
        .store
        .channels_owned_by(user_id)
        .await?
        .into_iter()
        .find(|c| c.authenticated);
    Ok(channel.map(|c| c.id))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        async_trait::async_trait,
        crossfeed_gateway::{
            ActionButton, ChannelAdmin, ChannelIdentity, GatewayError,
            error::Result as GwResult,
        },
        crossfeed_store::{Channel, Membership, MembershipStatus, store_memory::InMemoryStore},
    };

    use super::*;

    struct CountingGateway;

    #[async_trait]
    impl Gateway for CountingGateway {
        async fn resolve_channel(&self, handle: &str) -> GwResult<ChannelIdentity> {
            Err(GatewayError::not_found(handle))
        }

        async fn list_administrators(&self, _channel_id: i64) -> GwResult<Vec<ChannelAdmin>> {
            Ok(Vec::new())
        }

        async fn member_count(&self, _channel_id: i64) -> GwResult<u32> {
            Ok(42)
        }

        async fn deliver_content(
            &self,
            _source: i64,
            _target: i64,
            _message_id: i32,
        ) -> GwResult<()> {
            Ok(())
        }

        async fn send_direct_message(
            &self,
            _user_id: i64,
            _text: &str,
            _actions: Option<Vec<ActionButton>>,
        ) -> GwResult<()> {
            Ok(())
        }
    }

    fn context(store: Arc<InMemoryStore>) -> BotContext {
        let gateway: Arc<dyn Gateway> = Arc::new(CountingGateway);
        let workflow = Arc::new(MembershipWorkflow::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&gateway),
        ));
        let relay = Arc::new(RelayEngine::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&gateway),
            crossfeed_relay::RelayConfig::default(),
        ));
        BotContext {
            bot: Bot::new("123:TEST"),
            store,
            gateway,
            workflow,
            relay,
            flows: Arc::new(crossfeed_workflow::InMemoryFlows::new()),
        }
    }

    #[tokio::test]
    async fn group_view_shows_subscriber_counts() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = context(Arc::clone(&store));

        let owner = User {
            id: 1,
            username: None,
        };
        let group = ctx.workflow.create_group(&owner, "News").await.unwrap();
        store
            .upsert_channel(&Channel {
                id: -100,
                owner_id: Some(1),
                handle: Some("feed".into()),
                title: "Feed".into(),
                authenticated: true,
            })
            .await
            .unwrap();
        store
            .insert_membership(&Membership {
                group_id: group.id,
                channel_id: -100,
                status: MembershipStatus::Accepted,
                inviter_id: None,
            })
            .await
            .unwrap();

        let (text, _) = ctx.view_group_menu(group.id).await.unwrap();
        assert!(text.contains("Feed"));
        assert!(text.contains("(42 subscribers)"));
    }

    #[test]
    fn handle_extraction() {
        assert_eq!(extract_handle("@daily_news"), Some("daily_news"));
        assert_eq!(extract_handle("join t.me/daily_news now"), Some("daily_news"));
        assert_eq!(extract_handle("https://t.me/daily_news"), Some("daily_news"));
        assert_eq!(extract_handle("no handle here"), None);
        // Too short for a Telegram handle.
        assert_eq!(extract_handle("@ab"), None);
    }

    #[test]
    fn callback_prefix_parsing() {
        assert_eq!(parse_id("manage_42", "manage_"), Some(42));
        assert_eq!(parse_id("manage_x", "manage_"), None);
        assert_eq!(
            parse_pair("removeok_7_-100123", "removeok_"),
            Some((7, -100123))
        );
        assert_eq!(parse_pair("removeok_7", "removeok_"), None);
        // "removeok_" data must not be mistaken for "remove_".
        assert_eq!(parse_id("removeok_7_-1", "remove_"), None);
    }
}
