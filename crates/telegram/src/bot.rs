use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    crossfeed_relay::RelayEngine,
    crossfeed_store::Store,
    crossfeed_workflow::{InMemoryFlows, MembershipWorkflow},
};

use crate::{config::BotConfig, gateway::TelegramGateway, handlers, handlers::BotContext};

/// Connect the bot and start the long-polling loop.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    config: BotConfig,
    store: Arc<dyn Store>,
) -> crate::error::Result<CancellationToken> {
    // Build bot with a client timeout longer than the long-polling timeout (30s)
    // so the HTTP client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    // Verify credentials.
    let me = bot.get_me().await?;
    info!(username = ?me.username, "telegram bot connected");

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Open the main menu"),
        BotCommand::new("help", "How the bot works"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    let gateway: Arc<TelegramGateway> = Arc::new(TelegramGateway::new(bot.clone()));
    let workflow = Arc::new(MembershipWorkflow::new(
        Arc::clone(&store),
        gateway.clone(),
    ));
    let relay = Arc::new(RelayEngine::new(
        Arc::clone(&store),
        gateway.clone(),
        config.relay_config(),
    ));
    let ctx = Arc::new(BotContext {
        bot: bot.clone(),
        store,
        gateway,
        workflow,
        relay,
        flows: Arc::new(InMemoryFlows::new()),
    });

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let backoff = std::time::Duration::from_secs(config.poll_backoff_secs);

    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![
                    AllowedUpdate::Message,
                    AllowedUpdate::ChannelPost,
                    AllowedUpdate::CallbackQuery,
                ])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                if let Err(e) = handlers::handle_message(&ctx, msg).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            UpdateKind::ChannelPost(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received channel post");
                                // Spawned so album debouncing never stalls the
                                // poll loop.
                                tokio::spawn(handlers::handle_channel_post(
                                    Arc::clone(&ctx),
                                    msg,
                                ));
                            },
                            UpdateKind::CallbackQuery(query) => {
                                debug!(
                                    callback_data = ?query.data,
                                    "received telegram callback query"
                                );
                                if let Err(e) = handlers::handle_callback(&ctx, query).await {
                                    error!(error = %e, "error handling telegram callback query");
                                }
                            },
                            other => {
                                debug!("ignoring unsupported update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Conflict: another bot instance is running with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!(
                            "telegram bot stopped: another instance is already running \
                             with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(backoff).await;
                },
            }
        }
    });

    Ok(cancel)
}
