//! Telegram front end for the memefeed session state machine.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use memefeed_core::FeedController;
use memefeed_core::config::Config;
use memefeed_core::fetch::DedupFetcher;

use crate::bot::{BotContext, dispatch_update, new_chat_queues};
use crate::reddit::RedditSource;
use crate::telegram::TelegramClient;
use crate::transport::TelegramTransport;

mod bot;
pub mod commands;
mod ingest;
pub mod reddit;
pub mod telegram;
pub mod transport;

/// Runs the bot until Ctrl-C. `config` must already be validated.
pub async fn run(config: Config) -> Result<()> {
    let token = config
        .bot_token()
        .context("telegram.bot_token or MEMEFEED_TELEGRAM_BOT_TOKEN is required")?;
    let client = TelegramClient::new(token);
    let source = RedditSource::from_config(&config.reddit, config.feed.max_title_len)?;
    run_with(config, client, source).await
}

/// Runs the bot against explicit clients.
pub async fn run_with(config: Config, client: TelegramClient, source: RedditSource) -> Result<()> {
    if let Err(err) = client
        .set_my_commands(&commands::telegram_command_specs())
        .await
    {
        tracing::warn!(error = %err, "failed to register bot commands");
    }

    let fetcher = DedupFetcher::new(source, config.feed.fetch_settings());
    let controller = FeedController::new(
        TelegramTransport::new(client.clone()),
        fetcher,
        config.feed.session_scope,
    );
    let allowlist: HashSet<i64> = config.telegram.allowlist_user_ids.iter().copied().collect();
    let context = Arc::new(BotContext::new(controller, allowlist));
    let chat_queues = new_chat_queues();

    let mut offset: Option<i64> = None;
    let poll_timeout = config.telegram.poll_timeout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(
        scope = ?config.feed.session_scope,
        topics = ?config.feed.topics,
        allowlisted_users = config.telegram.allowlist_user_ids.len(),
        "memefeed bot started, polling for updates"
    );

    loop {
        let current_offset = offset;
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
            updates = client.get_updates(current_offset, poll_timeout) => {
                let updates = match updates {
                    Ok(updates) => updates,
                    Err(err) => {
                        tracing::warn!(error = %err, "telegram polling error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                if !updates.is_empty() {
                    tracing::debug!(count = updates.len(), "received updates");
                }
                for update in updates {
                    offset = Some(update.update_id + 1);
                    dispatch_update(&chat_queues, &context, update).await;
                }
            }
        }
    }

    Ok(())
}
