use std::collections::HashSet;

use memefeed_core::FeedController;

use crate::reddit::RedditSource;
use crate::telegram::TelegramClient;
use crate::transport::TelegramTransport;

pub(crate) type Controller = FeedController<TelegramTransport, RedditSource>;

pub(crate) struct BotContext {
    controller: Controller,
    allowlist_user_ids: HashSet<i64>,
}

impl BotContext {
    pub(crate) fn new(controller: Controller, allowlist_user_ids: HashSet<i64>) -> Self {
        Self {
            controller,
            allowlist_user_ids,
        }
    }

    pub(crate) fn controller(&self) -> &Controller {
        &self.controller
    }

    pub(crate) fn client(&self) -> &TelegramClient {
        self.controller.transport().client()
    }

    pub(crate) fn allowlist_user_ids(&self) -> &HashSet<i64> {
        &self.allowlist_user_ids
    }
}
