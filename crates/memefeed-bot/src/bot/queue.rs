use std::collections::HashMap;
use std::sync::Arc;

use memefeed_core::transport::Transport;
use memefeed_core::views::ChatId;
use tokio::sync::{Mutex, mpsc};

use crate::bot::context::BotContext;
use crate::commands::help_text;
use crate::ingest::{Allowlist, Incoming, Input, parse_update};
use crate::telegram::Update;

/// One sender per chat; each chat's events are handled in arrival order.
pub(crate) type ChatQueueMap = Arc<Mutex<HashMap<ChatId, mpsc::UnboundedSender<Incoming>>>>;

pub(crate) fn new_chat_queues() -> ChatQueueMap {
    Arc::new(Mutex::new(HashMap::new()))
}

pub(crate) async fn dispatch_update(
    queues: &ChatQueueMap,
    context: &Arc<BotContext>,
    update: Update,
) {
    let allowlist = Allowlist(context.allowlist_user_ids());
    if let Some(incoming) = parse_update(update, &allowlist) {
        enqueue(queues, context, incoming).await;
    }
}

async fn enqueue(queues: &ChatQueueMap, context: &Arc<BotContext>, incoming: Incoming) {
    let key = incoming.chat();
    let sender = {
        let mut queues = queues.lock().await;
        if let Some(sender) = queues.get(&key) {
            sender.clone()
        } else {
            let (sender, receiver) = mpsc::unbounded_channel();
            spawn_queue_worker(key, receiver, Arc::clone(context));
            queues.insert(key, sender.clone());
            sender
        }
    };

    if let Err(err) = sender.send(incoming) {
        let incoming = err.0;
        let (sender, receiver) = mpsc::unbounded_channel();
        spawn_queue_worker(key, receiver, Arc::clone(context));
        {
            let mut queues = queues.lock().await;
            queues.insert(key, sender.clone());
        }
        if sender.send(incoming).is_err() {
            tracing::error!(chat = key, "chat queue closed; dropping event");
        }
    }
}

fn spawn_queue_worker(
    key: ChatId,
    mut receiver: mpsc::UnboundedReceiver<Incoming>,
    context: Arc<BotContext>,
) {
    tokio::spawn(async move {
        while let Some(incoming) = receiver.recv().await {
            tracing::debug!(chat = key, input = ?incoming.input, "handling event");
            handle_incoming(&context, incoming).await;
        }
    });
}

async fn handle_incoming(context: &BotContext, incoming: Incoming) {
    let Incoming { origin, input } = incoming;
    match input {
        Input::Event(event) => context.controller().handle(&origin, event).await,
        Input::Help => {
            if let Err(err) = context.client().send_message(origin.chat, &help_text()).await {
                tracing::warn!(chat = origin.chat, error = %err, "failed to send help");
            }
        }
        Input::Acknowledge => context.controller().transport().notify(&origin, None).await,
    }
}
