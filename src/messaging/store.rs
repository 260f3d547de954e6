use crate::config::AppConfig;
use crate::identity::resolve_user_id;
use crate::messaging::replies::canned_reply;
use crate::models::{Conversation, Message};
use crate::storage::{load_json, save_json, KeyValueStore, MESSAGES_STORAGE_KEY};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Timing of the simulated counterpart
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub enabled: bool,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl ReplySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            enabled: true,
            min_delay: config.reply_delay_min,
            max_delay: config.reply_delay_max,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn draw_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

/// Messaging state. Everything except the UI focus fields is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagingState {
    pub user_id: String,
    #[serde(default)]
    pub conversations: HashMap<String, Conversation>,
    #[serde(default)]
    pub messages: HashMap<String, Vec<Message>>,
    #[serde(default)]
    pub total_unread: u32,
    #[serde(skip)]
    pub active_conversation_id: Option<String>,
    #[serde(skip)]
    pub is_chat_open: bool,
}

impl MessagingState {
    /// Whether the user is currently looking at `conversation_id`
    pub fn is_viewing(&self, conversation_id: &str) -> bool {
        self.is_chat_open && self.active_conversation_id.as_deref() == Some(conversation_id)
    }
}

struct Shared {
    state: Mutex<MessagingState>,
    persistence: Arc<dyn KeyValueStore>,
    replies: ReplySettings,
    pending: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn abort_all(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handles) in pending.drain() {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Conversation and message store for the local buyer.
///
/// Cloning is cheap and every clone sees the same state. Pending simulated
/// replies only hold a weak reference, so dropping the last clone cancels
/// them.
#[derive(Clone)]
pub struct MessageStore {
    shared: Arc<Shared>,
}

impl MessageStore {
    pub fn new(persistence: Arc<dyn KeyValueStore>, replies: ReplySettings) -> Self {
        let persisted: Option<MessagingState> =
            load_json(persistence.as_ref(), MESSAGES_STORAGE_KEY);
        let mut state = persisted.unwrap_or_default();
        let user_id = resolve_user_id(Some(state.user_id.as_str()), &mut rand::thread_rng());
        let minted = user_id != state.user_id;
        state.user_id = user_id;

        info!(
            "Loaded messaging state for {}: {} conversations, {} unread",
            state.user_id,
            state.conversations.len(),
            state.total_unread
        );
        if minted {
            save_json(persistence.as_ref(), MESSAGES_STORAGE_KEY, &state);
        }

        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                persistence,
                replies,
                pending: Mutex::new(HashMap::new()),
                revision,
            }),
        }
    }

    fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    fn lock(&self) -> MutexGuard<'_, MessagingState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist `state` and notify subscribers. Called with the lock held so
    /// writes land in mutation order.
    fn commit(&self, state: &MessagingState) {
        save_json(self.shared.persistence.as_ref(), MESSAGES_STORAGE_KEY, state);
        self.shared.revision.send_modify(|rev| *rev += 1);
    }

    pub fn user_id(&self) -> String {
        self.lock().user_id.clone()
    }

    /// Open a chat with a seller about a property, reusing an existing
    /// conversation for the same (property, seller) pair.
    pub fn start_conversation(
        &self,
        seller_id: &str,
        seller_name: &str,
        property_id: &str,
        property_title: &str,
        property_image: Option<&str>,
    ) -> String {
        let mut state = self.lock();

        let existing = state
            .conversations
            .values()
            .find(|c| c.property_id == property_id && c.seller_id == seller_id)
            .map(|c| c.id.clone());

        let conversation_id = match existing {
            Some(id) => {
                debug!("Reusing conversation {} for property {}", id, property_id);
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                let conversation = Conversation {
                    id: id.clone(),
                    property_id: property_id.to_string(),
                    buyer_id: state.user_id.clone(),
                    seller_id: seller_id.to_string(),
                    last_message: None,
                    last_message_at: None,
                    unread_count: 0,
                    other_party_name: seller_name.to_string(),
                    property_title: property_title.to_string(),
                    property_image: property_image.map(str::to_string),
                    created_at: Utc::now(),
                };
                state.conversations.insert(id.clone(), conversation);
                state.messages.insert(id.clone(), Vec::new());
                info!(
                    "Started conversation {} with {} about {}",
                    id, seller_name, property_title
                );
                id
            }
        };

        state.active_conversation_id = Some(conversation_id.clone());
        state.is_chat_open = true;
        self.commit(&state);
        conversation_id
    }

    /// Append a message from the local user and schedule the counterpart's
    /// reply. Unknown conversations and blank content are ignored.
    pub fn send_message(&self, conversation_id: &str, content: &str) -> Option<Message> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        let message = {
            let mut state = self.lock();
            let user_id = state.user_id.clone();
            let Some(conversation) = state.conversations.get_mut(conversation_id) else {
                warn!("send_message on unknown conversation {}", conversation_id);
                return None;
            };

            let now = Utc::now();
            let message = Message {
                id: Uuid::new_v4().to_string(),
                conversation_id: conversation_id.to_string(),
                sender_id: user_id.clone(),
                receiver_id: conversation.counterpart_of(&user_id).to_string(),
                property_id: conversation.property_id.clone(),
                content: content.to_string(),
                is_read: true,
                created_at: now,
            };
            conversation.last_message = Some(message.content.clone());
            conversation.last_message_at = Some(now);

            state
                .messages
                .entry(conversation_id.to_string())
                .or_default()
                .push(message.clone());
            self.commit(&state);
            message
        };

        debug!("Sent message {} in {}", message.id, conversation_id);
        self.schedule_reply(conversation_id, content);
        Some(message)
    }

    fn schedule_reply(&self, conversation_id: &str, outgoing: &str) {
        let replies = &self.shared.replies;
        if !replies.enabled {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, skipping simulated reply for {}", conversation_id);
            return;
        };

        let (delay, reply) = {
            let mut rng = rand::thread_rng();
            (replies.draw_delay(&mut rng), canned_reply(outgoing, &mut rng))
        };
        debug!("Simulated reply for {} due in {:?}", conversation_id, delay);

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let id = conversation_id.to_string();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                MessageStore::from_shared(shared).add_simulated_reply(&id, reply);
            }
        });

        let mut pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
        let handles = pending.entry(conversation_id.to_string()).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Append a message from the conversation's counterpart. Counts as
    /// unread unless the user is viewing that conversation.
    pub fn add_simulated_reply(&self, conversation_id: &str, content: &str) {
        let mut state = self.lock();
        let user_id = state.user_id.clone();
        let viewing = state.is_viewing(conversation_id);
        let Some(conversation) = state.conversations.get_mut(conversation_id) else {
            debug!("Dropping reply for removed conversation {}", conversation_id);
            return;
        };

        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: conversation.counterpart_of(&user_id).to_string(),
            receiver_id: user_id,
            property_id: conversation.property_id.clone(),
            content: content.to_string(),
            is_read: viewing,
            created_at: now,
        };
        conversation.last_message = Some(message.content.clone());
        conversation.last_message_at = Some(now);
        if !viewing {
            conversation.unread_count += 1;
        }

        state
            .messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
        if !viewing {
            state.total_unread += 1;
        }
        info!(
            "Reply received in {} (total unread {})",
            conversation_id, state.total_unread
        );
        self.commit(&state);
    }

    /// Mark every message addressed to the local user in the conversation
    /// as read and clear its unread counter
    pub fn mark_as_read(&self, conversation_id: &str) {
        let mut state = self.lock();
        let user_id = state.user_id.clone();
        let Some(conversation) = state.conversations.get_mut(conversation_id) else {
            return;
        };
        let cleared = std::mem::take(&mut conversation.unread_count);

        let mut flipped = 0;
        if let Some(messages) = state.messages.get_mut(conversation_id) {
            for message in messages
                .iter_mut()
                .filter(|m| m.receiver_id == user_id && !m.is_read)
            {
                message.is_read = true;
                flipped += 1;
            }
        }

        if cleared == 0 && flipped == 0 {
            return;
        }
        state.total_unread = state.total_unread.saturating_sub(cleared);
        debug!(
            "Marked {} messages read in {} (total unread {})",
            flipped, conversation_id, state.total_unread
        );
        self.commit(&state);
    }

    pub fn set_active_conversation(&self, conversation_id: Option<&str>) {
        let mut state = self.lock();
        state.active_conversation_id = conversation_id.map(str::to_string);
        self.commit(&state);
    }

    pub fn open_chat(&self) {
        let mut state = self.lock();
        state.is_chat_open = true;
        self.commit(&state);
    }

    pub fn close_chat(&self) {
        let mut state = self.lock();
        state.is_chat_open = false;
        self.commit(&state);
    }

    pub fn toggle_chat(&self) {
        let mut state = self.lock();
        state.is_chat_open = !state.is_chat_open;
        self.commit(&state);
    }

    /// Delete a conversation and cancel its pending replies
    pub fn remove_conversation(&self, conversation_id: &str) -> bool {
        self.cancel_pending(conversation_id);

        let mut state = self.lock();
        let Some(conversation) = state.conversations.remove(conversation_id) else {
            return false;
        };
        state.messages.remove(conversation_id);
        state.total_unread = state.total_unread.saturating_sub(conversation.unread_count);
        if state.active_conversation_id.as_deref() == Some(conversation_id) {
            state.active_conversation_id = None;
        }
        info!("Removed conversation {}", conversation_id);
        self.commit(&state);
        true
    }

    fn cancel_pending(&self, conversation_id: &str) {
        let mut pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handles) = pending.remove(conversation_id) {
            for handle in handles {
                handle.abort();
            }
        }
    }

    /// Cancel every pending simulated reply
    pub fn shutdown(&self) {
        info!("Cancelling pending simulated replies");
        self.shared.abort_all();
    }

    /// Number of replies still scheduled for a conversation
    pub fn pending_replies(&self, conversation_id: &str) -> usize {
        let pending = self.shared.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending
            .get(conversation_id)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.lock().conversations.get(conversation_id).cloned()
    }

    /// Conversations ordered by most recent activity first
    pub fn conversations(&self) -> Vec<Conversation> {
        let mut list: Vec<Conversation> = self.lock().conversations.values().cloned().collect();
        list.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        list
    }

    pub fn messages(&self, conversation_id: &str) -> Vec<Message> {
        self.lock()
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_unread(&self) -> u32 {
        self.lock().total_unread
    }

    pub fn snapshot(&self) -> MessagingState {
        self.lock().clone()
    }

    /// Revision counter bumped after every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> MessageStore {
        MessageStore::new(Arc::new(MemoryStore::new()), ReplySettings::default())
    }

    fn start(store: &MessageStore) -> String {
        store.start_conversation(
            "seller_1",
            "Asha Rao",
            "prop_42",
            "3 BHK in Powai",
            Some("https://img.example/42.jpg"),
        )
    }

    #[test]
    fn start_conversation_is_idempotent_per_property_and_seller() {
        let store = store();
        let first = start(&store);
        let second = start(&store);
        assert_eq!(first, second);
        assert_eq!(store.conversations().len(), 1);

        let other = store.start_conversation("seller_2", "Vikram", "prop_42", "3 BHK in Powai", None);
        assert_ne!(first, other);
        assert_eq!(store.conversations().len(), 2);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.active_conversation_id.as_deref(), Some(other.as_str()));
        assert!(snapshot.is_chat_open);

        let conv = store.conversation(&first).unwrap();
        assert_eq!(conv.unread_count, 0);
        assert_eq!(conv.buyer_id, store.user_id());
        assert!(store.messages(&first).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn each_send_appends_one_message_and_updates_summary() {
        let store = store();
        let id = start(&store);

        for (i, text) in ["Hi", "Is it available?", "Can I visit Saturday?"].iter().enumerate() {
            let sent = store.send_message(&id, text).unwrap();
            assert_eq!(store.messages(&id).len(), i + 1);

            let conv = store.conversation(&id).unwrap();
            assert_eq!(conv.last_message.as_deref(), Some(*text));
            assert_eq!(conv.last_message_at, Some(sent.created_at));
            assert_eq!(sent.sender_id, store.user_id());
            assert_eq!(sent.receiver_id, "seller_1");
            assert_eq!(sent.property_id, "prop_42");
        }
        assert_eq!(store.pending_replies(&id), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn send_to_unknown_conversation_is_a_no_op() {
        let store = store();
        assert!(store.send_message("missing", "hello").is_none());
        assert!(store.messages("missing").is_empty());

        let id = start(&store);
        assert!(store.send_message(&id, "   ").is_none());
        assert!(store.messages(&id).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_reply_arrives_and_counts_unread_when_not_viewing() {
        let store = store();
        let id = start(&store);
        store.close_chat();

        store.send_message(&id, "What is the price?").unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;

        let messages = store.messages(&id);
        assert_eq!(messages.len(), 2);
        let reply = &messages[1];
        assert_eq!(reply.sender_id, "seller_1");
        assert_eq!(reply.receiver_id, store.user_id());
        assert!(!reply.is_read);
        assert!(reply.content.contains("negotiable"));

        let conv = store.conversation(&id).unwrap();
        assert_eq!(conv.unread_count, 1);
        assert_eq!(conv.last_message.as_deref(), Some(reply.content.as_str()));
        assert_eq!(store.total_unread(), 1);
        assert_eq!(store.pending_replies(&id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_in_open_conversation_is_already_read() {
        let store = store();
        let id = start(&store);

        store.send_message(&id, "hello").unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;

        let messages = store.messages(&id);
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_read);
        assert_eq!(store.conversation(&id).unwrap().unread_count, 0);
        assert_eq!(store.total_unread(), 0);
    }

    #[test]
    fn mark_as_read_clears_counters() {
        let store = store();
        let a = start(&store);
        let b = store.start_conversation("seller_2", "Vikram", "prop_7", "Villa in Baner", None);
        store.set_active_conversation(None);

        store.add_simulated_reply(&a, "one");
        store.add_simulated_reply(&a, "two");
        store.add_simulated_reply(&b, "three");
        assert_eq!(store.total_unread(), 3);

        store.mark_as_read(&a);
        let user = store.user_id();
        assert!(store
            .messages(&a)
            .iter()
            .filter(|m| m.receiver_id == user)
            .all(|m| m.is_read));
        assert_eq!(store.conversation(&a).unwrap().unread_count, 0);
        assert_eq!(store.total_unread(), 1);

        store.mark_as_read("missing");
        assert_eq!(store.total_unread(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn removing_a_conversation_cancels_its_replies() {
        let store = store();
        let id = start(&store);
        store.close_chat();
        store.add_simulated_reply(&id, "earlier");
        store.send_message(&id, "anyone there?").unwrap();
        assert_eq!(store.pending_replies(&id), 1);

        assert!(store.remove_conversation(&id));
        assert_eq!(store.pending_replies(&id), 0);
        assert_eq!(store.total_unread(), 0);
        assert!(store.snapshot().active_conversation_id.is_none());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.conversation(&id).is_none());
        assert!(store.messages(&id).is_empty());
        assert!(!store.remove_conversation(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_all_pending_replies() {
        let store = store();
        let id = start(&store);
        store.send_message(&id, "first").unwrap();
        store.send_message(&id, "second").unwrap();

        store.shutdown();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(store.messages(&id).len(), 2);
        assert_eq!(store.pending_replies(&id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_replies_schedule_nothing() {
        let store = MessageStore::new(Arc::new(MemoryStore::new()), ReplySettings::disabled());
        let id = start(&store);
        store.send_message(&id, "hello").unwrap();
        assert_eq!(store.pending_replies(&id), 0);
    }

    #[test]
    fn state_survives_reload_without_ui_focus() {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = MessageStore::new(persistence.clone(), ReplySettings::disabled());
        let id = start(&first);
        first.send_message(&id, "Is parking included?").unwrap();
        first.close_chat();
        first.add_simulated_reply(&id, "Yes, one covered slot.");

        let reloaded = MessageStore::new(persistence, ReplySettings::disabled());
        assert_eq!(reloaded.user_id(), first.user_id());
        assert_eq!(reloaded.messages(&id).len(), 2);
        assert_eq!(reloaded.total_unread(), 1);

        let snapshot = reloaded.snapshot();
        assert!(snapshot.active_conversation_id.is_none());
        assert!(!snapshot.is_chat_open);
    }

    #[test]
    fn conversations_are_ordered_by_recent_activity() {
        let store = MessageStore::new(Arc::new(MemoryStore::new()), ReplySettings::disabled());
        let older = start(&store);
        let newer = store.start_conversation("seller_2", "Vikram", "prop_7", "Villa in Baner", None);
        store.add_simulated_reply(&older, "bumped");

        let order: Vec<String> = store.conversations().into_iter().map(|c| c.id).collect();
        assert_eq!(order, vec![older, newer]);
    }

    #[test]
    fn subscribers_see_revisions() {
        let store = store();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        start(&store);
        assert!(rx.has_changed().unwrap());
        let seen = *rx.borrow_and_update();
        assert!(seen >= 1);
    }
}
