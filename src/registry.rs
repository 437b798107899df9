use crate::deck::PromptDeck;
use crate::session::GameSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

// The adapter-defined conversation scope a session lives in. Opaque to the
// core, same as player identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        ChannelId(id.to_string())
    }
}

// Sole owner of the channel -> session map. Sessions are created lazily on
// first touch, bound to the deck loaded at that moment, and handed out
// behind one exclusive lock per channel; different channels never contend.
pub struct SessionRegistry {
    deck: Arc<PromptDeck>,
    sessions: HashMap<ChannelId, Arc<Mutex<GameSession>>>,
}

impl SessionRegistry {
    pub fn new(deck: Arc<PromptDeck>) -> Self {
        SessionRegistry {
            deck,
            sessions: HashMap::new(),
        }
    }

    // Existing session for the channel, or a fresh one over the currently
    // loaded deck. Never fails.
    pub fn get(&mut self, channel: &ChannelId) -> Arc<Mutex<GameSession>> {
        if let Some(session) = self.sessions.get(channel) {
            return Arc::clone(session);
        }
        let session = Arc::new(Mutex::new(GameSession::new(Arc::clone(&self.deck))));
        self.sessions.insert(channel.clone(), Arc::clone(&session));
        session
    }

    // Discards the channel's session, queue membership and all, and installs
    // a fresh play-through over `deck`. Loading new content starts clean.
    pub fn replace(&mut self, channel: &ChannelId, deck: Arc<PromptDeck>) -> Arc<Mutex<GameSession>> {
        let session = Arc::new(Mutex::new(GameSession::new(deck)));
        self.sessions.insert(channel.clone(), Arc::clone(&session));
        session
    }

    // Swaps the deck used for sessions created after this point. Channels
    // already playing keep their deck until their own reload.
    pub fn set_deck(&mut self, deck: Arc<PromptDeck>) {
        self.deck = deck;
    }

    pub fn deck(&self) -> &Arc<PromptDeck> {
        &self.deck
    }

    pub fn channel_count(&self) -> usize {
        self.sessions.len()
    }
}
