use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// Opaque player identity. The adapter fills this with whatever stable
// identifier its chat platform hands out; the core never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId(id.to_string())
    }
}

// Ordered, duplicate-free signup queue. The head is whoever currently has
// the floor; rotation moves the head to the tail and leaves everyone else's
// relative order untouched.
#[derive(Debug, Clone, Default)]
pub struct PlayerQueue {
    players: VecDeque<PlayerId>,
}

impl PlayerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Appends to the tail. Returns false (and changes nothing) if the player
    // already signed up; duplicate signups are not an error.
    pub fn add(&mut self, player: PlayerId) -> bool {
        if self.players.contains(&player) {
            false
        } else {
            self.players.push_back(player);
            true
        }
    }

    // Returns false if the player was never in the queue.
    pub fn remove(&mut self, player: &PlayerId) -> bool {
        match self.players.iter().position(|p| p == player) {
            Some(index) => {
                self.players.remove(index);
                true
            }
            None => false,
        }
    }

    // Moves the current head to the tail.
    pub fn rotate(&mut self) -> Result<(), GameError> {
        match self.players.pop_front() {
            Some(head) => {
                self.players.push_back(head);
                Ok(())
            }
            None => Err(GameError::EmptyQueue),
        }
    }

    pub fn current(&self) -> Result<&PlayerId, GameError> {
        self.players.front().ok_or(GameError::EmptyQueue)
    }

    // The player whose turn comes after the current one.
    pub fn peek_next(&self) -> Result<&PlayerId, GameError> {
        match self.players.len() {
            0 => Err(GameError::EmptyQueue),
            1 => Err(GameError::InsufficientPlayers),
            _ => Ok(&self.players[1]),
        }
    }

    // Makes `target` the current head, signing them up first if needed.
    // The rotation count is bounded by the queue size so a missing target
    // can never spin this forever.
    pub fn fast_forward(&mut self, target: &PlayerId) {
        self.add(target.clone());
        for _ in 0..self.players.len() {
            if self.players.front() == Some(target) {
                break;
            }
            if let Some(head) = self.players.pop_front() {
                self.players.push_back(head);
            }
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.iter()
    }

    pub fn size(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn reset(&mut self) {
        self.players.clear();
    }
}
