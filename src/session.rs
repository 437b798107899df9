use crate::deck::PromptDeck;
use crate::draw::{DrawState, MessageRef};
use crate::error::GameError;
use crate::queue::{PlayerId, PlayerQueue};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

// Minutes reserved per signed-up player when a total time limit is set.
// Whatever remains after the buffer is the actual play budget.
const BUFFER_MINUTES_PER_PLAYER: i64 = 2;

// A player and the prompt that is theirs to answer. The two are produced
// together so the adapter can never render a stale pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnUpdate {
    pub player: PlayerId,
    pub prompt: String,
}

// Read-only snapshot for the status command.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub title: String,
    pub current_player: Option<PlayerId>,
    pub next_player: Option<PlayerId>,
    pub current_prompt: Option<String>,
    pub players: Vec<PlayerId>,
    pub used_prompts: usize,
    pub remaining_prompts: usize,
    pub constraints: Vec<String>,
    pub finished: bool,
    pub last_rendered: Option<MessageRef>,
}

// One channel's game: the signup queue plus the draw state for the current
// play-through, bound to one shared deck. Replaced wholesale when new
// content is loaded; resets only ever target the queue or the draw state
// explicitly, never both at once.
#[derive(Debug)]
pub struct GameSession {
    deck: Arc<PromptDeck>,
    queue: PlayerQueue,
    draw: DrawState,
    rng: StdRng,
}

impl GameSession {
    pub fn new(deck: Arc<PromptDeck>) -> Self {
        Self::with_rng(deck, StdRng::from_os_rng())
    }

    // Deterministic draws for tests; the generator is a constructor
    // parameter, never a hidden global.
    pub fn with_rng(deck: Arc<PromptDeck>, rng: StdRng) -> Self {
        GameSession {
            deck,
            queue: PlayerQueue::new(),
            draw: DrawState::new(),
            rng,
        }
    }

    pub fn deck(&self) -> &PromptDeck {
        &self.deck
    }

    pub fn has_started(&self) -> bool {
        self.draw.has_started()
    }

    pub fn is_finished(&self) -> bool {
        self.draw.is_finished()
    }

    // --- Queue membership, delegated to the signup queue.

    pub fn add_player(&mut self, player: PlayerId) -> bool {
        self.queue.add(player)
    }

    pub fn remove_player(&mut self, player: &PlayerId) -> bool {
        self.queue.remove(player)
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.queue.members().cloned().collect()
    }

    pub fn player_count(&self) -> usize {
        self.queue.size()
    }

    pub fn current_player(&self) -> Result<&PlayerId, GameError> {
        self.queue.current()
    }

    pub fn peek_next(&self) -> Result<&PlayerId, GameError> {
        self.queue.peek_next()
    }

    // Clears the signup list only; the draw state is untouched.
    pub fn reset_players(&mut self) {
        self.queue.reset();
    }

    // --- The turn/prompt protocol.

    pub fn start(&mut self, first_player: PlayerId) -> Result<TurnUpdate, GameError> {
        self.start_at(first_player, Utc::now())
    }

    // Fast-forwards the queue to the opening player and draws the first
    // prompt for them.
    pub fn start_at(
        &mut self,
        first_player: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<TurnUpdate, GameError> {
        self.queue.fast_forward(&first_player);
        self.draw.advance(&self.deck, &mut self.rng, now);
        self.bound_pair()
    }

    pub fn advance_turn(&mut self) -> Result<TurnUpdate, GameError> {
        self.advance_turn_at(Utc::now())
    }

    // Next player, next prompt.
    pub fn advance_turn_at(&mut self, now: DateTime<Utc>) -> Result<TurnUpdate, GameError> {
        self.queue.rotate()?;
        self.draw.advance(&self.deck, &mut self.rng, now);
        self.bound_pair()
    }

    pub fn skip(&mut self) -> Result<TurnUpdate, GameError> {
        self.skip_at(Utc::now())
    }

    // Passes the floor without spending a prompt: the queue rotates and the
    // unanswered prompt stays on the table for the next player. Draw state
    // stays untouched, except that before the first draw this counts as the
    // first prompt access like any other operation.
    pub fn skip_at(&mut self, now: DateTime<Utc>) -> Result<TurnUpdate, GameError> {
        self.queue.rotate()?;
        if !self.draw.has_started() {
            self.draw.advance(&self.deck, &mut self.rng, now);
        }
        self.bound_pair()
    }

    pub fn redact(&mut self, last_rendered: MessageRef) -> Result<TurnUpdate, GameError> {
        self.redact_at(last_rendered, Utc::now())
    }

    // Withdraws the most recently shown prompt: stores the adapter's message
    // handle for it and draws a replacement for the same player. No
    // rotation.
    pub fn redact_at(
        &mut self,
        last_rendered: MessageRef,
        now: DateTime<Utc>,
    ) -> Result<TurnUpdate, GameError> {
        self.queue.current()?;
        self.draw.record_rendered(last_rendered);
        self.draw.advance(&self.deck, &mut self.rng, now);
        self.bound_pair()
    }

    // --- End-condition configuration.

    pub fn set_prompt_limit(&mut self, count: usize) -> Result<(), GameError> {
        if count == 0 {
            return Err(GameError::InvalidConfiguration(
                "prompt limit must be at least 1".into(),
            ));
        }
        self.draw.set_max_prompts(count);
        Ok(())
    }

    pub fn set_time_limit(&mut self, minutes: i64) -> Result<(), GameError> {
        self.set_time_limit_at(minutes, Utc::now())
    }

    // A requested total of M minutes reserves two minutes of buffer per
    // signed-up player; the rest is the play budget. An over-subtracted
    // budget is clamped (to one minute) when the deadline is armed rather
    // than rejected here.
    pub fn set_time_limit_at(
        &mut self,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        if minutes <= 0 {
            return Err(GameError::InvalidConfiguration(
                "time limit must be at least 1 minute".into(),
            ));
        }
        let budget = minutes - BUFFER_MINUTES_PER_PLAYER * self.queue.size() as i64;
        self.draw.set_time_budget(budget);
        if self.draw.has_started() {
            self.draw.arm_deadline(now);
        }
        Ok(())
    }

    pub fn length_constraints(&self) -> Vec<String> {
        self.draw.length_constraints()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            title: self.deck.title.clone(),
            current_player: self.queue.current().ok().cloned(),
            next_player: self.queue.peek_next().ok().cloned(),
            current_prompt: self.draw.current_prompt(&self.deck).map(str::to_string),
            players: self.players(),
            used_prompts: self.draw.used_count(),
            remaining_prompts: self.deck.prompt_count() - self.draw.used_count(),
            constraints: self.draw.length_constraints(),
            finished: self.draw.is_finished(),
            last_rendered: self.draw.last_rendered().cloned(),
        }
    }

    pub fn used_prompts(&self) -> usize {
        self.draw.used_count()
    }

    // The player and prompt read together, so callers always hand the
    // adapter a coherent pairing.
    fn bound_pair(&self) -> Result<TurnUpdate, GameError> {
        let player = self.queue.current()?.clone();
        let prompt = self
            .draw
            .current_prompt(&self.deck)
            .ok_or(GameError::DrawExhausted)?
            .to_string();
        Ok(TurnUpdate { player, prompt })
    }
}
