use crate::deck::PromptDeck;
use crate::error::GameError;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// Ceiling on regular draws when nobody configured an end condition.
pub const DEFAULT_PROMPT_LIMIT: usize = 20;

// Opaque handle to the most recently rendered prompt message. Owned by the
// adapter; the core stores and returns it, never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef(pub String);

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Where one play-through stands. `Drawing` carries the index of the prompt
// currently on the table; index 0 is a real index, never a stand-in for
// "nothing drawn yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    NotStarted,
    Drawing(usize),
    Finished,
}

// Per-play-through draw bookkeeping over one immutable deck. The used set
// only grows; a non-final current index is always a member of it; the
// deadline, once armed, is never recomputed.
#[derive(Debug, Clone)]
pub struct DrawState {
    phase: DrawPhase,
    used: HashSet<usize>,
    max_prompts: Option<usize>,
    budget_minutes: Option<i64>,
    deadline: Option<DateTime<Utc>>,
    last_rendered: Option<MessageRef>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawState {
    pub fn new() -> Self {
        DrawState {
            phase: DrawPhase::NotStarted,
            used: HashSet::new(),
            max_prompts: None,
            budget_minutes: None,
            deadline: None,
            last_rendered: None,
        }
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == DrawPhase::Finished
    }

    pub fn has_started(&self) -> bool {
        self.phase != DrawPhase::NotStarted
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    pub fn max_prompts(&self) -> Option<usize> {
        self.max_prompts
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn set_max_prompts(&mut self, max: usize) {
        self.max_prompts = Some(max);
    }

    // Stores the play budget in minutes. The deadline itself is armed on the
    // first prompt access, or immediately if the play-through already began.
    pub fn set_time_budget(&mut self, minutes: i64) {
        self.budget_minutes = Some(minutes);
    }

    pub fn record_rendered(&mut self, reference: MessageRef) {
        self.last_rendered = Some(reference);
    }

    pub fn last_rendered(&self) -> Option<&MessageRef> {
        self.last_rendered.as_ref()
    }

    // The prompt currently on the table: none before the first draw, the
    // deck's closing prompt once finished.
    pub fn current_prompt<'a>(&self, deck: &'a PromptDeck) -> Option<&'a str> {
        match self.phase {
            DrawPhase::NotStarted => None,
            DrawPhase::Drawing(index) => deck.prompts.get(index).map(String::as_str),
            DrawPhase::Finished => Some(&deck.final_prompt),
        }
    }

    // One step of the draw machine. From `NotStarted` this is the first
    // prompt access, which also arms the deadline; from `Finished` it is a
    // no-op. Otherwise: end condition met -> `Finished`, else draw one
    // unused index uniformly at random.
    pub fn advance(&mut self, deck: &PromptDeck, rng: &mut impl Rng, now: DateTime<Utc>) {
        match self.phase {
            DrawPhase::Finished => return,
            DrawPhase::NotStarted => self.arm_deadline(now),
            DrawPhase::Drawing(_) => {}
        }

        if self.end_condition_met(deck, now) {
            self.phase = DrawPhase::Finished;
            return;
        }

        match self.draw_unused(deck, rng) {
            Ok(index) => {
                self.used.insert(index);
                self.phase = DrawPhase::Drawing(index);
            }
            // Exhaustion is already an end condition; this arm only exists
            // so an impossible draw can never loop or panic.
            Err(_) => self.phase = DrawPhase::Finished,
        }
    }

    // Arms the deadline exactly once, if a time budget was configured. The
    // budget is clamped to a minute so an over-subtracted buffer still
    // yields a playable (if short) game.
    pub fn arm_deadline(&mut self, now: DateTime<Utc>) {
        if self.deadline.is_none() {
            if let Some(minutes) = self.budget_minutes {
                self.deadline = Some(now + Duration::minutes(minutes.max(1)));
            }
        }
    }

    fn end_condition_met(&self, deck: &PromptDeck, now: DateTime<Utc>) -> bool {
        let used = self.used.len();
        if used >= deck.prompt_count() {
            return true;
        }
        match self.max_prompts {
            Some(max) if used >= max => return true,
            // The default ceiling only binds when neither limit was set.
            None if self.budget_minutes.is_none() && used >= DEFAULT_PROMPT_LIMIT => {
                return true;
            }
            _ => {}
        }
        match self.deadline {
            Some(deadline) if now >= deadline => true,
            _ => false,
        }
    }

    // Uniform pick over the unused indices. Collecting the complement first
    // keeps this a single bounded draw rather than a resample loop.
    fn draw_unused(&self, deck: &PromptDeck, rng: &mut impl Rng) -> Result<usize, GameError> {
        let unused: Vec<usize> = (0..deck.prompt_count())
            .filter(|index| !self.used.contains(index))
            .collect();
        if unused.is_empty() {
            return Err(GameError::DrawExhausted);
        }
        Ok(unused[rng.random_range(0..unused.len())])
    }

    // Human-readable description of the active end conditions, for the
    // length query and the status snapshot.
    pub fn length_constraints(&self) -> Vec<String> {
        let mut constraints = Vec::new();
        if let Some(max) = self.max_prompts {
            constraints.push(format!("at most {} prompts", max));
        }
        if let Some(minutes) = self.budget_minutes {
            match self.deadline {
                Some(deadline) => {
                    constraints.push(format!("until {}", deadline.format("%H:%M UTC")));
                }
                None => {
                    constraints.push(format!("about {} minutes of play", minutes.max(1)));
                }
            }
        }
        if constraints.is_empty() {
            constraints.push(format!("at most {} prompts (default)", DEFAULT_PROMPT_LIMIT));
        }
        constraints
    }
}
