use crate::error::ContentLoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;

// Static deck content: intro material plus the regular prompts and the one
// closing prompt. Immutable once loaded; sessions share it behind an Arc and
// keep their draw bookkeeping elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDeck {
    pub title: String,
    #[serde(default)]
    pub intro: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(rename = "final")]
    pub final_prompt: String,
    pub prompts: Vec<String>,
}

// One record of the tabular export format: a deck label, an optional header,
// and the card body. Numbered decks hold prompts, the highest number being
// the closing deck; an "option" deck carries metadata such as the title.
#[derive(Debug, Clone, Deserialize)]
pub struct DeckRow {
    pub deck: String,
    #[serde(default)]
    pub header: String,
    pub body: String,
}

impl PromptDeck {
    pub fn load_from_file(path: &str) -> Result<Self, ContentLoadError> {
        let file = File::open(path)?;
        let deck: PromptDeck = serde_json::from_reader(file)?;
        deck.validate()
    }

    // Builds a deck from already-fetched tabular rows. Fetching the rows
    // (and any credentials that takes) is the caller's business.
    pub fn from_rows(rows: &[DeckRow]) -> Result<Self, ContentLoadError> {
        let mut title = String::new();
        let mut decks: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for row in rows {
            if row.deck == "option" {
                if row.header == "gameTitle" {
                    title = row.body.clone();
                }
            } else if let Ok(number) = row.deck.parse::<u32>() {
                let text = if row.header.is_empty() {
                    row.body.clone()
                } else {
                    format!("{} - {}", row.header, row.body)
                };
                decks.entry(number).or_default().push(text);
            }
            // Rows with any other deck label are decoration in the source
            // sheets and are skipped.
        }

        let final_number = *decks.keys().next_back().ok_or(ContentLoadError::EmptyDeck)?;
        let final_prompt = decks
            .remove(&final_number)
            .unwrap_or_default()
            .join("\n");
        let prompts = decks.into_values().flatten().collect();

        PromptDeck {
            title,
            intro: Vec::new(),
            instructions: Vec::new(),
            final_prompt,
            prompts,
        }
        .validate()
    }

    // A tiny built-in deck so the demo binary runs without any content file,
    // in the spirit of the placeholder intro the earliest revisions shipped.
    pub fn builtin() -> Self {
        PromptDeck {
            title: "For the Queen (demo deck)".into(),
            intro: vec![
                "The Queen has decided to leave the safety of her kingdom \
                 and travel to a distant land. You are among those chosen \
                 to accompany her."
                    .into(),
            ],
            instructions: vec![
                "When a prompt is drawn for you, answer it aloud, then pass \
                 the turn."
                    .into(),
                "Any player may invoke the x-card to withdraw a prompt."
                    .into(),
            ],
            final_prompt: "The Queen is under attack. Do you defend her?".into(),
            prompts: vec![
                "Why do you love the Queen?".into(),
                "The Queen trusts you more than anyone. Why?".into(),
                "What did you leave behind to join this journey?".into(),
                "What small kindness did the Queen once show you?".into(),
                "What do you fear will happen before the journey ends?".into(),
                "What rumor about the Queen do you suspect is true?".into(),
            ],
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    // Never hand back a partially usable deck.
    fn validate(self) -> Result<Self, ContentLoadError> {
        if self.prompts.is_empty() {
            return Err(ContentLoadError::EmptyDeck);
        }
        if self.final_prompt.trim().is_empty() {
            return Err(ContentLoadError::MissingFinal);
        }
        Ok(self)
    }
}
