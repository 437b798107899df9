use crate::deck::PromptDeck;
use crate::draw::MessageRef;
use crate::error::GameError;
use crate::message::Message;
use crate::queue::PlayerId;
use crate::registry::{ChannelId, SessionRegistry};
use crate::session::{GameSession, TurnUpdate};
use crate::settings::Settings;
use crate::utils::join_players;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::EnumString;

const WRAP_WIDTH: usize = 72;

// The command vocabulary. Several verbs keep the aliases players knew from
// the original bot; `next`/`done`/`prompt` all pass the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Verb {
    #[strum(serialize = "join", serialize = "add")]
    Join,
    #[strum(serialize = "leave", serialize = "remove")]
    Leave,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "next", serialize = "done", serialize = "prompt")]
    Next,
    #[strum(serialize = "skip")]
    Skip,
    #[strum(serialize = "xcard", serialize = "redact")]
    XCard,
    #[strum(serialize = "promptlimit")]
    PromptLimit,
    #[strum(serialize = "timelimit")]
    TimeLimit,
    #[strum(serialize = "length")]
    Length,
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "load")]
    Load,
    #[strum(serialize = "reset")]
    Reset,
    #[strum(serialize = "help")]
    Help,
    #[strum(serialize = "quit", serialize = "exit")]
    Quit,
}

// One parsed input line: `#channel @player +verb args...`. Channel and
// player fall back to defaults so a quick local session needs no prefixes.
#[derive(Debug)]
pub struct ParsedCommand {
    pub channel: ChannelId,
    pub player: PlayerId,
    pub verb: Verb,
    pub args: Vec<String>,
}

// The console adapter: parses command lines, drives the registry and the
// sessions behind it, and renders templated strings. Everything that crosses
// into the core is a plain value; everything that comes back is rendered
// here.
pub struct App {
    pub settings: Settings,
    pub registry: SessionRegistry,
    pub running: bool,

    // The adapter owns message references: a counter stands in for the chat
    // platform's message ids, and the last prompt rendered per channel is
    // what the x-card withdraws.
    rendered_count: u64,
    last_prompt: HashMap<ChannelId, (MessageRef, String)>,
}

impl App {
    pub fn new(settings: Settings, registry: SessionRegistry) -> Self {
        App {
            settings,
            registry,
            running: true,
            rendered_count: 0,
            last_prompt: HashMap::new(),
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Vec<Message> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        let parsed = match self.parse_line(line) {
            Ok(parsed) => parsed,
            Err(text) => return vec![Message::system(text)],
        };
        debug!(
            "#{} @{} -> {:?} {:?}",
            parsed.channel, parsed.player, parsed.verb, parsed.args
        );

        match parsed.verb {
            Verb::Quit => {
                self.running = false;
                vec![Message::system("Goodbye!".to_string())]
            }
            Verb::Help => vec![Message::system(self.help_text())],
            Verb::Load => self.handle_load(&parsed).await,
            _ => self.handle_session_command(&parsed).await,
        }
    }

    fn parse_line(&self, line: &str) -> Result<ParsedCommand, String> {
        let mut channel = ChannelId::from("table");
        let mut player = PlayerId::from("guest");

        let mut tokens = line.split_whitespace().peekable();
        while let Some(token) = tokens.peek() {
            if let Some(name) = token.strip_prefix('#') {
                channel = ChannelId(name.to_string());
                tokens.next();
            } else if let Some(name) = token.strip_prefix('@') {
                player = PlayerId(name.to_string());
                tokens.next();
            } else {
                break;
            }
        }

        let prefix = self.settings.command_prefix.as_str();
        let word = tokens
            .next()
            .ok_or_else(|| format!("Try {}help for the command list.", prefix))?;
        let verb_text = word.strip_prefix(prefix).ok_or_else(|| {
            format!("Commands start with '{}'. Try {}help.", prefix, prefix)
        })?;
        let verb = Verb::from_str(verb_text)
            .map_err(|_| format!("Unknown command '{}'. Try {}help.", word, prefix))?;
        let args = tokens.map(str::to_string).collect();

        Ok(ParsedCommand {
            channel,
            player,
            verb,
            args,
        })
    }

    async fn handle_session_command(&mut self, parsed: &ParsedCommand) -> Vec<Message> {
        let session = self.registry.get(&parsed.channel);
        let mut session = session.lock().await;

        match parsed.verb {
            Verb::Join => self.update_players(&mut session, parsed, true),
            Verb::Leave => self.update_players(&mut session, parsed, false),
            Verb::List => {
                let players = session.players();
                if players.is_empty() {
                    vec![Message::game(
                        "No players currently signed up!".to_string(),
                    )]
                } else {
                    vec![Message::game(format!(
                        "Current players: {}",
                        join_players(", ", &players)
                    ))]
                }
            }
            Verb::Start => {
                let mut messages = self.render_intro(session.deck());
                match session.start(parsed.player.clone()) {
                    Ok(update) => messages.push(self.render_turn(&parsed.channel, &update)),
                    Err(err) => messages.push(Message::system(describe(&err))),
                }
                messages
            }
            Verb::Next => match session.advance_turn() {
                Ok(update) => vec![self.render_turn(&parsed.channel, &update)],
                Err(err) => vec![Message::system(describe(&err))],
            },
            Verb::Skip => {
                let outgoing = session.current_player().ok().cloned();
                match session.skip() {
                    Ok(update) => {
                        let mut message = self.render_turn(&parsed.channel, &update);
                        if let Some(outgoing) = outgoing {
                            message.content = format!(
                                "{} (we'd still like to hear your answer, @{}!)",
                                message.content, outgoing
                            );
                        }
                        vec![message]
                    }
                    Err(err) => vec![Message::system(describe(&err))],
                }
            }
            Verb::XCard => {
                let Some((reference, text)) = self.last_prompt.get(&parsed.channel).cloned()
                else {
                    return vec![Message::system(
                        "Nothing has been drawn to withdraw yet.".to_string(),
                    )];
                };
                match session.redact(reference.clone()) {
                    Ok(update) => {
                        info!("#{}: prompt withdrawn at {}", parsed.channel, reference);
                        vec![
                            Message::game(format!("[{}] withdrawn: ||{}||", reference, text)),
                            self.render_turn(&parsed.channel, &update),
                        ]
                    }
                    Err(err) => vec![Message::system(describe(&err))],
                }
            }
            Verb::PromptLimit => match parse_count(&parsed.args) {
                Some(count) => match session.set_prompt_limit(count) {
                    Ok(()) => vec![self.render_length(&session)],
                    Err(err) => vec![Message::system(describe(&err))],
                },
                None => vec![Message::system(format!(
                    "Usage: {}promptlimit <number of prompts>",
                    self.settings.command_prefix
                ))],
            },
            Verb::TimeLimit => match parse_minutes(&parsed.args) {
                Some(minutes) => match session.set_time_limit(minutes) {
                    Ok(()) => vec![self.render_length(&session)],
                    Err(err) => vec![Message::system(describe(&err))],
                },
                None => vec![Message::system(format!(
                    "Usage: {}timelimit <total minutes>",
                    self.settings.command_prefix
                ))],
            },
            Verb::Length => vec![self.render_length(&session)],
            Verb::Status => self.render_status(&session),
            Verb::Reset => {
                session.reset_players();
                vec![Message::game(format!(
                    "Player list cleared. Sign up again with {}join!",
                    self.settings.command_prefix
                ))]
            }
            // Handled before locking a session.
            Verb::Load | Verb::Help | Verb::Quit => Vec::new(),
        }
    }

    // Applies a signup change for the issuing player, or for every player
    // named in the arguments, and reports who changed and who did not.
    fn update_players(
        &self,
        session: &mut GameSession,
        parsed: &ParsedCommand,
        joining: bool,
    ) -> Vec<Message> {
        let targets: Vec<PlayerId> = if parsed.args.is_empty() {
            vec![parsed.player.clone()]
        } else {
            parsed
                .args
                .iter()
                .map(|arg| PlayerId(arg.trim_start_matches('@').to_string()))
                .collect()
        };

        let mut changed = Vec::new();
        let mut unchanged = Vec::new();
        for target in targets {
            let applied = if joining {
                session.add_player(target.clone())
            } else {
                session.remove_player(&target)
            };
            if applied {
                changed.push(target);
            } else {
                unchanged.push(target);
            }
        }

        let mut text = String::new();
        if !changed.is_empty() {
            text = if joining {
                format!("{} added to current game!", join_players(", ", &changed))
            } else {
                format!("{} removed from current game", join_players(", ", &changed))
            };
        }
        if !unchanged.is_empty() {
            let unchanged_text = if joining {
                format!("{} already in game!", join_players(", ", &unchanged))
            } else {
                format!("{} not in game", join_players(", ", &unchanged))
            };
            text = if text.is_empty() {
                unchanged_text
            } else {
                format!("{} ({})", text, unchanged_text)
            };
        }
        vec![Message::game(text)]
    }

    async fn handle_load(&mut self, parsed: &ParsedCommand) -> Vec<Message> {
        let path = parsed
            .args
            .first()
            .cloned()
            .unwrap_or_else(|| self.settings.deck_path.clone());

        match PromptDeck::load_from_file(&path) {
            Ok(deck) => {
                let deck = Arc::new(deck);
                // New content starts a clean play-through for this channel
                // and becomes the deck for channels touched later.
                self.registry.replace(&parsed.channel, Arc::clone(&deck));
                self.registry.set_deck(Arc::clone(&deck));
                self.last_prompt.remove(&parsed.channel);
                info!("#{}: loaded deck '{}' from {}", parsed.channel, deck.title, path);
                vec![Message::game(format!(
                    "Loaded \"{}\" ({} prompts). Sign up with {}join!",
                    deck.title,
                    deck.prompt_count(),
                    self.settings.command_prefix
                ))]
            }
            Err(err) => {
                warn!("#{}: deck load from {} failed: {}", parsed.channel, path, err);
                vec![Message::system(format!(
                    "Couldn't load a deck from {}: {}. The current game is untouched.",
                    path, err
                ))]
            }
        }
    }

    fn render_intro(&self, deck: &PromptDeck) -> Vec<Message> {
        let mut messages = vec![Message::game(format!("** {} **", deck.title))];
        for paragraph in &deck.intro {
            messages.push(Message::game(textwrap::fill(paragraph, WRAP_WIDTH)));
        }
        for instruction in &deck.instructions {
            messages.push(Message::game(format!(
                "- {}",
                textwrap::fill(instruction, WRAP_WIDTH)
            )));
        }
        messages
    }

    // Renders a player/prompt pairing and remembers the rendered message so
    // the x-card can withdraw it later.
    fn render_turn(&mut self, channel: &ChannelId, update: &TurnUpdate) -> Message {
        self.rendered_count += 1;
        let reference = MessageRef(format!("msg-{}", self.rendered_count));
        self.last_prompt
            .insert(channel.clone(), (reference, update.prompt.clone()));
        Message::game(format!("{}: @{}", update.prompt, update.player))
    }

    fn render_length(&self, session: &GameSession) -> Message {
        Message::game(format!(
            "This game runs {}.",
            session.length_constraints().join(" and ")
        ))
    }

    fn render_status(&self, session: &GameSession) -> Vec<Message> {
        let status = session.status();
        let mut lines = vec![format!("Game: {}", status.title)];
        if status.players.is_empty() {
            lines.push("No players currently signed up!".to_string());
        } else {
            lines.push(format!(
                "Players: {}",
                join_players(", ", &status.players)
            ));
        }
        if let (Some(player), Some(prompt)) = (&status.current_player, &status.current_prompt) {
            lines.push(format!("On the table: {}: @{}", prompt, player));
        }
        if let Some(next) = &status.next_player {
            lines.push(format!("Up next: @{}", next));
        }
        lines.push(format!(
            "Prompts used: {} ({} left in the deck)",
            status.used_prompts, status.remaining_prompts
        ));
        lines.push(format!("Length: {}", status.constraints.join(" and ")));
        if status.finished {
            lines.push("The final prompt has been reached.".to_string());
        }
        vec![Message::game(lines.join("\n"))]
    }

    fn help_text(&self) -> String {
        let prefix = &self.settings.command_prefix;
        [
            format!("{}join / {}leave - sign up for or drop out of the game", prefix, prefix),
            format!("{}list - list the players of the current game", prefix),
            format!("{}start - begin play, starting with you", prefix),
            format!("{}next - finish your turn and pass the floor", prefix),
            format!("{}skip - pass the floor without answering", prefix),
            format!("{}xcard - withdraw the current prompt and draw another", prefix),
            format!("{}promptlimit <n> / {}timelimit <minutes> - set the game length", prefix, prefix),
            format!("{}length / {}status - how long this game runs, and where it stands", prefix, prefix),
            format!("{}load [path] - load a deck file (starts a clean game)", prefix),
            format!("{}reset - clear the player list", prefix),
            "Prefix any command with #channel and @player to speak as someone else."
                .to_string(),
        ]
        .join("\n")
    }
}

// Core errors become user-facing text here; none of them end the program.
fn describe(err: &GameError) -> String {
    match err {
        GameError::EmptyQueue => "No players have signed up yet! Use the join command first.".to_string(),
        GameError::InsufficientPlayers => "That needs at least two players in the game.".to_string(),
        GameError::InvalidConfiguration(reason) => format!("That won't work: {}.", reason),
        GameError::DrawExhausted => "The deck has run dry.".to_string(),
    }
}

fn parse_count(args: &[String]) -> Option<usize> {
    args.first()?.parse().ok()
}

fn parse_minutes(args: &[String]) -> Option<i64> {
    args.first()?.parse().ok()
}
