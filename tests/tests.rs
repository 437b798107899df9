// ../tests/tests.rs
use chrono::{Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;
use std::sync::Arc;
use turntaker::*;

fn deck(prompts: &[&str], final_prompt: &str) -> PromptDeck {
    PromptDeck {
        title: "Test Deck".to_string(),
        intro: Vec::new(),
        instructions: Vec::new(),
        final_prompt: final_prompt.to_string(),
        prompts: prompts.iter().map(|p| p.to_string()).collect(),
    }
}

fn seeded_session(deck: PromptDeck, seed: u64) -> GameSession {
    GameSession::with_rng(Arc::new(deck), StdRng::seed_from_u64(seed))
}

// --- PlayerQueue

#[test]
fn test_queue_never_holds_duplicates() {
    let mut queue = PlayerQueue::new();
    assert!(queue.add(PlayerId::from("alice")));
    assert!(queue.add(PlayerId::from("bob")));
    assert!(!queue.add(PlayerId::from("alice")), "duplicate add must be a no-op");
    assert_eq!(queue.size(), 2);

    assert!(queue.remove(&PlayerId::from("alice")));
    assert!(!queue.remove(&PlayerId::from("alice")), "second remove must be a no-op");
    assert_eq!(queue.size(), 1);
}

#[test]
fn test_rotate_cyclic_law() {
    let mut queue = PlayerQueue::new();
    for name in ["alice", "bob", "carol"] {
        queue.add(PlayerId::from(name));
    }
    let original: Vec<PlayerId> = queue.members().cloned().collect();

    for _ in 0..queue.size() {
        queue.rotate().expect("rotate on a non-empty queue");
    }
    let rotated: Vec<PlayerId> = queue.members().cloned().collect();
    assert_eq!(original, rotated, "N rotations must restore the original order");
}

#[test]
fn test_rotate_preserves_relative_order() {
    let mut queue = PlayerQueue::new();
    for name in ["alice", "bob", "carol"] {
        queue.add(PlayerId::from(name));
    }
    queue.rotate().expect("rotate on a non-empty queue");
    let order: Vec<String> = queue.members().map(|p| p.0.clone()).collect();
    assert_eq!(order, ["bob", "carol", "alice"]);
}

#[test]
fn test_fast_forward_to_present_player() {
    let mut queue = PlayerQueue::new();
    for name in ["alice", "bob", "carol"] {
        queue.add(PlayerId::from(name));
    }
    queue.fast_forward(&PlayerId::from("carol"));
    assert_eq!(queue.current().expect("non-empty"), &PlayerId::from("carol"));
    assert_eq!(queue.size(), 3);
}

#[test]
fn test_fast_forward_signs_up_missing_player() {
    let mut queue = PlayerQueue::new();
    queue.add(PlayerId::from("alice"));
    queue.fast_forward(&PlayerId::from("dave"));
    assert_eq!(queue.current().expect("non-empty"), &PlayerId::from("dave"));
    assert_eq!(queue.size(), 2);
}

#[test]
fn test_empty_queue_operations_fail() {
    let mut queue = PlayerQueue::new();
    assert_eq!(queue.current().unwrap_err(), GameError::EmptyQueue);
    assert_eq!(queue.rotate().unwrap_err(), GameError::EmptyQueue);
    assert_eq!(queue.peek_next().unwrap_err(), GameError::EmptyQueue);

    queue.add(PlayerId::from("alice"));
    assert_eq!(queue.peek_next().unwrap_err(), GameError::InsufficientPlayers);

    queue.add(PlayerId::from("bob"));
    assert_eq!(queue.peek_next().expect("two players"), &PlayerId::from("bob"));
}

// --- DrawState

#[test]
fn test_deck_exhaustion_switches_to_final_prompt() {
    let deck = deck(&["A", "B", "C"], "Z");
    let mut draw = DrawState::new();
    let mut rng = StdRng::seed_from_u64(7);
    let now = Utc::now();

    let mut seen = std::collections::HashSet::new();
    for _ in 0..3 {
        draw.advance(&deck, &mut rng, now);
        match draw.phase() {
            DrawPhase::Drawing(index) => assert!(seen.insert(index), "no index may repeat"),
            other => panic!("expected Drawing, got {:?}", other),
        }
    }
    assert_eq!(seen.len(), 3);

    // The deck is spent; the next advance reaches the final prompt and
    // every advance after that stays there.
    draw.advance(&deck, &mut rng, now);
    assert!(draw.is_finished());
    assert_eq!(draw.current_prompt(&deck), Some("Z"));
    draw.advance(&deck, &mut rng, now);
    assert_eq!(draw.current_prompt(&deck), Some("Z"));
    assert_eq!(draw.used_count(), 3);
}

#[test]
fn test_prompt_limit_finishes_after_exact_count() {
    let deck = deck(&["A", "B", "C", "D", "E"], "Z");
    let mut draw = DrawState::new();
    draw.set_max_prompts(2);
    let mut rng = StdRng::seed_from_u64(7);
    let now = Utc::now();

    draw.advance(&deck, &mut rng, now);
    draw.advance(&deck, &mut rng, now);
    assert!(!draw.is_finished());
    assert_eq!(draw.used_count(), 2);

    draw.advance(&deck, &mut rng, now);
    assert!(draw.is_finished(), "the draw after the limit must finish");
    assert_eq!(draw.used_count(), 2, "finishing must not draw another prompt");
}

#[test]
fn test_default_prompt_limit_applies_when_unconfigured() {
    let prompts: Vec<String> = (0..25).map(|i| format!("prompt {}", i)).collect();
    let deck = PromptDeck {
        title: "Big Deck".to_string(),
        intro: Vec::new(),
        instructions: Vec::new(),
        final_prompt: "Z".to_string(),
        prompts,
    };
    let mut draw = DrawState::new();
    let mut rng = StdRng::seed_from_u64(7);
    let now = Utc::now();

    for _ in 0..DEFAULT_PROMPT_LIMIT {
        draw.advance(&deck, &mut rng, now);
        assert!(!draw.is_finished());
    }
    draw.advance(&deck, &mut rng, now);
    assert!(draw.is_finished());
    assert_eq!(draw.used_count(), DEFAULT_PROMPT_LIMIT);
}

#[test]
fn test_length_reports_default_as_default() {
    let draw = DrawState::new();
    assert_eq!(
        draw.length_constraints(),
        vec![format!("at most {} prompts (default)", DEFAULT_PROMPT_LIMIT)]
    );
}

// --- GameSession

#[test]
fn test_scenario_two_players_prompt_limit_two() {
    let mut session = seeded_session(deck(&["A", "B", "C"], "Z"), 11);
    session.add_player(PlayerId::from("p1"));
    session.add_player(PlayerId::from("p2"));
    session.set_prompt_limit(2).expect("positive limit");
    assert!(!session.has_started());

    let t0 = Utc::now();
    let first = session.start_at(PlayerId::from("p1"), t0).expect("start");
    assert!(session.has_started());
    assert_eq!(session.status().next_player, Some(PlayerId::from("p2")));
    assert_eq!(first.player, PlayerId::from("p1"));
    assert!(["A", "B", "C"].contains(&first.prompt.as_str()));

    let second = session.advance_turn_at(t0).expect("second turn");
    assert_eq!(second.player, PlayerId::from("p2"));
    assert!(["A", "B", "C"].contains(&second.prompt.as_str()));
    assert_ne!(second.prompt, first.prompt, "prompts must not repeat");

    // Two prompts have been used; the limit is met, so the next turn gets
    // the final prompt, back around the table to p1.
    let last = session.advance_turn_at(t0).expect("final turn");
    assert_eq!(last.player, PlayerId::from("p1"));
    assert_eq!(last.prompt, "Z");
    assert!(session.is_finished());
}

#[test]
fn test_skip_replays_prompt_without_spending_one() {
    let mut session = seeded_session(deck(&["A", "B", "C"], "Z"), 3);
    session.add_player(PlayerId::from("p1"));
    session.add_player(PlayerId::from("p2"));

    let first = session.start(PlayerId::from("p1")).expect("start");
    assert_eq!(session.used_prompts(), 1);

    let skipped = session.skip().expect("skip");
    assert_eq!(skipped.player, PlayerId::from("p2"), "the floor must rotate");
    assert_eq!(skipped.prompt, first.prompt, "the unanswered prompt stays on the table");
    assert_eq!(session.used_prompts(), 1, "skip must not draw");

    let advanced = session.advance_turn().expect("advance");
    assert_eq!(session.used_prompts(), 2, "advance draws exactly one");
    assert_ne!(advanced.prompt, first.prompt);
}

#[test]
fn test_redact_draws_replacement_without_rotating() {
    let mut session = seeded_session(deck(&["A", "B", "C"], "Z"), 5);
    session.add_player(PlayerId::from("p1"));
    session.add_player(PlayerId::from("p2"));
    let first = session.start(PlayerId::from("p1")).expect("start");

    let reference = MessageRef("msg-41".to_string());
    let redrawn = session.redact(reference.clone()).expect("redact");
    assert_eq!(redrawn.player, PlayerId::from("p1"), "no rotation on redact");
    assert_ne!(redrawn.prompt, first.prompt, "a fresh prompt replaces the withdrawn one");
    assert_eq!(session.used_prompts(), 2);
    assert_eq!(session.status().last_rendered, Some(reference));
}

#[test]
fn test_past_deadline_finishes_on_next_advance() {
    let mut session = seeded_session(deck(&["A", "B", "C", "D"], "Z"), 13);
    session.add_player(PlayerId::from("p1"));
    session.add_player(PlayerId::from("p2"));

    let t0 = Utc::now();
    // 10 minutes requested, minus 2 minutes of buffer per player = 6.
    session.set_time_limit_at(10, t0).expect("positive limit");
    session.start_at(PlayerId::from("p1"), t0).expect("start");

    let in_time = session
        .advance_turn_at(t0 + Duration::minutes(5))
        .expect("still in time");
    assert_ne!(in_time.prompt, "Z");

    let too_late = session
        .advance_turn_at(t0 + Duration::minutes(7))
        .expect("past the deadline");
    assert_eq!(too_late.prompt, "Z");
    assert!(session.is_finished());
}

#[test]
fn test_over_subtracted_time_budget_is_clamped() {
    let mut session = seeded_session(deck(&["A", "B", "C"], "Z"), 17);
    session.add_player(PlayerId::from("p1"));
    session.add_player(PlayerId::from("p2"));

    let t0 = Utc::now();
    // 1 minute requested minus 4 minutes of buffer goes negative; the
    // deadline still lands a full minute out.
    session.set_time_limit_at(1, t0).expect("positive limit");
    session.start_at(PlayerId::from("p1"), t0).expect("start");

    let early = session
        .advance_turn_at(t0 + Duration::seconds(30))
        .expect("within the clamped minute");
    assert_ne!(early.prompt, "Z");

    let late = session
        .advance_turn_at(t0 + Duration::seconds(61))
        .expect("after the clamped minute");
    assert_eq!(late.prompt, "Z");
}

#[test]
fn test_end_condition_configuration_is_validated() {
    let mut session = seeded_session(deck(&["A"], "Z"), 1);
    assert!(matches!(
        session.set_prompt_limit(0).unwrap_err(),
        GameError::InvalidConfiguration(_)
    ));
    assert!(matches!(
        session.set_time_limit(0).unwrap_err(),
        GameError::InvalidConfiguration(_)
    ));
    assert!(matches!(
        session.set_time_limit(-5).unwrap_err(),
        GameError::InvalidConfiguration(_)
    ));
}

#[test]
fn test_advance_turn_on_empty_queue_fails() {
    let mut session = seeded_session(deck(&["A"], "Z"), 1);
    assert_eq!(session.advance_turn().unwrap_err(), GameError::EmptyQueue);
    assert_eq!(session.used_prompts(), 0, "a failed rotation must not draw");
}

#[test]
fn test_seeded_sessions_draw_identically() {
    let cards = ["A", "B", "C", "D", "E"];
    let mut left = seeded_session(deck(&cards, "Z"), 99);
    let mut right = seeded_session(deck(&cards, "Z"), 99);
    for session in [&mut left, &mut right] {
        session.add_player(PlayerId::from("p1"));
        session.add_player(PlayerId::from("p2"));
    }

    let t0 = Utc::now();
    let mut left_drawn = vec![left.start_at(PlayerId::from("p1"), t0).expect("start").prompt];
    let mut right_drawn = vec![right.start_at(PlayerId::from("p1"), t0).expect("start").prompt];
    for _ in 0..4 {
        left_drawn.push(left.advance_turn_at(t0).expect("turn").prompt);
        right_drawn.push(right.advance_turn_at(t0).expect("turn").prompt);
    }
    assert_eq!(left_drawn, right_drawn);
}

#[test]
fn test_reset_players_leaves_draw_state_alone() {
    let mut session = seeded_session(deck(&["A", "B"], "Z"), 23);
    session.add_player(PlayerId::from("p1"));
    session.start(PlayerId::from("p1")).expect("start");
    assert_eq!(session.used_prompts(), 1);

    session.reset_players();
    assert_eq!(session.player_count(), 0);
    assert_eq!(session.used_prompts(), 1, "resets never silently touch both halves");
}

// --- SessionRegistry

#[tokio::test]
async fn test_registry_replace_discards_membership() {
    let mut registry = SessionRegistry::new(Arc::new(deck(&["A", "B"], "Z")));
    let channel = ChannelId::from("table");

    {
        let session = registry.get(&channel);
        let mut session = session.lock().await;
        session.add_player(PlayerId::from("alice"));
        session.add_player(PlayerId::from("bob"));
        assert_eq!(session.player_count(), 2);
    }

    registry.replace(&channel, Arc::new(deck(&["X", "Y"], "W")));

    let session = registry.get(&channel);
    let session = session.lock().await;
    assert_eq!(session.player_count(), 0, "loading new content starts clean");
    assert_eq!(session.deck().prompts, ["X", "Y"]);
}

#[tokio::test]
async fn test_registry_channels_are_independent() {
    let mut registry = SessionRegistry::new(Arc::new(deck(&["A", "B"], "Z")));
    let table = ChannelId::from("table");
    let lounge = ChannelId::from("lounge");

    {
        let session = registry.get(&table);
        session.lock().await.add_player(PlayerId::from("alice"));
    }
    let session = registry.get(&lounge);
    assert_eq!(session.lock().await.player_count(), 0);
    assert_eq!(registry.channel_count(), 2);
}

#[tokio::test]
async fn test_registry_set_deck_applies_to_new_channels() {
    let mut registry = SessionRegistry::new(Arc::new(deck(&["A"], "Z")));
    let table = ChannelId::from("table");
    let lounge = ChannelId::from("lounge");

    {
        let session = registry.get(&table);
        assert_eq!(session.lock().await.deck().prompts, ["A"]);
    }

    registry.set_deck(Arc::new(deck(&["X", "Y"], "W")));

    // The channel already playing keeps its deck; a new channel gets the
    // freshly loaded one.
    let old = registry.get(&table);
    assert_eq!(old.lock().await.deck().prompts, ["A"]);
    let new = registry.get(&lounge);
    assert_eq!(new.lock().await.deck().prompts, ["X", "Y"]);
}

// --- Deck loading

#[test]
fn test_deck_loads_from_fixture_file() {
    let deck = PromptDeck::load_from_file("tests/queen_demo_deck.json")
        .expect("Failed to read the demo deck fixture");
    assert_eq!(deck.title, "For the Queen");
    assert_eq!(deck.intro.len(), 2);
    assert_eq!(deck.instructions.len(), 2);
    assert_eq!(deck.prompt_count(), 5);
    assert_eq!(deck.final_prompt, "The Queen is under attack. Do you defend her?");
}

#[test]
fn test_deck_with_no_prompts_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"title": "Empty", "final": "Z", "prompts": []}}"#
    )
    .expect("write temp deck");

    let err = PromptDeck::load_from_file(file.path().to_str().expect("utf-8 path")).unwrap_err();
    assert!(matches!(err, ContentLoadError::EmptyDeck));
}

#[test]
fn test_deck_with_blank_final_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"title": "No Ending", "final": "  ", "prompts": ["A"]}}"#
    )
    .expect("write temp deck");

    let err = PromptDeck::load_from_file(file.path().to_str().expect("utf-8 path")).unwrap_err();
    assert!(matches!(err, ContentLoadError::MissingFinal));
}

#[test]
fn test_malformed_deck_source_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "deck: definitely not json").expect("write temp deck");

    let err = PromptDeck::load_from_file(file.path().to_str().expect("utf-8 path")).unwrap_err();
    assert!(matches!(err, ContentLoadError::Malformed(_)));
}

#[test]
fn test_missing_deck_file_is_an_io_error() {
    let err = PromptDeck::load_from_file("tests/no_such_deck.json").unwrap_err();
    assert!(matches!(err, ContentLoadError::Io(_)));
}

fn row(deck: &str, header: &str, body: &str) -> DeckRow {
    DeckRow {
        deck: deck.to_string(),
        header: header.to_string(),
        body: body.to_string(),
    }
}

#[test]
fn test_tabular_import_builds_a_deck() {
    let rows = vec![
        row("option", "gameTitle", "A Court In Exile"),
        row("option", "theme", "ignored"),
        row("1", "", "First prompt"),
        row("1", "Love", "Second prompt"),
        row("2", "", "Third prompt"),
        row("banner", "", "decoration, skipped"),
        row("9", "", "The closing prompt"),
    ];

    let deck = PromptDeck::from_rows(&rows).expect("import");
    assert_eq!(deck.title, "A Court In Exile");
    // The highest-numbered deck becomes the final prompt, everything in the
    // numbered decks below it is a regular prompt.
    assert_eq!(deck.final_prompt, "The closing prompt");
    assert_eq!(
        deck.prompts,
        ["First prompt", "Love - Second prompt", "Third prompt"]
    );
}

#[test]
fn test_tabular_import_with_no_numbered_decks_is_rejected() {
    let rows = vec![row("option", "gameTitle", "Empty Court")];
    assert!(matches!(
        PromptDeck::from_rows(&rows).unwrap_err(),
        ContentLoadError::EmptyDeck
    ));
}

// --- Settings and errors

#[test]
fn test_settings_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("settings.json");
    let path = path.to_str().expect("utf-8 path");

    let mut settings = Settings::default();
    settings.command_prefix = "!".to_string();
    settings.debug_mode = true;
    settings.save_to_file(path).expect("save settings");

    let loaded = Settings::load_settings_from_file(path).expect("load settings");
    assert_eq!(loaded.command_prefix, "!");
    assert!(loaded.debug_mode);
    assert_eq!(loaded.deck_path, settings.deck_path);
}

#[test]
fn test_errors_render_for_the_adapter() {
    let err = AppError::from(GameError::EmptyQueue);
    assert_eq!(err.to_string(), "Game error: No players have signed up yet");

    let err = AppError::from(ContentLoadError::EmptyDeck);
    assert_eq!(err.to_string(), "Content error: Deck contains no prompts");
}

// --- Console adapter

#[tokio::test]
async fn test_adapter_signup_flow() {
    let registry = SessionRegistry::new(Arc::new(PromptDeck::builtin()));
    let mut app = App::new(Settings::default(), registry);

    let joined = app.handle_line("#table @alice +join").await;
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].content, "@alice added to current game!");

    let again = app.handle_line("#table @alice +join").await;
    assert_eq!(again[0].content, "@alice already in game!");

    let listed = app.handle_line("#table +list").await;
    assert_eq!(listed[0].content, "Current players: @alice");
}

#[tokio::test]
async fn test_adapter_rejects_unknown_commands() {
    let registry = SessionRegistry::new(Arc::new(PromptDeck::builtin()));
    let mut app = App::new(Settings::default(), registry);

    let answer = app.handle_line("@alice +conga").await;
    assert_eq!(answer.len(), 1);
    assert_eq!(answer[0].message_type, MessageType::System);
    assert!(answer[0].content.contains("Unknown command"));
}

#[tokio::test]
async fn test_adapter_failed_load_leaves_game_untouched() {
    let registry = SessionRegistry::new(Arc::new(PromptDeck::builtin()));
    let mut app = App::new(Settings::default(), registry);

    app.handle_line("#table @alice +join").await;
    let failed = app.handle_line("#table +load tests/no_such_deck.json").await;
    assert!(failed[0].content.contains("untouched"));

    let listed = app.handle_line("#table +list").await;
    assert_eq!(listed[0].content, "Current players: @alice");
}
