use anyhow::Context;
use log::info;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use turntaker::app::App;
use turntaker::deck::PromptDeck;
use turntaker::message::{Message, MessageType};
use turntaker::registry::SessionRegistry;
use turntaker::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().unwrap_or_default();
    turntaker::logging::init(settings.debug_mode).context("failed to install logger")?;

    // A missing deck file is not fatal for the demo; the built-in deck keeps
    // the table playable and +load can swap in real content later.
    let deck = match PromptDeck::load_from_file(&settings.deck_path) {
        Ok(deck) => {
            info!("loaded deck '{}' from {}", deck.title, settings.deck_path);
            deck
        }
        Err(err) => {
            info!(
                "no deck at {} ({}); using the built-in demo deck",
                settings.deck_path, err
            );
            PromptDeck::builtin()
        }
    };

    let registry = SessionRegistry::new(Arc::new(deck));
    let mut app = App::new(settings, registry);

    println!("turntaker: a prompt-drawing turn taker for the table");
    println!(
        "Type {}help for commands. Lines look like: #channel @player {}join",
        app.settings.command_prefix, app.settings.command_prefix
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while app.running {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        for message in app.handle_line(&line).await {
            print_message(&message);
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    match message.message_type {
        MessageType::System => println!("[!] {}", message.content),
        MessageType::Game | MessageType::Player => println!("{}", message.content),
    }
}
