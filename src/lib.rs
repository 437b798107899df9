pub mod app;
pub mod deck;
pub mod draw;
pub mod error;
pub mod logging;
pub mod message;
pub mod queue;
pub mod registry;
pub mod session;
pub mod settings;
pub mod utils;

// Re-export commonly used items for easier access
pub use app::App;
pub use deck::{DeckRow, PromptDeck};
pub use draw::{DrawPhase, DrawState, MessageRef, DEFAULT_PROMPT_LIMIT};
pub use error::{AppError, ContentLoadError, GameError, Result};
pub use message::{Message, MessageType};
pub use queue::{PlayerId, PlayerQueue};
pub use registry::{ChannelId, SessionRegistry};
pub use session::{GameSession, SessionStatus, TurnUpdate};
pub use settings::Settings;
