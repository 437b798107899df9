use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MessageType {
    Player,
    Game,
    System,
}

// One rendered line of output, tagged with who it is from so the console
// front end (or any other) can style it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub message_type: MessageType,
}

impl Message {
    pub fn new(content: String, message_type: MessageType) -> Self {
        Message {
            content,
            message_type,
        }
    }

    pub fn game(content: String) -> Self {
        Self::new(content, MessageType::Game)
    }

    pub fn system(content: String) -> Self {
        Self::new(content, MessageType::System)
    }
}
