use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

// Define a structure to hold application settings with serialization and
// deserialization capabilities.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    pub command_prefix: String, // Prefix the adapter strips off command words.
    pub deck_path: String,      // Deck content file loaded at startup.
    pub debug_mode: bool,       // Flag to enable or disable debug logging.
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            command_prefix: "+".to_string(),
            deck_path: "./data/decks/queen.json".to_string(),
            debug_mode: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    // Load settings from the default file path.
    pub fn load() -> io::Result<Self> {
        Self::load_settings_from_file("./data/settings.json")
    }

    // Save current settings to the default file path.
    pub fn save(&self) -> io::Result<()> {
        std::fs::create_dir_all("./data")?;
        self.save_to_file("./data/settings.json")
    }

    pub fn load_settings_from_file(path: &str) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}
