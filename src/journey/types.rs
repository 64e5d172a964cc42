// Core types for the journey state machine

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the journey; exactly one is active at a time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Welcome,
    Journey,
    FlowerResult,
    BouquetResult,
    Final,
    UploadPicture,
    ComicResult,
}

impl Screen {
    pub const ALL: [Screen; 7] = [
        Screen::Welcome,
        Screen::Journey,
        Screen::FlowerResult,
        Screen::BouquetResult,
        Screen::Final,
        Screen::UploadPicture,
        Screen::ComicResult,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Screen::Welcome => "welcome",
            Screen::Journey => "journey",
            Screen::FlowerResult => "flower_result",
            Screen::BouquetResult => "bouquet_result",
            Screen::Final => "final",
            Screen::UploadPicture => "upload_picture",
            Screen::ComicResult => "comic_result",
        }
    }

    /// Percentage shown in the progress bar
    pub fn progress(&self) -> u8 {
        match self {
            Screen::Welcome => 0,
            Screen::Journey => 14,
            Screen::FlowerResult => 28,
            Screen::BouquetResult => 42,
            Screen::Final => 56,
            Screen::UploadPicture => 70,
            Screen::ComicResult => 100,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient, user-visible message raised by a failed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub raised_at: DateTime<Local>,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Local::now(),
        }
    }
}

/// Why a trigger was refused without touching the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyName,
    MissingPhoto,
    WrongScreen { expected: Screen, actual: Screen },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyName => f.write_str("Please enter your name to continue"),
            Rejection::MissingPhoto => f.write_str("Please choose your picture first"),
            Rejection::WrongScreen { expected, actual } => {
                write!(f, "Only available on {} (currently on {})", expected, actual)
            }
        }
    }
}

/// Result of feeding a trigger into the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Moved to a new screen
    Advanced(Screen),
    /// Session fields changed, screen did not
    Updated,
    /// A generation is already in flight; nothing happened
    Busy,
    /// Guard refused the trigger; nothing happened
    Rejected(Rejection),
    /// The side effect failed; the notice was stored and the screen kept
    Failed(Notice),
}

impl ActionOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, ActionOutcome::Advanced(_))
    }
}
