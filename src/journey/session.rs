// Session - everything the journey knows about the current visitor

use super::catalog::{Catalogs, Selection};
use super::types::{Notice, Screen};
use crate::media::EncodedImage;

/// The root aggregate of one journey.
///
/// Snapshots of this value are what the presentation layer renders. Only
/// [`JourneyController`](super::JourneyController) changes the live copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub screen: Screen,
    pub user_name: String,
    pub flower: Selection,
    pub color: Selection,

    /// Picture of the visitor, required for the comic
    pub user_photo: Option<EncodedImage>,
    /// Optional picture of their partner
    pub partner_photo: Option<EncodedImage>,

    pub flower_image: Option<EncodedImage>,
    pub bouquet_image: Option<EncodedImage>,
    pub comic_image: Option<EncodedImage>,

    /// Latch: set while a generation call is in flight
    pub is_generating: bool,
    pub loading_message: String,
    pub notice: Option<Notice>,
}

impl Session {
    pub fn new(catalogs: &Catalogs) -> Self {
        Self {
            screen: Screen::Welcome,
            user_name: String::new(),
            flower: Selection::new(catalogs.flowers.clone()),
            color: Selection::new(catalogs.colors.clone()),
            user_photo: None,
            partner_photo: None,
            flower_image: None,
            bouquet_image: None,
            comic_image: None,
            is_generating: false,
            loading_message: String::new(),
            notice: None,
        }
    }

    pub fn selected_flower(&self) -> &str {
        self.flower.current()
    }

    pub fn selected_color(&self) -> &str {
        self.color.current()
    }

    /// The name as it will be used, without surrounding whitespace
    pub fn trimmed_name(&self) -> &str {
        self.user_name.trim()
    }

    pub fn has_name(&self) -> bool {
        !self.trimmed_name().is_empty()
    }

    /// The generated image shown on the current screen, if it is a result screen
    pub fn result_image(&self) -> Option<&EncodedImage> {
        match self.screen {
            Screen::FlowerResult => self.flower_image.as_ref(),
            Screen::BouquetResult => self.bouquet_image.as_ref(),
            Screen::ComicResult => self.comic_image.as_ref(),
            _ => None,
        }
    }
}
