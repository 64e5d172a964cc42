// Journey - the screen flow and the session it drives

mod catalog;
mod controller;
mod session;
mod types;

pub use catalog::{Catalog, CatalogError, Catalogs, Selection, DEFAULT_COLORS, DEFAULT_FLOWERS};
pub use controller::{JourneyController, PhotoSlot};
pub use session::Session;
pub use types::{ActionOutcome, Notice, Rejection, Screen};
