//! `pilotrecall` - Recall item checklists for pilots, organized by flight phase
//!
//! This library keeps recall items and flights in a local `SQLite` database,
//! validates what goes in, and exposes the phase filter and view state that
//! decide which items a pilot sees at each stage of a flight.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod deeplink;
pub mod error;
pub mod filter;
pub mod logging;
pub mod manager;
pub mod model;
pub mod phase;
pub mod repository;
pub mod state;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::filter_items;
pub use logging::init_logging;
pub use manager::RecallManager;
pub use model::{
    Attachment, FlightList, FlightListChanges, FlightListDraft, FlightStatus, RecallItem,
    RecallItemChanges, RecallItemDraft, RememberedFlight,
};
pub use phase::FlightPhase;
pub use repository::{Repository, SqliteRepository};
pub use state::{StateStore, ViewState};
pub use storage::{Storage, StorageStats};
pub use validation::{FlightInput, RecallItemInput, ValidationError};
