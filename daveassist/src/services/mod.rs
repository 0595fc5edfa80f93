//! Services module
//!
//! Business logic services that coordinate between commands and the
//! backend ports.

pub mod bulk;
pub mod deletion;
pub mod gateway;
pub mod settings;
pub mod trash;

pub use bulk::{BulkCoordinator, BulkDeleteResult, FailedItem};
pub use deletion::{DeletionOutcome, DeletionService, UndoAction};
pub use gateway::{DeleteResult, Gateway};
pub use settings::{AppSettings, SettingsService};
pub use trash::{DeletedItem, SelectionRestore, TrashListing, TrashService};
