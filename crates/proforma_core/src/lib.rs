pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod roster;
pub mod selection;

pub use config::{FormHeader, ProformaConfig};
pub use error::{ErrorCategory, ProformaError};
pub use model::{EventResult, StudentRecord};
pub use roster::{RosterClient, load_roster_file, parse_roster};
pub use selection::{Filters, RosterView, RowKey, SelectAllState};
