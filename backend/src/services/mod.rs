//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod colors;
pub mod import;
pub mod records;
pub mod search;
pub mod tags;
pub mod users;

pub use colors::{ColorService, ColorUpdateReport};
pub use import::{ImageDescriptor, ImportReport, ImportService};
pub use records::{RecordService, RecordUpdate};
pub use search::{SearchRequest, SearchService};
pub use tags::{DetachOutcome, MergeOutcome, TagService};
pub use users::{UserService, UserUpdate};
