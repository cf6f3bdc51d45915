//! Todo domain model
//!
//! - `item`: `Todo`, completion and urgency rules
//! - `subtask`: `SubTask`
//! - `todo_file`: the persisted document, next ids and id repair
//! - `serde_impl`: lenient reading of stored documents, including old formats

mod item;
mod serde_impl;
mod subtask;
mod todo_file;

pub use item::Todo;
pub use serde_impl::parse_stored_datetime;
pub use subtask::SubTask;
pub use todo_file::{LoadReport, MAX_ID, TodoFile};
pub(crate) use todo_file::following_id;
