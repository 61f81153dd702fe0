//! Document tree engine behind a rich-text editor: an arena tree of typed
//! nodes mutated through transactions, a markdown codec, a toolbar state
//! synchronizer and an executor for structured editing commands.

pub mod command;
pub mod editor;
mod error;
pub mod markdown;
pub mod outline;
pub mod toolbar;
pub mod tree;

pub use error::{Result, TreeError};
