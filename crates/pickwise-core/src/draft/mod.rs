pub mod filter;
pub mod roster;
pub mod session;
pub mod slot;

pub use session::{DraftError, DraftPick, DraftSession};
