// Library root: configuration, projection loading, and draft state.
//
// Nothing in this crate touches the network or the terminal.

pub mod config;
pub mod draft;
pub mod projections;
