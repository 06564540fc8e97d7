// Library root: the interactive pieces of the advisor, exposed so the
// integration tests can drive a draft without a terminal.

pub mod console;
pub mod draft_loop;
