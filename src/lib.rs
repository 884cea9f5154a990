//! cardsort binary support: argument parsing, tracing setup and the terminal
//! front end.

pub mod args;
pub mod logging;
pub mod terminal;
