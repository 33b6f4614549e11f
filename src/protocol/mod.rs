//! Admin command wire protocol.
//!
//! A connection carries a stream of line-feed terminated commands. Arguments
//! are separated by spaces or carriage returns and may be quoted:
//!
//! - `'single quoted'`: taken verbatim, no escapes
//! - `"double quoted"`: `\\` and `\"` are escapes, everything else verbatim
//! - outside quotes a backslash escapes the following byte
//!
//! A command with no arguments is ignored. A command longer than the receive
//! buffer capacity closes the connection.

mod args;
mod tokenizer;

pub use args::Args;
pub use tokenizer::Tokenizer;
