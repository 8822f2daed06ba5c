pub mod parser;

pub use parser::{expand_pid, tokenize, CommandLine, ParseError};
