#![deny(unreachable_pub)]
#![deny(unsafe_code)]

mod driver;
mod eval;
mod lexer;
mod listing;
mod parser;
mod symtab;
mod types;

pub use driver::{assemble_files, OutputFormat, OutputOptions};
pub use types::{AssemblerFailure, Fail, IoAction, IoFailed, IoTarget};
