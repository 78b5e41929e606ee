//! The prelude exports the things almost every user of the base crate
//! wants: the tagged word type, its bit masks, and the builtin symbol
//! seed.  Providing this prelude is the main purpose of the base crate.
pub use super::instruction::builtin_symbols;
pub use super::word::{AbsoluteMinusRelocatable, Word, RELOC, WORD_MASK};
