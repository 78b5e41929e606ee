//! The `base` crate defines the PDP-7-related things which are useful
//! to the assembler and to other associated tools.  The idea is that a
//! tool which needs to know about the machine's word size or its
//! instruction set can depend on the base crate without dragging in
//! the assembler itself.

pub mod instruction;
pub mod prelude;
mod word;

pub use crate::word::*;
