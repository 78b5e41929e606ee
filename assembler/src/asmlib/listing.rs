//! The assembly listing and the label dump.
//!
//! The listing is accumulated as structured lines during the second
//! pass and formatted on the way out: the source line as first seen,
//! then one line per assignment or stored word, with the
//! one-character error code in the final column.

use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};

use base::prelude::Word;

use super::types::ErrorFlag;

#[derive(Debug, Default)]
pub(crate) struct Listing {
    lines: Vec<ListingLine>,
}

#[derive(Debug)]
pub(crate) enum ListingLine {
    /// A source line, echoed once as the parser reaches it.
    Source(String),
    /// A `name = expr` statement and the value it bound.
    Assignment { value: u32, flag: Option<ErrorFlag> },
    /// A stored memory word and its relocated location.
    Word {
        location: u32,
        value: u32,
        flag: Option<ErrorFlag>,
    },
    /// A diagnostic, repeated here so the listing stands alone.
    Diagnostic(String),
}

impl Listing {
    pub(crate) fn push(&mut self, line: ListingLine) {
        self.lines.push(line);
    }
}

fn flag_code(flag: &Option<ErrorFlag>) -> char {
    match flag {
        Some(flag) => flag.listing_code(),
        None => ' ',
    }
}

impl Display for ListingLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ListingLine::Source(text) => write!(f, "\t\t{text}"),
            ListingLine::Assignment { value, flag } => {
                write!(f, "\t{value:06o} {}", flag_code(flag))
            }
            ListingLine::Word {
                location,
                value,
                flag,
            } => {
                write!(f, "{location:06o}: {value:06o} {}", flag_code(flag))
            }
            ListingLine::Diagnostic(text) => f.write_str(text),
        }
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Write the label dump: every global label in name order, its
/// relocated absolute value, and `r` when it was relocatable.  The
/// listing's `Labels:` section and the name-list side-car both come
/// through here.
pub(crate) fn dump_labels<'a, W: Write>(
    writer: &mut W,
    labels: impl Iterator<Item = (&'a str, Word)>,
    base: u32,
) -> io::Result<()> {
    for (name, value) in labels {
        writeln!(
            writer,
            "{name:<8} 0{:06o}{}",
            value.relocated(base),
            if value.is_relocatable() { " r" } else { "" }
        )?;
    }
    Ok(())
}
