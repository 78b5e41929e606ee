//! The statement grammar, applied greedily left to right over one
//! line at a time.
//!
//! A line is either a directive (a tab, then `.local NAME`), or a
//! sequence of statements separated by `;`: any number of `label:`
//! definitions, then an assignment `name = expr` or a bare expression
//! whose value becomes the next memory word.  A `"` starts a comment
//! running to the end of the line.

use tracing::{event, Level};

use super::driver::Assembler;
use super::eval::expression;
use super::lexer::LineCursor;
use super::types::ErrorFlag;

pub(crate) fn process_line(asm: &mut Assembler, line: &str) {
    if let Some(rest) = directive_head(line) {
        directive(asm, rest);
        return;
    }
    let mut cursor = LineCursor::new(line);
    loop {
        cursor.skip_separators();
        while let Some(name) = cursor.take_label() {
            asm.define_label_here(name);
            cursor.skip_separators();
        }
        if cursor.finished() {
            return;
        }
        if let Some(target) = cursor.take_assignment() {
            match expression(&mut cursor, asm) {
                Ok(value) => asm.assign(target, value),
                Err(_) => return,
            }
        } else {
            match expression(&mut cursor, asm) {
                Ok(word) => asm.emit(word, line),
                Err(_) => return,
            }
        }
        cursor.skip_separators();
        cursor.take_statement_separator();
        if cursor.finished() {
            return;
        }
    }
}

/// A directive line starts with a tab, a dot and a letter.  The
/// letter matters: `<TAB>..=020000` re-bases the program and
/// `<TAB>.+1` is an ordinary expression over the location counter,
/// and neither is a directive.
fn directive_head(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("\t.")?;
    if rest.chars().next().is_some_and(|ch| ch.is_ascii_alphabetic()) {
        Some(rest)
    } else {
        None
    }
}

/// The only directive is `.local NAME`, which confines NAME to the
/// current file. The whole line belongs to the directive.
fn directive(asm: &mut Assembler, rest: &str) {
    let end = rest
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (keyword, after) = rest.split_at(end);
    if keyword != "local" {
        asm.report(
            Some(ErrorFlag::Syntax),
            format!("'.{keyword}' is not a directive"),
        );
        return;
    }
    let mut cursor = LineCursor::new(after);
    cursor.skip_separators();
    let name_end = cursor
        .rest()
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'))
        .unwrap_or(cursor.rest().len());
    let name = &cursor.rest()[..name_end];
    if name.is_empty() {
        asm.report(
            Some(ErrorFlag::Syntax),
            "'.local' needs a name".to_string(),
        );
        return;
    }
    event!(Level::DEBUG, "{name} is local to the current file");
    asm.declare_local(name);
}
