//! Scanning of one source line.
//!
//! The notation has no real token grammar: what a character means
//! depends on what is being looked for, and single characters of
//! lookahead decide between forms (`a>` is a character literal, `ab`
//! is a symbol).  So the lexer is a cursor over the line which the
//! parser and the expression evaluator steer, rather than a
//! tokeniser run up front.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use base::prelude::WORD_MASK;

mod rx;
#[cfg(test)]
mod tests;

/// An atomic operand within an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syllable<'a> {
    /// `<c`: the character in the high half of the word.
    CharHigh(char),
    /// `c>` or `>c`: the character in the low nine bits.
    CharLow(char),
    /// A symbol reference, to be looked up in the tables.
    Symbol(&'a str),
    /// `Nf` or `Nb`: a relative-label reference.
    Relative { number: u32, direction: Direction },
    /// An integer literal, already masked to 18 bits.
    Literal(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

/// Text which does not begin any syllable form.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Unrecognised<'a> {
    pub(crate) content: &'a str,
}

impl Display for Unrecognised<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.content.is_empty() {
            f.write_str("expected a syllable but the statement ended")
        } else {
            write!(f, "'{}' is not part of the assembly notation", self.content)
        }
    }
}

impl Error for Unrecognised<'_> {}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// A position within one source line.  Everything which consumes
/// input does so through this cursor, left to right, never backing
/// up.
#[derive(Debug, Clone)]
pub(crate) struct LineCursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub(crate) fn new(line: &'a str) -> LineCursor<'a> {
        LineCursor { line, pos: 0 }
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Spaces, tabs and commas all separate syllables and statements
    /// and are otherwise meaningless.
    pub(crate) fn skip_separators(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' || ch == ',' {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    pub(crate) fn at_comment(&self) -> bool {
        self.peek() == Some('"')
    }

    /// True when nothing but a comment (or nothing at all) remains.
    pub(crate) fn finished(&self) -> bool {
        self.peek().is_none() || self.at_comment()
    }

    /// Consume `IDENT:` and return the identifier, if that is what
    /// comes next.
    pub(crate) fn take_label(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let captures = rx::LABEL_HEAD.captures(rest)?;
        let whole = captures.get(0).expect("capture 0 is the whole match");
        let name = captures
            .get(1)
            .expect("the label pattern has one group")
            .as_str();
        self.advance(whole.end());
        Some(name)
    }

    /// Consume `SYMBOL =` and return the symbol, if that is what
    /// comes next.
    pub(crate) fn take_assignment(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let captures = rx::ASSIGNMENT_HEAD.captures(rest)?;
        let whole = captures.get(0).expect("capture 0 is the whole match");
        let name = captures
            .get(1)
            .expect("the assignment pattern has one group")
            .as_str();
        self.advance(whole.end());
        Some(name)
    }

    /// Consume a single already-peeked operator character.
    pub(crate) fn take_operator(&mut self) {
        self.advance(1);
    }

    /// Consume a `;` if one comes next.
    pub(crate) fn take_statement_separator(&mut self) -> bool {
        if self.peek() == Some(';') {
            self.advance(1);
            true
        } else {
            false
        }
    }

    /// Consume the next syllable.  The forms are tried in a fixed
    /// order; in particular any character followed by `>` is a
    /// character literal, even when the character could begin a
    /// symbol.
    pub(crate) fn take_syllable(&mut self) -> Result<Syllable<'a>, Unrecognised<'a>> {
        let rest = self.rest();
        let mut chars = rest.chars();
        let first = match chars.next() {
            Some(ch) => ch,
            None => return Err(Unrecognised { content: rest }),
        };
        let second = chars.next();

        if first == '<' {
            return match second {
                Some(ch) => {
                    self.advance('<'.len_utf8() + ch.len_utf8());
                    Ok(Syllable::CharHigh(ch))
                }
                None => Err(Unrecognised {
                    content: &rest[..1],
                }),
            };
        }
        if second == Some('>') {
            self.advance(first.len_utf8() + 1);
            return Ok(Syllable::CharLow(first));
        }
        if first == '>' {
            return match second {
                Some(ch) => {
                    self.advance(1 + ch.len_utf8());
                    Ok(Syllable::CharLow(ch))
                }
                None => Err(Unrecognised {
                    content: &rest[..1],
                }),
            };
        }
        if first.is_ascii_alphabetic() || first == '_' || first == '.' {
            let end = rest
                .find(|ch: char| !is_ident_char(ch))
                .unwrap_or(rest.len());
            self.advance(end);
            return Ok(Syllable::Symbol(&rest[..end]));
        }
        if first.is_ascii_digit() {
            return self.take_numeric(rest);
        }
        Err(Unrecognised {
            content: &rest[..first.len_utf8()],
        })
    }

    /// A run of digits: a relative-label reference when suffixed with
    /// a lone `f` or `b`, otherwise an integer literal (octal when it
    /// starts with `0`, else decimal).
    fn take_numeric(&mut self, rest: &'a str) -> Result<Syllable<'a>, Unrecognised<'a>> {
        let digits_end = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..digits_end];
        let after = &rest[digits_end..];
        let mut after_chars = after.chars();
        let suffix = after_chars.next();
        let beyond = after_chars.next();

        if let Some(dir @ ('f' | 'b')) = suffix {
            if !beyond.is_some_and(is_ident_char) {
                let number = digits
                    .chars()
                    .fold(0u32, |n, ch| {
                        n.wrapping_mul(10)
                            .wrapping_add(ch.to_digit(10).expect("only digits were scanned"))
                    });
                self.advance(digits_end + 1);
                return Ok(Syllable::Relative {
                    number,
                    direction: if dir == 'f' {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    },
                });
            }
        }
        if suffix.is_some_and(is_ident_char) {
            // Something like `1x`: not a number, not a reference.
            let end = rest
                .find(|ch: char| !is_ident_char(ch))
                .unwrap_or(rest.len());
            return Err(Unrecognised {
                content: &rest[..end],
            });
        }

        let radix = if digits.starts_with('0') { 8 } else { 10 };
        let mut value: u32 = 0;
        for ch in digits.chars() {
            match ch.to_digit(radix) {
                Some(d) => {
                    value = (value * radix + d) & WORD_MASK;
                }
                None => {
                    return Err(Unrecognised { content: digits });
                }
            }
        }
        self.advance(digits_end);
        Ok(Syllable::Literal(value))
    }
}
