//! The expression evaluator.
//!
//! An expression is a run of syllables folded strictly left to right;
//! there is no precedence.  Whitespace between two syllables means
//! bitwise OR, which is what makes `lac foo` an instruction: the
//! opcode word and the address are simply ORed together.  `+` and `-`
//! are the only explicit operators.

use tracing::{event, Level};

use base::prelude::Word;

use super::driver::Assembler;
use super::lexer::{LineCursor, Syllable};
use super::types::ErrorFlag;

/// The line could not be parsed; the caller abandons the rest of it.
/// The diagnostic has already been reported.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SyntaxAbort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combiner {
    Union,
    Add,
    Subtract,
}

/// Evaluate an expression starting at the cursor.  On success the
/// cursor is left at the end of the statement (`;`, a comment, or the
/// end of the line).  Undefined names are only errors on the second
/// pass; on the first they quietly evaluate to zero, since the second
/// pass will see their definitions.
pub(crate) fn expression(
    cursor: &mut LineCursor<'_>,
    asm: &mut Assembler,
) -> Result<Word, SyntaxAbort> {
    cursor.skip_separators();
    let mut acc = syllable_value(cursor, asm)?;
    loop {
        cursor.skip_separators();
        let combiner = match cursor.peek() {
            None | Some(';') | Some('"') => break,
            Some('+') => {
                cursor.take_operator();
                Combiner::Add
            }
            Some('-') => {
                cursor.take_operator();
                Combiner::Subtract
            }
            Some(_) => Combiner::Union,
        };
        cursor.skip_separators();
        let operand = syllable_value(cursor, asm)?;
        acc = combine(acc, operand, combiner, asm);
    }
    Ok(acc)
}

fn syllable_value(cursor: &mut LineCursor<'_>, asm: &mut Assembler) -> Result<Word, SyntaxAbort> {
    let syllable = match cursor.take_syllable() {
        Ok(syllable) => syllable,
        Err(e) => {
            asm.report(Some(ErrorFlag::Syntax), e.to_string());
            return Err(SyntaxAbort);
        }
    };
    event!(Level::TRACE, "syllable {syllable:?}");
    Ok(match syllable {
        Syllable::CharHigh(ch) => Word::absolute((ch as u32) << 9),
        Syllable::CharLow(ch) => Word::absolute(ch as u32),
        Syllable::Literal(n) => Word::absolute(n),
        Syllable::Symbol(name) => match asm.lookup(name) {
            Some(value) => value,
            None => {
                asm.report(
                    Some(ErrorFlag::Undefined),
                    format!("'{name}' is undefined"),
                );
                Word::ZERO
            }
        },
        Syllable::Relative { number, direction } => {
            match asm.resolve_relative(number, direction) {
                Some(value) => value,
                None => {
                    asm.report(
                        Some(ErrorFlag::Undefined),
                        format!("relative label {number} has no definition in that direction"),
                    );
                    Word::ZERO
                }
            }
        }
    })
}

fn combine(acc: Word, operand: Word, combiner: Combiner, asm: &mut Assembler) -> Word {
    match combiner {
        Combiner::Union => acc.union(operand),
        Combiner::Add => acc.add(operand),
        Combiner::Subtract => match acc.sub(operand) {
            Ok(value) => value,
            Err(e) => {
                asm.report(Some(ErrorFlag::RelocationMix), e.to_string());
                // Keep folding with the masked difference so that the
                // rest of the expression still gets checked.
                Word::absolute(acc.magnitude().wrapping_sub(operand.magnitude()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::driver::{Assembler, Pass};
    use super::super::lexer::LineCursor;
    use super::{expression, SyntaxAbort};
    use base::prelude::Word;

    fn evaluate(asm: &mut Assembler, text: &str) -> Result<Word, SyntaxAbort> {
        let mut cursor = LineCursor::new(text);
        expression(&mut cursor, asm)
    }

    fn pass_two_assembler() -> Assembler {
        let mut asm = Assembler::new();
        asm.set_pass_for_tests(Pass::Two);
        asm
    }

    #[test]
    fn whitespace_joins_syllables_with_or() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "lac 5"), Ok(Word::absolute(0o200005)));
        assert_eq!(evaluate(&mut asm, "lac,5"), Ok(Word::absolute(0o200005)));
        assert!(asm.take_errors_for_tests().is_empty());
    }

    #[test]
    fn explicit_operators_fold_left_to_right() {
        let mut asm = pass_two_assembler();
        // No precedence: (2 + 3) - 1, syllable by syllable.
        assert_eq!(evaluate(&mut asm, "2 + 3 - 1"), Ok(Word::absolute(4)));
    }

    #[test]
    fn addition_wraps_and_stays_in_18_bits() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "0777777 + 2"), Ok(Word::absolute(1)));
    }

    #[test]
    fn octal_and_decimal_literals() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "010"), Ok(Word::absolute(8)));
        assert_eq!(evaluate(&mut asm, "10"), Ok(Word::absolute(10)));
    }

    #[test]
    fn character_literals() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "<A"), Ok(Word::absolute(0o101000)));
        assert_eq!(evaluate(&mut asm, "A>"), Ok(Word::absolute(0o101)));
        assert_eq!(evaluate(&mut asm, ">A"), Ok(Word::absolute(0o101)));
    }

    #[test]
    fn undefined_symbol_is_zero_and_reported_on_pass_two() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "lac nowhere"), Ok(Word::absolute(0o200000)));
        let errors = asm.take_errors_for_tests();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("nowhere"));
    }

    #[test]
    fn undefined_symbol_is_silent_on_pass_one() {
        let mut asm = Assembler::new();
        assert_eq!(evaluate(&mut asm, "nowhere"), Ok(Word::ZERO));
        assert!(asm.take_errors_for_tests().is_empty());
    }

    #[test]
    fn absolute_minus_relocatable_is_reported() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "5 - ."), Ok(Word::absolute(5)));
        let errors = asm.take_errors_for_tests();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("relocatable"));
    }

    #[test]
    fn relocatable_minus_relocatable_is_absolute_and_clean() {
        let mut asm = pass_two_assembler();
        let got = evaluate(&mut asm, ". - .").expect("expression should parse");
        assert_eq!(got, Word::absolute(0));
        assert!(asm.take_errors_for_tests().is_empty());
    }

    #[test]
    fn garbage_aborts_the_line() {
        let mut asm = pass_two_assembler();
        assert_eq!(evaluate(&mut asm, "lac *"), Err(SyntaxAbort));
        assert_eq!(asm.take_errors_for_tests().len(), 1);
    }
}
