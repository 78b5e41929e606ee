use super::{Direction, LineCursor, Syllable};

fn syllables(text: &str) -> Vec<Syllable<'_>> {
    let mut cursor = LineCursor::new(text);
    let mut result = Vec::new();
    loop {
        cursor.skip_separators();
        if cursor.finished() {
            return result;
        }
        result.push(cursor.take_syllable().expect("input should scan cleanly"));
    }
}

#[test]
fn separators_are_spaces_tabs_and_commas() {
    assert_eq!(
        syllables("lac \t,x"),
        vec![Syllable::Symbol("lac"), Syllable::Symbol("x")]
    );
}

#[test]
fn symbols_may_contain_dots_underscores_and_digits() {
    assert_eq!(
        syllables(". .. x_1 a.b"),
        vec![
            Syllable::Symbol("."),
            Syllable::Symbol(".."),
            Syllable::Symbol("x_1"),
            Syllable::Symbol("a.b"),
        ]
    );
}

#[test]
fn leading_zero_selects_octal() {
    assert_eq!(syllables("010"), vec![Syllable::Literal(8)]);
    assert_eq!(syllables("10"), vec![Syllable::Literal(10)]);
    assert_eq!(syllables("0"), vec![Syllable::Literal(0)]);
}

#[test]
fn literals_mask_to_18_bits() {
    assert_eq!(syllables("01000001"), vec![Syllable::Literal(1)]);
    assert_eq!(syllables("262145"), vec![Syllable::Literal(1)]);
}

#[test]
fn nine_is_not_an_octal_digit() {
    let mut cursor = LineCursor::new("09");
    let e = cursor.take_syllable().expect_err("09 should not scan");
    assert_eq!(e.content, "09");
}

#[test]
fn character_literal_forms() {
    assert_eq!(syllables("<A"), vec![Syllable::CharHigh('A')]);
    assert_eq!(syllables("A>"), vec![Syllable::CharLow('A')]);
    assert_eq!(syllables(">A"), vec![Syllable::CharLow('A')]);
    // A one-letter name followed by > is still a character literal.
    assert_eq!(syllables("a>"), vec![Syllable::CharLow('a')]);
    assert_eq!(syllables("< "), vec![Syllable::CharHigh(' ')]);
}

#[test]
fn relative_references() {
    assert_eq!(
        syllables("1f 12b"),
        vec![
            Syllable::Relative {
                number: 1,
                direction: Direction::Forward
            },
            Syllable::Relative {
                number: 12,
                direction: Direction::Backward
            },
        ]
    );
}

#[test]
fn digits_followed_by_letters_are_not_anything() {
    let mut cursor = LineCursor::new("1fx");
    let e = cursor.take_syllable().expect_err("1fx should not scan");
    assert_eq!(e.content, "1fx");
}

#[test]
fn labels_at_the_head_of_a_statement() {
    let mut cursor = LineCursor::new("a: b: lac x");
    assert_eq!(cursor.take_label(), Some("a"));
    cursor.skip_separators();
    assert_eq!(cursor.take_label(), Some("b"));
    cursor.skip_separators();
    assert_eq!(cursor.take_label(), None);
    assert_eq!(cursor.rest(), "lac x");
}

#[test]
fn numeric_labels_scan_like_any_other() {
    let mut cursor = LineCursor::new("1:");
    assert_eq!(cursor.take_label(), Some("1"));
}

#[test]
fn assignment_heads() {
    let mut cursor = LineCursor::new("x = 5");
    assert_eq!(cursor.take_assignment(), Some("x"));
    cursor.skip_separators();
    assert_eq!(cursor.rest(), "5");

    let mut cursor = LineCursor::new(".. =020000");
    assert_eq!(cursor.take_assignment(), Some(".."));

    let mut cursor = LineCursor::new("lac x");
    assert_eq!(cursor.take_assignment(), None);
    assert_eq!(cursor.rest(), "lac x");
}

#[test]
fn comments_end_the_line() {
    let mut cursor = LineCursor::new("\" nothing");
    assert!(cursor.at_comment());
    assert!(cursor.finished());

    let mut cursor = LineCursor::new("lac x \" fetch it");
    cursor.skip_separators();
    assert!(!cursor.finished());
}

#[test]
fn statement_separator() {
    let mut cursor = LineCursor::new("; hlt");
    assert!(cursor.take_statement_separator());
    assert!(!cursor.take_statement_separator());
}

#[test]
fn garbage_is_unrecognised() {
    let mut cursor = LineCursor::new("*");
    let e = cursor.take_syllable().expect_err("* should not scan");
    assert_eq!(e.content, "*");
}

#[test]
fn an_empty_line_has_no_syllable() {
    let mut cursor = LineCursor::new("");
    assert!(cursor.take_syllable().is_err());
}
