use std::{ops::Deref, sync::OnceLock};

use regex::Regex;

pub(crate) struct LazyRegex {
    once: OnceLock<Regex>,
    pattern: &'static str,
}

impl LazyRegex {
    pub(crate) const fn new(pattern: &'static str) -> Self {
        LazyRegex {
            once: OnceLock::new(),
            pattern,
        }
    }
}

impl Deref for LazyRegex {
    type Target = Regex;

    fn deref(&self) -> &Regex {
        self.once.get_or_init(|| match Regex::new(self.pattern) {
            Ok(r) => r,
            Err(e) => {
                panic!("'{}' is not a valid regular expression: {e}", self.pattern);
            }
        })
    }
}

/// A label definition at the head of a statement: `IDENT:`.
pub(crate) static LABEL_HEAD: LazyRegex = LazyRegex::new("^([A-Za-z0-9_.]+):");

/// An assignment at the head of a statement: `SYMBOL =`.
pub(crate) static ASSIGNMENT_HEAD: LazyRegex = LazyRegex::new("^([A-Za-z0-9_.]+)[ \t,]*=");
