//! The assembler's name tables.
//!
//! Variables (assignment targets, plus every builtin mnemonic) and
//! labels are distinct namespaces; expression lookup consults the
//! variables first.  Labels come in three kinds: global, local to one
//! file (declared with `.local` or spelled with a leading `L`), and
//! the numeric relative labels which may be redefined freely.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{event, Level};

use base::prelude::{builtin_symbols, Word};

use super::lexer::Direction;

/// Identifies one input file.  Local and relative labels are scoped
/// to the file which defines them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FileId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct SymbolTable {
    variables: HashMap<String, Word>,
    global_labels: BTreeMap<String, Word>,
    local_labels: HashMap<(FileId, String), Word>,
    local_names: HashSet<(FileId, String)>,
    relative: HashMap<(FileId, u32), Vec<Word>>,
}

/// The outcome of a label definition; a conflict carries the value
/// which is being kept.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LabelOutcome {
    Defined,
    Conflict { kept: Word },
}

impl SymbolTable {
    /// A table holding only the builtin mnemonics, the location
    /// counter `.` and the relocation base `..`.
    pub(crate) fn new() -> SymbolTable {
        let mut variables: HashMap<String, Word> = builtin_symbols()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        variables.insert(".".to_string(), Word::relocatable(0));
        variables.insert("..".to_string(), Word::absolute(0o10000));
        SymbolTable {
            variables,
            global_labels: BTreeMap::new(),
            local_labels: HashMap::new(),
            local_names: HashSet::new(),
            relative: HashMap::new(),
        }
    }

    pub(crate) fn assign_variable(&mut self, name: &str, value: Word) {
        event!(Level::DEBUG, "variable {name} = {value}");
        self.variables.insert(name.to_string(), value);
    }

    pub(crate) fn variable(&self, name: &str) -> Option<Word> {
        self.variables.get(name).copied()
    }

    /// Record that `name` is local to `file`, as `.local` does.
    pub(crate) fn declare_local(&mut self, file: FileId, name: &str) {
        self.local_names.insert((file, name.to_string()));
    }

    fn is_local(&self, file: FileId, name: &str) -> bool {
        name.starts_with('L') || self.local_names.contains(&(file, name.to_string()))
    }

    /// Define a label at `loc`.  Redefinition with the same value is
    /// a no-op (it happens on every second pass); redefinition with a
    /// different value keeps the earlier value and reports the
    /// conflict to the caller.
    pub(crate) fn define_label(&mut self, file: FileId, name: &str, loc: Word) -> LabelOutcome {
        let existing = if self.is_local(file, name) {
            self.local_labels
                .entry((file, name.to_string()))
                .or_insert(loc)
        } else {
            self.global_labels.entry(name.to_string()).or_insert(loc)
        };
        if *existing == loc {
            event!(Level::DEBUG, "label {name} = {loc}");
            LabelOutcome::Defined
        } else {
            LabelOutcome::Conflict { kept: *existing }
        }
    }

    /// Look a label up; the current file's local entry shadows any
    /// global of the same name.
    pub(crate) fn label(&self, file: FileId, name: &str) -> Option<Word> {
        self.local_labels
            .get(&(file, name.to_string()))
            .or_else(|| self.global_labels.get(name))
            .copied()
    }

    /// Expression lookup: variables first, then labels.
    pub(crate) fn lookup(&self, file: FileId, name: &str) -> Option<Word> {
        self.variable(name).or_else(|| self.label(file, name))
    }

    /// Append a definition of relative label `number` at `loc`.  The
    /// driver calls this on the first pass only, so that the lists do
    /// not double up.
    pub(crate) fn define_relative(&mut self, file: FileId, number: u32, loc: Word) {
        self.relative.entry((file, number)).or_default().push(loc);
    }

    /// Resolve `Nf`/`Nb` relative to the location counter `here`:
    /// forward means the nearest definition strictly after it,
    /// backward the nearest strictly before it.
    pub(crate) fn resolve_relative(
        &self,
        file: FileId,
        number: u32,
        direction: Direction,
        here: Word,
    ) -> Option<Word> {
        let entries = self.relative.get(&(file, number))?;
        match direction {
            Direction::Forward => entries
                .iter()
                .filter(|loc| loc.magnitude() > here.magnitude())
                .min_by_key(|loc| loc.magnitude()),
            Direction::Backward => entries
                .iter()
                .filter(|loc| loc.magnitude() < here.magnitude())
                .max_by_key(|loc| loc.magnitude()),
        }
        .copied()
    }

    /// Every global label, in ascending name order.  Local labels are
    /// deliberately absent: they are a per-file implementation detail.
    pub(crate) fn global_labels(&self) -> impl Iterator<Item = (&str, Word)> {
        self.global_labels
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }
}

#[cfg(test)]
mod tests {
    use super::{FileId, LabelOutcome, SymbolTable};
    use crate::lexer::Direction;
    use base::prelude::Word;

    const F0: FileId = FileId(0);
    const F1: FileId = FileId(1);

    #[test]
    fn builtins_are_preloaded() {
        let table = SymbolTable::new();
        assert_eq!(table.variable("lac"), Some(Word::absolute(0o200000)));
        assert_eq!(table.variable("."), Some(Word::relocatable(0)));
        assert_eq!(table.variable(".."), Some(Word::absolute(0o10000)));
    }

    #[test]
    fn variables_shadow_labels_in_lookup() {
        let mut table = SymbolTable::new();
        table.define_label(F0, "x", Word::relocatable(3));
        table.assign_variable("x", Word::absolute(9));
        assert_eq!(table.lookup(F0, "x"), Some(Word::absolute(9)));
        assert_eq!(table.label(F0, "x"), Some(Word::relocatable(3)));
    }

    #[test]
    fn leading_l_names_are_local_to_their_file() {
        let mut table = SymbolTable::new();
        table.define_label(F0, "Loop", Word::relocatable(1));
        table.define_label(F1, "Loop", Word::relocatable(2));
        assert_eq!(table.label(F0, "Loop"), Some(Word::relocatable(1)));
        assert_eq!(table.label(F1, "Loop"), Some(Word::relocatable(2)));
        assert_eq!(table.global_labels().count(), 0);
    }

    #[test]
    fn declared_locals_shadow_the_global_of_the_same_name() {
        let mut table = SymbolTable::new();
        table.define_label(F0, "buf", Word::relocatable(5));
        table.declare_local(F1, "buf");
        table.define_label(F1, "buf", Word::relocatable(8));
        assert_eq!(table.label(F0, "buf"), Some(Word::relocatable(5)));
        assert_eq!(table.label(F1, "buf"), Some(Word::relocatable(8)));
        // Only the file-0 definition was global.
        let globals: Vec<_> = table.global_labels().collect();
        assert_eq!(globals, vec![("buf", Word::relocatable(5))]);
    }

    #[test]
    fn conflicting_redefinition_keeps_the_earlier_value() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.define_label(F0, "x", Word::relocatable(1)),
            LabelOutcome::Defined
        );
        assert_eq!(
            table.define_label(F0, "x", Word::relocatable(1)),
            LabelOutcome::Defined
        );
        assert_eq!(
            table.define_label(F0, "x", Word::relocatable(2)),
            LabelOutcome::Conflict {
                kept: Word::relocatable(1)
            }
        );
        assert_eq!(table.label(F0, "x"), Some(Word::relocatable(1)));
    }

    #[test]
    fn relative_labels_resolve_to_the_nearest_definition() {
        let mut table = SymbolTable::new();
        for loc in [0, 2, 4] {
            table.define_relative(F0, 1, Word::relocatable(loc));
        }
        let here = Word::relocatable(1);
        assert_eq!(
            table.resolve_relative(F0, 1, Direction::Forward, here),
            Some(Word::relocatable(2))
        );
        assert_eq!(
            table.resolve_relative(F0, 1, Direction::Backward, here),
            Some(Word::relocatable(0))
        );
        // Strictly before/after: from a definition site the definition
        // itself is not a candidate.
        let at_first = Word::relocatable(0);
        assert_eq!(
            table.resolve_relative(F0, 1, Direction::Backward, at_first),
            None
        );
        assert_eq!(table.resolve_relative(F0, 2, Direction::Forward, here), None);
        assert_eq!(table.resolve_relative(F1, 1, Direction::Forward, here), None);
    }
}
