//! The two-pass driver.
//!
//! Pass one walks every input file to collect label definitions; pass
//! two walks them again, evaluating each statement with the full
//! tables and writing the memory image.  Only the location counter is
//! rewound between the passes; every other table carries over, which
//! is what lets the second pass notice labels defined twice with
//! different values.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{event, span, Level};

use base::prelude::{Word, WORD_MASK};

use super::lexer::Direction;
use super::listing::{dump_labels, Listing, ListingLine};
use super::parser;
use super::symtab::{FileId, LabelOutcome, SymbolTable};
use super::types::{
    AssemblerFailure, ErrorFlag, ErrorLocation, IoAction, IoFailed, IoTarget, ProgramError,
};

mod output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    One,
    Two,
}

/// Which encoder the memory image is fed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Octal location/word pairs with the originating source line.
    #[default]
    A7Out,
    /// The assembly listing with the label dump appended.
    Listing,
    /// Raw paper-tape frames.
    Ptr,
    /// Paper-tape frames with the RIM loader's start trailer.
    Rim,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<OutputFormat, String> {
        match s {
            "a7out" => Ok(OutputFormat::A7Out),
            "list" => Ok(OutputFormat::Listing),
            "ptr" => Ok(OutputFormat::Ptr),
            "rim" => Ok(OutputFormat::Rim),
            _ => Err(format!(
                "'{s}' is not an output format (expected a7out, list, ptr or rim)"
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::A7Out => "a7out",
            OutputFormat::Listing => "list",
            OutputFormat::Ptr => "ptr",
            OutputFormat::Rim => "rim",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// Also write the label dump to a side-car file.
    pub namelist: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemoryCell {
    pub(crate) value: u32,
    /// The source line the word came from, for the octal dump and the
    /// listing.
    pub(crate) source: String,
}

/// The assembled program: a sparse image of 18-bit words indexed by
/// absolute location.
#[derive(Debug, Default)]
pub(crate) struct MemoryImage {
    cells: BTreeMap<u32, MemoryCell>,
}

impl MemoryImage {
    fn store(&mut self, location: u32, value: u32, source: &str) {
        self.cells.insert(
            location,
            MemoryCell {
                value,
                source: source.to_string(),
            },
        );
    }

    pub(crate) fn get(&self, location: u32) -> Option<&MemoryCell> {
        self.cells.get(&location)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &MemoryCell)> {
        self.cells.iter().map(|(location, cell)| (*location, cell))
    }

    pub(crate) fn highest_location(&self) -> Option<u32> {
        self.cells.last_key_value().map(|(location, _)| *location)
    }
}

/// One input file, read once and traversed by both passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceFile {
    pub(crate) name: String,
    pub(crate) lines: Vec<String>,
}

impl SourceFile {
    #[cfg(test)]
    pub(crate) fn from_text(name: &str, text: &str) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            lines: text.lines().map(String::from).collect(),
        }
    }
}

/// Owns every table and the in-progress output; one instance lives
/// for the whole run.
#[derive(Debug)]
pub(crate) struct Assembler {
    pass: Pass,
    file: FileId,
    file_name: String,
    line_number: u32,
    pub(crate) symtab: SymbolTable,
    pub(crate) image: MemoryImage,
    pub(crate) listing: Listing,
    pub(crate) errors: Vec<ProgramError>,
    /// The first error flag raised by the statement being evaluated;
    /// it becomes the listing's error column.
    statement_flag: Option<ErrorFlag>,
}

impl Assembler {
    pub(crate) fn new() -> Assembler {
        Assembler {
            pass: Pass::One,
            file: FileId(0),
            file_name: String::new(),
            line_number: 0,
            symtab: SymbolTable::new(),
            image: MemoryImage::default(),
            listing: Listing::default(),
            errors: Vec::new(),
            statement_flag: None,
        }
    }

    fn dot(&self) -> Word {
        self.symtab
            .variable(".")
            .expect("the location counter is seeded and never removed")
    }

    fn relocation_base(&self) -> u32 {
        self.symtab
            .variable("..")
            .expect("the relocation base is seeded and never removed")
            .magnitude()
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Word> {
        self.symtab.lookup(self.file, name)
    }

    pub(crate) fn resolve_relative(&self, number: u32, direction: Direction) -> Option<Word> {
        self.symtab
            .resolve_relative(self.file, number, direction, self.dot())
    }

    pub(crate) fn declare_local(&mut self, name: &str) {
        self.symtab.declare_local(self.file, name);
    }

    /// Report a diagnostic.  The first pass is permissive: it stays
    /// quiet and lets the second pass do the reporting, since by then
    /// forward references have stopped being errors.
    pub(crate) fn report(&mut self, flag: Option<ErrorFlag>, message: String) {
        if self.pass != Pass::Two {
            return;
        }
        let error = ProgramError {
            location: ErrorLocation {
                file: self.file_name.clone(),
                line: self.line_number,
            },
            message,
        };
        eprintln!("{error}");
        self.listing.push(ListingLine::Diagnostic(error.to_string()));
        self.errors.push(error);
        if let Some(flag) = flag {
            self.statement_flag = self.statement_flag.or(Some(flag));
        }
    }

    /// Define a label at the current location counter.  A purely
    /// numeric name is a relative label and goes into the per-file
    /// list instead (on the first pass only, so the list does not
    /// double up).
    pub(crate) fn define_label_here(&mut self, name: &str) {
        let here = self.dot();
        if name.bytes().all(|b| b.is_ascii_digit()) {
            if self.pass == Pass::One {
                let number = name.chars().fold(0u32, |n, ch| {
                    n.wrapping_mul(10)
                        .wrapping_add(ch.to_digit(10).expect("the name is all digits"))
                });
                self.symtab.define_relative(self.file, number, here);
            }
        } else if let LabelOutcome::Conflict { kept } =
            self.symtab.define_label(self.file, name, here)
        {
            self.report(
                None,
                format!(
                    "label '{name}' is defined again with value {here}; keeping {kept}"
                ),
            );
        }
    }

    /// Bind a variable.  Assigning to `.` moves the location counter
    /// but keeps it relocatable; the counter never leaves the
    /// segment, it only jumps around inside it.
    pub(crate) fn assign(&mut self, name: &str, value: Word) {
        let value = if name == "." {
            Word::tagged(
                value.magnitude(),
                self.dot().is_relocatable() || value.is_relocatable(),
            )
        } else {
            value
        };
        self.symtab.assign_variable(name, value);
        if self.pass == Pass::Two {
            self.listing.push(ListingLine::Assignment {
                value: value.magnitude(),
                flag: self.statement_flag,
            });
        }
        self.statement_flag = None;
    }

    /// Store an expression statement's word at the location counter,
    /// relocating both by the current `..`, and advance the counter.
    /// The first pass only advances the counter.
    pub(crate) fn emit(&mut self, word: Word, source: &str) {
        if self.pass == Pass::Two {
            let dot = self.dot();
            let base = self.relocation_base();
            if dot.is_relocatable() && dot.magnitude() + base > WORD_MASK {
                // The relocation add wrapped: user arithmetic dragged
                // the counter below the base.
                self.report(
                    Some(ErrorFlag::BelowBase),
                    "location counter is below the relocation base".to_string(),
                );
            } else {
                let location = dot.relocated(base);
                let value = word.relocated(base);
                event!(Level::DEBUG, "{location:06o}: {value:06o}");
                self.image.store(location, value, source);
                self.listing.push(ListingLine::Word {
                    location,
                    value,
                    flag: self.statement_flag,
                });
            }
            self.statement_flag = None;
        }
        let next = self.dot().add(Word::absolute(1));
        self.symtab.assign_variable(".", next);
    }

    fn run_pass(&mut self, pass: Pass, sources: &[SourceFile]) {
        let span = span!(Level::ERROR, "assembly pass", pass = ?pass);
        let _enter = span.enter();
        self.pass = pass;
        self.symtab.assign_variable(".", Word::relocatable(0));
        for (index, source) in sources.iter().enumerate() {
            self.file = FileId(index);
            self.file_name = source.name.clone();
            for (line_index, line) in source.lines.iter().enumerate() {
                self.line_number = (line_index + 1) as u32;
                self.statement_flag = None;
                if self.pass == Pass::Two {
                    self.listing.push(ListingLine::Source(line.clone()));
                }
                parser::process_line(self, line);
            }
        }
        event!(
            Level::INFO,
            "pass ended with the location counter at {}",
            self.dot()
        );
    }

    #[cfg(test)]
    pub(crate) fn set_pass_for_tests(&mut self, pass: Pass) {
        self.pass = pass;
    }

    #[cfg(test)]
    pub(crate) fn take_errors_for_tests(&mut self) -> Vec<ProgramError> {
        std::mem::take(&mut self.errors)
    }
}

/// Run both passes over in-memory sources and hand back the filled-in
/// assembler.
pub(crate) fn assemble_sources(sources: &[SourceFile]) -> Assembler {
    let mut asm = Assembler::new();
    asm.run_pass(Pass::One, sources);
    asm.run_pass(Pass::Two, sources);
    event!(
        Level::INFO,
        "assembly produced {} words and {} diagnostics",
        asm.image.iter().count(),
        asm.errors.len()
    );
    asm
}

fn read_source_file(path: &Path) -> Result<SourceFile, AssemblerFailure> {
    let read_failed = |error| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Read,
            target: IoTarget::File(path.to_path_buf()),
            error,
        })
    };
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(read_failed)?;
    let mut lines = Vec::new();
    for item in BufReader::new(file).lines() {
        let line = item.map_err(read_failed)?;
        // Tolerate CRLF input; the parser never wants the CR.
        lines.push(line.trim_end_matches('\r').to_string());
    }
    Ok(SourceFile {
        name: path.to_string_lossy().into_owned(),
        lines,
    })
}

fn namelist_path(output_file: &Path) -> PathBuf {
    let mut name = output_file.as_os_str().to_owned();
    name.push(".nm");
    PathBuf::from(name)
}

/// Assemble the input files, in command-line order, into
/// `output_file`.  Diagnostics go to standard error as they are
/// found; if there were any, the result is `BadProgram` so the caller
/// can exit non-zero.
pub fn assemble_files(
    input_files: &[PathBuf],
    output_file: &Path,
    options: OutputOptions,
) -> Result<(), AssemblerFailure> {
    let sources: Vec<SourceFile> = input_files
        .iter()
        .map(|path| read_source_file(path))
        .collect::<Result<_, _>>()?;
    let asm = assemble_sources(&sources);

    let write_failed = |error| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Write,
            target: IoTarget::File(output_file.to_path_buf()),
            error,
        })
    };
    let span = span!(Level::ERROR, "write output", format = %options.format);
    let _enter = span.enter();
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_file)
        .map_err(write_failed)?;
    let mut writer = BufWriter::new(file);
    let base = asm.relocation_base();
    match options.format {
        OutputFormat::A7Out => output::write_octal_dump(&asm.image, &mut writer, output_file)?,
        OutputFormat::Listing => {
            write!(writer, "{}", asm.listing).map_err(write_failed)?;
            writeln!(writer, "\nLabels:").map_err(write_failed)?;
            dump_labels(&mut writer, asm.symtab.global_labels(), base).map_err(write_failed)?;
        }
        OutputFormat::Ptr => {
            output::write_tape_frames(&asm.image, base, false, &mut writer, output_file)?
        }
        OutputFormat::Rim => {
            output::write_tape_frames(&asm.image, base, true, &mut writer, output_file)?
        }
    }
    writer.flush().map_err(write_failed)?;

    if options.namelist {
        let path = namelist_path(output_file);
        let namelist_failed = |error| {
            AssemblerFailure::Io(IoFailed {
                action: IoAction::Write,
                target: IoTarget::File(path.clone()),
                error,
            })
        };
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(namelist_failed)?;
        let mut writer = BufWriter::new(file);
        dump_labels(&mut writer, asm.symtab.global_labels(), base).map_err(namelist_failed)?;
        writer.flush().map_err(namelist_failed)?;
    }

    if asm.errors.is_empty() {
        Ok(())
    } else {
        Err(AssemblerFailure::BadProgram(asm.errors.len()))
    }
}
