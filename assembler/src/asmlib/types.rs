use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io::Error as IoError;
use std::path::PathBuf;

/// The classes of user-program diagnostic, each with the one-character
/// code shown in the listing's error column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorFlag {
    /// `U`: undefined symbol or unresolvable relative reference.
    Undefined,
    /// `A`: subtraction of a relocatable value from an absolute one.
    RelocationMix,
    /// `.`: the location counter fell below the relocation base.
    BelowBase,
    /// `?`: the line could not be parsed.
    Syntax,
}

impl ErrorFlag {
    pub(crate) fn listing_code(&self) -> char {
        match self {
            ErrorFlag::Undefined => 'U',
            ErrorFlag::RelocationMix => 'A',
            ErrorFlag::BelowBase => '.',
            ErrorFlag::Syntax => '?',
        }
    }
}

/// Identifies the input position a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorLocation {
    pub(crate) file: String,
    pub(crate) line: u32,
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One diagnostic about the user's program.  These are never fatal;
/// they are reported on the second pass and decide the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProgramError {
    pub(crate) location: ErrorLocation,
    pub(crate) message: String,
}

impl Display for ProgramError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl Error for ProgramError {}

#[derive(Debug, PartialEq, Eq)]
pub enum IoAction {
    Read,
    Write,
}

impl Display for IoAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoAction::Read => "read",
            IoAction::Write => "write",
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum IoTarget {
    File(PathBuf),
}

impl Display for IoTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IoTarget::File(file_name) => {
                write!(f, "file {}", file_name.display())
            }
        }
    }
}

#[derive(Debug)]
pub struct IoFailed {
    pub action: IoAction,
    pub target: IoTarget,
    pub error: IoError,
}

impl Display for IoFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let IoFailed {
            action,
            target,
            error,
        } = self;
        write!(f, "I/O error: {action} failed on {target}: {error}")
    }
}

impl PartialEq<IoFailed> for IoFailed {
    fn eq(&self, other: &IoFailed) -> bool {
        self.action == other.action
            && self.target == other.target
            && self.error.to_string() == other.error.to_string()
    }
}

/// Why an assembly run produced no usable output.
#[derive(Debug, PartialEq)]
pub enum AssemblerFailure {
    Io(IoFailed),
    /// The given number of diagnostics were reported (already printed
    /// to standard error as they were found).
    BadProgram(usize),
}

impl Display for AssemblerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssemblerFailure::Io(e) => write!(f, "{e}"),
            AssemblerFailure::BadProgram(n) => {
                write!(
                    f,
                    "{n} {} reported in the user program",
                    if *n == 1 { "error was" } else { "errors were" }
                )
            }
        }
    }
}

impl Error for AssemblerFailure {}

impl From<IoFailed> for AssemblerFailure {
    fn from(e: IoFailed) -> AssemblerFailure {
        AssemblerFailure::Io(e)
    }
}

/// The binary's top-level error type.
#[derive(Debug)]
pub enum Fail {
    AsmFail(AssemblerFailure),
    InitialisationFailure(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Fail::AsmFail(assembler_failure) => assembler_failure.fmt(f),
            Fail::InitialisationFailure(msg) => f.write_str(msg.as_str()),
        }
    }
}

impl Error for Fail {}
