//! The diagnostic data channel: semantic and syntactic problems that are
//! recoverable at the compilation-unit level.
//!
//! This is deliberately separate from [`crate::module::CompileError`], which
//! carries operational failures (file not found, internal invariants). A
//! diagnostic never aborts compilation by itself; only [`Diagnostics::has_fatal`]
//! decides whether the caller should refuse to hand the resulting [`crate::document::Document`]
//! to a code generator.

use std::fmt;

use crate::location::StmtInfo;

/// Which stage of the pipeline raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticType {
    Lexer,
    Syntax,
    Semantic,
}

/// Severity of a diagnostic. Only `Fatal` prevents code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Note,
    Warning,
    Fatal,
}

/// The specific semantic or syntactic complaint, carrying whatever data is
/// needed to render the message in [`DiagnosticKind::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    DuplicateTypeDecl { name: String },
    DuplicateFieldDecl { name: String },
    DuplicateEnumFieldValue { value: i32 },
    DuplicatePathParamDecl { name: String },
    MapKeyNotPrimitive { found: String },
    CustomTypeNotFound { name: String },
    RecursiveOneof,
    UnknownOption { name: String },
    OptionTypeMismatch { expected: String, name: String },
    UnresolvedImport { file: String },
    ImportNameNotFound { name: String, file: String },
    /// A generic syntax error raised by the reader in [`crate::syntax`], not
    /// one of the semantic kinds above.
    Syntax { message: String },
}

impl DiagnosticKind {
    /// Render the kind's fixed message template. These strings are part of
    /// the tool's external contract and must match byte for byte.
    pub fn render(&self) -> String {
        match self {
            DiagnosticKind::DuplicateTypeDecl { name } => {
                format!("A type {name} has been defined more than once.")
            }
            DiagnosticKind::MapKeyNotPrimitive { found } => {
                format!("The key of the map must be a primitive type. give {found}")
            }
            DiagnosticKind::CustomTypeNotFound { name } => {
                format!("cannot find type `{name}`")
            }
            DiagnosticKind::DuplicateFieldDecl { name } => {
                format!("field `{name}` is already declared")
            }
            DiagnosticKind::DuplicateEnumFieldValue { value } => {
                format!("discriminant value `{value}` already exists")
            }
            DiagnosticKind::DuplicatePathParamDecl { name } => {
                format!("path param `{name}` is already declared")
            }
            DiagnosticKind::RecursiveOneof => "oneof type does not allow recursion".to_string(),
            DiagnosticKind::UnknownOption { name } => format!("Option \"{name}\" unknown."),
            DiagnosticKind::OptionTypeMismatch { expected, name } => {
                // The doubled `expected` is verbatim from the tool this was
                // distilled from; see DESIGN.md open questions.
                format!("Value must be {expected} for {expected} option \"{name}\".")
            }
            DiagnosticKind::UnresolvedImport { file } => {
                format!("ModuleNotFoundError: unresolved import `{file}`")
            }
            DiagnosticKind::ImportNameNotFound { name, file } => {
                format!("ImportError: cannot import name `{name}` from `{file}`")
            }
            DiagnosticKind::Syntax { message } => message.clone(),
        }
    }

    /// The severity every occurrence of this kind carries. All semantic kinds
    /// are fatal; only a future warning-level kind would return `Level::Warning`.
    pub fn level(&self) -> Level {
        Level::Fatal
    }

    pub fn diagnostic_type(&self) -> DiagnosticType {
        match self {
            DiagnosticKind::Syntax { .. } => DiagnosticType::Syntax,
            _ => DiagnosticType::Semantic,
        }
    }
}

/// One accumulated problem, with enough structured data to locate and explain
/// the offence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub level: Level,
    pub location: StmtInfo,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: StmtInfo) -> Self {
        let level = kind.level();
        Diagnostic {
            kind,
            level,
            location,
        }
    }

    pub fn message(&self) -> String {
        self.kind.render()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message())
    }
}

/// Accumulates diagnostics across a compilation, never interrupting the walk.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        #[cfg(debug_assertions)]
        if diagnostic.level >= Level::Warning {
            tracing::warn!(%diagnostic, "diagnostic raised");
        }
        self.entries.push(diagnostic);
    }

    pub fn has_fatal(&self) -> bool {
        self.entries.iter().any(|d| d.level == Level::Fatal)
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Diagnostics {
            entries: iter.into_iter().collect(),
        }
    }
}
