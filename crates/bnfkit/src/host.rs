//! The output side of the host compilation: source files and diagnostics.

use crate::types::Map;
use std::{
    cell::RefCell,
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

/// Accepts newly generated source files for the ongoing compilation.
pub trait Filer {
    /// Create the source file for the type `name` (a qualified identifier).
    ///
    /// Creating the same file twice within one build is an error.
    fn create_source_file(&mut self, name: &str) -> io::Result<Box<dyn Write + '_>>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
    Note,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Note => f.write_str("note"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Accepts diagnostics. Errors do not stop the round, but fail the build.
pub trait Messager {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects reported diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reported: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.reported.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.iter()
            .filter(|diagnostic| diagnostic.kind == DiagnosticKind::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

impl Messager for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("diagnostic reported: {}", diagnostic);
        self.reported.push(diagnostic);
    }
}

/// Keeps generated sources in memory, keyed by qualified name.
#[derive(Debug, Default, Clone)]
pub struct MemoryFiler {
    files: Rc<RefCell<Map<String, Vec<u8>>>>,
}

impl MemoryFiler {
    pub fn names(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.borrow().contains_key(name)
    }

    pub fn source(&self, name: &str) -> Option<String> {
        let files = self.files.borrow();
        let bytes = files.get(name)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl Filer for MemoryFiler {
    fn create_source_file(&mut self, name: &str) -> io::Result<Box<dyn Write + '_>> {
        let mut files = self.files.borrow_mut();
        if files.contains_key(name) {
            return Err(already_created(name));
        }
        files.insert(name.to_owned(), vec![]);
        Ok(Box::new(MemoryWriter {
            files: self.files.clone(),
            name: name.to_owned(),
        }))
    }
}

struct MemoryWriter {
    files: Rc<RefCell<Map<String, Vec<u8>>>>,
    name: String,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self.files.borrow_mut();
        let file = files
            .get_mut(&self.name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, self.name.clone()))?;
        file.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes generated sources below a root directory, one file per type.
#[derive(Debug)]
pub struct DirFiler {
    root: PathBuf,
    extension: String,
    created: Vec<PathBuf>,
}

impl DirFiler {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            created: vec![],
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The files created so far.
    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }
}

impl Filer for DirFiler {
    fn create_source_file(&mut self, name: &str) -> io::Result<Box<dyn Write + '_>> {
        let mut path = self.root.join(name.replace('.', "/"));
        path.set_extension(&self.extension);
        if self.created.contains(&path) {
            return Err(already_created(name));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&path)?;
        tracing::debug!("writing {}", path.display());
        self.created.push(path);
        Ok(Box::new(io::BufWriter::new(file)))
    }
}

fn already_created(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("Attempt to recreate a file for type {}", name),
    )
}
