//! The contract between the processor and a grammar compiler.

use crate::introspect::Introspection;
use std::{io, path::Path};

/// A compiler turning grammar files into source files.
///
/// The processor brings it up once per build, injecting the introspection
/// backend it must use for every reflective query about user code.
pub trait GrammarCompiler: Sized {
    /// A successfully parsed grammar file.
    type Document;

    /// The extension of the generated source files, without the dot.
    const SOURCE_EXTENSION: &'static str;

    fn init(introspection: Box<dyn Introspection>) -> anyhow::Result<Self>;

    /// Parse a grammar file. `Ok(None)` means the file is not a valid
    /// grammar document.
    fn parse(&self, path: &Path) -> io::Result<Option<Self::Document>>;

    /// Generate sources for `document` below `output_dir`, one file per
    /// type, laid out by package.
    fn generate(
        &self,
        document: &Self::Document,
        source_dir: &Path,
        output_dir: &Path,
        options: &str,
    ) -> anyhow::Result<()>;
}
