//! A reference grammar compiler for Grammar-Kit style BNF files.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod names;
pub mod parser;

use self::{ast::GrammarFile, codegen::Codegen};
use crate::{compiler::GrammarCompiler, introspect::Introspection};
use anyhow::Context as _;
use std::{fs, io, path::Path};

#[derive(Debug, thiserror::Error)]
#[error("syntax error at offset {offset}: {message}")]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Parse the contents of a grammar file.
pub fn parse(source: &str) -> Result<GrammarFile, SyntaxError> {
    let _span = tracing::trace_span!("parse_grammar").entered();
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(source, &tokens).parse_file()
}

pub struct BnfCompiler {
    introspection: Box<dyn Introspection>,
}

impl GrammarCompiler for BnfCompiler {
    type Document = GrammarFile;

    const SOURCE_EXTENSION: &'static str = "java";

    fn init(introspection: Box<dyn Introspection>) -> anyhow::Result<Self> {
        Ok(Self { introspection })
    }

    fn parse(&self, path: &Path) -> io::Result<Option<GrammarFile>> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                tracing::debug!("{}: {}", path.display(), err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        match parse(&source) {
            Ok(grammar) => Ok(Some(grammar)),
            Err(err) => {
                tracing::debug!("{}: {}", path.display(), err);
                Ok(None)
            }
        }
    }

    fn generate(
        &self,
        document: &GrammarFile,
        source_dir: &Path,
        output_dir: &Path,
        _options: &str,
    ) -> anyhow::Result<()> {
        tracing::trace!("generating from {}", source_dir.display());
        let files = Codegen::new(document, &*self.introspection).generate()?;
        for file in files {
            let path = output_dir.join(file.relative_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, file.contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    }
}
