//! Drives grammar compilation across the rounds of a host compilation.

use crate::{
    compiler::GrammarCompiler,
    error::{Error, ResolutionError},
    host::{Diagnostic, Filer, Messager},
    options::{Options, LEXER_OPTION, PARSER_OPTION},
    scratch::{self, ScratchDir},
    shim::Shim,
    symbols::SymbolTable,
    types::Queue,
};
use std::{
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Initializing,
    Draining,
    Idle,
}

/// The per-build generation driver.
///
/// `init` must be called once, before the first round, by a single caller.
/// Each call to `process` then drains the grammar queue; a grammar is
/// dequeued exactly once, so later rounds do not regenerate it.
#[derive(Debug)]
pub struct Processor<C> {
    state: State,
    lexers: Queue<PathBuf>,
    parsers: Queue<PathBuf>,
    compiler: Option<C>,
}

impl<C> Default for Processor<C> {
    fn default() -> Self {
        Self {
            state: State::Uninitialized,
            lexers: Queue::default(),
            parsers: Queue::default(),
            compiler: None,
        }
    }
}

impl<C> Processor<C>
where
    C: GrammarCompiler,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supported_options() -> &'static [&'static str] {
        &[LEXER_OPTION, PARSER_OPTION]
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pending_parsers(&self) -> impl Iterator<Item = &Path> + '_ {
        self.parsers.iter().map(PathBuf::as_path)
    }

    /// Lexer grammars are queued but not generated yet.
    pub fn pending_lexers(&self) -> impl Iterator<Item = &Path> + '_ {
        self.lexers.iter().map(PathBuf::as_path)
    }

    /// Queue the configured grammars and bring up the grammar compiler with
    /// the symbol table of this build installed as its introspection backend.
    pub fn init(&mut self, options: &Options, symbols: Rc<dyn SymbolTable>) -> anyhow::Result<()> {
        match self.state {
            State::Uninitialized => {}
            State::Initializing => anyhow::bail!("processor initialization is already in progress"),
            State::Draining | State::Idle => {
                tracing::warn!("processor is already initialized");
                return Ok(());
            }
        }
        self.state = State::Initializing;

        // grammars are queued only once the compiler is up.
        let compiler = match C::init(Box::new(Shim::new(symbols))) {
            Ok(compiler) => compiler,
            Err(err) => {
                self.state = State::Uninitialized;
                return Err(err);
            }
        };

        self.lexers.extend(options.paths(LEXER_OPTION));
        self.parsers.extend(options.paths(PARSER_OPTION));
        tracing::debug!(
            "queued {} parser grammar(s), {} lexer grammar(s)",
            self.parsers.len(),
            self.lexers.len()
        );

        self.compiler = Some(compiler);
        self.state = State::Idle;
        Ok(())
    }

    /// Run one round: generate every queued parser grammar.
    ///
    /// Failures are reported through `messager` and skip only the grammar
    /// they occurred in.
    pub fn process(&mut self, filer: &mut dyn Filer, messager: &mut dyn Messager) {
        let Some(compiler) = &self.compiler else {
            tracing::warn!("process called before init");
            return;
        };
        self.state = State::Draining;

        while let Some(source) = self.parsers.pop() {
            let span = tracing::debug_span!("grammar", path = %source.display());
            let _entered = span.enter();

            if let Err(err) = process_file(compiler, &source, filer) {
                tracing::debug!("skipping grammar: {}", err);
                let message = match &err {
                    Error::InvalidGrammarDocument(..) => err.to_string(),
                    _ => format!("{}: {}", source.display(), err),
                };
                messager.report(Diagnostic::error(message));
            }
        }

        if !self.lexers.is_empty() {
            tracing::debug!("{} lexer grammar(s) left unprocessed", self.lexers.len());
        }
        self.state = State::Idle;
    }
}

fn process_file<C>(compiler: &C, source: &Path, filer: &mut dyn Filer) -> Result<(), Error>
where
    C: GrammarCompiler,
{
    let scratch = ScratchDir::new()?;
    let result = generate_into(compiler, source, &scratch, filer);
    scratch::release(scratch, result)
}

fn generate_into<C>(
    compiler: &C,
    source: &Path,
    scratch: &ScratchDir,
    filer: &mut dyn Filer,
) -> Result<(), Error>
where
    C: GrammarCompiler,
{
    let document = compiler
        .parse(source)?
        .ok_or_else(|| Error::InvalidGrammarDocument(source.to_owned()))?;

    let source_dir = match source.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let source_dir = if source_dir.is_absolute() {
        source_dir
    } else {
        env::current_dir()?.join(source_dir)
    };
    compiler
        .generate(&document, &source_dir, scratch.path(), "")
        .map_err(|err| match err.downcast::<ResolutionError>() {
            Ok(err) => Error::Resolution(err),
            Err(err) => Error::Generate(err),
        })?;

    // read everything first so that a broken output is not promoted halfway.
    let mut generated = vec![];
    for file in scratch.files() {
        let file = file?;
        let relative = file
            .strip_prefix(scratch.path())
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let name = output_name(relative, C::SOURCE_EXTENSION);
        generated.push((name, fs::read(&file)?));
    }

    for (name, content) in generated {
        tracing::debug!("promoting {}", name);
        let mut output = filer.create_source_file(&name)?;
        output.write_all(&content)?;
        output.flush()?;
    }
    Ok(())
}

/// The qualified identifier of a generated file, from its path relative to
/// the output directory.
pub fn output_name(relative: &Path, extension: &str) -> String {
    let path = relative.to_string_lossy();
    let suffix = format!(".{}", extension);
    let path = path.strip_suffix(suffix.as_str()).unwrap_or(&path);
    path.replace(['/', '\\'], ".")
}
