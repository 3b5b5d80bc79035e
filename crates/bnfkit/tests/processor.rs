//! Orchestration behavior, independent of any real grammar format.

use anyhow::bail;
use bnfkit::{
    compiler::GrammarCompiler,
    error::ResolutionError,
    host::{Diagnostics, MemoryFiler},
    introspect::Introspection,
    options::{Options, LEXER_OPTION, PARSER_OPTION},
    processor::State,
    symbols::MemoryTable,
    Processor,
};
use std::{
    cell::{Cell, RefCell},
    env, fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

thread_local! {
    static OUTPUT_DIRS: RefCell<Vec<PathBuf>> = RefCell::new(vec![]);
    static INIT_FAILURES: Cell<u32> = Cell::new(0);
}

/// Each line of an input names a file to emit; `fail` aborts after emitting
/// the lines before it, `unresolved <name>` aborts with a resolution error,
/// and `invalid` as the first line rejects the document.
struct LineCompiler;

impl GrammarCompiler for LineCompiler {
    type Document = Vec<String>;

    const SOURCE_EXTENSION: &'static str = "java";

    fn init(_introspection: Box<dyn Introspection>) -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn parse(&self, path: &Path) -> io::Result<Option<Vec<String>>> {
        let lines: Vec<String> = fs::read_to_string(path)?
            .lines()
            .map(str::to_owned)
            .collect();
        if lines.first().map_or(false, |line| line == "invalid") {
            return Ok(None);
        }
        Ok(Some(lines))
    }

    fn generate(
        &self,
        document: &Vec<String>,
        source_dir: &Path,
        output_dir: &Path,
        options: &str,
    ) -> anyhow::Result<()> {
        assert!(source_dir.is_absolute());
        assert_eq!(options, "");
        OUTPUT_DIRS.with(|dirs| dirs.borrow_mut().push(output_dir.to_owned()));

        for line in document {
            if line == "fail" {
                bail!("generation aborted");
            }
            if let Some(type_name) = line.strip_prefix("unresolved ") {
                return Err(ResolutionError::EmptyCandidates {
                    type_name: type_name.to_owned(),
                }
                .into());
            }
            let path = output_dir.join(line);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, line.as_bytes())?;
        }
        Ok(())
    }
}

/// Fails to come up as long as `INIT_FAILURES` is non-zero.
struct FlakyCompiler(LineCompiler);

impl GrammarCompiler for FlakyCompiler {
    type Document = Vec<String>;

    const SOURCE_EXTENSION: &'static str = "java";

    fn init(introspection: Box<dyn Introspection>) -> anyhow::Result<Self> {
        let failures = INIT_FAILURES.with(Cell::get);
        if failures > 0 {
            INIT_FAILURES.with(|cell| cell.set(failures - 1));
            bail!("grammar compiler is unavailable");
        }
        LineCompiler::init(introspection).map(Self)
    }

    fn parse(&self, path: &Path) -> io::Result<Option<Vec<String>>> {
        self.0.parse(path)
    }

    fn generate(
        &self,
        document: &Vec<String>,
        source_dir: &Path,
        output_dir: &Path,
        options: &str,
    ) -> anyhow::Result<()> {
        self.0.generate(document, source_dir, output_dir, options)
    }
}

struct Inputs {
    dir: tempfile::TempDir,
}

impl Inputs {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn add(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }
}

fn options(parsers: &[PathBuf]) -> Options {
    let value = env::join_paths(parsers).unwrap().into_string().unwrap();
    [(PARSER_OPTION, value)].into_iter().collect()
}

fn processor(options: &Options) -> Processor<LineCompiler> {
    let mut processor = Processor::new();
    processor.init(options, Rc::new(MemoryTable::new())).unwrap();
    processor
}

#[test]
fn state_transitions() {
    let inputs = Inputs::new();
    let grammar = inputs.add("a.g", "org/example/A.java\n");

    let mut processor = Processor::<LineCompiler>::new();
    assert_eq!(processor.state(), State::Uninitialized);

    // rounds before init do nothing.
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);
    assert!(filer.names().is_empty());

    let options = options(&[grammar]);
    processor.init(&options, Rc::new(MemoryTable::new())).unwrap();
    assert_eq!(processor.state(), State::Idle);
    assert_eq!(processor.pending_parsers().count(), 1);

    processor.process(&mut filer, &mut diagnostics);
    assert_eq!(processor.state(), State::Idle);
    assert_eq!(processor.pending_parsers().count(), 0);
    assert_eq!(filer.names(), ["org.example.A"]);

    // a second round regenerates nothing, and re-initializing is ignored.
    processor.init(&options, Rc::new(MemoryTable::new())).unwrap();
    processor.process(&mut filer, &mut diagnostics);
    assert_eq!(filer.names().len(), 1);
    assert!(!diagnostics.has_errors());
}

#[test]
fn failed_init_can_be_retried() {
    INIT_FAILURES.with(|cell| cell.set(1));

    let inputs = Inputs::new();
    let grammar = inputs.add("a.g", "org/example/A.java\n");
    let options = options(&[grammar]);

    let mut processor = Processor::<FlakyCompiler>::new();
    let err = processor
        .init(&options, Rc::new(MemoryTable::new()))
        .unwrap_err();
    assert!(err.to_string().contains("unavailable"));
    assert_eq!(processor.state(), State::Uninitialized);
    assert_eq!(processor.pending_parsers().count(), 0);

    processor.init(&options, Rc::new(MemoryTable::new())).unwrap();
    assert_eq!(processor.state(), State::Idle);
    assert_eq!(processor.pending_parsers().count(), 1);

    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);
    assert!(!diagnostics.has_errors());
    assert_eq!(filer.names(), ["org.example.A"]);
}

#[test]
fn resolution_errors_are_reported_per_grammar() {
    let inputs = Inputs::new();
    let unresolved = inputs.add(
        "unresolved.g",
        "org/example/Partial.java\nunresolved Lang1Root\n",
    );
    let ok = inputs.add("ok.g", "org/example/Ok.java\n");

    let mut processor = processor(&options(&[unresolved.clone(), ok]));
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    let errors: Vec<_> = diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        format!(
            "{}: no candidate name for type `Lang1Root`",
            unresolved.display()
        )
    );
    assert!(!filer.contains("org.example.Partial"));
    assert_eq!(filer.names(), ["org.example.Ok"]);
    assert_eq!(processor.state(), State::Idle);
}

#[test]
fn failed_generation_promotes_nothing_and_continues() {
    let inputs = Inputs::new();
    let failing = inputs.add("failing.g", "org/example/Partial.java\nfail\n");
    let ok = inputs.add("ok.g", "org/example/Ok.java\norg/example/impl/OkImpl.java\n");

    let mut processor = processor(&options(&[failing, ok]));
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    let errors: Vec<_> = diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("failing.g"));
    assert!(errors[0].message.contains("generation aborted"));

    assert!(!filer.contains("org.example.Partial"));
    assert_eq!(filer.names(), ["org.example.Ok", "org.example.impl.OkImpl"]);
    assert_eq!(
        filer.source("org.example.impl.OkImpl").as_deref(),
        Some("org/example/impl/OkImpl.java")
    );
}

#[test]
fn rejected_documents_name_their_file() {
    let inputs = Inputs::new();
    let invalid = inputs.add("invalid.g", "invalid\n");

    let mut processor = processor(&options(&[invalid.clone()]));
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    let errors: Vec<_> = diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        format!("Invalid grammar file: {}", invalid.display())
    );
    assert!(filer.names().is_empty());
}

#[test]
fn every_grammar_gets_its_own_scratch_directory() {
    OUTPUT_DIRS.with(|dirs| dirs.borrow_mut().clear());

    let inputs = Inputs::new();
    let a = inputs.add("a.g", "A.java\n");
    let b = inputs.add("b.g", "B.java\nfail\n");
    let c = inputs.add("c.g", "C.java\n");

    let mut processor = processor(&options(&[a, b, c]));
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    let dirs = OUTPUT_DIRS.with(|dirs| dirs.borrow().clone());
    assert_eq!(dirs.len(), 3);
    assert_ne!(dirs[0], dirs[1]);
    assert_ne!(dirs[1], dirs[2]);
    for dir in &dirs {
        assert!(!dir.exists(), "{} was not removed", dir.display());
    }
    assert_eq!(filer.names(), ["A", "C"]);
}

#[test]
fn colliding_outputs_fail_only_the_later_grammar() {
    let inputs = Inputs::new();
    let first = inputs.add("first.g", "org/example/Shared.java\n");
    let second = inputs.add("second.g", "org/example/Shared.java\n");

    let mut processor = processor(&options(&[first, second]));
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    let errors: Vec<_> = diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("second.g"));
    assert_eq!(filer.names(), ["org.example.Shared"]);
}

#[test]
fn lexer_grammars_stay_queued() {
    let inputs = Inputs::new();
    let lexer = inputs.add("lang.flex", "Lexer.java\n");

    let options: Options = [(LEXER_OPTION, lexer.to_string_lossy().into_owned())]
        .into_iter()
        .collect();
    let mut processor = processor(&options);
    let mut filer = MemoryFiler::default();
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    assert!(filer.names().is_empty());
    assert_eq!(processor.pending_lexers().collect::<Vec<_>>(), [lexer.as_path()]);
    assert_eq!(
        Processor::<LineCompiler>::supported_options(),
        [LEXER_OPTION, PARSER_OPTION]
    );
}
