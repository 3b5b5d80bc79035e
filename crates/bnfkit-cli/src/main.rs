use anyhow::Context as _;
use bnfkit::{
    bnf::BnfCompiler,
    host::{DirFiler, Diagnostics},
    options::{Options, LEXER_OPTION, PARSER_OPTION},
    symbols::MemoryTable,
    Processor,
};
use clap::Parser;
use std::{fs, path::PathBuf, rc::Rc};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grammar files to generate parsers from, separated by the platform's
    /// path-list separator.
    #[arg(long)]
    parser: Option<String>,

    /// Lexer grammar files.
    #[arg(long)]
    lexer: Option<String>,

    /// The directory receiving the generated sources.
    #[arg(long, default_value = "generated")]
    out_dir: PathBuf,

    /// Additional processor options, as `key=value`.
    #[arg(short = 'A', value_name = "KEY=VALUE")]
    options: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let mut options = Options::new();
    for arg in &args.options {
        options.parse_arg(arg);
    }
    if let Some(parser) = &args.parser {
        options.set(PARSER_OPTION, parser.as_str());
    }
    if let Some(lexer) = &args.lexer {
        options.set(LEXER_OPTION, lexer.as_str());
    }

    fs::create_dir_all(&args.out_dir).with_context(|| {
        anyhow::anyhow!("failed to create the output directory {}", args.out_dir.display())
    })?;

    let mut processor = Processor::<BnfCompiler>::new();
    processor
        .init(&options, Rc::new(MemoryTable::new()))
        .context("failed to initialize the grammar compiler")?;

    let mut filer = DirFiler::new(&args.out_dir, "java");
    let mut diagnostics = Diagnostics::default();
    processor.process(&mut filer, &mut diagnostics);

    for diagnostic in diagnostics.iter() {
        eprintln!("[{}] {}", diagnostic.kind, diagnostic.message);
    }
    for path in filer.created() {
        println!("{}", path.display());
    }

    if diagnostics.has_errors() {
        anyhow::bail!("grammar generation failed");
    }
    Ok(())
}
