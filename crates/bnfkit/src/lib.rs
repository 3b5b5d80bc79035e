//! Grammar-driven source generation for an in-progress compilation.
//!
//! The [`processor::Processor`] reads grammar files named by the host's
//! options, runs a [`compiler::GrammarCompiler`] over each of them and hands
//! every generated file back to the host. While generating, the grammar
//! compiler reflects on user-written helper classes through the
//! [`shim::Shim`], which answers those queries from the host's partially
//! resolved symbol table.

pub mod bnf;
pub mod compiler;
pub mod error;
pub mod host;
pub mod introspect;
pub mod options;
pub mod processor;
pub mod scratch;
pub mod shim;
pub mod symbols;
pub mod types;
pub mod util;

pub use crate::{
    error::{Error, ResolutionError},
    processor::Processor,
};
