//! Processor options supplied by the host.

use crate::types::Map;
use std::{env, path::PathBuf};

/// The option listing grammars to generate parsers from.
pub const PARSER_OPTION: &str = "parser";

/// The option listing lexer grammars.
pub const LEXER_OPTION: &str = "lexer";

/// Key/value options, as passed with `-Akey=value`.
#[derive(Debug, Default, Clone)]
pub struct Options {
    values: Map<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Parse a `key=value` argument. A bare `key` maps to an empty value.
    pub fn parse_arg(&mut self, arg: &str) -> &mut Self {
        let arg = arg.strip_prefix("-A").unwrap_or(arg);
        match arg.split_once('=') {
            Some((name, value)) => self.set(name, value),
            None => self.set(arg, ""),
        }
    }

    /// The paths listed in the option `name`.
    ///
    /// Entries are separated by the platform's path-list separator; blank
    /// entries are dropped and an absent option yields no paths.
    pub fn paths(&self, name: &str) -> Vec<PathBuf> {
        let Some(value) = self.get(name) else {
            return vec![];
        };
        env::split_paths(value)
            .filter(|path| !path.to_string_lossy().trim().is_empty())
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Options
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (name, value) in iter {
            options.set(name, value);
        }
        options
    }
}
