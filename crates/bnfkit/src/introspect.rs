//! The symbol introspection capability a grammar compiler relies on.
//!
//! A grammar may refer to user-written helper code ("call this existing
//! method when building this node"). The grammar compiler does not know the
//! host language's symbol table; it reflects on that code exclusively through
//! [`Introspection`].

use crate::{
    error::ResolutionError,
    symbols::{SymbolRef, SymbolTable},
};
use std::{fmt, hash, rc::Rc};

/// The marker for "any name" / "any type" in method queries.
pub const WILDCARD: &str = "*";

/// A symbol handed to the grammar compiler, or `None` for "unknown".
///
/// The wrapper keeps the table it came from so that it can navigate to its
/// enclosing declaration.
#[derive(Clone)]
pub struct NavigableSymbol {
    symbol: Option<SymbolRef>,
    table: Rc<dyn SymbolTable>,
}

impl NavigableSymbol {
    pub fn new(symbol: Option<SymbolRef>, table: Rc<dyn SymbolTable>) -> Self {
        Self { symbol, table }
    }

    pub fn symbol(&self) -> Option<SymbolRef> {
        self.symbol
    }

    /// The enclosing declaration, wrapped again.
    ///
    /// The parent of an unknown symbol is unknown, as is the parent of a
    /// top-level scope.
    pub fn parent(&self) -> NavigableSymbol {
        let parent = self.symbol.and_then(|symbol| self.table.enclosing(symbol));
        Self::new(parent, self.table.clone())
    }
}

impl PartialEq for NavigableSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for NavigableSymbol {}

impl hash::Hash for NavigableSymbol {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.symbol.hash(state)
    }
}

impl fmt::Debug for NavigableSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NavigableSymbol").field(&self.symbol).finish()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Instance,
    Static,
}

/// A literal name, or [`WILDCARD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Any,
    Named(String),
}

impl Pattern {
    pub fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Named(expected) => expected == name,
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        if s == WILDCARD {
            Self::Any
        } else {
            Self::Named(s.to_owned())
        }
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        if s == WILDCARD {
            Self::Any
        } else {
            Self::Named(s)
        }
    }
}

/// A filter over the members of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodQuery {
    pub kind: MethodKind,
    /// `None` when the grammar did not name a method at all.
    pub name: Option<Pattern>,
    /// The number of arguments the call site passes, or `None` for any.
    pub param_count: Option<usize>,
    /// Patterns for the leading parameters, by position.
    pub param_types: Vec<Pattern>,
}

impl MethodQuery {
    pub fn new(kind: MethodKind, name: Option<&str>) -> Self {
        Self {
            kind,
            name: name.map(Pattern::from),
            param_count: None,
            param_types: vec![],
        }
    }

    pub fn param_count(mut self, count: usize) -> Self {
        self.param_count = Some(count);
        self
    }

    pub fn param_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Pattern>,
    {
        self.param_types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// A generic parameter of a method together with its resolved bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameterInfo {
    pub name: String,
    pub extends_list: Vec<String>,
}

impl fmt::Display for TypeParameterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, bound) in self.extends_list.iter().enumerate() {
            f.write_str(if i == 0 { " extends " } else { " & " })?;
            f.write_str(bound)?;
        }
        Ok(())
    }
}

/// Reflection over user code, as required by a grammar compiler.
pub trait Introspection {
    /// Whether a type or executable is declared public.
    fn is_public(&self, element: Option<&NavigableSymbol>) -> bool;

    /// `None` means the class does not exist (yet).
    fn find_class(&self, class_name: Option<&str>) -> Option<NavigableSymbol>;

    /// Members of `class_name`, including inherited ones, matching `query`.
    fn find_methods(&self, class_name: Option<&str>, query: &MethodQuery) -> Vec<NavigableSymbol>;

    fn super_class_name(&self, class_name: Option<&str>) -> Result<Option<String>, ResolutionError>;

    /// `[return type, param type 1, param name 1, ...]`.
    fn signature(&self, method: Option<&NavigableSymbol>) -> Result<Vec<String>, ResolutionError>;

    fn generic_parameters(
        &self,
        method: Option<&NavigableSymbol>,
    ) -> Result<Vec<TypeParameterInfo>, ResolutionError>;

    fn thrown_types(&self, method: Option<&NavigableSymbol>) -> Result<Vec<String>, ResolutionError>;

    /// The qualified name of the class declaring `method`, empty if unknown.
    fn declaring_class(&self, method: Option<&NavigableSymbol>) -> String;

    fn annotations(&self, element: Option<&NavigableSymbol>) -> Vec<String>;

    fn parameter_annotations(&self, method: Option<&NavigableSymbol>, index: usize) -> Vec<String>;

    fn class_references(&self, element: &str) -> Vec<String>;

    fn find_package(&self, package_name: Option<&str>) -> Option<NavigableSymbol>;
}
