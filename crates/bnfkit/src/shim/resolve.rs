//! Qualified-name reconstruction for types the host has not bound yet.
//!
//! Generation runs in the middle of a compilation, so a helper class may
//! refer to types declared in the very same batch (or about to be generated).
//! The host reports those as placeholders carrying only their literal text.
//! The candidates produced here are rebuilt from the import list and package
//! of the compilation unit the reference appears in.

use crate::{
    error::ResolutionError,
    symbols::{SymbolRef, SymbolTable, TypeRef, UnresolvedTypeName},
};

/// The ordered guesses for the qualified name of a type.
///
/// The first name is the canonical guess, later ones are the remaining
/// ambiguity (typically introduced by wildcard imports). Each matching
/// import contributes its own entry, so repeated imports repeat a name.
#[derive(Debug, Clone)]
pub struct CandidateNameSet {
    names: Vec<String>,
}

impl CandidateNameSet {
    fn singleton(name: String) -> Self {
        Self {
            names: vec![name],
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl FromIterator<String> for CandidateNameSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Compute the candidate names of `ty` as referenced from `context`.
pub fn resolve(table: &dyn SymbolTable, context: SymbolRef, ty: &TypeRef) -> CandidateNameSet {
    match ty {
        TypeRef::Resolved(name) => CandidateNameSet::singleton(name.clone()),
        TypeRef::Unresolved(name) => resolve_unresolved(table, context, name),
    }
}

/// The canonical guess for `ty`.
pub fn resolve_first(
    table: &dyn SymbolTable,
    context: SymbolRef,
    ty: &TypeRef,
) -> Result<String, ResolutionError> {
    resolve(table, context, ty)
        .first()
        .map(str::to_owned)
        .ok_or_else(|| ResolutionError::EmptyCandidates {
            type_name: ty.to_string(),
        })
}

fn resolve_unresolved(
    table: &dyn SymbolTable,
    context: SymbolRef,
    name: &UnresolvedTypeName,
) -> CandidateNameSet {
    let literal = name.literal();
    let (root, remainder) = name.root_and_remainder();
    let unit = table.compilation_unit(context);

    let specific: Vec<&str> = unit
        .map(|unit| unit.imports_ending_with(root).collect())
        .unwrap_or_default();

    let candidates: CandidateNameSet = if !specific.is_empty() {
        match remainder {
            Some(remainder) => specific
                .iter()
                .map(|import| format!("{}.{}", import, remainder))
                .collect(),
            None => specific.iter().map(|&import| import.to_owned()).collect(),
        }
    } else {
        let mut names = vec![literal.to_owned()];
        if let Some(unit) = unit {
            if !unit.package.is_empty() {
                names.push(format!("{}.{}", unit.package, literal));
            }
            names.extend(
                unit.imports
                    .iter()
                    .filter(|import| !import.is_static && import.is_wildcard())
                    .map(|import| format!("{}.{}", import.name.trim_end_matches(".*"), literal)),
            );
        }
        names.into_iter().collect()
    };

    tracing::trace!(
        "resolved placeholder `{}` to {:?}",
        literal,
        candidates.iter().collect::<Vec<_>>()
    );
    candidates
}
