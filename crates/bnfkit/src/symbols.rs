//! The host compiler's symbol model, as seen by the generator.
//!
//! Symbols are never owned here: a [`SymbolRef`] is a handle into the host's
//! table and every declaration is borrowed from it for the duration of one
//! query.

pub mod memory;

use std::fmt;

pub use self::memory::MemoryTable;

/// The identifier of the root object type.
pub const ROOT_TYPE: &str = "java.lang.Object";

/// A handle into the host's symbol table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolRef {
    raw: u32,
}

impl SymbolRef {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }
}

bitflags::bitflags! {
    /// Declaration modifiers relevant to introspection.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const ABSTRACT = 1 << 4;
        const FINAL = 1 << 5;
    }
}

/// A reference to a type as it appears in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A type the host has bound, in its canonical textual form
    /// (e.g. `java.util.List<java.time.LocalDate>` or `int`).
    Resolved(String),

    /// A placeholder for a type the host could not bind in this round.
    Unresolved(UnresolvedTypeName),
}

impl TypeRef {
    pub fn resolved(name: impl Into<String>) -> Self {
        Self::Resolved(name.into())
    }

    pub fn unresolved(literal: impl Into<String>) -> Self {
        Self::Unresolved(UnresolvedTypeName::new(literal))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(..))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(name) => f.write_str(name),
            Self::Unresolved(name) => f.write_str(name.literal()),
        }
    }
}

/// The literal, dot-separated text of a type reference the host parser saw
/// but could not bind to a declaration yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedTypeName {
    literal: String,
}

impl UnresolvedTypeName {
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Split the literal at its first `.` into the root segment and the
    /// optional remainder.
    pub fn root_and_remainder(&self) -> (&str, Option<&str>) {
        match self.literal.split_once('.') {
            Some((root, remainder)) => (root, Some(remainder)),
            None => (&self.literal, None),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    AnnotationType,
}

/// A declared class, interface, enum, record or annotation type.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub qualified_name: String,
    pub modifiers: Modifiers,
    /// `None` for interfaces, annotation types and the root type itself.
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let superclass = match kind {
            TypeKind::Interface | TypeKind::AnnotationType => None,
            _ if qualified_name == ROOT_TYPE => None,
            TypeKind::Enum => Some(TypeRef::resolved(format!(
                "java.lang.Enum<{}>",
                qualified_name
            ))),
            TypeKind::Record => Some(TypeRef::resolved("java.lang.Record")),
            TypeKind::Class => Some(TypeRef::resolved(ROOT_TYPE)),
        };
        Self {
            kind,
            qualified_name,
            modifiers: Modifiers::empty(),
            superclass,
            interfaces: vec![],
        }
    }

    pub fn class(qualified_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, qualified_name)
    }

    pub fn interface(qualified_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, qualified_name)
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn extends(mut self, superclass: Option<TypeRef>) -> Self {
        self.superclass = superclass;
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn simple_name(&self) -> &str {
        crate::util::split_qualified(&self.qualified_name).1
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutableKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

/// A method or constructor.
#[derive(Debug, Clone)]
pub struct ExecutableDecl {
    pub kind: ExecutableKind,
    pub name: String,
    pub modifiers: Modifiers,
    pub return_type: TypeRef,
    pub parameters: Vec<Parameter>,
    /// Whether the last parameter collects variadic arguments.
    pub varargs: bool,
    pub type_parameters: Vec<SymbolRef>,
    pub thrown_types: Vec<TypeRef>,
}

impl ExecutableDecl {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            kind: ExecutableKind::Method,
            name: name.into(),
            modifiers: Modifiers::empty(),
            return_type: TypeRef::resolved("void"),
            parameters: vec![],
            varargs: false,
            type_parameters: vec![],
            thrown_types: vec![],
        }
    }

    pub fn constructor() -> Self {
        Self {
            kind: ExecutableKind::Constructor,
            name: "<init>".into(),
            ..Self::method("")
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn varargs(mut self, varargs: bool) -> Self {
        self.varargs = varargs;
        self
    }

    pub fn throws(mut self, ty: TypeRef) -> Self {
        self.thrown_types.push(ty);
        self
    }
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct TypeParameterDecl {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

/// A borrowed view of one symbol, tagged by its kind.
#[derive(Debug, Copy, Clone)]
pub enum Symbol<'a> {
    Type(&'a TypeDecl),
    Executable(&'a ExecutableDecl),
    Variable(&'a VariableDecl),
    TypeParameter(&'a TypeParameterDecl),
    Package(&'a str),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The qualified identifier, `a.b.*` for wildcard imports.
    pub name: String,
    pub is_static: bool,
}

impl Import {
    pub fn is_wildcard(&self) -> bool {
        self.name.ends_with(".*")
    }
}

/// The lexical context of a source file: its package and import list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: String,
    pub imports: Vec<Import>,
}

impl CompilationUnit {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            imports: vec![],
        }
    }

    pub fn import(mut self, name: impl Into<String>) -> Self {
        self.imports.push(Import {
            name: name.into(),
            is_static: false,
        });
        self
    }

    pub fn import_static(mut self, name: impl Into<String>) -> Self {
        self.imports.push(Import {
            name: name.into(),
            is_static: true,
        });
        self
    }

    /// Non-static imports whose qualified identifier ends with `.{name}`.
    pub fn imports_ending_with<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.imports
            .iter()
            .filter(|import| !import.is_static)
            .map(|import| import.name.as_str())
            .filter(move |import| {
                import
                    .strip_suffix(name)
                    .map_or(false, |prefix| prefix.ends_with('.'))
            })
    }
}

/// The host compiler's live, partially resolved symbol table.
///
/// It is queried by name and by handle, never enumerated wholesale.
pub trait SymbolTable {
    /// Look up a top-level or nested type by its exact qualified name.
    fn type_element(&self, qualified_name: &str) -> Option<SymbolRef>;

    fn symbol(&self, symbol: SymbolRef) -> Symbol<'_>;

    /// The lexically enclosing symbol, `None` at the top-level scope.
    fn enclosing(&self, symbol: SymbolRef) -> Option<SymbolRef>;

    /// Every member of a type, including inherited ones.
    fn all_members(&self, ty: SymbolRef) -> Vec<SymbolRef>;

    /// The compilation unit a source symbol was declared in.
    fn compilation_unit(&self, symbol: SymbolRef) -> Option<&CompilationUnit>;

    /// Whether a value of the declared type `from` can be assigned to `to`.
    fn is_assignable(&self, from: SymbolRef, to: &TypeRef) -> bool;
}

impl<T: ?Sized> SymbolTable for &T
where
    T: SymbolTable,
{
    fn type_element(&self, qualified_name: &str) -> Option<SymbolRef> {
        (**self).type_element(qualified_name)
    }

    fn symbol(&self, symbol: SymbolRef) -> Symbol<'_> {
        (**self).symbol(symbol)
    }

    fn enclosing(&self, symbol: SymbolRef) -> Option<SymbolRef> {
        (**self).enclosing(symbol)
    }

    fn all_members(&self, ty: SymbolRef) -> Vec<SymbolRef> {
        (**self).all_members(ty)
    }

    fn compilation_unit(&self, symbol: SymbolRef) -> Option<&CompilationUnit> {
        (**self).compilation_unit(symbol)
    }

    fn is_assignable(&self, from: SymbolRef, to: &TypeRef) -> bool {
        (**self).is_assignable(from, to)
    }
}
