//! An in-memory symbol table.

use super::{
    CompilationUnit, ExecutableDecl, ExecutableKind, Modifiers, Symbol, SymbolRef, SymbolTable,
    TypeDecl, TypeParameterDecl, TypeRef, VariableDecl,
};
use crate::types::{Map, Set};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct UnitID {
    raw: u32,
}

#[derive(Debug)]
enum Decl {
    Type(TypeDecl),
    Executable(ExecutableDecl),
    Variable(VariableDecl),
    TypeParameter(TypeParameterDecl),
    Package(String),
}

#[derive(Debug)]
struct Entry {
    decl: Decl,
    enclosing: Option<SymbolRef>,
    unit: Option<UnitID>,
    members: Vec<SymbolRef>,
}

/// A [`SymbolTable`] built up front through a small declaration API.
///
/// Top-level types are enclosed by a package symbol, nested declarations by
/// the type they are declared in.
#[derive(Debug, Default)]
pub struct MemoryTable {
    entries: Vec<Entry>,
    units: Vec<CompilationUnit>,
    types: Map<String, SymbolRef>,
    packages: Map<String, SymbolRef>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: CompilationUnit) -> UnitID {
        let id = UnitID {
            raw: self.units.len() as u32,
        };
        self.units.push(unit);
        id
    }

    /// Declare a top-level type in the compilation unit `unit`.
    pub fn add_type(&mut self, unit: UnitID, decl: TypeDecl) -> SymbolRef {
        let package = self.units[unit.raw as usize].package.clone();
        let package = self.package(&package);
        let name = decl.qualified_name.clone();
        let id = self.push(Decl::Type(decl), Some(package), Some(unit));
        self.types.insert(name, id);
        id
    }

    /// Declare a type nested in `outer`.
    pub fn add_nested_type(&mut self, outer: SymbolRef, decl: TypeDecl) -> SymbolRef {
        let name = decl.qualified_name.clone();
        let id = self.push_member(outer, Decl::Type(decl));
        self.types.insert(name, id);
        id
    }

    pub fn add_executable(&mut self, owner: SymbolRef, decl: ExecutableDecl) -> SymbolRef {
        self.push_member(owner, Decl::Executable(decl))
    }

    pub fn add_field(
        &mut self,
        owner: SymbolRef,
        name: impl Into<String>,
        modifiers: Modifiers,
        ty: TypeRef,
    ) -> SymbolRef {
        let decl = VariableDecl {
            name: name.into(),
            modifiers,
            ty,
        };
        self.push_member(owner, Decl::Variable(decl))
    }

    /// Declare a type parameter on the executable `owner`.
    pub fn add_type_parameter(
        &mut self,
        owner: SymbolRef,
        name: impl Into<String>,
        bounds: Vec<TypeRef>,
    ) -> SymbolRef {
        let unit = self.entries[owner.into_raw() as usize].unit;
        let decl = TypeParameterDecl {
            name: name.into(),
            bounds,
        };
        let id = self.push(Decl::TypeParameter(decl), Some(owner), unit);
        if let Decl::Executable(exec) = &mut self.entries[owner.into_raw() as usize].decl {
            exec.type_parameters.push(id);
        }
        id
    }

    fn package(&mut self, name: &str) -> SymbolRef {
        if let Some(&id) = self.packages.get(name) {
            return id;
        }
        let id = self.push(Decl::Package(name.to_owned()), None, None);
        self.packages.insert(name.to_owned(), id);
        id
    }

    fn push_member(&mut self, owner: SymbolRef, decl: Decl) -> SymbolRef {
        let unit = self.entries[owner.into_raw() as usize].unit;
        let id = self.push(decl, Some(owner), unit);
        self.entries[owner.into_raw() as usize].members.push(id);
        id
    }

    fn push(&mut self, decl: Decl, enclosing: Option<SymbolRef>, unit: Option<UnitID>) -> SymbolRef {
        let id = SymbolRef::from_raw(self.entries.len() as u32);
        self.entries.push(Entry {
            decl,
            enclosing,
            unit,
            members: vec![],
        });
        id
    }

    fn entry(&self, symbol: SymbolRef) -> Option<&Entry> {
        self.entries.get(symbol.into_raw() as usize)
    }

    fn type_decl(&self, symbol: SymbolRef) -> Option<&TypeDecl> {
        match self.entry(symbol).map(|entry| &entry.decl) {
            Some(Decl::Type(decl)) => Some(decl),
            _ => None,
        }
    }

    /// The declared supertypes of `ty` which are known to this table.
    fn supertypes(&self, ty: SymbolRef) -> impl Iterator<Item = SymbolRef> + '_ {
        self.type_decl(ty)
            .into_iter()
            .flat_map(|decl| decl.superclass.iter().chain(&decl.interfaces))
            .filter_map(|super_ty| match super_ty {
                TypeRef::Resolved(name) => self.types.get(erasure(name)).copied(),
                TypeRef::Unresolved(..) => None,
            })
    }
}

/// Strip generic arguments from a canonical type name.
fn erasure(name: &str) -> &str {
    name.split_once('<').map_or(name, |(raw, _)| raw)
}

impl SymbolTable for MemoryTable {
    fn type_element(&self, qualified_name: &str) -> Option<SymbolRef> {
        self.types.get(qualified_name).copied()
    }

    fn symbol(&self, symbol: SymbolRef) -> Symbol<'_> {
        match self.entry(symbol).map(|entry| &entry.decl) {
            Some(Decl::Type(decl)) => Symbol::Type(decl),
            Some(Decl::Executable(decl)) => Symbol::Executable(decl),
            Some(Decl::Variable(decl)) => Symbol::Variable(decl),
            Some(Decl::TypeParameter(decl)) => Symbol::TypeParameter(decl),
            Some(Decl::Package(name)) => Symbol::Package(name),
            None => Symbol::Other,
        }
    }

    fn enclosing(&self, symbol: SymbolRef) -> Option<SymbolRef> {
        self.entry(symbol)?.enclosing
    }

    fn all_members(&self, ty: SymbolRef) -> Vec<SymbolRef> {
        let mut members = Set::default();
        // overridden methods are reported once, from the most derived type.
        let mut signatures: Set<(&str, Vec<&TypeRef>)> = Set::default();
        let mut visited = Set::default();
        let mut stack = vec![ty];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(entry) = self.entry(current) else {
                continue;
            };
            for &member in &entry.members {
                let decl = &self.entries[member.into_raw() as usize].decl;
                let inherited = current != ty;
                if inherited && !is_inheritable(decl) {
                    continue;
                }
                if let Decl::Executable(exec) = decl {
                    if exec.kind != ExecutableKind::Constructor {
                        let signature = (
                            exec.name.as_str(),
                            exec.parameters.iter().map(|param| &param.ty).collect(),
                        );
                        if !signatures.insert(signature) && inherited {
                            continue;
                        }
                    }
                }
                members.insert(member);
            }
            let supertypes: Vec<_> = self.supertypes(current).collect();
            stack.extend(supertypes.into_iter().rev());
        }
        members.into_iter().collect()
    }

    fn compilation_unit(&self, symbol: SymbolRef) -> Option<&CompilationUnit> {
        let unit = self.entry(symbol)?.unit?;
        self.units.get(unit.raw as usize)
    }

    fn is_assignable(&self, from: SymbolRef, to: &TypeRef) -> bool {
        let target = match to {
            TypeRef::Resolved(name) => erasure(name),
            TypeRef::Unresolved(..) => return false,
        };
        let mut visited = Set::default();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            match self.type_decl(current) {
                Some(decl) if decl.qualified_name == target => return true,
                Some(..) => stack.extend(self.supertypes(current)),
                None => {}
            }
        }
        // every reference type widens to the root type.
        target == super::ROOT_TYPE && self.type_decl(from).is_some()
    }
}

fn is_inheritable(decl: &Decl) -> bool {
    match decl {
        Decl::Executable(exec) => {
            exec.kind != ExecutableKind::Constructor && !exec.modifiers.contains(Modifiers::PRIVATE)
        }
        Decl::Variable(var) => !var.modifiers.contains(Modifiers::PRIVATE),
        Decl::Type(ty) => !ty.modifiers.contains(Modifiers::PRIVATE),
        Decl::TypeParameter(..) | Decl::Package(..) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> (MemoryTable, SymbolRef, SymbolRef) {
        let mut table = MemoryTable::new();
        let unit = table.add_unit(CompilationUnit::new("org.example"));
        let base = table.add_type(
            unit,
            TypeDecl::class("org.example.Base").modifiers(Modifiers::PUBLIC),
        );
        table.add_executable(base, ExecutableDecl::constructor());
        table.add_executable(
            base,
            ExecutableDecl::method("inherited").modifiers(Modifiers::PUBLIC),
        );
        table.add_executable(
            base,
            ExecutableDecl::method("hidden").modifiers(Modifiers::PRIVATE),
        );
        let derived = table.add_type(
            unit,
            TypeDecl::class("org.example.Derived")
                .extends(Some(TypeRef::resolved("org.example.Base")))
                .implements(TypeRef::resolved("java.lang.Comparable<org.example.Derived>")),
        );
        table.add_executable(derived, ExecutableDecl::constructor());
        table.add_executable(derived, ExecutableDecl::method("own"));
        (table, base, derived)
    }

    fn member_names(table: &MemoryTable, ty: SymbolRef) -> Vec<String> {
        table
            .all_members(ty)
            .into_iter()
            .filter_map(|member| match table.symbol(member) {
                Symbol::Executable(exec) => Some(exec.name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn all_members_include_inheritable_supertype_members() {
        let (table, _, derived) = hierarchy();
        assert_eq!(member_names(&table, derived), ["<init>", "own", "inherited"]);
    }

    #[test]
    fn overridden_methods_are_reported_once() {
        let (mut table, _, derived) = hierarchy();
        let param = || TypeRef::resolved("java.lang.String");
        table.add_executable(
            derived,
            ExecutableDecl::method("inherited").modifiers(Modifiers::PUBLIC),
        );
        table.add_executable(derived, ExecutableDecl::method("own").param("s", param()));
        assert_eq!(
            member_names(&table, derived),
            ["<init>", "own", "inherited", "own"]
        );

        let members = table.all_members(derived);
        let inherited: Vec<_> = members
            .iter()
            .filter(|&&member| matches!(table.symbol(member), Symbol::Executable(exec) if exec.name == "inherited"))
            .collect();
        assert_eq!(inherited.len(), 1);
        assert_eq!(table.enclosing(*inherited[0]), Some(derived));
    }

    #[test]
    fn top_level_types_are_enclosed_by_their_package() {
        let (table, base, _) = hierarchy();
        let package = table.enclosing(base).unwrap();
        assert!(matches!(table.symbol(package), Symbol::Package("org.example")));
        assert_eq!(table.enclosing(package), None);
    }

    #[test]
    fn subtyping_follows_declared_supertypes() {
        let (table, base, derived) = hierarchy();
        assert!(table.is_assignable(derived, &TypeRef::resolved("org.example.Base")));
        assert!(table.is_assignable(derived, &TypeRef::resolved("org.example.Derived")));
        assert!(table.is_assignable(base, &TypeRef::resolved("java.lang.Object")));
        assert!(!table.is_assignable(base, &TypeRef::resolved("org.example.Derived")));
        assert!(!table.is_assignable(derived, &TypeRef::unresolved("Base")));
    }

    #[test]
    fn members_share_the_compilation_unit_of_their_owner() {
        let (table, base, _) = hierarchy();
        let method = table.all_members(base)[1];
        assert_eq!(
            table.compilation_unit(method).map(|unit| unit.package.as_str()),
            Some("org.example")
        );
    }
}
