//! Member filtering for method queries.

use super::resolve::resolve;
use crate::{
    introspect::{MethodKind, MethodQuery, Pattern},
    symbols::{ExecutableDecl, ExecutableKind, Modifiers, Symbol, SymbolRef, SymbolTable, TypeRef},
};

/// Whether `member` satisfies `query`.
pub fn matches(table: &dyn SymbolTable, query: &MethodQuery, member: SymbolRef) -> bool {
    let Symbol::Executable(exec) = table.symbol(member) else {
        return false;
    };
    if exec.modifiers.contains(Modifiers::ABSTRACT) {
        return false;
    }

    let kind_matches = match query.kind {
        MethodKind::Constructor => {
            exec.kind == ExecutableKind::Constructor
                && !exec.modifiers.contains(Modifiers::PRIVATE)
        }
        MethodKind::Instance => {
            exec.kind == ExecutableKind::Method && !exec.modifiers.contains(Modifiers::STATIC)
        }
        MethodKind::Static => {
            exec.kind == ExecutableKind::Method && exec.modifiers.contains(Modifiers::STATIC)
        }
    };

    kind_matches
        && query
            .name
            .as_ref()
            .map_or(false, |pattern| pattern.is_match(&exec.name))
        && matches_parameters(table, query, member, exec)
}

fn matches_parameters(
    table: &dyn SymbolTable,
    query: &MethodQuery,
    member: SymbolRef,
    exec: &ExecutableDecl,
) -> bool {
    let declared = exec.parameters.len();
    if let Some(count) = query.param_count {
        if !exec.varargs && count != declared {
            return false;
        }
        // a variadic collector may bind no argument, but the fixed slots must.
        if count + 1 < declared {
            return false;
        }
    }
    if query.param_types.len() > declared {
        return false;
    }

    query
        .param_types
        .iter()
        .zip(&exec.parameters)
        .all(|(pattern, param)| match pattern {
            Pattern::Any => true,
            Pattern::Named(from) => is_assignable(table, member, from, &param.ty),
        })
}

/// Whether the type named `from` can be passed where `to` is declared.
pub fn is_assignable(table: &dyn SymbolTable, context: SymbolRef, from: &str, to: &TypeRef) -> bool {
    match to {
        TypeRef::Unresolved(..) => resolve(table, context, to).contains(from),
        TypeRef::Resolved(name) => {
            name == from
                || table
                    .type_element(from)
                    .map_or(false, |from| table.is_assignable(from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{CompilationUnit, MemoryTable, TypeDecl};

    struct Fixture {
        table: MemoryTable,
        class: SymbolRef,
    }

    impl Fixture {
        fn new() -> Self {
            let mut table = MemoryTable::new();
            let unit = table.add_unit(
                CompilationUnit::new("org.example.impl").import("org.example.lang.Node"),
            );
            table.add_type(unit, TypeDecl::interface("org.example.lang.Base"));
            table.add_type(
                unit,
                TypeDecl::class("org.example.lang.Concrete")
                    .implements(TypeRef::resolved("org.example.lang.Base")),
            );
            let class = table.add_type(unit, TypeDecl::class("org.example.impl.Util"));
            Self { table, class }
        }

        fn add(&mut self, decl: ExecutableDecl) -> SymbolRef {
            self.table.add_executable(self.class, decl)
        }

        fn check(&self, query: &MethodQuery, member: SymbolRef) -> bool {
            matches(&self.table, query, member)
        }
    }

    fn query(kind: MethodKind, name: &str) -> MethodQuery {
        MethodQuery::new(kind, Some(name))
    }

    #[test]
    fn constructor_queries_skip_private_and_abstract_constructors() {
        let mut fx = Fixture::new();
        let public = fx.add(ExecutableDecl::constructor().modifiers(Modifiers::PUBLIC));
        let private = fx.add(ExecutableDecl::constructor().modifiers(Modifiers::PRIVATE));
        let method = fx.add(ExecutableDecl::method("create"));

        let q = query(MethodKind::Constructor, "*");
        assert!(fx.check(&q, public));
        assert!(!fx.check(&q, private));
        assert!(!fx.check(&q, method));
    }

    #[test]
    fn static_and_instance_queries_partition_methods() {
        let mut fx = Fixture::new();
        let stat = fx.add(ExecutableDecl::method("run").modifiers(Modifiers::STATIC));
        let inst = fx.add(ExecutableDecl::method("run"));
        let abst = fx.add(ExecutableDecl::method("run").modifiers(Modifiers::ABSTRACT));
        let ctor = fx.add(ExecutableDecl::constructor());

        let statics = query(MethodKind::Static, "run");
        let instances = query(MethodKind::Instance, "*");
        assert!(fx.check(&statics, stat));
        assert!(!fx.check(&statics, inst));
        assert!(!fx.check(&instances, stat));
        assert!(fx.check(&instances, inst));
        assert!(!fx.check(&statics, abst));
        assert!(!fx.check(&instances, abst));
        assert!(!fx.check(&instances, ctor));
    }

    #[test]
    fn names_must_match_exactly_unless_wildcard() {
        let mut fx = Fixture::new();
        let run = fx.add(ExecutableDecl::method("run"));
        assert!(!fx.check(&query(MethodKind::Instance, "ru"), run));
        assert!(!fx.check(&MethodQuery::new(MethodKind::Instance, None), run));
        assert!(fx.check(&query(MethodKind::Instance, "run"), run));
    }

    #[test]
    fn fixed_arity_requires_exact_count() {
        let mut fx = Fixture::new();
        let two = fx.add(
            ExecutableDecl::method("f")
                .param("a", TypeRef::resolved("int"))
                .param("b", TypeRef::resolved("int")),
        );
        assert!(fx.check(&query(MethodKind::Instance, "f").param_count(2), two));
        assert!(!fx.check(&query(MethodKind::Instance, "f").param_count(1), two));
        assert!(!fx.check(&query(MethodKind::Instance, "f").param_count(3), two));
        assert!(fx.check(&query(MethodKind::Instance, "f"), two));
    }

    #[test]
    fn variadic_methods_accept_one_slot_of_slack() {
        let mut fx = Fixture::new();
        let varargs = fx.add(
            ExecutableDecl::method("f")
                .param("a", TypeRef::resolved("int"))
                .param("b", TypeRef::resolved("int"))
                .param("rest", TypeRef::resolved("int[]"))
                .varargs(true),
        );
        let q = |count| query(MethodKind::Instance, "f").param_count(count);
        assert!(!fx.check(&q(1), varargs));
        assert!(fx.check(&q(2), varargs));
        assert!(fx.check(&q(3), varargs));
        assert!(fx.check(&q(7), varargs));
    }

    #[test]
    fn more_patterns_than_parameters_never_match() {
        let mut fx = Fixture::new();
        let one = fx.add(ExecutableDecl::method("f").param("a", TypeRef::resolved("int")));
        let q = query(MethodKind::Instance, "f").param_types(["*", "*"]);
        assert!(!fx.check(&q, one));
    }

    #[test]
    fn parameter_patterns_use_assignability() {
        let mut fx = Fixture::new();
        let by_base = fx.add(
            ExecutableDecl::method("f").param("node", TypeRef::resolved("org.example.lang.Base")),
        );
        let by_placeholder =
            fx.add(ExecutableDecl::method("g").param("node", TypeRef::unresolved("Node")));

        let q = |name, ty: &str| query(MethodKind::Instance, name).param_types([ty]);
        assert!(fx.check(&q("f", "org.example.lang.Base"), by_base));
        assert!(fx.check(&q("f", "org.example.lang.Concrete"), by_base));
        assert!(!fx.check(&q("f", "org.example.lang.Unknown"), by_base));
        assert!(fx.check(&q("f", "*"), by_base));
        assert!(fx.check(&q("g", "org.example.lang.Node"), by_placeholder));
        assert!(!fx.check(&q("g", "org.example.impl.Node"), by_placeholder));
    }
}
