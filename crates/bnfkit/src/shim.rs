//! [`Introspection`] backed by the host's partially resolved symbol table.

pub mod methods;
pub mod resolve;

use self::resolve::resolve_first;
use crate::{
    error::ResolutionError,
    introspect::{Introspection, MethodQuery, NavigableSymbol, TypeParameterInfo},
    symbols::{Modifiers, Symbol, SymbolRef, SymbolTable, TypeKind, TypeRef, ROOT_TYPE},
};
use std::rc::Rc;

/// Answers the grammar compiler's reflection queries from the host.
///
/// The shim only borrows host symbols per call; it is installed once per
/// build and shared with the grammar compiler for the rest of it.
pub struct Shim {
    table: Rc<dyn SymbolTable>,
}

impl Shim {
    pub fn new(table: Rc<dyn SymbolTable>) -> Self {
        Self { table }
    }

    fn wrap(&self, symbol: SymbolRef) -> NavigableSymbol {
        NavigableSymbol::new(Some(symbol), self.table.clone())
    }

    fn lookup(&self, class_name: Option<&str>) -> Option<SymbolRef> {
        class_name.and_then(|name| self.table.type_element(name))
    }

    fn resolve_first(&self, context: SymbolRef, ty: &TypeRef) -> Result<String, ResolutionError> {
        resolve_first(&*self.table, context, ty)
    }

    fn type_parameter_info(&self, param: SymbolRef) -> Result<Option<TypeParameterInfo>, ResolutionError> {
        let Symbol::TypeParameter(decl) = self.table.symbol(param) else {
            return Ok(None);
        };
        let extends_list = decl
            .bounds
            .iter()
            .map(|bound| self.resolve_first(param, bound))
            .collect::<Result<_, _>>()?;
        Ok(Some(TypeParameterInfo {
            name: decl.name.clone(),
            extends_list,
        }))
    }
}

/// The host symbol behind a wrapper handed out by this shim.
fn host_symbol(element: Option<&NavigableSymbol>) -> Option<SymbolRef> {
    element.and_then(NavigableSymbol::symbol)
}

impl Introspection for Shim {
    fn is_public(&self, element: Option<&NavigableSymbol>) -> bool {
        let Some(symbol) = host_symbol(element) else {
            return false;
        };
        match self.table.symbol(symbol) {
            Symbol::Type(decl) => decl.modifiers.contains(Modifiers::PUBLIC),
            Symbol::Executable(decl) => decl.modifiers.contains(Modifiers::PUBLIC),
            Symbol::Variable(..) | Symbol::TypeParameter(..) | Symbol::Package(..) | Symbol::Other => {
                false
            }
        }
    }

    fn find_class(&self, class_name: Option<&str>) -> Option<NavigableSymbol> {
        self.lookup(class_name).map(|symbol| self.wrap(symbol))
    }

    fn find_methods(&self, class_name: Option<&str>, query: &MethodQuery) -> Vec<NavigableSymbol> {
        if query.name.is_none() {
            return vec![];
        }
        let Some(class) = self.lookup(class_name) else {
            return vec![];
        };
        self.table
            .all_members(class)
            .into_iter()
            .filter(|&member| methods::matches(&*self.table, query, member))
            .map(|member| self.wrap(member))
            .collect()
    }

    fn super_class_name(&self, class_name: Option<&str>) -> Result<Option<String>, ResolutionError> {
        let Some(class) = self.lookup(class_name) else {
            return Ok(None);
        };
        match self.table.symbol(class) {
            Symbol::Type(decl) => match decl.kind {
                TypeKind::Interface | TypeKind::AnnotationType => Ok(Some(ROOT_TYPE.to_owned())),
                _ => decl
                    .superclass
                    .as_ref()
                    .map(|superclass| self.resolve_first(class, superclass))
                    .transpose(),
            },
            _ => Ok(None),
        }
    }

    fn signature(&self, method: Option<&NavigableSymbol>) -> Result<Vec<String>, ResolutionError> {
        let Some(symbol) = host_symbol(method) else {
            return Ok(vec![]);
        };
        let Symbol::Executable(exec) = self.table.symbol(symbol) else {
            return Ok(vec![]);
        };
        let mut result = Vec::with_capacity(1 + 2 * exec.parameters.len());
        result.push(self.resolve_first(symbol, &exec.return_type)?);
        for param in &exec.parameters {
            result.push(self.resolve_first(symbol, &param.ty)?);
            result.push(param.name.clone());
        }
        Ok(result)
    }

    fn generic_parameters(
        &self,
        method: Option<&NavigableSymbol>,
    ) -> Result<Vec<TypeParameterInfo>, ResolutionError> {
        let Some(symbol) = host_symbol(method) else {
            return Ok(vec![]);
        };
        let Symbol::Executable(exec) = self.table.symbol(symbol) else {
            return Ok(vec![]);
        };
        let mut infos = Vec::with_capacity(exec.type_parameters.len());
        for &param in &exec.type_parameters {
            infos.extend(self.type_parameter_info(param)?);
        }
        Ok(infos)
    }

    fn thrown_types(&self, method: Option<&NavigableSymbol>) -> Result<Vec<String>, ResolutionError> {
        let Some(symbol) = host_symbol(method) else {
            return Ok(vec![]);
        };
        let Symbol::Executable(exec) = self.table.symbol(symbol) else {
            return Ok(vec![]);
        };
        exec.thrown_types
            .iter()
            .map(|ty| self.resolve_first(symbol, ty))
            .collect()
    }

    fn declaring_class(&self, method: Option<&NavigableSymbol>) -> String {
        let Some(symbol) = host_symbol(method) else {
            return String::new();
        };
        if !matches!(self.table.symbol(symbol), Symbol::Executable(..)) {
            return String::new();
        }
        let mut current = Some(symbol);
        while let Some(symbol) = current {
            if let Symbol::Type(decl) = self.table.symbol(symbol) {
                return decl.qualified_name.clone();
            }
            current = self.table.enclosing(symbol);
        }
        String::new()
    }

    // The remaining queries only back IDE features and stay empty.

    fn annotations(&self, _element: Option<&NavigableSymbol>) -> Vec<String> {
        vec![]
    }

    fn parameter_annotations(&self, _method: Option<&NavigableSymbol>, _index: usize) -> Vec<String> {
        vec![]
    }

    fn class_references(&self, _element: &str) -> Vec<String> {
        vec![]
    }

    fn find_package(&self, _package_name: Option<&str>) -> Option<NavigableSymbol> {
        None
    }
}
