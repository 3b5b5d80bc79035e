//! Identifier conventions and import management for generated sources.

use crate::{types::Map, util::split_qualified};

/// `some_rule` / `someRule` -> `SomeRule`.
pub fn pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for part in name.split(|c: char| c == '_' || c == '-').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// `someRule` / `some_rule` -> `SOME_RULE`.
pub fn upper_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            result.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        result.extend(c.to_uppercase());
    }
    result
}

/// The imports of one generated file.
///
/// Qualified names are shortened to their simple name whenever that is
/// unambiguous within the file.
#[derive(Debug)]
pub struct Imports {
    package: String,
    /// simple name -> the qualified name it stands for
    taken: Map<String, String>,
    imports: Vec<String>,
}

impl Imports {
    /// Imports of the file declaring `class_name`.
    pub fn new(class_name: &str) -> Self {
        let (package, simple) = split_qualified(class_name);
        let mut taken = Map::default();
        taken.insert(simple.to_owned(), class_name.to_owned());
        Self {
            package: package.to_owned(),
            taken,
            imports: vec![],
        }
    }

    /// The name to write for the type `qualified`.
    pub fn shorten(&mut self, qualified: &str) -> String {
        let (package, simple) = split_qualified(qualified);
        if package.is_empty() {
            return qualified.to_owned();
        }
        match self.taken.get(simple) {
            Some(existing) if existing == qualified => return simple.to_owned(),
            Some(..) => return qualified.to_owned(),
            None => (),
        }
        self.taken.insert(simple.to_owned(), qualified.to_owned());
        if package != self.package && package != "java.lang" {
            self.imports.push(qualified.to_owned());
        }
        simple.to_owned()
    }

    /// Shorten every qualified name inside a type expression such as
    /// `java.util.List<java.time.LocalDate>`.
    pub fn shorten_type(&mut self, ty: &str) -> String {
        let mut result = String::with_capacity(ty.len());
        let mut rest = ty;
        while let Some(start) = rest.find(|c: char| c.is_alphabetic() || c == '_' || c == '$') {
            result.push_str(&rest[..start]);
            rest = &rest[start..];
            let end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
                .unwrap_or(rest.len());
            let name = rest[..end].trim_end_matches('.');
            result.push_str(&self.shorten(name));
            rest = &rest[name.len()..];
        }
        result.push_str(rest);
        result
    }

    /// The import declarations, sorted.
    pub fn render(&self) -> String {
        let mut imports: Vec<&str> = self.imports.iter().map(String::as_str).collect();
        imports.sort_unstable();
        imports.dedup();
        imports
            .into_iter()
            .map(|name| format!("import {};\n", name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_conversions() {
        assert_eq!(pascal_case("root"), "Root");
        assert_eq!(pascal_case("some_rule"), "SomeRule");
        assert_eq!(pascal_case("someRule"), "SomeRule");
        assert_eq!(upper_snake("someRule"), "SOME_RULE");
        assert_eq!(upper_snake("some_rule"), "SOME_RULE");
        assert_eq!(upper_snake("rule2"), "RULE2");
    }

    #[test]
    fn shortens_unambiguous_names() {
        let mut imports = Imports::new("org.example.psi.Lang1Root");
        assert_eq!(
            imports.shorten_type("java.util.List<java.time.LocalDate>"),
            "List<LocalDate>"
        );
        assert_eq!(imports.shorten("java.lang.String"), "String");
        assert_eq!(imports.shorten("org.example.psi.Lang1Child"), "Lang1Child");
        assert_eq!(imports.shorten("int"), "int");
        assert_eq!(
            imports.render(),
            "import java.time.LocalDate;\nimport java.util.List;\n"
        );
    }

    #[test]
    fn keeps_conflicting_names_qualified() {
        let mut imports = Imports::new("org.example.Lang1Root");
        assert_eq!(imports.shorten("org.other.Lang1Root"), "org.other.Lang1Root");
        assert_eq!(imports.shorten("java.util.List"), "List");
        assert_eq!(imports.shorten("java.awt.List"), "java.awt.List");
        assert_eq!(
            imports.shorten_type("java.lang.String..."),
            "String..."
        );
        assert_eq!(imports.render(), "import java.util.List;\n");
    }
}
