//! Java source generation for a parsed grammar.
//!
//! Produces the files a Grammar-Kit grammar is expected to yield: the parser
//! class, the element-type holder with its node factory, the root visitor and,
//! for every node rule, an interface plus an implementation class.

use super::{
    ast::{Attrs, Expr, GrammarFile, Modifier, Rule},
    names::{pascal_case, upper_snake, Imports},
};
use crate::{
    introspect::{Introspection, MethodKind, MethodQuery, TypeParameterInfo},
    types::Map,
    util::{display_fn, split_qualified},
};
use anyhow::bail;
use std::{
    fmt::{self, Write as _},
    path::PathBuf,
};

const HEADER: &str = "// This is a generated file. Not intended for manual editing.\n";

const PSI_ELEMENT: &str = "com.intellij.psi.PsiElement";
const PSI_ELEMENT_VISITOR: &str = "com.intellij.psi.PsiElementVisitor";
const PSI_TREE_UTIL: &str = "com.intellij.psi.util.PsiTreeUtil";
const AST_NODE: &str = "com.intellij.lang.ASTNode";
const I_ELEMENT_TYPE: &str = "com.intellij.psi.tree.IElementType";
const NOT_NULL: &str = "org.jetbrains.annotations.NotNull";
const NULLABLE: &str = "org.jetbrains.annotations.Nullable";
const LIST: &str = "java.util.List";
const PARSER_UTIL: &str = "com.intellij.lang.parser.GeneratedParserUtilBase";

/// A generated compilation unit.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub class_name: String,
    pub contents: String,
}

impl GeneratedFile {
    /// `a/b/C.java` for the class `a.b.C`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.java", self.class_name.replace('.', "/")))
    }
}

/// Header attributes, with defaults filled in.
#[derive(Debug)]
struct Config {
    parser_class: String,
    psi_package: String,
    psi_impl_package: String,
    holder_class: String,
    prefix: String,
    impl_suffix: String,
    element_type_class: String,
    token_type_class: String,
    extends: String,
    util_class: Option<String>,
}

impl Config {
    fn from_attrs(attrs: &Attrs) -> Self {
        let get = |name: &str, default: &str| attrs.string(name).unwrap_or(default).to_owned();
        Self {
            parser_class: get("parserClass", "generated.GeneratedParser"),
            psi_package: get("psiPackage", "generated.psi"),
            psi_impl_package: get("psiImplPackage", "generated.psi.impl"),
            holder_class: get("elementTypeHolderClass", "generated.GeneratedTypes"),
            prefix: get("psiClassPrefix", ""),
            impl_suffix: get("psiImplClassSuffix", "Impl"),
            element_type_class: get("elementTypeClass", I_ELEMENT_TYPE),
            token_type_class: get("tokenTypeClass", I_ELEMENT_TYPE),
            extends: get("extends", "com.intellij.extapi.psi.ASTWrapperPsiElement"),
            util_class: attrs.string("psiImplUtilClass").map(str::to_owned),
        }
    }
}

/// A method contributed to a node by the `methods` attribute.
#[derive(Debug)]
enum NodeMethod {
    Delegate(Delegate),
    Skipped { name: String, reason: String },
}

/// A static helper method the node implementation forwards to.
#[derive(Debug)]
struct Delegate {
    name: String,
    helper_class: String,
    return_type: String,
    /// `(type, name)`, without the node parameter.
    params: Vec<(String, String)>,
    generics: Vec<TypeParameterInfo>,
    thrown: Vec<String>,
}

impl Delegate {
    fn is_void(&self) -> bool {
        self.return_type == "void"
    }

    /// `<T extends A> R name(P1 p1, ...) throws E`, shortened against `imports`.
    fn declaration(&self, imports: &mut Imports) -> String {
        let mut decl = String::new();
        if !self.generics.is_empty() {
            let generics: Vec<String> = self
                .generics
                .iter()
                .map(|param| {
                    let bounds: Vec<String> = param
                        .extends_list
                        .iter()
                        .map(|bound| imports.shorten_type(bound))
                        .collect();
                    if bounds.is_empty() {
                        param.name.clone()
                    } else {
                        format!("{} extends {}", param.name, bounds.join(" & "))
                    }
                })
                .collect();
            decl.push_str(&format!("<{}> ", generics.join(", ")));
        }
        decl.push_str(&imports.shorten_type(&self.return_type));
        decl.push(' ');
        decl.push_str(&self.name);
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(ty, name)| format!("{} {}", imports.shorten_type(ty), name))
            .collect();
        decl.push_str(&format!("({})", params.join(", ")));
        if !self.thrown.is_empty() {
            let thrown: Vec<String> = self.thrown.iter().map(|ty| imports.shorten_type(ty)).collect();
            decl.push_str(&format!(" throws {}", thrown.join(", ")));
        }
        decl
    }
}

/// A child node accessor derived from the rule expression.
#[derive(Debug, Default, Clone, Copy)]
struct ChildShape {
    many: bool,
    optional: bool,
}

pub struct Codegen<'g> {
    grammar: &'g GrammarFile,
    introspection: &'g dyn Introspection,
    config: Config,
    rules: Map<&'g str, &'g Rule>,
}

impl<'g> Codegen<'g> {
    pub fn new(grammar: &'g GrammarFile, introspection: &'g dyn Introspection) -> Self {
        Self {
            grammar,
            introspection,
            config: Config::from_attrs(&grammar.attrs),
            rules: grammar
                .rules
                .iter()
                .map(|rule| (rule.name.as_str(), rule))
                .collect(),
        }
    }

    pub fn generate(&self) -> anyhow::Result<Vec<GeneratedFile>> {
        if self.grammar.rules.is_empty() {
            bail!("the grammar declares no rules");
        }
        let mut files = vec![self.parser()?, self.holder()?, self.visitor()?];
        for rule in self.nodes() {
            let methods = self.resolve_methods(rule)?;
            files.push(self.node_interface(rule, &methods)?);
            files.push(self.node_impl(rule, &methods)?);
        }
        Ok(files)
    }

    /// Rules that become PSI nodes. The first rule is the file root.
    fn nodes(&self) -> impl Iterator<Item = &'g Rule> + '_ {
        self.grammar.rules.iter().skip(1).filter(|rule| rule.is_public())
    }

    fn is_node(&self, name: &str) -> bool {
        self.nodes().any(|rule| rule.name == name)
    }

    fn interface_name(&self, rule: &Rule) -> String {
        qualify(
            &self.config.psi_package,
            &format!("{}{}", self.config.prefix, pascal_case(&rule.name)),
        )
    }

    fn impl_name(&self, rule: &Rule) -> String {
        qualify(
            &self.config.psi_impl_package,
            &format!(
                "{}{}{}",
                self.config.prefix,
                pascal_case(&rule.name),
                self.config.impl_suffix
            ),
        )
    }

    fn visitor_name(&self) -> String {
        qualify(
            &self.config.psi_package,
            &format!("{}Visitor", self.config.prefix),
        )
    }

    /// The rule named by a rule-level `extends`, if any.
    fn base_rule(&self, rule: &Rule) -> Option<&'g Rule> {
        let base = rule.attrs.string("extends")?;
        self.rules.get(base).copied().filter(|base| base.name != rule.name)
    }

    /// Look up the helpers named in the rule's `methods` attribute.
    fn resolve_methods(&self, rule: &Rule) -> anyhow::Result<Vec<NodeMethod>> {
        let mut methods = vec![];
        for entry in rule.attrs.list("methods") {
            if entry.name.is_some() {
                tracing::debug!("ignoring accessor entry {:?} of {}", entry.value, rule.name);
                continue;
            }
            methods.push(self.resolve_method(rule, &entry.value)?);
        }
        Ok(methods)
    }

    fn resolve_method(&self, rule: &Rule, name: &str) -> anyhow::Result<NodeMethod> {
        let skipped = |reason: String| NodeMethod::Skipped {
            name: name.to_owned(),
            reason,
        };
        let Some(util_class) = self.config.util_class.as_deref() else {
            return Ok(skipped("no psiImplUtilClass is configured".to_owned()));
        };
        if self.introspection.find_class(Some(util_class)).is_none() {
            return Ok(skipped(format!("class {} not found", util_class)));
        }

        // the node parameter is the interface or, failing that, the implementation.
        for node_type in [self.interface_name(rule), self.impl_name(rule)] {
            let query = MethodQuery::new(MethodKind::Static, Some(name)).param_types([node_type]);
            let candidates = self.introspection.find_methods(Some(util_class), &query);
            let Some(method) = candidates.first() else {
                continue;
            };

            let signature = self.introspection.signature(Some(method))?;
            let Some((return_type, params)) = signature.split_first() else {
                continue;
            };
            let params: Vec<(String, String)> = params
                .chunks_exact(2)
                .skip(1)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            let helper_class = match self.introspection.declaring_class(Some(method)) {
                class if class.is_empty() => util_class.to_owned(),
                class => class,
            };
            tracing::trace!("{}: {} delegates to {}", rule.name, name, helper_class);

            return Ok(NodeMethod::Delegate(Delegate {
                name: name.to_owned(),
                helper_class,
                return_type: return_type.clone(),
                params,
                generics: self.introspection.generic_parameters(Some(method))?,
                thrown: self.introspection.thrown_types(Some(method))?,
            }));
        }
        Ok(skipped(format!(
            "no static method {} in {} accepts the node",
            name, util_class
        )))
    }

    /// Node rules referenced directly by `rule`, with their cardinality.
    fn children(&self, rule: &Rule) -> Map<&'g str, (&'g Rule, ChildShape)> {
        let mut children = Map::default();
        self.collect_children(&rule.expr, ChildShape::default(), &mut children);
        children
    }

    fn collect_children(
        &self,
        expr: &Expr,
        shape: ChildShape,
        out: &mut Map<&'g str, (&'g Rule, ChildShape)>,
    ) {
        match expr {
            Expr::Ref(name) => {
                let Some(rule) = self.rules.get(name.as_str()).copied() else {
                    return;
                };
                if !self.is_node(&rule.name) {
                    return;
                }
                out.entry(rule.name.as_str())
                    .and_modify(|(_, existing)| {
                        existing.many = true;
                        existing.optional &= shape.optional;
                    })
                    .or_insert((rule, shape));
            }
            Expr::Literal(..) | Expr::And(..) | Expr::Not(..) => (),
            Expr::Sequence(items) => {
                for item in items {
                    self.collect_children(item, shape, out);
                }
            }
            Expr::Choice(choices) => {
                let shape = ChildShape {
                    optional: true,
                    ..shape
                };
                for choice in choices {
                    self.collect_children(choice, shape, out);
                }
            }
            Expr::Optional(inner) => {
                let shape = ChildShape {
                    optional: true,
                    ..shape
                };
                self.collect_children(inner, shape, out);
            }
            Expr::ZeroOrMore(inner) => {
                self.collect_children(inner, ChildShape { many: true, optional: true }, out);
            }
            Expr::OneOrMore(inner) => {
                let shape = ChildShape { many: true, ..shape };
                self.collect_children(inner, shape, out);
            }
        }
    }

    fn parser(&self) -> anyhow::Result<GeneratedFile> {
        let class_name = &self.config.parser_class;
        let mut imports = Imports::new(class_name);
        let builder = imports.shorten("com.intellij.lang.PsiBuilder");
        let marker = imports.shorten("com.intellij.lang.PsiBuilder.Marker");
        let element_type = imports.shorten(I_ELEMENT_TYPE);
        let ast_node = imports.shorten(AST_NODE);
        let psi_parser = imports.shorten("com.intellij.lang.PsiParser");
        let light_parser = imports.shorten("com.intellij.lang.LightPsiParser");

        let mut emitter = ParserEmitter {
            rules: &self.rules,
            tokens: token_decls(&self.grammar.attrs)
                .into_iter()
                .map(|token| (token.text, token.constant))
                .collect(),
            builder: &builder,
            marker: &marker,
            out: String::new(),
        };
        let (_, simple) = split_qualified(class_name);
        let first = &self.grammar.rules[0];

        let out = &mut emitter.out;
        writeln!(
            out,
            "public class {} implements {}, {} {{\n",
            simple, psi_parser, light_parser
        )?;
        writeln!(
            out,
            "  public {ast} parse({ty} t, {b} b) {{\n    parseLight(t, b);\n    return b.getTreeBuilt();\n  }}\n",
            ast = ast_node,
            ty = element_type,
            b = builder
        )?;
        writeln!(
            out,
            "  public void parseLight({ty} t, {b} b) {{\n    boolean r;\n    b = adapt_builder_(t, b, this, null);\n    {m} m = enter_section_(b, 0, _COLLAPSE_, null);\n    r = parse_root_(t, b);\n    exit_section_(b, 0, m, t, r, true, TRUE_CONDITION);\n  }}\n",
            ty = element_type,
            b = builder,
            m = marker
        )?;
        writeln!(
            out,
            "  protected boolean parse_root_({ty} t, {b} b) {{\n    return parse_root_(t, b, 0);\n  }}\n",
            ty = element_type,
            b = builder
        )?;
        writeln!(
            out,
            "  static boolean parse_root_({ty} t, {b} b, int l) {{\n    return {first}(b, l + 1);\n  }}\n",
            ty = element_type,
            b = builder,
            first = first.name
        )?;

        for (i, rule) in self.grammar.rules.iter().enumerate() {
            if rule.has_modifier(Modifier::External) || rule.has_modifier(Modifier::Fake) {
                continue;
            }
            let element = (i > 0 && rule.is_public()).then(|| upper_snake(&rule.name));
            emitter.rule(rule, element.as_deref())?;
        }
        emitter.out.push_str("}\n");

        let statics = [self.config.holder_class.clone(), PARSER_UTIL.to_owned()];
        Ok(source_file(class_name, &imports, &statics, &emitter.out))
    }

    fn holder(&self) -> anyhow::Result<GeneratedFile> {
        let class_name = &self.config.holder_class;
        let mut imports = Imports::new(class_name);
        let element_type = imports.shorten(I_ELEMENT_TYPE);
        let psi_element = imports.shorten(PSI_ELEMENT);
        let ast_node = imports.shorten(AST_NODE);
        let node_type = imports.shorten(&self.config.element_type_class);
        let token_type = imports.shorten(&self.config.token_type_class);
        let (_, simple) = split_qualified(class_name);

        let mut out = String::new();
        writeln!(out, "public interface {} {{\n", simple)?;
        for rule in self.nodes() {
            let constant = upper_snake(&rule.name);
            writeln!(
                out,
                "  {} {} = new {}(\"{}\");",
                element_type, constant, node_type, constant
            )?;
        }
        out.push('\n');
        for token in token_decls(&self.grammar.attrs) {
            writeln!(
                out,
                "  {} {} = new {}(\"{}\");",
                element_type,
                token.constant,
                token_type,
                java_escape(&token.debug_name)
            )?;
        }

        writeln!(out, "\n  class Factory {{")?;
        writeln!(
            out,
            "    public static {} createElement({} node) {{",
            psi_element, ast_node
        )?;
        writeln!(out, "      {} type = node.getElementType();", element_type)?;
        for (i, rule) in self.nodes().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            let impl_class = imports.shorten(&self.impl_name(rule));
            writeln!(
                out,
                "      {} (type == {}) {{\n        return new {}(node);\n      }}",
                keyword,
                upper_snake(&rule.name),
                impl_class
            )?;
        }
        writeln!(
            out,
            "      throw new AssertionError(\"Unknown element type: \" + type);\n    }}\n  }}\n}}"
        )?;
        Ok(source_file(class_name, &imports, &[], &out))
    }

    fn visitor(&self) -> anyhow::Result<GeneratedFile> {
        let class_name = self.visitor_name();
        let mut imports = Imports::new(&class_name);
        let not_null = imports.shorten(NOT_NULL);
        let base = imports.shorten(PSI_ELEMENT_VISITOR);
        let psi_element = imports.shorten(PSI_ELEMENT);
        let (_, simple) = split_qualified(&class_name);

        let mut out = String::new();
        writeln!(out, "public class {} extends {} {{\n", simple, base)?;
        for rule in self.nodes() {
            let node = imports.shorten(&self.interface_name(rule));
            let delegate = match self.base_rule(rule) {
                Some(base) => format!("visit{}", pascal_case(&base.name)),
                None => "visitPsiElement".to_owned(),
            };
            writeln!(
                out,
                "  public void visit{}(@{} {} o) {{\n    {}(o);\n  }}\n",
                pascal_case(&rule.name),
                not_null,
                node,
                delegate
            )?;
        }
        writeln!(
            out,
            "  public void visitPsiElement(@{} {} o) {{\n    visitElement(o);\n  }}\n\n}}",
            not_null, psi_element
        )?;
        Ok(source_file(&class_name, &imports, &[], &out))
    }

    fn node_interface(&self, rule: &Rule, methods: &[NodeMethod]) -> anyhow::Result<GeneratedFile> {
        let class_name = self.interface_name(rule);
        let mut imports = Imports::new(&class_name);
        let supertype = match self.base_rule(rule) {
            Some(base) => self.interface_name(base),
            None => PSI_ELEMENT.to_owned(),
        };
        let supertype = imports.shorten(&supertype);
        let (_, simple) = split_qualified(&class_name);

        let mut out = String::new();
        writeln!(out, "public interface {} extends {} {{\n", simple, supertype)?;
        for (child, shape) in self.children(rule).into_values() {
            let (ty, getter) = self.accessor(&mut imports, child, shape);
            writeln!(out, "  {} {}();\n", ty, getter)?;
        }
        for method in methods {
            match method {
                NodeMethod::Delegate(delegate) => {
                    writeln!(out, "  {};\n", delegate.declaration(&mut imports))?;
                }
                NodeMethod::Skipped { name, reason } => {
                    writeln!(out, "  //WARNING: {} is skipped, {}\n", name, reason)?;
                }
            }
        }
        out.push_str("}\n");
        Ok(source_file(&class_name, &imports, &[], &out))
    }

    fn node_impl(&self, rule: &Rule, methods: &[NodeMethod]) -> anyhow::Result<GeneratedFile> {
        let class_name = self.impl_name(rule);
        let mut imports = Imports::new(&class_name);
        let superclass = match self.base_rule(rule) {
            Some(base) => self.impl_name(base),
            None => rule
                .attrs
                .string("extends")
                .unwrap_or(&self.config.extends)
                .to_owned(),
        };
        let superclass = imports.shorten(&superclass);
        let interface = imports.shorten(&self.interface_name(rule));
        let visitor = imports.shorten(&self.visitor_name());
        let not_null = imports.shorten(NOT_NULL);
        let ast_node = imports.shorten(AST_NODE);
        let psi_visitor = imports.shorten(PSI_ELEMENT_VISITOR);
        let (_, simple) = split_qualified(&class_name);

        let mut out = String::new();
        writeln!(
            out,
            "public class {} extends {} implements {} {{\n",
            simple, superclass, interface
        )?;
        writeln!(
            out,
            "  public {}(@{} {} node) {{\n    super(node);\n  }}\n",
            simple, not_null, ast_node
        )?;
        writeln!(
            out,
            "  public void accept(@{} {} visitor) {{\n    visitor.visit{}(this);\n  }}\n",
            not_null,
            visitor,
            pascal_case(&rule.name)
        )?;
        writeln!(
            out,
            "  @Override\n  public void accept(@{nn} {pv} visitor) {{\n    if (visitor instanceof {v}) accept(({v})visitor);\n    else super.accept(visitor);\n  }}\n",
            nn = not_null,
            pv = psi_visitor,
            v = visitor
        )?;

        for (child, shape) in self.children(rule).into_values() {
            let (ty, getter) = self.accessor(&mut imports, child, shape);
            let node = imports.shorten(&self.interface_name(child));
            let tree_util = imports.shorten(PSI_TREE_UTIL);
            let body = if shape.many {
                format!("{}.getChildrenOfTypeAsList(this, {}.class)", tree_util, node)
            } else if shape.optional {
                format!("{}.getChildOfType(this, {}.class)", tree_util, node)
            } else {
                format!("notNullChild({}.getChildOfType(this, {}.class))", tree_util, node)
            };
            writeln!(
                out,
                "  @Override\n  public {} {}() {{\n    return {};\n  }}\n",
                ty, getter, body
            )?;
        }

        for method in methods {
            match method {
                NodeMethod::Delegate(delegate) => {
                    let helper = imports.shorten(&delegate.helper_class);
                    let args = display_fn(|f| {
                        f.write_str("this")?;
                        for (_, name) in &delegate.params {
                            write!(f, ", {}", name)?;
                        }
                        Ok(())
                    });
                    let ret = if delegate.is_void() { "" } else { "return " };
                    writeln!(
                        out,
                        "  @Override\n  public {} {{\n    {}{}.{}({});\n  }}\n",
                        delegate.declaration(&mut imports),
                        ret,
                        helper,
                        delegate.name,
                        args
                    )?;
                }
                NodeMethod::Skipped { name, reason } => {
                    writeln!(out, "  //WARNING: {} is skipped, {}\n", name, reason)?;
                }
            }
        }
        out.push_str("}\n");
        Ok(source_file(&class_name, &imports, &[], &out))
    }

    /// The return type and getter name of a child accessor.
    fn accessor(&self, imports: &mut Imports, child: &Rule, shape: ChildShape) -> (String, String) {
        let node = imports.shorten(&self.interface_name(child));
        let getter = format!("get{}", pascal_case(&child.name));
        if shape.many {
            let list = imports.shorten(LIST);
            let not_null = imports.shorten(NOT_NULL);
            (format!("@{} {}<{}>", not_null, list, node), format!("{}List", getter))
        } else if shape.optional {
            let nullable = imports.shorten(NULLABLE);
            (format!("@{} {}", nullable, node), getter)
        } else {
            let not_null = imports.shorten(NOT_NULL);
            (format!("@{} {}", not_null, node), getter)
        }
    }
}

/// A token declared in the `tokens` attribute.
#[derive(Debug)]
struct TokenDecl {
    constant: String,
    text: String,
    debug_name: String,
}

fn token_decls(attrs: &Attrs) -> Vec<TokenDecl> {
    attrs
        .list("tokens")
        .iter()
        .filter_map(|entry| {
            let name = entry.name.as_deref()?;
            let debug_name = if entry.value.starts_with("regexp:") {
                name.to_owned()
            } else {
                entry.value.clone()
            };
            Some(TokenDecl {
                constant: upper_snake(name),
                text: entry.value.clone(),
                debug_name,
            })
        })
        .collect()
}

/// Writes the recursive-descent methods of the parser class.
///
/// Every rule becomes a static method; nested expressions are split out into
/// private methods named after their position (`rule_0`, `rule_0_1`, ...).
struct ParserEmitter<'a, 'g> {
    rules: &'a Map<&'g str, &'g Rule>,
    /// token text -> token constant
    tokens: Map<String, String>,
    builder: &'a str,
    marker: &'a str,
    out: String,
}

impl ParserEmitter<'_, '_> {
    fn rule(&mut self, rule: &Rule, element: Option<&str>) -> fmt::Result {
        writeln!(
            self.out,
            "  /* ********************************************************** */"
        )?;
        writeln!(self.out, "  // {}", rule.expr)?;
        let visibility = if rule.is_public() { "public " } else { "" };
        self.method(visibility, &rule.name, &rule.expr, element)
    }

    fn method(&mut self, visibility: &str, name: &str, expr: &Expr, element: Option<&str>) -> fmt::Result {
        writeln!(
            self.out,
            "  {}static boolean {}({} b, int l) {{",
            visibility, name, self.builder
        )?;
        writeln!(
            self.out,
            "    if (!recursion_guard_(b, l, \"{}\")) return false;",
            name
        )?;
        let mut pending = vec![];
        self.body(name, expr, element.unwrap_or("null"), &mut pending)?;
        writeln!(self.out, "  }}\n")?;

        for (sub, expr) in pending {
            writeln!(self.out, "  // {}", expr)?;
            self.method("private ", &sub, expr, None)?;
        }
        Ok(())
    }

    fn body<'e>(
        &mut self,
        name: &str,
        expr: &'e Expr,
        element: &str,
        pending: &mut Vec<(String, &'e Expr)>,
    ) -> fmt::Result {
        let m = self.marker;
        match expr {
            Expr::Sequence(items) => {
                writeln!(self.out, "    boolean r;\n    {m} m = enter_section_(b);")?;
                if items.is_empty() {
                    writeln!(self.out, "    r = true;")?;
                }
                for (i, item) in items.iter().enumerate() {
                    let call = self.call(name, i, item, pending);
                    if i == 0 {
                        writeln!(self.out, "    r = {call};")?;
                    } else {
                        writeln!(self.out, "    r = r && {call};")?;
                    }
                }
                writeln!(self.out, "    exit_section_(b, m, {element}, r);\n    return r;")
            }
            Expr::Choice(choices) => {
                writeln!(self.out, "    boolean r;\n    {m} m = enter_section_(b);")?;
                for (i, choice) in choices.iter().enumerate() {
                    let call = self.call(name, i, choice, pending);
                    if i == 0 {
                        writeln!(self.out, "    r = {call};")?;
                    } else {
                        writeln!(self.out, "    if (!r) r = {call};")?;
                    }
                }
                writeln!(self.out, "    exit_section_(b, m, {element}, r);\n    return r;")
            }
            Expr::Optional(inner) => {
                let call = self.call(name, 0, inner, pending);
                writeln!(
                    self.out,
                    "    {m} m = enter_section_(b);\n    {call};\n    exit_section_(b, m, {element}, true);\n    return true;"
                )
            }
            Expr::ZeroOrMore(inner) => {
                let call = self.call(name, 0, inner, pending);
                writeln!(
                    self.out,
                    "    {m} m = enter_section_(b);\n    while (true) {{\n      int c = current_position_(b);\n      if (!{call}) break;\n      if (!empty_element_parsed_guard_(b, \"{name}\", c)) break;\n    }}\n    exit_section_(b, m, {element}, true);\n    return true;"
                )
            }
            Expr::OneOrMore(inner) => {
                let call = self.call(name, 0, inner, pending);
                writeln!(
                    self.out,
                    "    boolean r;\n    {m} m = enter_section_(b);\n    r = {call};\n    while (r) {{\n      int c = current_position_(b);\n      if (!{call}) break;\n      if (!empty_element_parsed_guard_(b, \"{name}\", c)) break;\n    }}\n    exit_section_(b, m, {element}, r);\n    return r;"
                )
            }
            Expr::And(inner) | Expr::Not(inner) => {
                let (section, negate) = match expr {
                    Expr::Not(..) => ("_NOT_", "!"),
                    _ => ("_AND_", ""),
                };
                let call = self.call(name, 0, inner, pending);
                writeln!(
                    self.out,
                    "    boolean r;\n    {m} m = enter_section_(b, l, {section});\n    r = {negate}{call};\n    exit_section_(b, l, m, r, false, null);\n    return r;"
                )
            }
            Expr::Ref(..) | Expr::Literal(..) => {
                let call = self.call(name, 0, expr, pending);
                writeln!(
                    self.out,
                    "    boolean r;\n    {m} m = enter_section_(b);\n    r = {call};\n    exit_section_(b, m, {element}, r);\n    return r;"
                )
            }
        }
    }

    /// The Java expression parsing `expr`, queueing a helper method when
    /// `expr` is compound.
    fn call<'e>(
        &self,
        parent: &str,
        index: usize,
        expr: &'e Expr,
        pending: &mut Vec<(String, &'e Expr)>,
    ) -> String {
        match expr {
            Expr::Ref(name) if self.rules.contains_key(name.as_str()) => {
                format!("{}(b, l + 1)", name)
            }
            Expr::Ref(name) => format!("consumeToken(b, {})", upper_snake(name)),
            Expr::Literal(text) => match self.tokens.get(text) {
                Some(constant) => format!("consumeToken(b, {})", constant),
                None => format!("consumeToken(b, \"{}\")", java_escape(text)),
            },
            _ => {
                let sub = format!("{}_{}", parent, index);
                pending.push((sub.clone(), expr));
                format!("{}(b, l + 1)", sub)
            }
        }
    }
}

fn qualify(package: &str, simple: &str) -> String {
    if package.is_empty() {
        simple.to_owned()
    } else {
        format!("{}.{}", package, simple)
    }
}

fn java_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn source_file(class_name: &str, imports: &Imports, statics: &[String], body: &str) -> GeneratedFile {
    let (package, _) = split_qualified(class_name);
    let mut contents = String::from(HEADER);
    if !package.is_empty() {
        contents.push_str(&format!("package {};\n\n", package));
    }
    for class in statics {
        contents.push_str(&format!("import static {}.*;\n", class));
    }
    contents.push_str(&imports.render());
    contents.push('\n');
    contents.push_str(body);
    GeneratedFile {
        class_name: class_name.to_owned(),
        contents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bnf::parse, shim::Shim, symbols::MemoryTable};
    use std::rc::Rc;

    fn generate(grammar: &str) -> Vec<GeneratedFile> {
        let grammar = parse(grammar).unwrap();
        let shim = Shim::new(Rc::new(MemoryTable::new()));
        Codegen::new(&grammar, &shim).generate().unwrap()
    }

    fn file<'a>(files: &'a [GeneratedFile], class_name: &str) -> &'a str {
        &files
            .iter()
            .find(|file| file.class_name == class_name)
            .unwrap_or_else(|| panic!("{} was not generated", class_name))
            .contents
    }

    #[test]
    fn defaults_apply_without_a_header() {
        let files = generate("file ::= item*\nitem ::= 'x'");
        let names: Vec<_> = files.iter().map(|file| file.class_name.as_str()).collect();
        assert_eq!(
            names,
            [
                "generated.GeneratedParser",
                "generated.GeneratedTypes",
                "generated.psi.Visitor",
                "generated.psi.Item",
                "generated.psi.impl.ItemImpl",
            ]
        );
        assert_eq!(
            files[3].relative_path(),
            PathBuf::from("generated/psi/Item.java")
        );
    }

    #[test]
    fn parser_splits_nested_expressions() {
        let files = generate(
            r#"
{ tokens=[DOT='.'] }
file ::= (item | '.')* 
item ::= !DOT "x"
"#,
        );
        let parser = file(&files, "generated.GeneratedParser");
        assert!(parser.contains("import static generated.GeneratedTypes.*;"));
        assert!(parser.contains("return file(b, l + 1);"));
        assert!(parser.contains("static boolean file(PsiBuilder b, int l) {"));
        assert!(parser.contains("private static boolean file_0(PsiBuilder b, int l) {"));
        assert!(parser.contains("if (!r) r = consumeToken(b, DOT);"));
        assert!(parser.contains("r = !consumeToken(b, DOT);"));
        assert!(parser.contains("consumeToken(b, \"x\")"));
        assert!(parser.contains("exit_section_(b, m, ITEM, r);"));
    }

    #[test]
    fn holder_declares_node_and_token_types() {
        let files = generate(
            r#"
{
  elementTypeHolderClass="org.example.Types"
  psiImplPackage="org.example.impl"
  tokens=[DOT='.' SPACE='regexp:\s+']
}
file ::= item
item ::= DOT
"#,
        );
        let holder = file(&files, "org.example.Types");
        assert!(holder.contains("package org.example;"));
        assert!(holder.contains("IElementType ITEM = new IElementType(\"ITEM\");"));
        assert!(holder.contains("IElementType DOT = new IElementType(\".\");"));
        assert!(holder.contains("IElementType SPACE = new IElementType(\"SPACE\");"));
        assert!(holder.contains("import org.example.impl.ItemImpl;"));
        assert!(holder.contains("return new ItemImpl(node);"));
    }

    #[test]
    fn child_accessors_follow_cardinality() {
        let files = generate(
            r#"
{ psiPackage="p" psiImplPackage="p.impl" }
file ::= group
group ::= head item* [tail]
head ::= 'h'
item ::= 'i'
tail ::= 't'
"#,
        );
        let group = file(&files, "p.Group");
        assert!(group.contains("@NotNull Head getHead();"));
        assert!(group.contains("@NotNull List<Item> getItemList();"));
        assert!(group.contains("@Nullable Tail getTail();"));
        let group_impl = file(&files, "p.impl.GroupImpl");
        assert!(group_impl.contains("return PsiTreeUtil.getChildrenOfTypeAsList(this, Item.class);"));
        assert!(group_impl.contains("return notNullChild(PsiTreeUtil.getChildOfType(this, Head.class));"));
    }

    #[test]
    fn unresolved_helpers_leave_a_warning() {
        let files = generate(
            r#"
{ psiImplUtilClass="p.Util" }
file ::= node
node ::= 'n' { methods=[compute] }
"#,
        );
        let node = file(&files, "generated.psi.Node");
        assert!(node.contains("//WARNING: compute is skipped, class p.Util not found"));
    }

    #[test]
    fn empty_grammars_are_rejected() {
        let grammar = parse("").unwrap();
        let shim = Shim::new(Rc::new(MemoryTable::new()));
        assert!(Codegen::new(&grammar, &shim).generate().is_err());
    }
}
