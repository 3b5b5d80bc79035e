//! Syntax tree of a grammar file.

use crate::types::Map;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarFile {
    pub attrs: Attrs,
    pub rules: Vec<Rule>,
}

/// An attribute block, `{ key=value ... }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    entries: Map<String, AttrValue>,
}

impl Attrs {
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.get(name)
    }

    /// The value of a scalar attribute.
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            AttrValue::String(s) | AttrValue::Ident(s) => Some(s),
            AttrValue::List(..) => None,
        }
    }

    /// The entries of a list attribute.
    pub fn list(&self, name: &str) -> &[ListEntry] {
        match self.get(name) {
            Some(AttrValue::List(entries)) => entries,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Ident(String),
    List(Vec<ListEntry>),
}

/// An entry of a list attribute: `NAME='value'`, or a bare value.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub name: Option<String>,
    pub value: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Modifier {
    Private,
    External,
    Meta,
    Inner,
    Left,
    Upper,
    Fake,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "private" => Self::Private,
            "external" => Self::External,
            "meta" => Self::Meta,
            "inner" => Self::Inner,
            "left" => Self::Left,
            "upper" => Self::Upper,
            "fake" => Self::Fake,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub expr: Expr,
    pub attrs: Attrs,
}

impl Rule {
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether the rule produces a node of its own.
    pub fn is_public(&self) -> bool {
        !(self.has_modifier(Modifier::Private)
            || self.has_modifier(Modifier::External)
            || self.has_modifier(Modifier::Meta))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Choice(Vec<Expr>),
    Sequence(Vec<Expr>),
    Optional(Box<Expr>),
    ZeroOrMore(Box<Expr>),
    OneOrMore(Box<Expr>),
    And(Box<Expr>),
    Not(Box<Expr>),
    Ref(String),
    Literal(String),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(choices) => {
                for (i, choice) in choices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", choice)?;
                }
                Ok(())
            }
            Self::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    match item {
                        Self::Choice(..) => write!(f, "({})", item)?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                Ok(())
            }
            Self::Optional(inner) => write!(f, "[{}]", inner),
            Self::ZeroOrMore(inner) => write!(f, "{}*", Atom(inner)),
            Self::OneOrMore(inner) => write!(f, "{}+", Atom(inner)),
            Self::And(inner) => write!(f, "&{}", Atom(inner)),
            Self::Not(inner) => write!(f, "!{}", Atom(inner)),
            Self::Ref(name) => f.write_str(name),
            Self::Literal(text) => write!(f, "{:?}", text),
        }
    }
}

/// Parenthesizes compound expressions.
struct Atom<'a>(&'a Expr);

impl fmt::Display for Atom<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Choice(..) | Expr::Sequence(..) => write!(f, "({})", self.0),
            expr => write!(f, "{}", expr),
        }
    }
}
