//! Recursive-descent parser over the token stream.

use super::{
    ast::{AttrValue, Attrs, Expr, GrammarFile, ListEntry, Modifier, Rule},
    lexer::{Spanned, Token},
    SyntaxError,
};

pub struct Parser<'t, 'source> {
    source: &'source str,
    tokens: &'t [Spanned<'source>],
    pos: usize,
}

impl<'t, 'source> Parser<'t, 'source> {
    pub fn new(source: &'source str, tokens: &'t [Spanned<'source>]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    pub fn parse_file(mut self) -> Result<GrammarFile, SyntaxError> {
        let attrs = if self.peek() == Some(Token::LBrace) {
            self.attrs()?
        } else {
            Attrs::default()
        };
        let mut rules = vec![];
        while self.peek().is_some() {
            rules.push(self.rule()?);
        }
        Ok(GrammarFile { attrs, rules })
    }

    fn peek(&self) -> Option<Token<'source>> {
        self.peek_at(self.pos)
    }

    fn peek_at(&self, pos: usize) -> Option<Token<'source>> {
        self.tokens.get(pos).map(|(token, _)| *token)
    }

    fn bump(&mut self) -> Option<Token<'source>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, expected: Token<'source>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.offset(), message)
    }

    fn expect(&mut self, expected: Token<'source>, what: &str) -> Result<(), SyntaxError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn ident(&mut self) -> Result<&'source str, SyntaxError> {
        match self.peek() {
            Some(Token::Ident(ident)) => {
                self.pos += 1;
                Ok(ident)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    /// Whether a rule declaration starts at `pos`: modifiers, the rule name,
    /// then `::=`.
    fn is_rule_start(&self, mut pos: usize) -> bool {
        let mut idents = vec![];
        while let Some(Token::Ident(ident)) = self.peek_at(pos) {
            idents.push(ident);
            pos += 1;
        }
        match idents.split_last() {
            Some((_, modifiers)) => {
                self.peek_at(pos) == Some(Token::Define)
                    && modifiers.iter().all(|m| Modifier::from_keyword(m).is_some())
            }
            None => false,
        }
    }

    fn attrs(&mut self) -> Result<Attrs, SyntaxError> {
        self.expect(Token::LBrace, "`{`")?;
        let mut attrs = Attrs::default();
        while !self.eat(Token::RBrace) {
            let name = self.ident()?;
            self.expect(Token::Eq, "`=`")?;
            let value = match self.bump() {
                Some(Token::String(s)) => AttrValue::String(Token::unquote(s).to_owned()),
                Some(Token::Ident(ident)) => AttrValue::Ident(ident.to_owned()),
                Some(Token::LBracket) => AttrValue::List(self.list_entries()?),
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected attribute value"));
                }
            };
            self.eat(Token::Semicolon);
            attrs.insert(name, value);
        }
        Ok(attrs)
    }

    fn list_entries(&mut self) -> Result<Vec<ListEntry>, SyntaxError> {
        let mut entries = vec![];
        while !self.eat(Token::RBracket) {
            let entry = match self.bump() {
                Some(Token::Ident(name)) if self.eat(Token::Eq) => match self.bump() {
                    Some(Token::String(s)) => ListEntry {
                        name: Some(name.to_owned()),
                        value: Token::unquote(s).to_owned(),
                    },
                    Some(Token::Ident(value)) => ListEntry {
                        name: Some(name.to_owned()),
                        value: value.to_owned(),
                    },
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.error("expected list entry value"));
                    }
                },
                Some(Token::Ident(value)) => ListEntry {
                    name: None,
                    value: value.to_owned(),
                },
                Some(Token::String(s)) => ListEntry {
                    name: None,
                    value: Token::unquote(s).to_owned(),
                },
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error("expected list entry or `]`"));
                }
            };
            self.eat(Token::Semicolon);
            entries.push(entry);
        }
        Ok(entries)
    }

    fn rule(&mut self) -> Result<Rule, SyntaxError> {
        if !self.is_rule_start(self.pos) {
            return Err(self.error("expected rule declaration"));
        }
        let mut modifiers = vec![];
        let name = loop {
            let ident = self.ident()?;
            if self.peek() == Some(Token::Define) {
                break ident;
            }
            match Modifier::from_keyword(ident) {
                Some(modifier) => modifiers.push(modifier),
                None => {
                    self.pos -= 1;
                    return Err(self.error(format!("unknown rule modifier `{}`", ident)));
                }
            }
        };
        self.expect(Token::Define, "`::=`")?;
        let expr = self.choice()?;
        let attrs = if self.peek() == Some(Token::LBrace) {
            self.attrs()?
        } else {
            Attrs::default()
        };
        self.eat(Token::Semicolon);
        Ok(Rule {
            modifiers,
            name: name.to_owned(),
            expr,
            attrs,
        })
    }

    fn choice(&mut self) -> Result<Expr, SyntaxError> {
        let mut choices = vec![self.sequence()?];
        while self.eat(Token::Bar) {
            choices.push(self.sequence()?);
        }
        Ok(if choices.len() == 1 {
            choices.swap_remove(0)
        } else {
            Expr::Choice(choices)
        })
    }

    fn sequence(&mut self) -> Result<Expr, SyntaxError> {
        let mut items = vec![];
        loop {
            match self.peek() {
                Some(Token::Ident(..)) if self.is_rule_start(self.pos) => break,
                Some(
                    Token::Ident(..)
                    | Token::String(..)
                    | Token::LParen
                    | Token::LBracket
                    | Token::Bang
                    | Token::Amp,
                ) => items.push(self.postfix()?),
                _ => break,
            }
        }
        Ok(if items.len() == 1 {
            items.swap_remove(0)
        } else {
            Expr::Sequence(items)
        })
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.prefix()?;
        loop {
            expr = match self.peek() {
                Some(Token::Question) => Expr::Optional(Box::new(expr)),
                Some(Token::Star) => Expr::ZeroOrMore(Box::new(expr)),
                Some(Token::Plus) => Expr::OneOrMore(Box::new(expr)),
                _ => return Ok(expr),
            };
            self.pos += 1;
        }
    }

    fn prefix(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(Token::Bang) {
            return Ok(Expr::Not(Box::new(self.prefix()?)));
        }
        if self.eat(Token::Amp) {
            return Ok(Expr::And(Box::new(self.prefix()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(Expr::Ref(name.to_owned())),
            Some(Token::String(s)) => Ok(Expr::Literal(Token::unquote(s).to_owned())),
            Some(Token::LParen) => {
                let expr = self.choice()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let expr = self.choice()?;
                self.expect(Token::RBracket, "`]`")?;
                Ok(Expr::Optional(Box::new(expr)))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected expression"))
            }
        }
    }
}
