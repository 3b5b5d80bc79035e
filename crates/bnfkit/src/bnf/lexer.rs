//! Lexer implementation.

use super::SyntaxError;
use logos::Logos;
use std::ops::Range;

#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'source> {
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("::=")]
    Define,

    #[token("=")]
    Eq,

    #[token(";")]
    Semicolon,

    #[token("|")]
    Bar,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("!")]
    Bang,

    #[token("&")]
    Amp,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'source str),

    #[regex(r#""[^"\n]*""#)]
    #[regex(r"'[^'\n]*'")]
    String(&'source str),
}

impl<'source> Token<'source> {
    /// The contents of a string literal, without its quotes.
    pub fn unquote(s: &'source str) -> &'source str {
        &s[1..s.len() - 1]
    }
}

pub type Spanned<'source> = (Token<'source>, Range<usize>);

pub fn tokenize(source: &str) -> Result<Vec<Spanned<'_>>, SyntaxError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = vec![];
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(SyntaxError::new(
                    lexer.span().start,
                    format!("unexpected character {:?}", lexer.slice()),
                ))
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Token::*;

    fn lex(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn smoketest() {
        let input = r#"
{
  parserClass="org.example.Lang1Parser" // trailing comment
  tokens = [ DOT='.' ]
}
/* block
   comment */
root ::= !"x" (child | &'.')* ["?"]+
"#;
        assert!(matches!(
            &lex(input)[..],
            [
                LBrace,
                Ident("parserClass"),
                Eq,
                String("\"org.example.Lang1Parser\""),
                Ident("tokens"),
                Eq,
                LBracket,
                Ident("DOT"),
                Eq,
                String("'.'"),
                RBracket,
                RBrace,
                Ident("root"),
                Define,
                Bang,
                String("\"x\""),
                LParen,
                Ident("child"),
                Bar,
                Amp,
                String("'.'"),
                RParen,
                Star,
                LBracket,
                String("\"?\""),
                RBracket,
                Plus,
            ]
        ));
    }

    #[test]
    fn unquote_strips_either_quote() {
        assert_eq!(Token::unquote("\"abc\""), "abc");
        assert_eq!(Token::unquote("'.'"), ".");
    }

    #[test]
    fn unknown_characters_are_errors() {
        let err = tokenize("root ::= #").unwrap_err();
        assert_eq!(err.offset, 9);
    }
}
