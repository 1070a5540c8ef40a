//! Logos-based query tokenizer.
//!
//! Queries are lowercased and split into words and integer literals;
//! anything else is skipped.

use logos::Logos;
use smol_str::SmolStr;
use tracing::trace;

/// A query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: SmolStr,
    /// Set when the token is a numeric literal that fits an `i64`.
    pub int_value: Option<i64>,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[a-z][a-z0-9'-]*")]
    Word,
}

/// Tokenize a query into lowercase tokens.
pub fn tokenize(query: &str) -> Vec<Token> {
    let lowered = query.to_lowercase();
    let mut lexer = RawToken::lexer(&lowered);
    let mut tokens = Vec::new();
    while let Some(raw) = lexer.next() {
        let text = lexer.slice();
        match raw {
            Ok(RawToken::Integer) => tokens.push(Token {
                text: text.into(),
                int_value: text.parse().ok(),
            }),
            Ok(RawToken::Word) => tokens.push(Token {
                text: text.into(),
                int_value: None,
            }),
            Err(()) => {
                trace!(fragment = text, "skipping unrecognized input");
            }
        }
    }
    tokens
}
