//! SQL tokenizer used by the normalizer.
//!
//! The lexer only needs to tell literal values apart from query structure,
//! so it is deliberately shallow: keywords and identifiers share one token
//! kind and operators are lexed one character at a time.

use logos::{Lexer, Logos, Skip};

/// Skip a block comment. An unterminated comment runs to the end of input.
fn block_comment(lex: &mut Lexer<'_, SqlToken>) -> Skip {
    let rest = lex.remainder();
    let end = rest.find("*/").map_or(rest.len(), |i| i + 2);
    lex.bump(end);
    Skip
}

/// Decide what an opening bracket starts.
///
/// `[my col]` is a bracket-quoted identifier and is consumed whole; anything
/// else (`ARRAY[1, 2]`, `arr[3]`) leaves the bracket as punctuation so the
/// values inside are still lexed.
fn bracket(lex: &mut Lexer<'_, SqlToken>) -> bool {
    let rest = lex.remainder();
    let Some(end) = rest.find(']') else {
        return false;
    };
    let inner = &rest[..end];
    let ident = inner.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && !inner.contains(|c: char| c == '[' || c == ',');
    if ident {
        lex.bump(end + 1);
    }
    ident
}

/// Token types for SQL text.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n]*")]
pub enum SqlToken {
    #[token("/*", block_comment)]
    Comment,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"[xX]'[0-9a-fA-F]*'")]
    Hex,
    #[regex(r"'([^']|'')*'")]
    String,
    #[token("true", ignore(ascii_case))]
    #[token("false", ignore(ascii_case))]
    Boolean,

    // Bind parameters already present in the text
    #[regex(r"\?[0-9]*")]
    #[regex(r"\$[0-9]+")]
    #[regex(r"[:@][A-Za-z_][A-Za-z0-9_]*")]
    Placeholder,

    // Keywords, identifiers and system variables
    #[regex(r"[A-Za-z_][A-Za-z0-9_$]*")]
    #[regex(r"@@[A-Za-z_][A-Za-z0-9_.]*")]
    Word,
    #[regex(r#""([^"]|"")*""#)]
    #[regex(r"`[^`]*`")]
    QuotedIdent,
    /// Opening bracket; `true` when it began a `[quoted identifier]`.
    #[token("[", bracket)]
    LBracket(bool),
    #[token("]")]
    RBracket,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("::")]
    #[regex(r"[-+*/%<>=!|&^~.;:]")]
    Operator,
}

impl SqlToken {
    /// Whether this token carries a value that should not be part of the key.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            SqlToken::Number
                | SqlToken::Hex
                | SqlToken::String
                | SqlToken::Boolean
                | SqlToken::Placeholder
        )
    }
}
