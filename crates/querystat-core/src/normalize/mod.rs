//! Query normalization.
//!
//! A normalizer turns raw query text into the canonical key that statistics
//! are grouped under. Queries with the same structure but different literal
//! values map to the same key, similar to how plan cache fingerprints ignore
//! filter values.

mod lexer;

use logos::Logos;

pub use lexer::SqlToken;

/// Converts raw query text into a canonical key.
///
/// Implementations must be pure: the same input always yields the same key.
pub trait QueryNormalizer: Send + Sync {
    /// Return the canonical key for `query`.
    fn normalize(&self, query: &str) -> String;
}

impl<F> QueryNormalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, query: &str) -> String {
        self(query)
    }
}

/// Normalizer that keeps query text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl QueryNormalizer for IdentityNormalizer {
    fn normalize(&self, query: &str) -> String {
        query.to_string()
    }
}

/// Placeholder written in place of every literal value.
pub const PLACEHOLDER: &str = "?";

/// Literal-stripping SQL normalizer.
///
/// - Numbers, strings, hex blobs and booleans become `?`. A unary sign is
///   part of the literal, so `a = -1` and `a = 1` share a key.
/// - Existing bind parameters (`?1`, `$1`, `:name`, `@name`) become `?`.
/// - `IN (...)` lists made only of values collapse to `IN (?)`.
/// - Comments are dropped and whitespace runs collapse to one space.
///
/// Everything else, including keyword case and identifier quoting, is kept
/// verbatim, so `SELECT 1 FROM t` and `select 1 from t` stay distinct keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlNormalizer;

impl SqlNormalizer {
    /// Create a new SQL normalizer.
    pub fn new() -> Self {
        Self
    }
}

impl QueryNormalizer for SqlNormalizer {
    fn normalize(&self, query: &str) -> String {
        let pieces = tokenize(query);
        render(&pieces, query.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PieceKind {
    Value,
    Open,
    Close,
    Comma,
    Operator,
    Other,
}

/// Words after which `-` or `+` starts a signed literal rather than a subtraction.
const UNARY_KEYWORDS: &[&str] = &[
    "and", "between", "by", "case", "else", "having", "in", "is", "like", "limit", "not",
    "offset", "on", "or", "return", "returning", "select", "set", "then", "values", "when",
    "where",
];

#[derive(Debug)]
struct Piece<'a> {
    kind: PieceKind,
    text: &'a str,
    /// Whether whitespace or a comment separated this piece from the previous one.
    spaced: bool,
}

fn tokenize(query: &str) -> Vec<Piece<'_>> {
    let mut lexer = SqlToken::lexer(query);
    let mut pieces = Vec::new();
    let mut prev_end = 0;

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let kind = match token {
            Ok(t) if t.is_value() => PieceKind::Value,
            Ok(SqlToken::LParen) => PieceKind::Open,
            Ok(SqlToken::RParen) => PieceKind::Close,
            Ok(SqlToken::Comma) => PieceKind::Comma,
            Ok(SqlToken::Operator) => PieceKind::Operator,
            // Unrecognized input is carried through untouched.
            Ok(_) | Err(()) => PieceKind::Other,
        };
        let mut spaced = span.start > prev_end;
        if kind == PieceKind::Value && is_sign(&pieces) {
            // Fold the sign into the literal so `-1` and `1` share a key.
            if let Some(sign) = pieces.pop() {
                spaced = sign.spaced;
            }
        }
        pieces.push(Piece {
            kind,
            text: lexer.slice(),
            spaced,
        });
        prev_end = span.end;
    }

    pieces
}

/// Whether the last piece is a unary `-` or `+` applied to whatever follows.
fn is_sign(pieces: &[Piece<'_>]) -> bool {
    let Some((last, before)) = pieces.split_last() else {
        return false;
    };
    if last.kind != PieceKind::Operator || !matches!(last.text, "-" | "+") {
        return false;
    }
    match before.last() {
        None => true,
        Some(p) => match p.kind {
            PieceKind::Operator | PieceKind::Open | PieceKind::Comma => true,
            PieceKind::Other => UNARY_KEYWORDS
                .iter()
                .any(|kw| p.text.eq_ignore_ascii_case(kw)),
            PieceKind::Value | PieceKind::Close => false,
        },
    }
}

/// If `pieces[open]` starts a parenthesized list of values, return the index
/// of its closing parenthesis.
fn value_list_end(pieces: &[Piece<'_>], open: usize) -> Option<usize> {
    if pieces.get(open)?.kind != PieceKind::Open {
        return None;
    }
    let mut i = open + 1;
    loop {
        if pieces.get(i)?.kind != PieceKind::Value {
            return None;
        }
        match pieces.get(i + 1)?.kind {
            PieceKind::Close => return Some(i + 1),
            PieceKind::Comma => i += 2,
            _ => return None,
        }
    }
}

fn render(pieces: &[Piece<'_>], capacity: usize) -> String {
    let mut out = String::with_capacity(capacity);
    let mut i = 0;

    while i < pieces.len() {
        let piece = &pieces[i];
        if piece.spaced && !out.is_empty() {
            out.push(' ');
        }

        match piece.kind {
            PieceKind::Value => out.push_str(PLACEHOLDER),
            _ => out.push_str(piece.text),
        }

        if piece.kind == PieceKind::Other && piece.text.eq_ignore_ascii_case("in") {
            if let Some(close) = value_list_end(pieces, i + 1) {
                if pieces[i + 1].spaced {
                    out.push(' ');
                }
                out.push('(');
                out.push_str(PLACEHOLDER);
                out.push(')');
                i = close + 1;
                continue;
            }
        }

        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn norm(query: &str) -> String {
        SqlNormalizer::new().normalize(query)
    }

    #[test]
    fn test_numeric_literals_collapse() {
        assert_eq!(norm("SELECT 1 FROM t"), "SELECT ? FROM t");
        assert_eq!(norm("SELECT 2 FROM t"), "SELECT ? FROM t");
        assert_eq!(norm("SELECT 1 FROM table"), "SELECT ? FROM table");
    }

    #[test]
    fn test_string_and_boolean_literals() {
        assert_eq!(
            norm("UPDATE users SET name = 'O''Brien', active = TRUE WHERE id = 42"),
            "UPDATE users SET name = ?, active = ? WHERE id = ?"
        );
    }

    #[test]
    fn test_in_list_collapses() {
        assert_eq!(
            norm("SELECT * FROM t WHERE id IN (1, 2, 3)"),
            "SELECT * FROM t WHERE id IN (?)"
        );
        assert_eq!(
            norm("SELECT * FROM t WHERE id in ('a')"),
            "SELECT * FROM t WHERE id in (?)"
        );
    }

    #[test]
    fn test_in_subquery_is_kept() {
        assert_eq!(
            norm("SELECT * FROM t WHERE id IN (SELECT id FROM u WHERE x = 5)"),
            "SELECT * FROM t WHERE id IN (SELECT id FROM u WHERE x = ?)"
        );
    }

    #[test]
    fn test_insert_values_keep_arity() {
        assert_eq!(
            norm("INSERT INTO t (a, b) VALUES (1, 'x')"),
            "INSERT INTO t (a, b) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_placeholders_unified() {
        assert_eq!(
            norm("SELECT * FROM t WHERE a = $1 AND b = ?2 AND c = :name"),
            "SELECT * FROM t WHERE a = ? AND b = ? AND c = ?"
        );
    }

    #[test]
    fn test_whitespace_and_comments() {
        assert_eq!(
            norm("  SELECT\n\t a,b  /* note */ FROM   t -- tail"),
            "SELECT a,b FROM t"
        );
    }

    #[test]
    fn test_identifiers_untouched() {
        assert_eq!(
            norm("SELECT t1.col2, \"x 1\" FROM `tbl_3` WHERE t1.v::int > 0"),
            "SELECT t1.col2, \"x 1\" FROM `tbl_3` WHERE t1.v::int > ?"
        );
    }

    #[test]
    fn test_signed_literals_share_key() {
        assert_eq!(norm("SELECT * FROM t WHERE a = -1"), norm("SELECT * FROM t WHERE a = 1"));
        assert_eq!(norm("SELECT -1"), "SELECT ?");
        assert_eq!(norm("SELECT +2.5, - 3"), "SELECT ?, ?");
        assert_eq!(
            norm("SELECT * FROM t WHERE id IN (-1, 2)"),
            "SELECT * FROM t WHERE id IN (?)"
        );
        assert_eq!(norm("SELECT a FROM t LIMIT -1"), "SELECT a FROM t LIMIT ?");
    }

    #[test]
    fn test_binary_minus_is_kept() {
        assert_eq!(norm("SELECT x - 1 FROM t"), "SELECT x - ? FROM t");
        assert_eq!(norm("SELECT x-1, (y)+2 FROM t"), "SELECT x-?, (y)+? FROM t");
        assert_eq!(norm("SELECT 3 - -1"), "SELECT ? - ?");
    }

    #[test]
    fn test_comment_text_does_not_split_keys() {
        assert_eq!(norm("SELECT 1 FROM t /* req=1 */"), "SELECT ? FROM t");
        assert_eq!(norm("SELECT 2 FROM t /* req=2 */"), "SELECT ? FROM t");
        assert_eq!(norm("SELECT a /* unterminated"), "SELECT a");
    }

    #[test]
    fn test_backslash_in_string_literal() {
        assert_eq!(
            norm(r"SELECT * FROM f WHERE p = 'C:\' AND b = 'x'"),
            "SELECT * FROM f WHERE p = ? AND b = ?"
        );
        assert_eq!(
            norm(r"SELECT * FROM f WHERE p = 'C:\' AND b = 'x'"),
            norm(r"SELECT * FROM f WHERE p = 'D:\' AND b = 'y'")
        );
    }

    #[test]
    fn test_array_values_and_bracket_identifiers() {
        assert_eq!(norm("SELECT ARRAY[1,2] FROM t"), "SELECT ARRAY[?,?] FROM t");
        assert_eq!(norm("SELECT arr[1] FROM t"), norm("SELECT arr[2] FROM t"));
        assert_eq!(norm("SELECT [my col] FROM t"), "SELECT [my col] FROM t");
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(norm(""), "");
        assert_eq!(norm("   "), "");
    }

    #[test]
    fn test_closure_normalizer() {
        let upper = |q: &str| q.to_uppercase();
        assert_eq!(upper.normalize("select 1"), "SELECT 1");
        assert_eq!(IdentityNormalizer.normalize("select 1"), "select 1");
    }
}
