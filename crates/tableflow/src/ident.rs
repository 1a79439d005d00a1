//! SQL identifier validation and dialect-aware quoting.
//!
//! Every table, column, alias and index name that ends up in rendered SQL goes
//! through [`Dialect::write_ident`], so callers never splice raw names into
//! statement text.
//!
//! - [`Dialect::Sqlite`] (default) quotes with backticks: `` `users` ``
//! - [`Dialect::Postgres`] quotes with double quotes: `"users"`
//!
//! The quote character is escaped by doubling it.

use crate::error::{FlowError, FlowResult};

/// SQL dialect used when rendering a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Backtick-quoted identifiers, bare subqueries in FROM.
    #[default]
    Sqlite,
    /// Double-quoted identifiers, subqueries in FROM always carry an alias.
    Postgres,
}

impl Dialect {
    /// The identifier quote character.
    pub fn quote_char(self) -> char {
        match self {
            Self::Sqlite => '`',
            Self::Postgres => '"',
        }
    }

    /// Whether a subquery in FROM must be given an alias.
    pub fn requires_subquery_alias(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Quote a single identifier.
    pub fn quote(self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.write_ident(&mut out, name);
        out
    }

    pub(crate) fn write_ident(self, out: &mut String, name: &str) {
        let q = self.quote_char();
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
    }
}

/// Validate an identifier and strip one level of surrounding quotes.
///
/// Accepts `users`, `` `users` `` and `"users"`; all normalize to `users`.
pub(crate) fn normalize_ident(kind: &str, input: &str) -> FlowResult<String> {
    let trimmed = input.trim();
    let unquoted = strip_quotes(trimmed);
    if unquoted.trim().is_empty() {
        return Err(FlowError::configuration(format!("{kind} name cannot be empty")));
    }
    if unquoted.contains('\0') {
        return Err(FlowError::configuration(format!(
            "{kind} name cannot contain NUL character"
        )));
    }
    Ok(unquoted.to_string())
}

/// Lenient cleanup for names that cannot fail (aliases, columns, index names):
/// trims, strips one level of quotes and drops NUL characters.
pub(crate) fn clean_ident(input: &str) -> String {
    strip_quotes(input.trim())
        .chars()
        .filter(|c| *c != '\0')
        .collect()
}

fn strip_quotes(s: &str) -> &str {
    for q in ['`', '"'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
