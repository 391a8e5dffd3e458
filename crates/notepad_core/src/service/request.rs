//! Caller-supplied request parts: selection predicates and query options.

use rusqlite::types::Value;

/// Caller-supplied SQL predicate with positional `?` arguments.
///
/// The clause is combined with any store-imposed filter by `AND`, always
/// parenthesised. Use anonymous `?` placeholders only: numbered ones would
/// collide with values the store binds ahead of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub clause: String,
    pub args: Vec<Value>,
}

impl Selection {
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            args: Vec::new(),
        }
    }

    /// Appends one bind argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.clause.trim().is_empty()
    }

    /// Checks that the clause stays inside the parentheses it is wrapped in.
    ///
    /// Outside string literals, parentheses must balance without ever closing
    /// more than they opened, and comments (`--`, `/*`) and statement
    /// separators (`;`) are refused. Returns the reason on failure.
    pub fn check_enclosable(&self) -> Result<(), &'static str> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut chars = self.clause.chars().peekable();

        while let Some(ch) = chars.next() {
            if let Some(open) = quote {
                if ch == open {
                    quote = None;
                }
                continue;
            }
            match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or("closes a parenthesis it did not open")?;
                }
                ';' => return Err("contains a statement separator"),
                '-' if chars.peek() == Some(&'-') => return Err("contains a comment"),
                '/' if chars.peek() == Some(&'*') => return Err("contains a comment"),
                _ => {}
            }
        }

        if quote.is_some() {
            return Err("leaves a string literal open");
        }
        if depth != 0 {
            return Err("leaves a parenthesis open");
        }
        Ok(())
    }
}

/// Options for `NoteStore::query`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteQuery {
    /// Requested columns; empty selects the route's full whitelist.
    pub projection: Vec<String>,
    pub selection: Option<Selection>,
    /// `column [ASC|DESC], ...`; defaults to `modified_at DESC`.
    pub sort_order: Option<String>,
}

impl NoteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn sort_order(mut self, order: impl Into<String>) -> Self {
        self.sort_order = Some(order.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Selection;

    #[test]
    fn balanced_clauses_are_enclosable() {
        for clause in [
            "title = ?",
            "(title = ? OR body = ?) AND id > 2",
            "title = 'a) OR (1 = 1'",
            "title = 'it''s'",
            "body LIKE '%--%'",
        ] {
            assert_eq!(Selection::new(clause).check_enclosable(), Ok(()), "{clause}");
        }
    }

    #[test]
    fn escaping_clauses_are_refused() {
        for clause in [
            "1 = 1) OR (1 = 1",
            "id = 1)",
            "(id = 1",
            "title = 'open",
            "1 = 1 -- rest",
            "1 = 1 /* rest */",
            "1 = 1; DELETE FROM notes",
        ] {
            assert!(Selection::new(clause).check_enclosable().is_err(), "{clause}");
        }
    }
}
