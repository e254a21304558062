//! Table and row addressing.

use std::fmt::Display;

/// A table owned by exactly one bounded context.
///
/// Two contexts may both have a `users` table; they are different tables
/// because the owning context is part of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Table {
    context: &'static str,
    name: &'static str,
}

impl Table {
    pub const fn new(context: &'static str, name: &'static str) -> Self {
        Self { context, name }
    }

    pub fn context(&self) -> &'static str {
        self.context
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.context, self.name)
    }
}

/// Natural key of a row inside a table.
///
/// Composite keys join their parts with `:` so that every row sharing a
/// leading part can be found with a prefix scan (see [`RowKey::prefix`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(String);

impl RowKey {
    const SEPARATOR: char = ':';

    /// Key made of a single part.
    pub fn of(part: impl Display) -> Self {
        Self(part.to_string())
    }

    /// Key made of two parts.
    pub fn pair(first: impl Display, second: impl Display) -> Self {
        Self(format!("{first}{}{second}", Self::SEPARATOR))
    }

    /// Key made of three parts.
    pub fn triple(first: impl Display, second: impl Display, third: impl Display) -> Self {
        Self(format!(
            "{first}{sep}{second}{sep}{third}",
            sep = Self::SEPARATOR
        ))
    }

    /// Scan prefix matching every composite key whose leading part is `part`.
    pub fn prefix(part: impl Display) -> String {
        format!("{part}{}", Self::SEPARATOR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
