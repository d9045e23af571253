//! Database ID type definition.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Number of rows changed by an `INSERT`, `UPDATE` or `DELETE` statement.
pub type RowsAffected = usize;
