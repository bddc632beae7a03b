//! Link (pivot) table metadata

/// Link table between two models.
///
/// `local_column` points at the model the relation starts from and
/// `remote_column` at the model it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    /// The link table name (e.g., `"role_user"`)
    pub table_name: &'static str,
    pub local_column: &'static str,
    pub remote_column: &'static str,
}

impl LinkTable {
    pub const fn new(
        table_name: &'static str,
        local_column: &'static str,
        remote_column: &'static str,
    ) -> Self {
        Self {
            table_name,
            local_column,
            remote_column,
        }
    }

    /// `table.local_column`
    pub fn local(&self) -> String {
        format!("{}.{}", self.table_name, self.local_column)
    }

    /// `table.remote_column`
    pub fn remote(&self) -> String {
        format!("{}.{}", self.table_name, self.remote_column)
    }
}
