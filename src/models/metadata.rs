use serde::{Deserialize, Serialize};

use super::branch::Branch;

/// A table listed on a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
}

/// A column of a catalog table; order is display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Schema preview of one table, shaped as the parallel `columns` / `types`
/// lists the explorer displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub branch: Branch,
    pub table: String,
    pub columns: Vec<String>,
    pub types: Vec<String>,
}

impl TableSchema {
    pub fn new(branch: Branch, table: String, columns: &[Column]) -> Self {
        Self {
            branch,
            table,
            columns: columns.iter().map(|c| c.name.clone()).collect(),
            types: columns.iter().map(|c| c.data_type.clone()).collect(),
        }
    }
}
