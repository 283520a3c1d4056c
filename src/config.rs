//! Configuration for code object parsing.
//!
//! Section names and I/O limits with defaults matching what code object
//! producers emit. All structures round-trip through serde.

use serde::{Deserialize, Serialize};

/// Master configuration for opening and parsing code objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeObjectConfig {
    /// Section holding kernel machine code (default: `.text`).
    pub text_section: String,
    /// Section holding metadata notes (default: `.note`).
    pub note_section: String,
    /// Symbol table searched for kernels (default: `.symtab`).
    pub symbol_table: String,
    /// Tables tried in order when `symbol_table` is absent (default: `.dynsym`).
    pub symbol_table_fallbacks: Vec<String>,
    /// I/O configuration for reading code objects from disk.
    pub io: IOConfig,
}

impl Default for CodeObjectConfig {
    fn default() -> Self {
        Self {
            text_section: ".text".to_string(),
            note_section: ".note".to_string(),
            symbol_table: ".symtab".to_string(),
            symbol_table_fallbacks: vec![".dynsym".to_string()],
            io: IOConfig::default(),
        }
    }
}

impl CodeObjectConfig {
    /// Symbol table names in lookup order
    pub fn symbol_tables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.symbol_table.as_str())
            .chain(self.symbol_table_fallbacks.iter().map(String::as_str))
    }
}

/// I/O configuration for file reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOConfig {
    /// Maximum file size to map (default: 104857600 = 100MB).
    pub max_file_size: u64,
}

impl Default for IOConfig {
    fn default() -> Self {
        Self {
            max_file_size: 104857600, // 100MB
        }
    }
}
