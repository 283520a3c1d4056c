//! Symbol table parsing

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, LeRead};
use std::collections::HashMap;

/// ELF64 symbol table with its linked string table
pub struct SymbolTable<'a> {
    symbols: Vec<Symbol>,
    strings: &'a [u8],
    by_name: HashMap<&'a str, usize>,
}

impl<'a> SymbolTable<'a> {
    /// Parse symbol table from section data
    ///
    /// A trailing partial entry is ignored.
    pub fn parse(symbol_data: &[u8], string_data: &'a [u8]) -> Result<Self> {
        let mut symbols = Vec::with_capacity(symbol_data.len() / ELF64_SYM_SIZE);
        let mut by_name = HashMap::new();

        for (index, entry) in symbol_data.chunks_exact(ELF64_SYM_SIZE).enumerate() {
            let symbol = parse_symbol(entry)?;

            if symbol.st_name != 0 {
                if let Ok(name) = read_cstring(string_data, symbol.st_name as usize) {
                    by_name.entry(name).or_insert(index);
                }
            }

            symbols.push(symbol);
        }

        Ok(Self {
            symbols,
            strings: string_data,
            by_name,
        })
    }

    /// Get symbol by index
    pub fn by_index(&self, index: usize) -> Option<SymbolRef<'a>> {
        self.symbols.get(index).map(|symbol| SymbolRef {
            index,
            name: self.symbol_name(symbol).unwrap_or(""),
            symbol: *symbol,
        })
    }

    /// Get the first symbol with this name
    pub fn by_name(&self, name: &str) -> Option<SymbolRef<'a>> {
        self.by_name.get(name).and_then(|&idx| self.by_index(idx))
    }

    /// Get symbol name
    pub fn symbol_name(&self, symbol: &Symbol) -> Option<&'a str> {
        if symbol.st_name == 0 {
            return None;
        }
        read_cstring(self.strings, symbol.st_name as usize).ok()
    }

    /// All symbols in table order, including the null entry
    pub fn symbols(&self) -> Symbols<'_, 'a> {
        Symbols {
            table: self,
            next: 0,
        }
    }

    /// Count total symbols
    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

/// A symbol together with its table index and resolved name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef<'a> {
    pub index: usize,
    pub name: &'a str,
    pub symbol: Symbol,
}

impl<'a> SymbolRef<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn value(&self) -> u64 {
        self.symbol.st_value
    }

    pub fn size(&self) -> u64 {
        self.symbol.st_size
    }

    pub fn section_index(&self) -> u16 {
        self.symbol.st_shndx
    }

    pub fn is_function(&self) -> bool {
        self.symbol.is_function()
    }
}

/// Forward iterator over a [`SymbolTable`]
#[derive(Clone)]
pub struct Symbols<'t, 'a> {
    table: &'t SymbolTable<'a>,
    next: usize,
}

impl<'a> Iterator for Symbols<'_, 'a> {
    type Item = SymbolRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol = self.table.by_index(self.next)?;
        self.next += 1;
        Some(symbol)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.table.count().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Symbols<'_, '_> {}

/// Parse a single ELF64 symbol entry
fn parse_symbol(data: &[u8]) -> Result<Symbol> {
    if data.len() < ELF64_SYM_SIZE {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: ELF64_SYM_SIZE,
        });
    }
    Ok(Symbol {
        st_name: data.read_u32(0)?,
        st_info: data[4],
        st_other: data[5],
        st_shndx: data.read_u16(6)?,
        st_value: data.read_u64(8)?,
        st_size: data.read_u64(16)?,
    })
}
