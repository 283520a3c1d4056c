//! ELF64 little-endian object model
//!
//! A zero-copy reader for the parts of an ELF image a code object needs:
//! the header, the section table and symbol tables.

pub mod headers;
pub mod sections;
pub mod symbols;
pub mod types;
pub mod utils;

use headers::parse_header;
use sections::SectionTable;
use symbols::SymbolTable;
use tracing::trace;
pub use types::*;

/// A parsed ELF64 image borrowing its bytes
pub struct ElfFile<'data> {
    data: &'data [u8],
    header: ElfHeader,
    sections: SectionTable<'data>,
}

impl<'data> ElfFile<'data> {
    /// Parse ELF from raw data
    pub fn parse(data: &'data [u8]) -> Result<Self> {
        let header = parse_header(data)?;
        let sections = SectionTable::parse(data, &header)?;
        trace!(
            machine = header.e_machine,
            sections = sections.count(),
            "Parsed ELF64 image"
        );

        Ok(Self {
            data,
            header,
            sections,
        })
    }

    /// Get ELF header
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Get raw data
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    /// Get sections
    pub fn sections(&self) -> &SectionTable<'data> {
        &self.sections
    }

    /// Parse a symbol table by section name
    ///
    /// Returns `Ok(None)` if the section is missing, is not a symbol table,
    /// or links to a string table that does not exist.
    pub fn symbol_table(&self, name: &str) -> Result<Option<SymbolTable<'data>>> {
        let symtab_section = match self.sections.by_name(name) {
            Some(s) if matches!(s.header.sh_type, SHT_SYMTAB | SHT_DYNSYM) => s,
            _ => return Ok(None),
        };

        let strtab_idx = symtab_section.header.sh_link as usize;
        let strtab_section = match self.sections.by_index(strtab_idx) {
            Some(s) => s,
            None => return Ok(None),
        };

        SymbolTable::parse(symtab_section.data, strtab_section.data).map(Some)
    }
}
