//! Section table management

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_cstring, slice_at, LeRead};
use std::collections::HashMap;

/// Section table for efficient section lookup
pub struct SectionTable<'a> {
    headers: Vec<SectionHeader>,
    strings: &'a [u8],
    data: &'a [u8],
    /// Name to index of the first section carrying that name
    by_name: HashMap<&'a str, usize>,
}

impl<'a> SectionTable<'a> {
    /// Parse section table from ELF data
    pub fn parse(data: &'a [u8], header: &ElfHeader) -> Result<Self> {
        let sh_offset = header.e_shoff as usize;
        let sh_num = header.e_shnum as usize;

        if sh_num == 0 || sh_offset == 0 {
            return Ok(Self {
                headers: Vec::new(),
                strings: &[],
                data,
                by_name: HashMap::new(),
            });
        }

        let total_size = sh_num * ELF64_SHDR_SIZE;
        if sh_offset
            .checked_add(total_size)
            .map_or(true, |end| end > data.len())
        {
            return Err(ElfError::Truncated {
                offset: sh_offset,
                needed: total_size,
            });
        }

        let headers = (0..sh_num)
            .map(|i| parse_section_header(data, sh_offset + i * ELF64_SHDR_SIZE))
            .collect::<Result<Vec<_>>>()?;

        let strings = headers
            .get(header.e_shstrndx as usize)
            .and_then(|sh| slice_at(data, sh.sh_offset, sh.sh_size))
            .unwrap_or(&[]);

        let mut by_name = HashMap::new();
        for (i, sh) in headers.iter().enumerate() {
            if let Ok(name) = read_cstring(strings, sh.sh_name as usize) {
                by_name.entry(name).or_insert(i);
            }
        }

        Ok(Self {
            headers,
            strings,
            data,
            by_name,
        })
    }

    /// Get the first section with exactly this name, in table order
    pub fn by_name(&self, name: &str) -> Option<Section<'a>> {
        self.index_of(name).and_then(|idx| self.by_index(idx))
    }

    /// Index of the first section with exactly this name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Get section by index
    pub fn by_index(&self, index: usize) -> Option<Section<'a>> {
        self.headers.get(index).map(|header| {
            let name = read_cstring(self.strings, header.sh_name as usize).unwrap_or("");
            let data: &'a [u8] = if header.sh_type == SHT_NOBITS {
                &[]
            } else {
                slice_at(self.data, header.sh_offset, header.sh_size).unwrap_or(&[])
            };
            Section {
                index,
                header: *header,
                name,
                data,
            }
        })
    }

    /// Get all sections
    pub fn sections(&self) -> impl Iterator<Item = Section<'a>> + '_ {
        (0..self.headers.len()).filter_map(move |i| self.by_index(i))
    }

    /// Count sections
    pub fn count(&self) -> usize {
        self.headers.len()
    }
}

/// Parse a single ELF64 section header
fn parse_section_header(data: &[u8], offset: usize) -> Result<SectionHeader> {
    Ok(SectionHeader {
        sh_name: data.read_u32(offset)?,
        sh_type: data.read_u32(offset + 4)?,
        sh_flags: data.read_u64(offset + 8)?,
        sh_addr: data.read_u64(offset + 16)?,
        sh_offset: data.read_u64(offset + 24)?,
        sh_size: data.read_u64(offset + 32)?,
        sh_link: data.read_u32(offset + 40)?,
        sh_info: data.read_u32(offset + 44)?,
        sh_addralign: data.read_u64(offset + 48)?,
        sh_entsize: data.read_u64(offset + 56)?,
    })
}
