//! ELF64 header parsing

use crate::formats::elf::types::*;
use crate::formats::elf::utils::LeRead;

/// Parse ELF identification bytes
pub fn parse_ident(data: &[u8]) -> Result<ElfIdent> {
    if data.len() < 16 {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: 16,
        });
    }

    if &data[0..4] != ELF_MAGIC {
        return Err(ElfError::InvalidMagic);
    }

    if data[4] != ELFCLASS64 {
        return Err(ElfError::UnsupportedClass(data[4]));
    }
    if data[5] != ELFDATA2LSB {
        return Err(ElfError::UnsupportedData(data[5]));
    }

    Ok(ElfIdent {
        class: data[4],
        data: data[5],
        version: data[6],
        osabi: data[7],
        abiversion: data[8],
    })
}

/// Parse an ELF64 little-endian header
pub fn parse_header(data: &[u8]) -> Result<ElfHeader> {
    let ident = parse_ident(data)?;

    if data.len() < ELF64_EHDR_SIZE {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: ELF64_EHDR_SIZE,
        });
    }

    let header = ElfHeader {
        ident,
        e_type: data.read_u16(16)?,
        e_machine: data.read_u16(18)?,
        e_version: data.read_u32(20)?,
        e_entry: data.read_u64(24)?,
        e_phoff: data.read_u64(32)?,
        e_shoff: data.read_u64(40)?,
        e_flags: data.read_u32(48)?,
        e_ehsize: data.read_u16(52)?,
        e_phentsize: data.read_u16(54)?,
        e_phnum: data.read_u16(56)?,
        e_shentsize: data.read_u16(58)?,
        e_shnum: data.read_u16(60)?,
        e_shstrndx: data.read_u16(62)?,
    };

    if header.e_ehsize as usize != ELF64_EHDR_SIZE {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_ehsize: expected {}, got {}",
            ELF64_EHDR_SIZE, header.e_ehsize
        )));
    }

    if header.e_shnum > 0 && header.e_shentsize as usize != ELF64_SHDR_SIZE {
        return Err(ElfError::MalformedHeader(format!(
            "Invalid e_shentsize: expected {}, got {}",
            ELF64_SHDR_SIZE, header.e_shentsize
        )));
    }

    Ok(header)
}
