//! Core ELF64 types and constants

use thiserror::Error;

/// ELF parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElfError {
    #[error("Invalid ELF magic")]
    InvalidMagic,
    #[error("Unsupported ELF class: {0} (only ELFCLASS64 is supported)")]
    UnsupportedClass(u8),
    #[error("Unsupported ELF data encoding: {0} (only little endian is supported)")]
    UnsupportedData(u8),
    #[error("Invalid offset: {offset:#x}")]
    InvalidOffset { offset: usize },
    #[error("Truncated at {offset:#x}, needed {needed} bytes")]
    Truncated { offset: usize, needed: usize },
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("String not UTF-8")]
    InvalidString,
}

pub type Result<T> = std::result::Result<T, ElfError>;

/// ELF magic number
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;

/// Sizes of the fixed ELF64 structures
pub const ELF64_EHDR_SIZE: usize = 64;
pub const ELF64_SHDR_SIZE: usize = 64;
pub const ELF64_SYM_SIZE: usize = 24;

/// `e_machine` value for AMD GPUs
pub const EM_AMDGPU: u16 = 224;

/// ELF identification (first 16 bytes)
#[derive(Debug, Clone, Copy)]
pub struct ElfIdent {
    pub class: u8,
    pub data: u8,
    pub version: u8,
    pub osabi: u8,
    pub abiversion: u8,
}

/// ELF64 header
#[derive(Debug, Clone, Copy)]
pub struct ElfHeader {
    pub ident: ElfIdent,
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl ElfHeader {
    pub fn is_amdgpu(&self) -> bool {
        self.e_machine == EM_AMDGPU
    }
}

/// Section header
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionHeader {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

/// Section types
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_DYNSYM: u32 = 11;

/// Section flags
pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;

/// Special section indices
pub const SHN_UNDEF: u16 = 0;
pub const SHN_ABS: u16 = 0xfff1;

/// Symbol entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Symbol {
    pub st_name: u32,
    pub st_value: u64,
    pub st_size: u64,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
}

impl Symbol {
    pub fn st_bind(&self) -> u8 {
        self.st_info >> 4
    }

    pub fn st_type(&self) -> u8 {
        self.st_info & 0xf
    }

    pub fn is_undefined(&self) -> bool {
        self.st_shndx == SHN_UNDEF
    }

    pub fn is_function(&self) -> bool {
        self.st_type() == STT_FUNC
    }
}

/// Symbol binding
pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;

/// Symbol types
pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;

/// Section
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub index: usize,
    pub header: SectionHeader,
    pub name: &'a str,
    pub data: &'a [u8],
}

impl<'a> Section<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn size(&self) -> u64 {
        self.header.sh_size
    }

    pub fn addr(&self) -> u64 {
        self.header.sh_addr
    }

    pub fn offset(&self) -> u64 {
        self.header.sh_offset
    }

    /// True if `addr` lies in `[sh_addr, sh_addr + sh_size)`.
    pub fn contains_addr(&self, addr: u64) -> bool {
        addr >= self.header.sh_addr && addr - self.header.sh_addr < self.header.sh_size
    }

    pub fn is_executable(&self) -> bool {
        (self.header.sh_flags & SHF_EXECINSTR) != 0
    }

    pub fn is_allocated(&self) -> bool {
        (self.header.sh_flags & SHF_ALLOC) != 0
    }
}
