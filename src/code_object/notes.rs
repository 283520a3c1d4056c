//! Metadata note records and their well-known descriptors

use crate::code_object::records::VarSizeRecord;
use crate::error::{CodeObjectError, Result};
use crate::formats::elf::utils::{align_up, LeRead};
use serde::{Deserialize, Serialize};

/// Size of the fixed note header: name size, descriptor size, type
pub const NOTE_HEADER_SIZE: usize = 12;

/// Name and descriptor alignment inside a note
pub const NOTE_ALIGN: u64 = 4;

/// Note type tags used by code objects
pub const NT_AMDGPU_HSA_CODE_OBJECT_VERSION: u32 = 1;
pub const NT_AMDGPU_HSA_ISA: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    CodeObjectVersion,
    HsaIsa,
    Other(u32),
}

impl From<u32> for NoteType {
    fn from(value: u32) -> Self {
        match value {
            NT_AMDGPU_HSA_CODE_OBJECT_VERSION => NoteType::CodeObjectVersion,
            NT_AMDGPU_HSA_ISA => NoteType::HsaIsa,
            other => NoteType::Other(other),
        }
    }
}

/// One note: `namesz`, `descsz`, `type`, then the padded name and descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRecord<'a> {
    pub name_size: u32,
    pub desc_size: u32,
    pub type_tag: u32,
    name: &'a [u8],
    desc: &'a [u8],
}

fn padded(len: u32) -> Option<usize> {
    align_up(u64::from(len), NOTE_ALIGN).and_then(|v| usize::try_from(v).ok())
}

impl<'a> NoteRecord<'a> {
    /// Exact name bytes, without padding
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Exact descriptor bytes, without padding
    pub fn desc(&self) -> &'a [u8] {
        self.desc
    }

    /// Name with trailing NULs removed, if it is UTF-8
    pub fn name_str(&self) -> Option<&'a str> {
        let end = self
            .name
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        std::str::from_utf8(&self.name[..end]).ok()
    }

    pub fn note_type(&self) -> NoteType {
        NoteType::from(self.type_tag)
    }

    /// Header plus padded name plus padded descriptor
    pub fn size_with_padding(&self) -> usize {
        note_size(self.name_size, self.desc_size).unwrap_or(usize::MAX)
    }

    /// Typed view over the start of the descriptor.
    ///
    /// Bytes past `D::SIZE` are left to the descriptor to interpret or ignore.
    pub fn interpret<D: NoteDescriptor<'a>>(&self) -> Result<D> {
        if self.desc.len() < D::SIZE {
            return Err(CodeObjectError::DescriptorTooSmall {
                needed: D::SIZE,
                available: self.desc.len(),
            });
        }
        D::decode(self.desc)
    }
}

fn note_size(name_size: u32, desc_size: u32) -> Option<usize> {
    NOTE_HEADER_SIZE
        .checked_add(padded(name_size)?)?
        .checked_add(padded(desc_size)?)
}

impl<'a> VarSizeRecord<'a> for NoteRecord<'a> {
    const HEADER_SIZE: usize = NOTE_HEADER_SIZE;

    fn padded_size(bytes: &'a [u8]) -> Option<usize> {
        note_size(bytes.read_u32(0).ok()?, bytes.read_u32(4).ok()?)
    }

    fn parse(bytes: &'a [u8]) -> Option<Self> {
        let name_size = bytes.read_u32(0).ok()?;
        let desc_size = bytes.read_u32(4).ok()?;
        let type_tag = bytes.read_u32(8).ok()?;

        let name_start = NOTE_HEADER_SIZE;
        let desc_start = name_start.checked_add(padded(name_size)?)?;
        let name = bytes.get(name_start..name_start.checked_add(name_size as usize)?)?;
        let desc = bytes.get(desc_start..desc_start.checked_add(desc_size as usize)?)?;

        Some(NoteRecord {
            name_size,
            desc_size,
            type_tag,
            name,
            desc,
        })
    }
}

/// A fixed-layout structure carried in a note descriptor.
pub trait NoteDescriptor<'a>: Sized {
    /// Bytes of the fixed part; shorter descriptors are rejected
    const SIZE: usize;
    /// Note type that carries this descriptor
    const NOTE_TYPE: u32;

    /// Decode from a descriptor at least `SIZE` bytes long
    fn decode(desc: &'a [u8]) -> Result<Self>;
}

fn too_small(needed: usize, available: usize) -> CodeObjectError {
    CodeObjectError::DescriptorTooSmall { needed, available }
}

/// Code object format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeObjectVersion {
    pub major: u32,
    pub minor: u32,
}

impl<'a> NoteDescriptor<'a> for CodeObjectVersion {
    const SIZE: usize = 8;
    const NOTE_TYPE: u32 = NT_AMDGPU_HSA_CODE_OBJECT_VERSION;

    fn decode(desc: &'a [u8]) -> Result<Self> {
        let field = |offset: usize| {
            desc.read_u32(offset)
                .map_err(|_| too_small(Self::SIZE, desc.len()))
        };
        Ok(CodeObjectVersion {
            major: field(0)?,
            minor: field(4)?,
        })
    }
}

/// Target ISA: vendor and architecture names plus a version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsaDescriptor<'a> {
    pub vendor_name_size: u16,
    pub architecture_name_size: u16,
    pub major: u32,
    pub minor: u32,
    pub stepping: u32,
    /// Everything after the fixed fields: vendor name then architecture name
    names: &'a [u8],
}

impl<'a> IsaDescriptor<'a> {
    /// Vendor name bytes, as declared (may include a trailing NUL)
    pub fn vendor_name(&self) -> Result<&'a [u8]> {
        let len = usize::from(self.vendor_name_size);
        self.names
            .get(..len)
            .ok_or(too_small(Self::SIZE + len, Self::SIZE + self.names.len()))
    }

    /// Architecture name bytes, immediately after the vendor name
    pub fn architecture_name(&self) -> Result<&'a [u8]> {
        let start = usize::from(self.vendor_name_size);
        let end = start + usize::from(self.architecture_name_size);
        self.names
            .get(start..end)
            .ok_or(too_small(Self::SIZE + end, Self::SIZE + self.names.len()))
    }
}

impl<'a> NoteDescriptor<'a> for IsaDescriptor<'a> {
    const SIZE: usize = 16;
    const NOTE_TYPE: u32 = NT_AMDGPU_HSA_ISA;

    fn decode(desc: &'a [u8]) -> Result<Self> {
        let fixed = desc
            .get(..Self::SIZE)
            .ok_or(too_small(Self::SIZE, desc.len()))?;
        let err = |_| too_small(Self::SIZE, desc.len());
        Ok(IsaDescriptor {
            vendor_name_size: fixed.read_u16(0).map_err(err)?,
            architecture_name_size: fixed.read_u16(2).map_err(err)?,
            major: fixed.read_u32(4).map_err(err)?,
            minor: fixed.read_u32(8).map_err(err)?,
            stepping: fixed.read_u32(12).map_err(err)?,
            names: &desc[Self::SIZE..],
        })
    }
}

/// Strip trailing NULs from a name and decode it lossily
pub fn display_name(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
