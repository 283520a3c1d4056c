//! GPU code object access.
//!
//! A code object is an ELF64 little-endian image whose `.note` section holds
//! metadata notes and whose `.text` section holds the machine code of one or
//! more kernels. Each kernel starts with a fixed-size [`KernelHeader`] and is
//! marked by a function symbol. Kernel symbols often carry no size, so the
//! extent of a kernel is inferred from where the next kernel starts.

pub mod filter;
pub mod kernel;
pub mod notes;
pub mod records;
pub mod summary;

use crate::config::CodeObjectConfig;
use crate::error::{CodeObjectError, Result};
use crate::formats::elf::symbols::{SymbolRef, SymbolTable};
use crate::formats::elf::{ElfFile, ElfHeader, Section};
use filter::Conditional;
use std::ops::Range;
use tracing::{debug, warn};

pub use kernel::{KernelHeader, KernelSymbol, KERNEL_HEADER_SIZE};
pub use notes::{CodeObjectVersion, IsaDescriptor, NoteDescriptor, NoteRecord, NoteType};
pub use records::{RecordCursor, VarSizeRecord};
pub use summary::CodeObjectSummary;

/// Cursor over the notes of a code object
pub type Notes<'data> = RecordCursor<'data, NoteRecord<'data>>;

/// Sorted, deduplicated start addresses of all kernels
#[derive(Debug, Clone, Default)]
struct KernelMarkers {
    starts: Vec<u64>,
    /// Starts claimed by more than one kernel symbol
    shared: Vec<u64>,
}

impl KernelMarkers {
    fn from_values(mut values: Vec<u64>) -> Self {
        values.sort_unstable();
        let mut shared: Vec<u64> = values
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0])
            .collect();
        shared.dedup();
        values.dedup();
        Self {
            starts: values,
            shared,
        }
    }

    fn is_shared(&self, start: u64) -> bool {
        self.shared.binary_search(&start).is_ok()
    }

    /// First marker strictly greater than `start`
    fn next_after(&self, start: u64) -> Option<u64> {
        let idx = self.starts.partition_point(|&m| m <= start);
        self.starts.get(idx).copied()
    }
}

/// The bytes of one kernel and the addresses they span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelCode<'data> {
    pub start: u64,
    pub end: u64,
    pub bytes: &'data [u8],
}

impl KernelCode<'_> {
    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// An immutable view of a code object.
///
/// Section lookups and the kernel marker set are computed once during
/// construction; afterwards every query is a read over the borrowed buffer,
/// so a `CodeObject` can be shared across threads freely.
pub struct CodeObject<'data> {
    elf: ElfFile<'data>,
    config: CodeObjectConfig,
    symbols: Option<SymbolTable<'data>>,
    text: Option<Section<'data>>,
    note_index: Option<usize>,
    markers: KernelMarkers,
}

impl<'data> CodeObject<'data> {
    /// Parse a code object with the default configuration
    pub fn parse(data: &'data [u8]) -> Result<Self> {
        Self::parse_with_config(data, &CodeObjectConfig::default())
    }

    /// Parse a code object.
    ///
    /// Only a buffer that is not a usable ELF64 little-endian image fails
    /// here. A missing text or note section is reported by the first
    /// operation that needs it.
    pub fn parse_with_config(data: &'data [u8], config: &CodeObjectConfig) -> Result<Self> {
        let elf = ElfFile::parse(data)?;
        if !elf.header().is_amdgpu() {
            debug!(
                machine = elf.header().e_machine,
                "ELF machine is not AMDGPU, parsing anyway"
            );
        }

        let mut symbols = None;
        for name in config.symbol_tables() {
            if let Some(table) = elf.symbol_table(name)? {
                debug!(table = name, count = table.count(), "Using symbol table");
                symbols = Some(table);
                break;
            }
        }

        let text = elf.sections().by_name(&config.text_section);
        let note_index = elf.sections().index_of(&config.note_section);
        if text.is_none() {
            warn!(section = %config.text_section, "Code object has no text section");
        }
        if note_index.is_none() {
            warn!(section = %config.note_section, "Code object has no note section");
        }

        let mut code_object = Self {
            elf,
            config: config.clone(),
            symbols,
            text,
            note_index,
            markers: KernelMarkers::default(),
        };
        let values = code_object.kernels().map(|k| k.value()).collect();
        code_object.markers = KernelMarkers::from_values(values);
        debug!(
            kernels = code_object.markers.starts.len(),
            shared = code_object.markers.shared.len(),
            "Computed kernel markers"
        );

        Ok(code_object)
    }

    /// The underlying buffer
    pub fn data(&self) -> &'data [u8] {
        self.elf.data()
    }

    pub fn elf(&self) -> &ElfFile<'data> {
        &self.elf
    }

    pub fn header(&self) -> &ElfHeader {
        self.elf.header()
    }

    pub fn config(&self) -> &CodeObjectConfig {
        &self.config
    }

    /// The symbol table kernels are drawn from, if any
    pub fn symbol_table(&self) -> Option<&SymbolTable<'data>> {
        self.symbols.as_ref()
    }

    /// First section with exactly this name
    pub fn section_by_name(&self, name: &str) -> Result<Section<'data>> {
        self.elf
            .sections()
            .by_name(name)
            .ok_or_else(|| CodeObjectError::SectionNotFound(name.to_string()))
    }

    /// Index of the first section with exactly this name
    pub fn section_index_by_name(&self, name: &str) -> Result<usize> {
        self.elf
            .sections()
            .index_of(name)
            .ok_or_else(|| CodeObjectError::SectionNotFound(name.to_string()))
    }

    pub fn text_section_index(&self) -> Result<usize> {
        self.text_section().map(|text| text.index)
    }

    pub fn note_section_index(&self) -> Result<usize> {
        self.note_index
            .ok_or_else(|| CodeObjectError::SectionNotFound(self.config.note_section.clone()))
    }

    pub fn text_section(&self) -> Result<Section<'data>> {
        self.text
            .ok_or_else(|| CodeObjectError::SectionNotFound(self.config.text_section.clone()))
    }

    pub fn note_section(&self) -> Result<Section<'data>> {
        let index = self.note_section_index()?;
        self.elf
            .sections()
            .by_index(index)
            .ok_or_else(|| CodeObjectError::SectionNotFound(self.config.note_section.clone()))
    }

    /// Cursor over the note records of the note section.
    ///
    /// Iteration stops at the first record that does not fit in the section.
    /// Compare against [`RecordCursor::end`] to walk it manually.
    pub fn notes(&self) -> Result<Notes<'data>> {
        let section = self.note_section()?;
        Ok(RecordCursor::new(section.data))
    }

    /// Descriptor of the first note with type `D::NOTE_TYPE`, if any
    pub fn find_note<D: NoteDescriptor<'data>>(&self) -> Result<Option<D>> {
        self.notes()?
            .find(|note| note.type_tag == D::NOTE_TYPE)
            .map(|note| note.interpret::<D>())
            .transpose()
    }

    pub fn code_object_version(&self) -> Result<Option<CodeObjectVersion>> {
        self.find_note()
    }

    pub fn isa(&self) -> Result<Option<IsaDescriptor<'data>>> {
        self.find_note()
    }

    /// True if the symbol is a function defined inside the text section
    pub fn is_kernel_symbol(&self, symbol: &SymbolRef<'_>) -> bool {
        let Some(text) = &self.text else {
            return false;
        };
        symbol.is_function()
            && usize::from(symbol.section_index()) == text.index
            && text.contains_addr(symbol.value())
    }

    pub fn as_kernel_symbol(&self, symbol: SymbolRef<'data>) -> Result<KernelSymbol<'data>> {
        if self.is_kernel_symbol(&symbol) {
            Ok(KernelSymbol::new_unchecked(symbol))
        } else {
            Err(CodeObjectError::NotAKernel {
                name: symbol.name.to_string(),
            })
        }
    }

    /// Kernel symbols in symbol-table order
    pub fn kernels(&self) -> impl Iterator<Item = KernelSymbol<'data>> + '_ {
        let all = self.symbols.iter().flat_map(|table| table.symbols());
        Conditional::new(all, move |symbol: &SymbolRef<'data>| {
            self.is_kernel_symbol(symbol)
        })
        .map(KernelSymbol::new_unchecked)
    }

    /// First kernel symbol with this name, skipping same-named symbols
    /// that are not kernels
    pub fn kernel_by_name(&self, name: &str) -> Result<KernelSymbol<'data>> {
        self.kernels()
            .find(|kernel| kernel.name() == name)
            .ok_or_else(|| CodeObjectError::NotAKernel {
                name: name.to_string(),
            })
    }

    /// Sorted, deduplicated kernel start addresses
    pub fn kernel_markers(&self) -> &[u64] {
        &self.markers.starts
    }

    /// The code bytes belonging to a kernel, header included.
    ///
    /// A non-zero declared size gives `[value, value + size)`. A size of zero
    /// is taken to mean "unspecified": the kernel then runs up to the next
    /// kernel start, or to the end of the text section for the last kernel.
    /// This assumes kernels are laid out back to back. A zero-size kernel
    /// that shares its start with another kernel has no defined extent and
    /// yields [`CodeObjectError::AmbiguousKernelExtent`].
    pub fn kernel_code(&self, kernel: &KernelSymbol<'_>) -> Result<KernelCode<'data>> {
        let text = self.text_section()?;
        let bounds = text.addr()..text.addr().saturating_add(text.size());
        let start = kernel.value();

        let end = if kernel.size() != 0 {
            start.checked_add(kernel.size()).ok_or_else(|| {
                CodeObjectError::out_of_range(start, u64::MAX, bounds.clone())
            })?
        } else {
            if self.markers.is_shared(start) {
                warn!(kernel = kernel.name(), start, "Zero-size kernel shares its start");
                return Err(CodeObjectError::AmbiguousKernelExtent { offset: start });
            }
            self.markers.next_after(start).unwrap_or(bounds.end)
        };

        if start < bounds.start || end > bounds.end || start > end {
            debug!(kernel = kernel.name(), start, end, "Kernel extent outside text section");
            return Err(CodeObjectError::out_of_range(start, end, bounds));
        }

        // Bytes come from the section's own data, which is empty for NOBITS.
        let from = usize::try_from(start - bounds.start).ok();
        let to = usize::try_from(end - bounds.start).ok();
        from.zip(to)
            .and_then(|(from, to)| text.data.get(from..to))
            .map(|bytes| KernelCode { start, end, bytes })
            .ok_or_else(|| {
                debug!(kernel = kernel.name(), start, end, "Kernel code not backed by file data");
                CodeObjectError::out_of_range(start, end, bounds)
            })
    }

    /// The instructions of a kernel: its code with the kernel header skipped
    /// according to the header's entry byte offset.
    pub fn kernel_entry_code(&self, kernel: &KernelSymbol<'_>) -> Result<KernelCode<'data>> {
        let code = self.kernel_code(kernel)?;
        let header = KernelHeader::from_bytes(code.bytes).ok_or_else(|| {
            CodeObjectError::out_of_range(
                code.start,
                code.start.saturating_add(KERNEL_HEADER_SIZE as u64),
                code.range(),
            )
        })?;

        let entry = header.kernel_code_entry_byte_offset();
        let skip = u64::try_from(entry)
            .ok()
            .filter(|&skip| skip <= code.end - code.start)
            .ok_or_else(|| {
                CodeObjectError::out_of_range(
                    code.start.saturating_add_signed(entry),
                    code.end,
                    code.range(),
                )
            })?;

        Ok(KernelCode {
            start: code.start + skip,
            end: code.end,
            bytes: &code.bytes[skip as usize..],
        })
    }

    /// Serializable overview of versions, ISA, notes and kernels
    pub fn summary(&self) -> CodeObjectSummary {
        CodeObjectSummary::from_code_object(self)
    }
}
