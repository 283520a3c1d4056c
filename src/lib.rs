//! Reader for GPU code objects.
//!
//! A code object is an ELF64 little-endian image holding compiled kernels,
//! a `.note` section of self-describing metadata records and a symbol table
//! marking each kernel's entry point. [`CodeObject`] walks the notes lazily,
//! picks kernel symbols out of the symbol table and resolves each kernel's
//! header and code bytes, checking every read against the buffer.
//!
//! ```no_run
//! use hsaco::io::{IOLimits, SafeReader};
//! use hsaco::CodeObjectConfig;
//!
//! let reader = SafeReader::open("kernels.hsaco", IOLimits::default())?;
//! let code_object = reader.code_object(&CodeObjectConfig::default())?;
//! for kernel in code_object.kernels() {
//!     let code = code_object.kernel_code(&kernel)?;
//!     println!("{} {:#x}..{:#x}", kernel.name(), code.start, code.end);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod code_object;
pub mod config;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;

pub use code_object::{
    CodeObject, CodeObjectSummary, CodeObjectVersion, IsaDescriptor, KernelCode, KernelHeader,
    KernelSymbol, NoteRecord, NoteType, Notes, RecordCursor,
};
pub use config::CodeObjectConfig;
pub use error::{CodeObjectError, Result};
