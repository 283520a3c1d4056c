//! Serializable overview of a code object

use crate::code_object::notes::{display_name, CodeObjectVersion, NoteType};
use crate::code_object::CodeObject;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeObjectSummary {
    pub machine: u16,
    pub version: Option<CodeObjectVersion>,
    pub isa: Option<IsaSummary>,
    pub notes: Vec<NoteSummary>,
    pub kernels: Vec<KernelSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsaSummary {
    pub vendor: String,
    pub architecture: String,
    pub major: u32,
    pub minor: u32,
    pub stepping: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub note_type: NoteType,
    pub name: String,
    pub desc_size: u32,
    /// Raw descriptor, hex encoded, for notes without a known layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSummary {
    pub name: String,
    pub value: u64,
    pub declared_size: u64,
    pub code_start: Option<u64>,
    pub code_end: Option<u64>,
    pub header_version: Option<(u32, u32)>,
    /// Why the extent or header could not be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CodeObjectSummary {
    pub(crate) fn from_code_object(code_object: &CodeObject<'_>) -> Self {
        let notes = code_object
            .notes()
            .map(|notes| {
                notes
                    .map(|note| NoteSummary {
                        note_type: note.note_type(),
                        name: display_name(note.name()),
                        desc_size: note.desc_size,
                        desc_hex: matches!(note.note_type(), NoteType::Other(_))
                            .then(|| hex::encode(note.desc())),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let isa = code_object.isa().ok().flatten().and_then(|isa| {
            Some(IsaSummary {
                vendor: display_name(isa.vendor_name().ok()?),
                architecture: display_name(isa.architecture_name().ok()?),
                major: isa.major,
                minor: isa.minor,
                stepping: isa.stepping,
            })
        });

        let kernels = code_object
            .kernels()
            .map(|kernel| {
                let code = code_object.kernel_code(&kernel);
                let header = kernel.kernel_header(code_object);
                let error = match (&code, &header) {
                    (Err(e), _) | (_, Err(e)) => Some(e.to_string()),
                    _ => None,
                };
                KernelSummary {
                    name: kernel.name().to_string(),
                    value: kernel.value(),
                    declared_size: kernel.size(),
                    code_start: code.as_ref().ok().map(|c| c.start),
                    code_end: code.as_ref().ok().map(|c| c.end),
                    header_version: header
                        .ok()
                        .map(|h| (h.version_major(), h.version_minor())),
                    error,
                }
            })
            .collect();

        Self {
            machine: code_object.header().e_machine,
            version: code_object.code_object_version().ok().flatten(),
            isa,
            notes,
            kernels,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
