use crate::common::{note_record, two_kernel_code_object, version_note, CodeObjectBuilder};
use hsaco::code_object::summary::KernelSummary;
use hsaco::{CodeObject, CodeObjectSummary, CodeObjectVersion, NoteType};

#[test]
fn summary_covers_notes_and_kernels() {
    let data = two_kernel_code_object();
    let co = CodeObject::parse(&data).unwrap();
    let summary = co.summary();

    assert_eq!(summary.machine, 224);
    assert_eq!(summary.version, Some(CodeObjectVersion { major: 2, minor: 1 }));

    let isa = summary.isa.as_ref().unwrap();
    assert_eq!(isa.vendor, "AMD");
    assert_eq!(isa.architecture, "AMDGPU");
    assert_eq!((isa.major, isa.minor, isa.stepping), (9, 0, 6));

    assert_eq!(summary.notes.len(), 2);
    assert!(summary.notes.iter().all(|n| n.desc_hex.is_none()));

    assert_eq!(
        summary.kernels,
        vec![
            KernelSummary {
                name: "alpha".to_string(),
                value: 0x100,
                declared_size: 0x120,
                code_start: Some(0x100),
                code_end: Some(0x220),
                header_version: Some((1, 1)),
                error: None,
            },
            KernelSummary {
                name: "beta".to_string(),
                value: 0x220,
                declared_size: 0,
                code_start: Some(0x220),
                code_end: Some(0x360),
                header_version: Some((1, 1)),
                error: None,
            },
        ]
    );
}

#[test]
fn summary_records_unresolved_kernels() {
    let mut builder = CodeObjectBuilder::new();
    let mut notes = version_note(1, 0);
    notes.extend(note_record(b"X\0", 9, &[0xde, 0xad]));
    builder.note(notes);
    let text = builder.text(0, vec![0; 0x80]);
    builder.function("a", 0x40, 0, text);
    builder.function("b", 0x40, 0, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();
    let summary = co.summary();

    assert_eq!(summary.isa, None);
    assert_eq!(summary.notes[1].note_type, NoteType::Other(9));
    assert_eq!(summary.notes[1].desc_hex.as_deref(), Some("dead"));

    for kernel in &summary.kernels {
        assert_eq!(kernel.code_start, None);
        let error = kernel.error.as_deref().unwrap();
        assert!(error.contains("ambiguous"), "{error}");
    }
}

#[test]
fn summary_json_round_trips() {
    let data = two_kernel_code_object();
    let co = CodeObject::parse(&data).unwrap();
    let summary = co.summary();

    let json = summary.to_json().unwrap();
    assert!(json.contains("\"name\": \"alpha\""));
    assert!(json.contains("\"architecture\": \"AMDGPU\""));
    assert!(!json.contains("desc_hex"));

    let parsed: CodeObjectSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, summary);
}
