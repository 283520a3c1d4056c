use crate::common::{kernel_blob, local, two_kernel_code_object, CodeObjectBuilder};
use hsaco::formats::elf::{
    SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHN_UNDEF, SHT_NOBITS, SHT_PROGBITS, STT_FUNC,
};
use hsaco::{CodeObject, CodeObjectError};

/// Three zero-size kernels at 0x0, 0x40 and 0x80 in a 0xC0-byte text section
fn back_to_back() -> Vec<u8> {
    let mut builder = CodeObjectBuilder::new();
    let text = builder.text(0, vec![0x90; 0xC0]);
    builder.function("k0", 0x0, 0, text);
    builder.function("k1", 0x40, 0, text);
    builder.function("k2", 0x80, 0, text);
    builder.build()
}

#[test]
fn zero_size_kernels_run_to_next_marker() {
    let data = back_to_back();
    let co = CodeObject::parse(&data).unwrap();
    assert_eq!(co.kernel_markers(), &[0x0, 0x40, 0x80]);

    let ranges: Vec<_> = co
        .kernels()
        .map(|k| co.kernel_code(&k).unwrap().range())
        .collect();
    assert_eq!(ranges, vec![0x0..0x40, 0x40..0x80, 0x80..0xC0]);

    let last = co.kernel_by_name("k2").unwrap();
    assert_eq!(co.kernel_code(&last).unwrap().bytes.len(), 0x40);
}

#[test]
fn declared_size_gives_exact_extent() {
    let mut builder = CodeObjectBuilder::new();
    let text = builder.text(0, vec![0u8; 0x100]);
    builder.function("sized", 0x10, 0x20, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    let kernel = co.kernel_by_name("sized").unwrap();
    let code = co.kernel_code(&kernel).unwrap();
    assert_eq!((code.start, code.end), (0x10, 0x30));
    assert_eq!(code.bytes.len(), 0x20);
}

#[test]
fn declared_size_past_section_end_is_out_of_range() {
    let mut builder = CodeObjectBuilder::new();
    let text = builder.text(0, vec![0u8; 0x40]);
    builder.function("big", 0x10, 0x100, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    let kernel = co.kernel_by_name("big").unwrap();
    assert_eq!(
        co.kernel_code(&kernel).unwrap_err(),
        CodeObjectError::OutOfRange {
            start: 0x10,
            end: 0x110,
            bound_start: 0,
            bound_end: 0x40,
        }
    );
}

#[test]
fn kernel_header_must_fit_in_text_section() {
    let data = back_to_back();
    let co = CodeObject::parse(&data).unwrap();
    let kernel = co.kernel_by_name("k2").unwrap();

    assert_eq!(
        kernel.kernel_header(&co).unwrap_err(),
        CodeObjectError::OutOfRange {
            start: 0x80,
            end: 0x180,
            bound_start: 0,
            bound_end: 0xC0,
        }
    );
}

#[test]
fn kernel_header_fields_are_decoded() {
    let data = two_kernel_code_object();
    let co = CodeObject::parse(&data).unwrap();

    for kernel in co.kernels() {
        let header = kernel.kernel_header(&co).unwrap();
        assert_eq!((header.version_major(), header.version_minor()), (1, 1));
        assert_eq!(header.machine_kind(), 1);
        assert_eq!(header.machine_version(), (9, 0, 6));
        assert_eq!(header.kernel_code_entry_byte_offset(), 256);
    }
}

#[test]
fn kernel_header_uses_section_file_offset() {
    // Text loaded at a high address; the header is found through sh_offset.
    let mut builder = CodeObjectBuilder::new();
    let text = builder.text(0x7000_0000, kernel_blob(256, 4, 0xcc));
    builder.function("high", 0x7000_0000, 0, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    let kernel = co.kernel_by_name("high").unwrap();
    let header = kernel.kernel_header(&co).unwrap();
    assert_eq!(header.version_major(), 1);
    let code = co.kernel_entry_code(&kernel).unwrap();
    assert_eq!(code.bytes, &[0xcc; 4]);
    assert_eq!(code.start, 0x7000_0100);
}

#[test]
fn entry_code_skips_the_kernel_header() {
    let data = two_kernel_code_object();
    let co = CodeObject::parse(&data).unwrap();

    let alpha = co.kernel_by_name("alpha").unwrap();
    let code = co.kernel_entry_code(&alpha).unwrap();
    assert_eq!((code.start, code.end), (0x200, 0x220));
    assert!(code.bytes.iter().all(|&b| b == 0xaa));

    let beta = co.kernel_by_name("beta").unwrap();
    let code = co.kernel_entry_code(&beta).unwrap();
    assert_eq!((code.start, code.end), (0x320, 0x360));
    assert!(code.bytes.iter().all(|&b| b == 0xbb));
}

#[test]
fn entry_offset_outside_kernel_is_rejected() {
    let mut builder = CodeObjectBuilder::new();
    let mut text = kernel_blob(0x1000, 0x10, 0);
    text.extend(kernel_blob(-8, 0x10, 0));
    let text_index = builder.text(0, text);
    builder.function("far", 0, 0x110, text_index);
    builder.function("negative", 0x110, 0x110, text_index);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    for name in ["far", "negative"] {
        let kernel = co.kernel_by_name(name).unwrap();
        assert!(co.kernel_code(&kernel).is_ok());
        assert!(matches!(
            co.kernel_entry_code(&kernel),
            Err(CodeObjectError::OutOfRange { .. })
        ));
    }
}

#[test]
fn only_functions_inside_text_are_kernels() {
    let mut builder = CodeObjectBuilder::new();
    let data_index = builder.section(".data", SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, 0x1000, vec![0; 0x20]);
    let text = builder.text(0, vec![0; 0x100]);
    builder.object("table", 0x20, 8, text);
    builder.function("first", 0x0, 0, text);
    builder.function("in_data", 0x1000, 0, data_index);
    builder.function("external", 0, 0, SHN_UNDEF);
    builder.function("past_end", 0x100, 0, text);
    builder.symbol("helper", 0x80, 0, local(STT_FUNC), text);
    builder.function("second", 0x40, 0, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    let names: Vec<_> = co.kernels().map(|k| k.name()).collect();
    assert_eq!(names, vec!["first", "helper", "second"]);
    assert_eq!(co.kernel_markers(), &[0x0, 0x40, 0x80]);

    // Restarting yields the same sequence.
    let again: Vec<_> = co.kernels().map(|k| k.name()).collect();
    assert_eq!(names, again);

    // Extents come from sorted markers, not symbol-table order.
    let first = co.kernel_by_name("first").unwrap();
    assert_eq!(co.kernel_code(&first).unwrap().range(), 0x0..0x40);
    let helper = co.kernel_by_name("helper").unwrap();
    assert_eq!(co.kernel_code(&helper).unwrap().range(), 0x80..0x100);

    for name in ["table", "in_data", "external", "past_end"] {
        assert_eq!(
            co.kernel_by_name(name).unwrap_err(),
            CodeObjectError::NotAKernel {
                name: name.to_string()
            }
        );
    }
}

#[test]
fn as_kernel_symbol_checks_every_symbol() {
    let data = two_kernel_code_object();
    let co = CodeObject::parse(&data).unwrap();
    let table = co.symbol_table().unwrap();

    let kernels: Vec<_> = table
        .symbols()
        .filter_map(|symbol| co.as_kernel_symbol(symbol).ok())
        .map(|k| k.index())
        .collect();
    assert_eq!(kernels, vec![1, 2]);

    let null = table.by_index(0).unwrap();
    assert!(!co.is_kernel_symbol(&null));
    assert!(matches!(
        co.as_kernel_symbol(null),
        Err(CodeObjectError::NotAKernel { .. })
    ));
}

#[test]
fn zero_size_kernel_sharing_a_start_is_ambiguous() {
    let mut builder = CodeObjectBuilder::new();
    let text = builder.text(0, vec![0; 0xC0]);
    builder.function("a", 0x0, 0, text);
    builder.function("b", 0x40, 0, text);
    builder.function("b_alias", 0x40, 0, text);
    builder.function("b_sized", 0x40, 0x10, text);
    builder.function("c", 0x80, 0, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    assert_eq!(co.kernel_markers(), &[0x0, 0x40, 0x80]);
    assert_eq!(co.kernels().count(), 5);

    for name in ["b", "b_alias"] {
        let kernel = co.kernel_by_name(name).unwrap();
        assert_eq!(
            co.kernel_code(&kernel).unwrap_err(),
            CodeObjectError::AmbiguousKernelExtent { offset: 0x40 }
        );
    }

    let sized = co.kernel_by_name("b_sized").unwrap();
    assert_eq!(co.kernel_code(&sized).unwrap().range(), 0x40..0x50);
    let a = co.kernel_by_name("a").unwrap();
    assert_eq!(co.kernel_code(&a).unwrap().range(), 0x0..0x40);
    let c = co.kernel_by_name("c").unwrap();
    assert_eq!(co.kernel_code(&c).unwrap().range(), 0x80..0xC0);
}

#[test]
fn missing_symbol_table_means_no_kernels() {
    let mut builder = CodeObjectBuilder::new().symtab_name(None);
    builder.text(0, vec![0; 0x40]);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    assert!(co.symbol_table().is_none());
    assert_eq!(co.kernels().count(), 0);
    assert!(co.kernel_markers().is_empty());
    assert!(matches!(
        co.kernel_by_name("anything"),
        Err(CodeObjectError::NotAKernel { .. })
    ));
}

#[test]
fn dynamic_symbol_table_is_used_as_fallback() {
    let mut builder = CodeObjectBuilder::new().symtab_name(Some(".dynsym"));
    let text = builder.text(0, vec![0; 0x40]);
    builder.function("exported", 0, 0, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    let names: Vec<_> = co.kernels().map(|k| k.name()).collect();
    assert_eq!(names, vec!["exported"]);
}

#[test]
fn missing_text_section_yields_no_kernels() {
    let mut builder = CodeObjectBuilder::new();
    builder.function("orphan", 0, 0, 1);
    builder.note(Vec::new());
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    assert_eq!(co.kernels().count(), 0);
    assert_eq!(
        co.text_section().unwrap_err(),
        CodeObjectError::SectionNotFound(".text".to_string())
    );
}

#[test]
fn kernels_can_be_read_from_several_threads() {
    let data = back_to_back();
    let co = CodeObject::parse(&data).unwrap();

    let lengths: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    co.kernels()
                        .map(|k| co.kernel_code(&k).unwrap().bytes.len())
                        .sum::<usize>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(lengths, vec![0xC0; 4]);
}

#[test]
fn text_without_file_data_has_no_kernel_bytes() {
    // A NOBITS text section has a size but owns no bytes in the file, even
    // though a full kernel blob sits at its sh_offset.
    let mut builder = CodeObjectBuilder::new();
    let text = builder.section(
        ".text",
        SHT_NOBITS,
        SHF_ALLOC | SHF_EXECINSTR,
        0,
        kernel_blob(256, 0x40, 0xee),
    );
    builder.function("k", 0, 0, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    assert!(co.text_section().unwrap().data.is_empty());
    let kernel = co.kernel_by_name("k").unwrap();
    assert_eq!(
        co.kernel_code(&kernel).unwrap_err(),
        CodeObjectError::OutOfRange {
            start: 0,
            end: 0x140,
            bound_start: 0,
            bound_end: 0x140,
        }
    );
    assert_eq!(
        kernel.kernel_header(&co).unwrap_err(),
        CodeObjectError::OutOfRange {
            start: 0,
            end: 0x100,
            bound_start: 0,
            bound_end: 0x140,
        }
    );
    assert!(co.kernel_entry_code(&kernel).is_err());
}

#[test]
fn kernel_by_name_skips_same_named_non_kernels() {
    let mut builder = CodeObjectBuilder::new();
    let text = builder.text(0, vec![0; 0x40]);
    builder.function("dup", 0, 0, SHN_UNDEF);
    builder.object("dup", 0x10, 4, text);
    builder.function("dup", 0x20, 0x10, text);
    let data = builder.build();
    let co = CodeObject::parse(&data).unwrap();

    let kernel = co.kernel_by_name("dup").unwrap();
    assert_eq!(kernel.index(), 3);
    assert_eq!(co.kernel_code(&kernel).unwrap().range(), 0x20..0x30);
}
