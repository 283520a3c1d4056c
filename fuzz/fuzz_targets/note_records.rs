#![no_main]
use hsaco::code_object::{CodeObjectVersion, IsaDescriptor, Notes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for note in Notes::new(data) {
        let _ = note.interpret::<CodeObjectVersion>();
        if let Ok(isa) = note.interpret::<IsaDescriptor>() {
            let _ = isa.vendor_name();
            let _ = isa.architecture_name();
        }
    }
});
