#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(co) = hsaco::CodeObject::parse(data) else {
        return;
    };
    for kernel in co.kernels() {
        let _ = kernel.kernel_header(&co);
        let _ = co.kernel_entry_code(&kernel);
    }
    let _ = co.summary().to_json();
});
