//! Scanner fuzz target: feed arbitrary text (after a proto3 header) to the
//! scanner and renderer. They must not panic; errors are fine.
//! Build with: cargo fuzz run scanner_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let body = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let options = proto2ros::Options {
        import_root: Some(std::path::PathBuf::from("/nonexistent")),
        ..Default::default()
    };
    let target = proto2ros::EmitTarget::new(&options, "msg", "srv");
    let source = format!("syntax = \"proto3\";\n{}", body);
    let _ = proto2ros::render_str(&options, &source, &target);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run scanner_fuzz");
}
