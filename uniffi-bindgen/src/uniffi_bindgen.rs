//! Generates the Swift and Kotlin bindings for `accesskit-core`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
