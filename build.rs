// Build script to ensure Cargo rebuilds when embedded assets change.
// rust-embed embeds the stylesheet, the list script and the page templates at
// compile time, but Cargo's incremental compilation may not notice edits to
// those files on its own.

fn main() {
    println!("cargo:rerun-if-changed=src/assets/");
    println!("cargo:rerun-if-changed=templates/");
}
