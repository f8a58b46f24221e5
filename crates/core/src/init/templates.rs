//! Template files embedded into the binary.
//!
//! With the `debug-embed` feature the files are still compiled in for debug
//! builds, so `gprompt init` behaves the same however it was built.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/templates"]
pub struct TemplateAssets;

/// Template content by path relative to the templates root, e.g. `config.toml`.
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}
