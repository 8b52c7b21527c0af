//! Template content written by `kiln init`.

/// Starter recipe. `{name}` is substituted with the project name; the
/// commented keys document the defaults they would override.
pub const KILN_TOML_TEMPLATE: &str = r#"[project]
name = "{name}"
# source = "."
# manifest = "Cargo.toml"
# lock = "Cargo.lock"

[builder]
# command = "cargo"
# args = ["build", "--release", "--locked"]
# artifact = "target/release/{name}"

[runtime]
log_level = "info"
port = 3000
# install_dir = "/usr/local/bin"
# ca_bundle = "/etc/ssl/certs/ca-certificates.crt"

[image]
# output = "image"
"#;
