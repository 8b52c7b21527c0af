//! Runtime image metadata.
//!
//! An assembled image is a rootfs plus a `config.json` describing the
//! process contract: environment defaults, advertised port, and entry
//! point. The config shape follows the OCI image config so existing
//! tooling can consume it directly.

pub mod surface;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::CA_BUNDLE_ENV_VAR;
use crate::platform::Platform;

/// In-image location of the CA bundle, relative to the rootfs.
pub const CA_BUNDLE_INSTALL_PATH: &str = "etc/ssl/certs/ca-certificates.crt";

/// Host locations probed for a CA bundle when the recipe does not pin one.
pub const CA_BUNDLE_SEARCH_PATHS: &[&str] = &[
  "/etc/ssl/certs/ca-certificates.crt",
  "/etc/pki/tls/certs/ca-bundle.crt",
  "/etc/ssl/cert.pem",
];

/// Runtime contract for the assembled image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSpec {
  pub log_level: String,
  pub port: u16,
  pub install_dir: PathBuf,
  pub env: BTreeMap<String, String>,
  pub ca_bundle: Option<PathBuf>,
}

impl RuntimeSpec {
  /// Environment defaults baked into the image, sorted by name.
  ///
  /// `RUST_LOG` and `PORT` come from the dedicated recipe settings, which
  /// win over entries in the free-form env table. They stay plain defaults
  /// in the config, so a container runtime can override either at start
  /// without touching the rootfs.
  pub fn env_defaults(&self) -> Vec<String> {
    let mut vars = self.env.clone();
    vars.insert("RUST_LOG".to_string(), self.log_level.clone());
    vars.insert("PORT".to_string(), self.port.to_string());
    vars.into_iter().map(|(name, value)| format!("{name}={value}")).collect()
  }
}

/// Image configuration document written next to the rootfs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
  pub architecture: String,
  pub os: String,
  pub config: ProcessConfig,
}

/// The process block of the image config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
  #[serde(rename = "Env")]
  pub env: Vec<String>,

  /// Single argument-free entry point. There is no shell in the image, so
  /// this must be the binary itself.
  #[serde(rename = "Entrypoint")]
  pub entrypoint: Vec<String>,

  #[serde(rename = "ExposedPorts")]
  pub exposed_ports: BTreeMap<String, EmptyObject>,

  #[serde(rename = "WorkingDir")]
  pub working_dir: String,
}

/// Serializes as `{}`; the exposed-ports map is a set in the config format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

impl ImageConfig {
  pub fn new(platform: Platform, runtime: &RuntimeSpec, entry_point: &str) -> Self {
    let mut exposed_ports = BTreeMap::new();
    exposed_ports.insert(format!("{}/tcp", runtime.port), EmptyObject::default());

    Self {
      architecture: platform.arch.as_str().to_string(),
      os: platform.os.as_str().to_string(),
      config: ProcessConfig {
        env: runtime.env_defaults(),
        entrypoint: vec![entry_point.to_string()],
        exposed_ports,
        working_dir: "/".to_string(),
      },
    }
  }
}

/// No CA bundle could be located on the host.
#[derive(Debug, thiserror::Error)]
#[error("no CA bundle found; searched {searched:?}")]
pub struct CaBundleNotFound {
  pub searched: Vec<PathBuf>,
}

/// Locate the CA bundle to copy into the image.
///
/// Resolution order: the recipe's explicit path, then `KILN_CA_BUNDLE`,
/// then the well-known host locations. An explicit path that does not
/// exist is an error rather than a fall-through; a pinned-but-missing
/// bundle means the build host is not what the recipe expects.
pub fn resolve_ca_bundle(explicit: Option<&Path>) -> Result<PathBuf, CaBundleNotFound> {
  let mut searched = Vec::new();

  if let Some(path) = explicit {
    if path.is_file() {
      return Ok(path.to_path_buf());
    }
    searched.push(path.to_path_buf());
    return Err(CaBundleNotFound { searched });
  }

  if let Ok(env_path) = std::env::var(CA_BUNDLE_ENV_VAR) {
    let path = PathBuf::from(env_path);
    if path.is_file() {
      return Ok(path);
    }
    searched.push(path);
    return Err(CaBundleNotFound { searched });
  }

  for candidate in CA_BUNDLE_SEARCH_PATHS {
    let path = PathBuf::from(candidate);
    if path.is_file() {
      return Ok(path);
    }
    searched.push(path);
  }

  Err(CaBundleNotFound { searched })
}
