//! Scaffold a new kiln project.
//!
//! Core logic for the `kiln init` command: writes a starter `kiln.toml`
//! into the project directory and makes sure the store structure exists so
//! the first build starts from a known layout.

mod templates;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::consts::RECIPE_FILE_NAME;
use crate::platform::paths::store_dir;

pub use templates::KILN_TOML_TEMPLATE;

#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("invalid project name {0:?}: use letters, digits, `-` and `_`")]
  InvalidName(String),

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

pub struct InitOptions {
  /// Project directory to scaffold; created if missing.
  pub project_path: PathBuf,
  /// Project name. Defaults to the directory name.
  pub name: Option<String>,
}

#[derive(Debug)]
pub struct InitResult {
  pub project_dir: PathBuf,
  pub recipe_path: PathBuf,
  pub store_dir: PathBuf,
}

/// Scaffold a recipe and the store structure.
///
/// # Errors
///
/// Returns an error if a `kiln.toml` already exists, the name would not
/// survive a round trip through the recipe file, or directory creation
/// fails.
pub fn init(options: &InitOptions) -> Result<InitResult, InitError> {
  let project_dir = &options.project_path;

  // Created before canonicalizing; canonicalize requires an existing path
  fs::create_dir_all(project_dir).map_err(|e| InitError::CreateDir {
    path: project_dir.clone(),
    source: e,
  })?;

  let project_dir = dunce::canonicalize(project_dir).map_err(|e| InitError::Canonicalize {
    path: options.project_path.clone(),
    source: e,
  })?;

  let name = match &options.name {
    Some(name) => name.clone(),
    None => project_dir
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_else(|| "app".to_string()),
  };
  if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
    return Err(InitError::InvalidName(name));
  }

  let recipe_path = project_dir.join(RECIPE_FILE_NAME);
  if recipe_path.exists() {
    return Err(InitError::PathExists { path: recipe_path });
  }

  let store_dir = store_dir();
  let deps_dir = store_dir.join("deps");
  fs::create_dir_all(&deps_dir).map_err(|e| InitError::CreateDir {
    path: deps_dir,
    source: e,
  })?;

  let recipe_content = KILN_TOML_TEMPLATE.replace("{name}", &name);
  fs::write(&recipe_path, recipe_content).map_err(|e| InitError::WriteFile {
    path: recipe_path.clone(),
    source: e,
  })?;

  Ok(InitResult {
    project_dir,
    recipe_path,
    store_dir,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  fn with_temp_home<T>(temp: &TempDir, f: impl FnOnce() -> T) -> T {
    let data_dir = temp.path().join("data");
    temp_env::with_vars(
      [
        ("XDG_DATA_HOME", Some(data_dir.to_str().unwrap())),
        ("HOME", Some(temp.path().to_str().unwrap())),
      ],
      f,
    )
  }

  #[test]
  #[serial]
  fn init_scaffolds_recipe_and_store() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("svc");

    with_temp_home(&temp, || {
      let result = init(&InitOptions {
        project_path: project.clone(),
        name: None,
      })
      .unwrap();

      assert!(result.recipe_path.exists());
      assert!(result.store_dir.join("deps").exists());

      let content = std::fs::read_to_string(&result.recipe_path).unwrap();
      assert!(content.contains("name = \"svc\""));
      assert!(!content.contains("{name}"));
    });
  }

  #[test]
  #[serial]
  fn scaffolded_recipe_loads() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("svc");

    with_temp_home(&temp, || {
      let result = init(&InitOptions {
        project_path: project.clone(),
        name: Some("payments-api".to_string()),
      })
      .unwrap();

      let recipe = crate::recipe::Recipe::load(&result.project_dir).unwrap();
      assert_eq!(recipe.name, "payments-api");
      assert_eq!(recipe.runtime.port, 3000);
    });
  }

  #[test]
  #[serial]
  fn init_refuses_existing_recipe() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("svc");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join(RECIPE_FILE_NAME), "[project]\nname = \"old\"\n").unwrap();

    with_temp_home(&temp, || {
      let err = init(&InitOptions {
        project_path: project.clone(),
        name: None,
      })
      .unwrap_err();

      assert!(matches!(err, InitError::PathExists { .. }));
      // The existing recipe is untouched
      let content = std::fs::read_to_string(project.join(RECIPE_FILE_NAME)).unwrap();
      assert!(content.contains("old"));
    });
  }

  #[test]
  #[serial]
  fn name_that_would_break_the_recipe_is_rejected() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("svc");

    with_temp_home(&temp, || {
      let err = init(&InitOptions {
        project_path: project.clone(),
        name: Some("../evil".to_string()),
      })
      .unwrap_err();

      assert!(matches!(err, InitError::InvalidName(_)));
      assert!(!project.join(RECIPE_FILE_NAME).exists());
    });
  }

  #[test]
  #[serial]
  fn init_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("nested").join("deep").join("svc");

    with_temp_home(&temp, || {
      let result = init(&InitOptions {
        project_path: project.clone(),
        name: None,
      })
      .unwrap();

      assert!(result.recipe_path.exists());
    });
  }
}
