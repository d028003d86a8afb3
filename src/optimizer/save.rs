//! Staged writes of a saved directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::effective::{EffectiveConfig, EFFECTIVE_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::model::{Model, CONFIG_FILE, WEIGHTS_FILE};

const STAGING_PREFIX: &str = ".comprimir-";

/// Files making up a saved directory.
pub(crate) const SAVED_FILES: [&str; 3] = [CONFIG_FILE, WEIGHTS_FILE, EFFECTIVE_CONFIG_FILE];

fn parent_of(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write `model` and `config` into `dir`.
///
/// Everything is written to a staging directory beside `dir` first. A new
/// `dir` appears through one rename; an existing one has each file replaced
/// by rename. The staging directory is removed on every path out.
pub(crate) fn save_dir(model: &Model, config: &EffectiveConfig, dir: &Path) -> Result<()> {
    let parent = parent_of(dir);
    fs::create_dir_all(&parent)
        .map_err(|e| Error::io(format!("creating {}", parent.display()), e))?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)
        .map_err(|e| Error::io(format!("creating staging directory in {}", parent.display()), e))?;
    debug!(staging = %staging.path().display(), "staging saved files");

    model.write_to(staging.path())?;
    config.to_file(&staging.path().join(EFFECTIVE_CONFIG_FILE))?;

    if dir.exists() {
        if !dir.is_dir() {
            return Err(Error::io(
                format!("saving to {}", dir.display()),
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
            ));
        }
        for file in SAVED_FILES {
            fs::rename(staging.path().join(file), dir.join(file))
                .map_err(|e| Error::io(format!("replacing {}", dir.join(file).display()), e))?;
        }
    } else {
        fs::rename(staging.path(), dir)
            .map_err(|e| Error::io(format!("publishing {}", dir.display()), e))?;
    }
    info!(dir = %dir.display(), "saved optimized model");
    Ok(())
}
