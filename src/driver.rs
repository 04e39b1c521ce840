//! Writing compiled artifacts to disk

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::codegen::ClassFileDefinition;
use crate::common::config::Config;
use crate::common::error::Result;

/// Location of the class file for `qualified_name` under `destination`
/// (`a.b.C` -> `destination/a/b/C.class`)
pub fn class_file_path(destination: &Path, qualified_name: &str) -> PathBuf {
    let mut path = destination.to_path_buf();
    let mut segments = qualified_name.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{}.class", segment));
        }
    }
    path
}

/// Write every artifact under `config.destination_dir`, creating package
/// directories as needed. Returns the written paths in artifact order.
pub fn write_artifacts(config: &Config, artifacts: &[ClassFileDefinition]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = class_file_path(&config.destination_dir, artifact.name());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, artifact.bytecode())?;
        if config.verbose {
            info!("wrote {} ({} bytes)", path.display(), artifact.bytecode().len());
        } else {
            debug!("wrote {}", path.display());
        }
        written.push(path);
    }
    Ok(written)
}
