use log::{info, warn};
use rand::Rng;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Prepares the spool directory, dropping copies left behind by failed uploads.
pub fn init_temp_dir(temp_path: &Path) -> io::Result<()> {
    if temp_path.exists() {
        info!("Clearing temp directory {}...", temp_path.display());
        for entry in fs::read_dir(temp_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(path)?;
            } else {
                fs::remove_file(path)?;
            }
        }
    } else {
        fs::create_dir_all(temp_path)?;
    }
    info!("Temp directory ready");
    Ok(())
}

/// Random spool path that keeps the extension of `original_filename`.
pub fn temp_path_for(temp_dir: &Path, original_filename: &str) -> PathBuf {
    let mut rng = rand::rng();
    let token: u64 = rng.random();
    let stem = format!("upload_{:016x}", token);

    match extension_of(original_filename) {
        Some(ext) => temp_dir.join(format!("{}.{}", stem, ext)),
        None => temp_dir.join(stem),
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

pub async fn remove_temp_file(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Temp file already gone: {}", path.display());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
