//! Asset discovery.

use std::env;
use std::path::{Path, PathBuf};

use atoll_world::render::AssetStore;
use tracing::{info, warn};

/// Name of the asset directory.
const ASSETS_DIR: &str = "assets";

/// First of `candidates` holding an asset directory.
fn first_assets_dir<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .map(|dir| dir.join(ASSETS_DIR))
        .find(|dir| dir.is_dir())
}

/// Finds `assets/` in the working directory or next to the executable.
pub fn find_assets_dir() -> Option<PathBuf> {
    let cwd = env::current_dir().ok();
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    first_assets_dir(cwd.iter().chain(exe_dir.iter()).map(PathBuf::as_path))
}

/// Loads textures from `dir`, or generates them when there is no usable
/// asset directory.
pub fn load_textures(dir: Option<&Path>) -> AssetStore {
    let Some(dir) = dir else {
        info!("No asset directory found, using generated textures");
        return AssetStore::generated();
    };
    match AssetStore::load(dir) {
        Ok(store) => store,
        Err(e) => {
            warn!("Failed to load assets from {}: {e}", dir.display());
            AssetStore::generated()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_first_existing_dir_wins() {
        let empty = tempfile::tempdir().unwrap();
        let with_assets = tempfile::tempdir().unwrap();
        fs::create_dir(with_assets.path().join(ASSETS_DIR)).unwrap();

        let found = first_assets_dir([empty.path(), with_assets.path()]);
        assert_eq!(found, Some(with_assets.path().join(ASSETS_DIR)));
        assert_eq!(first_assets_dir([empty.path()]), None);
    }

    #[test]
    fn test_empty_dir_uses_generated_palette() {
        let dir = tempfile::tempdir().unwrap();
        let store = load_textures(Some(dir.path()));
        assert!(!store.is_empty());
        assert_eq!(store.len(), AssetStore::generated().len());
    }
}
