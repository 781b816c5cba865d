//! Deterministic local save paths for wallpaper files.

use std::path::{Path, PathBuf};

use url::Url;

/// Prefix the file host puts in front of every wallpaper file name.
pub const FILENAME_PREFIX: &str = "wallhaven-";

/// Computes where the file at `remote_path` is saved under `base_dir`.
///
/// The shard directory is the first two characters of the file name once the
/// [`FILENAME_PREFIX`] is stripped; the file keeps its remote name:
/// `https://host/full/ab/wallhaven-abc123.jpg` saves to
/// `<base_dir>/ab/wallhaven-abc123.jpg`.
///
/// Returns `None` when no usable file name can be extracted.
#[must_use]
pub fn save_path(base_dir: &Path, remote_path: &str) -> Option<PathBuf> {
    let basename = remote_basename(remote_path)?;
    let stripped = basename.strip_prefix(FILENAME_PREFIX).unwrap_or(&basename);
    let shard: String = stripped.chars().take(2).collect();
    if shard.is_empty() || shard == "." || shard == ".." {
        return None;
    }
    Some(base_dir.join(shard).join(&basename))
}

fn remote_basename(remote_path: &str) -> Option<String> {
    let last = match Url::parse(remote_path) {
        Ok(url) => url.path_segments()?.next_back()?.to_string(),
        Err(_) => remote_path
            .rsplit('/')
            .next()?
            .split(['?', '#'])
            .next()?
            .to_string(),
    };
    let valid = !last.is_empty() && last != "." && last != ".." && !last.contains('\\');
    valid.then_some(last)
}
