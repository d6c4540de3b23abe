use anyhow::{Context, Result};
use glob::Pattern;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Absolute form with `.`/`..` and symlinks resolved, so different spellings of
/// one file compare equal. Falls back to the path as given when it cannot be resolved.
pub fn canonical_path(path: &Path) -> PathBuf {
    match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Cannot resolve {}: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}

fn name_matches(pattern: &Pattern, path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.matches(name))
}

/// Files under `roots` whose name matches `pattern`, canonicalized, sorted and
/// deduplicated.
///
/// A root that cannot be accessed aborts discovery; unreadable entries below a
/// root are logged and skipped.
pub fn discover_files(roots: &[PathBuf], pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern =
        Pattern::new(pattern).with_context(|| format!("Invalid file pattern: {}", pattern))?;
    let mut files = Vec::new();

    for root in roots {
        let metadata = fs::metadata(root)
            .with_context(|| format!("Cannot access root directory: {}", root.display()))?;
        if metadata.is_file() {
            if name_matches(&pattern, root) {
                files.push(canonical_path(root));
            }
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && name_matches(&pattern, entry.path()) {
                files.push(canonical_path(entry.path()));
            }
        }
    }

    // Overlapping roots reach the same file more than once.
    files.sort();
    files.dedup();
    debug!("Discovered {} file(s) matching {}", files.len(), pattern);
    Ok(files)
}
