//! Output file housekeeping done before a role node runs.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::NodeError;

/// Delete output files left over from a previous run.
///
/// A file that does not exist is skipped. Returns how many were removed.
pub fn clear_stale_outputs<P: AsRef<Path>>(paths: &[P]) -> Result<usize, NodeError> {
    let mut removed = 0;
    for path in paths {
        let path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed stale output");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(NodeError::Output {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(removed)
}

/// Create the output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<(), NodeError> {
    std::fs::create_dir_all(dir).map_err(|source| NodeError::Output {
        path: dir.to_path_buf(),
        source,
    })
}
