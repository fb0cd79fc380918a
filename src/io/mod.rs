use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use tempfile::NamedTempFile;

pub mod json_writer;
pub mod meta;
pub mod summary;
pub mod tsv_writer;

const IO_BUF_CAPACITY: usize = 1 << 20; // 1 MiB

pub(crate) fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(file))
    }
}

/// Tab-delimited reader that tolerates ragged rows so callers can decide
/// per row whether a field-count mismatch is fatal.
pub(crate) fn tsv_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let source = open_maybe_gz(path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(source))
}

/// Mode given to freshly created outputs; the temp file starts out 0600.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Outputs written to temp files next to their targets and moved into place
/// together by [`StagedWrites::commit`]. Dropping without a commit removes
/// the temp files and leaves every target untouched.
#[derive(Default)]
pub struct StagedWrites {
    pending: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn stage<F>(&mut self, path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
    {
        if self.pending.iter().any(|(_, p)| p == path) {
            bail!("output {} staged twice", path.display());
        }
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        {
            let mut w = BufWriter::with_capacity(IO_BUF_CAPACITY, tmp.as_file_mut());
            fill(&mut w)?;
            w.flush()?;
        }
        set_output_permissions(&tmp, path)?;
        self.pending.push((tmp, path.to_path_buf()));
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        for (tmp, path) in self.pending {
            tmp.persist(&path)
                .with_context(|| format!("failed to move output into {}", path.display()))?;
        }
        Ok(())
    }
}

/// Writes `path` through a temp file in the same directory and only moves it
/// into place once `fill` succeeded.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let mut staged = StagedWrites::new();
    staged.stage(path, fill)?;
    staged.commit()
}

// An existing target keeps its mode; new files get OUTPUT_MODE.
#[cfg(unix)]
fn set_output_permissions(tmp: &NamedTempFile, target: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let perms = match std::fs::metadata(target) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => std::fs::Permissions::from_mode(OUTPUT_MODE),
    };
    tmp.as_file()
        .set_permissions(perms)
        .with_context(|| format!("failed to set permissions for {}", target.display()))
}

#[cfg(not(unix))]
fn set_output_permissions(_tmp: &NamedTempFile, _target: &Path) -> Result<()> {
    Ok(())
}
