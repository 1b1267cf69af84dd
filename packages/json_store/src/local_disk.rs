use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dotstore_core::{Error, Snapshot, Value};

/// A snapshot kept in a single JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSnapshot {
            path: path.into(),
            pretty: true,
        }
    }

    /// Pretty-print the snapshot (the default) or write it compactly.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("snapshot"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> Error {
        Error::Persist {
            location: self.location(),
            source,
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut f = fs::File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

/// Remove a leftover temporary file after a failed save.
fn discard_temp(temp_path: &Path) {
    if let Err(error) = fs::remove_file(temp_path) {
        tracing::debug!("Could not remove {}: {}", temp_path.display(), error);
    }
}

impl Snapshot for JsonFileSnapshot {
    fn load(&mut self) -> Result<Option<Value>, Error> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(error) => return Err(self.io_error(error)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        tracing::debug!("Reading {}...", self.path.display());
        let value: Value = serde_json::from_slice(&bytes)?;
        Ok(Some(value))
    }

    fn save(&mut self, root: &Value) -> Result<(), Error> {
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(root)?
        } else {
            serde_json::to_vec(root)?
        };
        bytes.push(b'\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let temp_path = self.temp_path();
        tracing::debug!("Writing {}...", self.path.display());
        let written = write_synced(&temp_path, &bytes)
            .and_then(|()| fs::rename(&temp_path, &self.path));

        if let Err(error) = written {
            discard_temp(&temp_path);
            return Err(self.io_error(error));
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
