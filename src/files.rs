//! Local file helpers: digests and packaged data-file lookup.

use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

/// Environment variable with extra data-file search directories.
pub const TOOLKIT_PATH_ENV: &str = "VCD_TOOLKIT_PATH";

/// Directory data files are installed under.
pub const DATA_DIR: &str = "vcd_toolkit_scripts";

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Hex SHA-256 of a file, read in 64 KiB chunks.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, thiserror::Error)]
pub enum DataFileError {
    #[error("data file '{name}' not found (searched {} locations)", .searched.len())]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Finds data files shipped alongside the toolkit.
///
/// For each base directory, in order, looks for
/// `<base>/vcd_toolkit_scripts/<name>`, `<base>/<name>` and
/// `<base>/scripts/<name>`.
#[derive(Debug, Clone, Default)]
pub struct DataFileLocator {
    bases: Vec<PathBuf>,
}

impl DataFileLocator {
    pub fn new(bases: Vec<PathBuf>) -> Self {
        Self { bases }
    }

    /// The working directory followed by the entries of
    /// `VCD_TOOLKIT_PATH`.
    pub fn from_env() -> Self {
        let mut bases: Vec<PathBuf> = env::current_dir().into_iter().collect();
        if let Some(extra) = env::var_os(TOOLKIT_PATH_ENV) {
            bases.extend(env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
        }
        Self { bases }
    }

    /// Append a search directory.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }

    /// Every path tried for `name`, in search order.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.bases
            .iter()
            .flat_map(|base| {
                [
                    base.join(DATA_DIR).join(name),
                    base.join(name),
                    base.join("scripts").join(name),
                ]
            })
            .collect()
    }

    /// Path of the first existing candidate.
    pub fn locate(&self, name: &str) -> Result<PathBuf, DataFileError> {
        let candidates = self.candidates(name);
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => {
                debug!(name, path = %path.display(), "located data file");
                Ok(path.clone())
            }
            None => Err(DataFileError::NotFound {
                name: name.to_string(),
                searched: candidates,
            }),
        }
    }

    /// Contents of the first existing candidate.
    pub fn read(&self, name: &str) -> Result<String, DataFileError> {
        let path = self.locate(name)?;
        std::fs::read_to_string(&path).map_err(|source| DataFileError::Io { path, source })
    }
}
