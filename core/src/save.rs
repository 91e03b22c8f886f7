//! Persistence of battery-backed cartridge memory.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use failure::{Error, Fail, ResultExt};

use crate::log::*;


/// Somewhere the battery-backed memory of a cartridge is kept between
/// sessions.
pub trait SaveStore {
    /// Fills `region` with the saved data and returns `true`. If there is no
    /// save yet, `region` is left untouched and `false` is returned.
    fn load(&mut self, region: &mut [u8]) -> Result<bool, Error>;

    /// Replaces the saved data with `region`.
    fn save(&mut self, region: &[u8]) -> Result<(), Error>;
}

#[derive(Debug, Fail)]
pub enum SaveError {
    #[fail(
        display = "save file '{}' has {} bytes, but the cartridge needs exactly {}",
        path,
        actual,
        expected
    )]
    WrongSize {
        path: String,
        actual: usize,
        expected: usize,
    },
}

/// A save file on disk.
#[derive(Debug, Clone)]
pub struct FileSave {
    path: PathBuf,
}

impl FileSave {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileSave {
    fn load(&mut self, region: &mut [u8]) -> Result<bool, Error> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                info!("[save] no save file at '{}'", self.path.display());
                return Ok(false);
            }
            Err(e) => {
                return Err(e.context(format!(
                    "failed to read save file '{}'",
                    self.path.display(),
                )).into());
            }
        };

        if data.len() != region.len() {
            return Err(SaveError::WrongSize {
                path: self.path.display().to_string(),
                actual: data.len(),
                expected: region.len(),
            }.into());
        }

        region.copy_from_slice(&data);
        info!("[save] loaded '{}'", self.path.display());
        Ok(true)
    }

    fn save(&mut self, region: &[u8]) -> Result<(), Error> {
        fs::write(&self.path, region)
            .context(format!("failed to write save file '{}'", self.path.display()))?;
        info!("[save] wrote {} bytes to '{}'", region.len(), self.path.display());
        Ok(())
    }
}
