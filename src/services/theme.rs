// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dark/light theme preference, persisted to a small file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const DARK: &str = "dark";
const LIGHT: &str = "light";

/// Theme preference errors.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("Failed to access theme file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Theme preference service.
#[derive(Debug)]
pub struct ThemeService {
    path: PathBuf,
    dark_mode: Mutex<bool>,
}

impl ThemeService {
    /// Load the stored preference, falling back to the system preference.
    pub fn load(path: impl Into<PathBuf>, prefers_dark: bool) -> Self {
        let path = path.into();
        let dark_mode = match read_stored(&path) {
            Ok(Some(dark)) => dark,
            Ok(None) => prefers_dark,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring stored theme preference");
                prefers_dark
            }
        };

        tracing::debug!(path = %path.display(), dark_mode, "Theme preference loaded");
        Self {
            path,
            dark_mode: Mutex::new(dark_mode),
        }
    }

    pub fn dark_mode(&self) -> bool {
        *self.dark_mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip the theme and persist it. Returns the new `dark_mode`.
    pub fn toggle(&self) -> bool {
        let mut dark_mode = self.dark_mode.lock().unwrap_or_else(PoisonError::into_inner);
        *dark_mode = !*dark_mode;

        if let Err(e) = persist(&self.path, *dark_mode) {
            tracing::warn!(error = %e, "Failed to persist theme preference");
        }
        *dark_mode
    }
}

/// Read the stored preference. `Ok(None)` if nothing is stored.
///
/// Only `dark` selects dark mode; any other non-empty value means light.
fn read_stored(path: &Path) -> Result<Option<bool>, ThemeError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ThemeError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match raw.trim() {
        "" => Ok(None),
        DARK => Ok(Some(true)),
        LIGHT => Ok(Some(false)),
        other => {
            tracing::debug!(value = other, "Stored theme is not dark, using light");
            Ok(Some(false))
        }
    }
}

fn persist(path: &Path, dark_mode: bool) -> Result<(), ThemeError> {
    let value = if dark_mode { DARK } else { LIGHT };
    fs::write(path, value).map_err(|source| ThemeError::Io {
        path: path.to_path_buf(),
        source,
    })
}
