use std::fs;
use std::path::Path;

use xbl_core::{TokenFile, TokenStore};

use crate::error::AuthError;

/// Load a token store from `path`.
///
/// Best effort: a missing, unreadable, or corrupt file yields `None` with a
/// warning, so callers fall back to signing in.
#[must_use]
pub fn load(path: &Path) -> Option<TokenStore> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no token file");
            return None;
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to read token file");
            return None;
        }
    };

    match TokenFile::from_json(&contents) {
        Ok(file) => Some(TokenStore::from_file(file)),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "ignoring corrupt token file");
            None
        }
    }
}

/// Write `store` to `path` as indented JSON, creating parent directories.
///
/// On Unix the file is made `0600` and a created parent `0700`.
///
/// # Errors
///
/// Returns `AuthError::TokenStore` if the file cannot be serialized, written,
/// or restricted.
pub fn save(path: &Path, store: &TokenStore) -> Result<(), AuthError> {
    let json = store
        .to_file()
        .to_json_pretty()
        .map_err(|e| AuthError::TokenStore(format!("serialize tokens: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::TokenStore(format!("mkdir {}: {e}", parent.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
    }

    fs::write(path, json)
        .map_err(|e| AuthError::TokenStore(format!("write {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| AuthError::TokenStore(format!("chmod {}: {e}", path.display())))?;
    }

    tracing::debug!(path = %path.display(), "saved tokens");
    Ok(())
}

/// Remove the token file. A missing file is not an error.
///
/// # Errors
///
/// Returns `AuthError::TokenStore` if the file exists but cannot be removed.
pub fn delete(path: &Path) -> Result<(), AuthError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(AuthError::TokenStore(format!(
            "failed to delete {}: {error}",
            path.display()
        ))),
    }
}
