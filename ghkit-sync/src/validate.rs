//! Identifier checks run before any remote call.

use ghkit_core::{Owner, ProjectNumber};

use crate::error::SyncError;

/// Logins become directory names and query variables: non-empty, no path
/// separators, no whitespace.
pub fn login(login: &str) -> Result<(), SyncError> {
    if login.trim().is_empty() {
        return Err(SyncError::Usage("workspace login is required".to_string()));
    }
    let path_like = login.contains(['/', '\\']) || login.starts_with('.');
    if path_like || login.chars().any(char::is_whitespace) {
        return Err(SyncError::Usage(format!("invalid workspace login '{login}'")));
    }
    Ok(())
}

pub fn owner(owner: &Owner) -> Result<(), SyncError> {
    login(&owner.login)
}

pub fn project_number(number: ProjectNumber) -> Result<(), SyncError> {
    if number.0 == 0 {
        return Err(SyncError::Usage("project numbers start at 1".to_string()));
    }
    Ok(())
}

/// Bare repository name, not `owner/name`.
pub fn repository_name(name: &str) -> Result<(), SyncError> {
    if name.trim().is_empty() {
        return Err(SyncError::Usage("repository name is required".to_string()));
    }
    if name.contains('/') {
        return Err(SyncError::Usage(format!(
            "repository '{name}' must be a bare name without the owner prefix"
        )));
    }
    Ok(())
}
