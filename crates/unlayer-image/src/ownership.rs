use std::path::PathBuf;

use crate::error::{Error, Result};

/// Apply symbolic owner/group names to a list of extracted paths.
///
/// Names are resolved against the local identity database once, then applied
/// to every path without following symlinks, so a symlink's own ownership
/// changes rather than its target's. With neither name set this is a no-op
/// and touches nothing.
pub fn set_ownership(paths: &[PathBuf], owner: Option<&str>, group: Option<&str>) -> Result<()> {
    if owner.is_none() && group.is_none() {
        return Ok(());
    }
    apply(paths, owner, group)
}

#[cfg(unix)]
fn apply(paths: &[PathBuf], owner: Option<&str>, group: Option<&str>) -> Result<()> {
    let uid = owner.map(resolve_uid).transpose()?;
    let gid = group.map(resolve_gid).transpose()?;

    for path in paths {
        std::os::unix::fs::lchown(path, uid, gid).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                Error::PermissionDenied { path: path.clone() }
            } else {
                Error::Io(e)
            }
        })?;
        tracing::trace!(path = %path.display(), uid, gid, "ownership applied");
    }
    Ok(())
}

#[cfg(unix)]
fn resolve_uid(name: &str) -> Result<u32> {
    nix::unistd::User::from_name(name)
        .map_err(|e| Error::Io(std::io::Error::from_raw_os_error(e as i32)))?
        .map(|user| user.uid.as_raw())
        .ok_or_else(|| Error::UnknownOwner(name.to_string()))
}

#[cfg(unix)]
fn resolve_gid(name: &str) -> Result<u32> {
    nix::unistd::Group::from_name(name)
        .map_err(|e| Error::Io(std::io::Error::from_raw_os_error(e as i32)))?
        .map(|grp| grp.gid.as_raw())
        .ok_or_else(|| Error::UnknownGroup(name.to_string()))
}

#[cfg(not(unix))]
fn apply(_paths: &[PathBuf], _owner: Option<&str>, _group: Option<&str>) -> Result<()> {
    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "ownership changes are only supported on unix",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_without_owner_and_group() {
        // Paths do not even need to exist when nothing is to be changed.
        let paths = vec![PathBuf::from("/nonexistent/one"), PathBuf::from("/nonexistent/two")];
        assert!(set_ownership(&paths, None, None).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn unknown_owner_is_reported() {
        let result = set_ownership(&[], Some("no-such-user-unlayer"), None);
        assert!(matches!(result, Err(Error::UnknownOwner(_))));
    }

    #[cfg(unix)]
    #[test]
    fn unknown_group_is_reported() {
        let result = set_ownership(&[], None, Some("no-such-group-unlayer"));
        assert!(matches!(result, Err(Error::UnknownGroup(_))));
    }

    #[cfg(unix)]
    #[test]
    fn root_owner_resolves() {
        // Resolution succeeds even with an empty path list, no chown occurs.
        assert!(set_ownership(&[], Some("root"), None).is_ok());
    }
}
