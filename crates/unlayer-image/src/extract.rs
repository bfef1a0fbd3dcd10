use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::matcher::PathMatch;
use crate::resolve::{ExtractionPlan, PlannedKind, PlannedMember};

/// Commit a staged plan to the filesystem, honoring the idempotency rules.
///
/// Globbed requests always re-extract. Without `force`, a single exact file
/// is skipped when its checksum already matches the destination, and a
/// multi-member plan is skipped wholesale as soon as any destination exists
/// as a file. Returns the destinations actually written; an empty list means
/// nothing changed.
pub(crate) fn extract_plan(
    plan: &ExtractionPlan,
    matcher: &PathMatch,
    force: bool,
) -> Result<Vec<PathBuf>> {
    let force = force || matcher.is_globbed();

    if !force && !plan.members.is_empty() {
        if plan.members.len() == 1 && !matcher.is_globbed() {
            if single_member_satisfied(&plan.members[0])? {
                return Ok(Vec::new());
            }
        } else if plan.members.iter().any(|m| m.dest.is_file()) {
            // Coarse directory-level check: a previous extraction left files
            // behind, treat the whole request as already satisfied.
            return Ok(Vec::new());
        }
    }

    let mut written = Vec::with_capacity(plan.members.len());
    let mut total_bytes = 0u64;
    for member in &plan.members {
        write_member(member)?;
        total_bytes += member.size;
        written.push(member.dest.clone());
    }

    // Directory modes go on last, deepest first: a write-protected directory
    // mode applied up front would block the writes below it.
    for member in plan.members.iter().rev() {
        if matches!(member.kind, PlannedKind::Directory) {
            restore_mode(&member.dest, member.mode)?;
        }
    }

    tracing::debug!(members = written.len(), total_bytes, "extraction committed");
    Ok(written)
}

/// Per-file idempotency check for an exact, non-globbed match.
///
/// An existing destination of the wrong kind cannot be compared against the
/// archive member and is reported rather than silently overwritten.
fn single_member_satisfied(member: &PlannedMember) -> Result<bool> {
    match &member.kind {
        PlannedKind::File { staged } => {
            if member.dest.is_dir() {
                return Err(Error::DestinationTypeMismatch {
                    dest: member.dest.clone(),
                });
            }
            if member.dest.is_file() {
                return Ok(file_digest(&member.dest)? == file_digest(staged)?);
            }
            Ok(false)
        }
        // Directories are idempotent by construction and always re-created,
        // unless something that is not a directory sits in the way.
        PlannedKind::Directory => {
            if member.dest.is_file() {
                return Err(Error::DestinationTypeMismatch {
                    dest: member.dest.clone(),
                });
            }
            Ok(false)
        }
    }
}

fn write_member(member: &PlannedMember) -> Result<()> {
    match &member.kind {
        PlannedKind::Directory => {
            fs::create_dir_all(&member.dest)?;
        }
        PlannedKind::File { staged } => {
            if let Some(parent) = member.dest.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::copy(staged, &member.dest)?;
            restore_mode(&member.dest, member.mode)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn restore_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restore_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

/// Stable content digest used for the idempotency comparison.
fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
