use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::format::sniff_layer;
use crate::image::{Image, LayerRef, Manifest};
use crate::matcher::{PathMatch, member_name};

/// Kind of a planned member, with the staged copy for files.
#[derive(Debug)]
pub(crate) enum PlannedKind {
    File { staged: PathBuf },
    Directory,
}

/// One matched archive member together with its rewritten destination.
#[derive(Debug)]
pub(crate) struct PlannedMember {
    pub name: String,
    pub dest: PathBuf,
    pub kind: PlannedKind,
    pub mode: Option<u32>,
    pub size: u64,
}

/// The resolved member set for one request, staged but not yet committed.
///
/// File contents are spooled into a temporary staging directory while the
/// layer streams by; dropping the plan, on any path, removes the staging
/// directory again.
pub(crate) struct ExtractionPlan {
    _staging: tempfile::TempDir,
    pub members: Vec<PlannedMember>,
}

/// Search the manifest's layers newest-first and stage the first hit.
///
/// A layer shadows everything below it, so collection happens inside the hit
/// layer only and the search never continues into older layers.
pub(crate) fn resolve_request(
    image: &mut Image,
    manifest: &Manifest,
    matcher: &PathMatch,
) -> Result<ExtractionPlan> {
    for layer in manifest.layers.iter().rev() {
        tracing::debug!(layer = layer.as_str(), target = matcher.target(), "scanning layer");
        if let Some(plan) = scan_layer(image, layer, matcher)? {
            tracing::debug!(
                layer = layer.as_str(),
                members = plan.members.len(),
                "target found"
            );
            return Ok(plan);
        }
    }

    Err(Error::PathNotFound {
        src: matcher.target().to_string(),
    })
}

/// Stream the image archive up to one layer blob and examine that layer.
fn scan_layer(
    image: &mut Image,
    layer: &LayerRef,
    matcher: &PathMatch,
) -> Result<Option<ExtractionPlan>> {
    let wanted = layer.as_str().trim_start_matches("./");

    let mut archive = image.archive()?;
    for entry in archive.entries()? {
        let entry = entry?;
        if member_name(&entry.path()?) == wanted {
            let reader = sniff_layer(entry)?;
            return collect_members(tar::Archive::new(reader), matcher);
        }
    }

    Err(Error::CorruptManifest {
        reason: format!("layer '{layer}' not present in image"),
    })
}

/// Single pass over a layer: decide whether the target lives here and stage
/// every member under the match prefix.
fn collect_members<R: Read>(
    mut layer: tar::Archive<R>,
    matcher: &PathMatch,
) -> Result<Option<ExtractionPlan>> {
    let staging = tempfile::Builder::new().prefix("unlayer-").tempdir()?;
    let mut members = Vec::new();
    let mut hit = false;
    let mut index = 0usize;

    for entry in layer.entries()? {
        let mut entry = entry?;
        let name = member_name(&entry.path()?);
        if !matcher.matches(&name) {
            continue;
        }
        hit = true;

        let entry_type = entry.header().entry_type();
        let is_dir = entry_type.is_dir();
        let is_file = entry_type.is_file();
        if !is_dir && !is_file {
            // Symlinks, devices and the like cannot be extracted. Requested
            // directly that is an error; inside a matched tree they are
            // passed over silently.
            if !matcher.is_globbed() && name == matcher.target() {
                return Err(Error::InvalidMemberKind { name });
            }
            continue;
        }

        // A strict child implies the target is a directory even when the
        // layer carries no explicit entry for the directory itself.
        matcher.validate_dest(is_dir || name != matcher.target())?;

        let stripped = matcher.stripped(&name);
        if stripped.is_empty() {
            // The globbed directory itself; only its contents are wanted.
            continue;
        }
        let dest = matcher.destination(stripped);

        let size = entry.header().size().unwrap_or(0);
        let mode = entry.header().mode().ok();
        let kind = if is_file {
            let staged = staging.path().join(format!("member-{index}"));
            let mut out = File::create(&staged)?;
            io::copy(&mut entry, &mut out)?;
            PlannedKind::File { staged }
        } else {
            PlannedKind::Directory
        };

        members.push(PlannedMember {
            name,
            dest,
            kind,
            mode,
            size,
        });
        index += 1;
    }

    if !hit {
        return Ok(None);
    }
    Ok(Some(ExtractionPlan {
        _staging: staging,
        members,
    }))
}
