use std::path::Path;

use crate::error::Result;
use crate::extract::extract_plan;
use crate::image::{Image, Manifest};
use crate::matcher::PathMatch;
use crate::ownership::set_ownership;
use crate::request::{ExtractOutcome, ExtractRequest, SessionReport};
use crate::resolve::resolve_request;

/// One extraction session against one opened image.
///
/// Owns the image handle and its parsed manifest for its whole lifetime;
/// both are released when the session drops, on success and failure alike.
/// Requests are served strictly one after another, and each request re-scans
/// the layers on its own since different sources may hit different layers.
pub struct ExtractSession {
    image: Image,
    manifest: Manifest,
}

impl ExtractSession {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut image = Image::open(path.as_ref())?;
        let manifest = image.read_manifest()?;
        tracing::debug!(
            image = %image.path().display(),
            layers = manifest.layers.len(),
            "session opened"
        );
        Ok(Self { image, manifest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resolve and extract a single request, then apply ownership to
    /// everything that was written.
    pub fn extract(&mut self, request: &ExtractRequest) -> Result<ExtractOutcome> {
        let matcher = PathMatch::new(&request.src, request.dest.as_deref());
        let plan = resolve_request(&mut self.image, &self.manifest, &matcher)?;
        let extracted = extract_plan(&plan, &matcher, request.force)?;

        set_ownership(
            &extracted,
            request.owner.as_deref(),
            request.group.as_deref(),
        )?;

        tracing::info!(
            src = %request.src,
            extracted = extracted.len(),
            "request finished"
        );
        Ok(ExtractOutcome {
            changed: !extracted.is_empty(),
            extracted,
        })
    }

    /// Run a batch of requests in order, aggregating their results.
    ///
    /// A failing request aborts the batch; paths written by earlier requests
    /// stay in place, there is no cross-request rollback.
    pub fn run(&mut self, requests: &[ExtractRequest]) -> Result<SessionReport> {
        let mut extracted = Vec::new();
        for request in requests {
            let outcome = self.extract(request)?;
            extracted.extend(outcome.extracted);
        }
        Ok(SessionReport {
            changed: !extracted.is_empty(),
            extracted,
        })
    }
}
