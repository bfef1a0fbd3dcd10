use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Normalize a tar entry path into the name form used for matching.
///
/// Drops a `./` prefix and any trailing separator, so `./usr/lib/` and
/// `usr/lib` compare equal.
pub(crate) fn member_name(path: &Path) -> String {
    let name = path.to_string_lossy();
    let name = name.strip_prefix("./").unwrap_or(&name);
    name.trim_end_matches('/').to_string()
}

/// A normalized extraction source: what to look for in a layer and where
/// each matched member lands on the local filesystem.
///
/// Archive member names never carry a leading separator, so one is stripped
/// from the requested source. A trailing `/*` turns the request into a glob
/// over the directory's contents and implies `force`.
#[derive(Clone, Debug)]
pub struct PathMatch {
    target: String,
    strip: usize,
    globbed: bool,
    dest: Option<PathBuf>,
}

impl PathMatch {
    pub fn new(src: &str, dest: Option<&Path>) -> Self {
        let mut src = src.strip_prefix('/').unwrap_or(src).to_string();

        let globbed = src.ends_with("/*");
        if globbed {
            src.truncate(src.len() - 2);
        }
        while src.ends_with('/') {
            src.pop();
        }

        // Globbed requests strip the whole target prefix; exact requests keep
        // the basename and strip only the leading directories.
        let strip = if globbed {
            src.len()
        } else {
            src.rfind('/').unwrap_or(0)
        };

        Self {
            target: src,
            strip,
            globbed,
            dest: dest.map(Path::to_path_buf),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_globbed(&self) -> bool {
        self.globbed
    }

    /// Whether a member name falls under this match: the target itself or
    /// anything below it. `usr/lib` matches `usr/lib/os-release` but never
    /// the sibling `usr/lib64`.
    pub fn matches(&self, name: &str) -> bool {
        match name.strip_prefix(self.target.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }

    /// Member name with the match prefix removed.
    pub fn stripped<'a>(&self, name: &'a str) -> &'a str {
        name[self.strip..].trim_start_matches('/')
    }

    /// Destination path for a matched member, after prefix stripping.
    ///
    /// Without a destination the member lands relative to the working
    /// directory; an existing directory destination is joined with the
    /// stripped name; anything else replaces the member name wholesale.
    pub fn destination(&self, stripped: &str) -> PathBuf {
        match &self.dest {
            None => PathBuf::from(stripped),
            Some(dest) if dest.is_dir() => dest.join(stripped),
            Some(dest) => dest.clone(),
        }
    }

    /// Globbed and directory extractions write multiple entries, so their
    /// destination must already exist as a directory.
    pub(crate) fn validate_dest(&self, member_is_dir: bool) -> Result<()> {
        if let Some(dest) = &self.dest {
            if (self.globbed || member_is_dir) && !dest.is_dir() {
                return Err(Error::InvalidDestination { dest: dest.clone() });
            }
        }
        Ok(())
    }
}
