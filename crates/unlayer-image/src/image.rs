use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::format::ImageFormat;
use crate::matcher::member_name;

const MANIFEST_NAME: &str = "manifest.json";

/// Name of a layer blob within the image archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerRef(pub(crate) String);

impl LayerRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layer list parsed from the image's first manifest record, oldest first.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub layers: Vec<LayerRef>,
}

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    #[serde(rename = "Layers")]
    layers: Vec<String>,
}

/// Read-only handle on the image archive, held open for a whole session.
///
/// The underlying file is rewound and re-wrapped for each scan, so the image
/// contributes exactly one open file descriptor regardless of how many
/// requests run against it.
pub struct Image {
    file: File,
    format: ImageFormat,
    path: PathBuf,
}

impl Image {
    pub fn open(path: &Path) -> Result<Self> {
        let format = ImageFormat::from_path(path)?;
        let file = File::open(path)?;
        Ok(Self {
            file,
            format,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a fresh scan over the image's top-level archive entries.
    pub(crate) fn archive(&mut self) -> Result<tar::Archive<Box<dyn Read + '_>>> {
        self.file.seek(SeekFrom::Start(0))?;
        let reader = self.format.decoder(&mut self.file);
        Ok(tar::Archive::new(reader))
    }

    /// Locate and parse the image's manifest record.
    pub fn read_manifest(&mut self) -> Result<Manifest> {
        let mut archive = self.archive()?;
        for entry in archive.entries()? {
            let mut entry = entry?;
            if member_name(&entry.path()?) == MANIFEST_NAME {
                let mut raw = String::new();
                entry.read_to_string(&mut raw)?;
                return parse_manifest(&raw);
            }
        }
        Err(Error::CorruptManifest {
            reason: format!("no {MANIFEST_NAME} entry in image"),
        })
    }
}

fn parse_manifest(raw: &str) -> Result<Manifest> {
    // An image may embed several manifest records; only the first one counts.
    let records: Vec<ManifestRecord> =
        serde_json::from_str(raw).map_err(|e| Error::CorruptManifest {
            reason: e.to_string(),
        })?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| Error::CorruptManifest {
            reason: "manifest contains no records".to_string(),
        })?;
    Ok(Manifest {
        layers: record.layers.into_iter().map(LayerRef).collect(),
    })
}
