use std::io::{self, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// On-disk format of the top-level image archive, selected by filename suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Tar,
    TarGz,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path.to_string_lossy();
        if name.ends_with(".tar.gz") {
            Ok(Self::TarGz)
        } else if name.ends_with(".tar") {
            Ok(Self::Tar)
        } else {
            Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }

    /// Wrap an image file reader in the decoder this format requires.
    pub(crate) fn decoder<'a, R: Read + 'a>(self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Self::Tar => Box::new(reader),
            Self::TarGz => Box::new(GzDecoder::new(reader)),
        }
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Sniff a layer blob stream and decompress it when it is gzip-compressed.
///
/// Layer blobs inside an image are usually plain tar, but images produced by
/// some tooling ship them gzipped. The sniffed bytes are chained back in
/// front of the reader, so the returned stream always starts at offset zero.
pub(crate) fn sniff_layer<'a, R: Read + 'a>(mut reader: R) -> io::Result<Box<dyn Read + 'a>> {
    let mut magic = [0u8; 2];
    let mut filled = 0;
    while filled < magic.len() {
        let n = reader.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let head = io::Cursor::new(magic[..filled].to_vec());
    if filled == magic.len() && magic == GZIP_MAGIC {
        Ok(Box::new(GzDecoder::new(head.chain(reader))))
    } else {
        Ok(Box::new(head.chain(reader)))
    }
}
