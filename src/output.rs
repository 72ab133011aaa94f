//! Writing a finished guide to disk or stdout, optionally gzip-compressed

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::epg::Guide;
use crate::error::Result;

/// Where a guide should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File { path: PathBuf, archive: bool },
}

impl OutputTarget {
    /// `-` means stdout; archiving only applies to files
    pub fn new(path: &Path, archive: bool) -> Self {
        if path.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File {
                path: path.to_path_buf(),
                archive,
            }
        }
    }

    /// Final path on disk: archives get a `.gz` suffix
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File { path, archive: false } => Some(path.clone()),
            OutputTarget::File { path, archive: true } => Some(archive_path(path)),
        }
    }
}

/// `guide.xml` -> `guide.xml.gz`
pub fn archive_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Write the guide and return the path written, if any
pub fn write_guide(guide: &Guide, target: &OutputTarget) -> Result<Option<PathBuf>> {
    match target {
        OutputTarget::Stdout => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            guide.write_to(&mut writer)?;
            writer.flush()?;
            Ok(None)
        }
        OutputTarget::File { path, archive } => {
            let resolved = if *archive { archive_path(path) } else { path.clone() };
            let file = BufWriter::new(File::create(&resolved)?);

            if *archive {
                let mut encoder = GzEncoder::new(file, Compression::default());
                guide.write_to(&mut encoder)?;
                encoder.finish()?.flush()?;
            } else {
                let mut file = file;
                guide.write_to(&mut file)?;
                file.flush()?;
            }

            info!(path = %resolved.display(), archive = *archive, "wrote guide");
            Ok(Some(resolved))
        }
    }
}
