use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{FlatL2Index, IndexError};

/// Leading bytes of every index file
pub const MAGIC: &[u8; 4] = b"DAIX";
pub const FORMAT_VERSION: u32 = 1;

// magic + version + dimension + rows + fingerprint
const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 16;

impl FlatL2Index {
    /// Serialize the index.
    ///
    /// Layout, little-endian: magic, format version (u32), dimension (u32), row count (u64),
    /// corpus fingerprint (16 bytes), then `rows * dimension` f32 values row-major.
    #[inline]
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), IndexError> {
        let dimension = u32::try_from(self.dimension)
            .map_err(|_| IndexError::Corrupted(format!("dimension {} too large", self.dimension)))?;

        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&dimension.to_le_bytes())?;
        writer.write_all(&(self.len() as u64).to_le_bytes())?;
        writer.write_all(&self.fingerprint)?;
        for value in &self.vectors {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    #[inline]
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, IndexError> {
        let mut header = [0u8; HEADER_LEN];
        reader
            .read_exact(&mut header)
            .map_err(|e| IndexError::Corrupted(format!("incomplete header: {e}")))?;

        if &header[0..4] != MAGIC {
            return Err(IndexError::BadMagic);
        }

        let version = u32::from_le_bytes(le_array(&header[4..8]));
        if version != FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion(version));
        }

        let dimension = u32::from_le_bytes(le_array(&header[8..12])) as usize;
        let rows = u64::from_le_bytes(le_array(&header[12..20]));
        let fingerprint = le_array(&header[20..36]);

        let mut index = Self::new(dimension)?;
        index.fingerprint = fingerprint;

        let expected_bytes = usize::try_from(rows)
            .ok()
            .and_then(|rows| rows.checked_mul(dimension))
            .and_then(|values| values.checked_mul(4))
            .ok_or_else(|| IndexError::Corrupted(format!("row count {rows} is implausible")))?;

        // Read at most one byte past the expected payload so trailing garbage is detected
        // without trusting the header for the allocation size.
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(expected_bytes as u64 + 1)
            .read_to_end(&mut payload)?;

        if payload.len() != expected_bytes {
            return Err(IndexError::Corrupted(format!(
                "expected {} bytes of vector data, found {}{}",
                expected_bytes,
                payload.len().min(expected_bytes),
                if payload.len() > expected_bytes {
                    " followed by trailing data"
                } else {
                    ""
                }
            )));
        }

        index.vectors = payload
            .chunks_exact(4)
            .map(|bytes| f32::from_le_bytes(le_array(bytes)))
            .collect();

        Ok(index)
    }

    /// Write the index to `path`, replacing any previous file atomically
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), IndexError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("index.tmp");
        let written = File::create(&tmp_path)
            .map_err(IndexError::from)
            .and_then(|file| self.write_to(BufWriter::new(file)))
            .and_then(|()| fs::rename(&tmp_path, path).map_err(IndexError::from));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e);
        }

        info!(
            "Saved index with {} rows ({} dimensions) to {}",
            self.len(),
            self.dimension,
            path.display()
        );
        Ok(())
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref();
        debug!("Loading index from {}", path.display());

        let file = File::open(path)?;
        let index = Self::read_from(BufReader::new(file))?;

        info!(
            "Loaded index with {} rows ({} dimensions) from {}",
            index.len(),
            index.dimension,
            path.display()
        );
        Ok(index)
    }
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
