use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::ImageReader;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::Serialize;

use crate::error::FingerprintError;
use crate::folder::list_files;

/// Extensions considered by the duplicate scan (lowercase, without dot)
pub const SCAN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Fixed-size visual summary of an image. Equal fingerprints mean "duplicate".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub Vec<u8>);

/// Produces fingerprints such that visually similar images yield equal or near-equal values.
pub trait Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError>;
}

/// Average (mean) hash over an 8x8 grayscale thumbnail.
pub struct PerceptualHasher {
    hasher: Hasher,
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PerceptualHasher {
    pub fn new() -> Self {
        Self {
            hasher: HasherConfig::new()
                .hash_alg(HashAlg::Mean)
                .hash_size(8, 8)
                .to_hasher(),
        }
    }
}

impl Fingerprinter for PerceptualHasher {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let img = ImageReader::open(path)
            .map_err(|source| FingerprintError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .decode()
            .map_err(|source| FingerprintError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Fingerprint(self.hasher.hash_image(&img).as_bytes().to_vec()))
    }
}

/// A file whose fingerprint was already seen, paired with the first file seen with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub duplicate: PathBuf,
    pub original: PathBuf,
}

fn is_scan_candidate(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCAN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Find images in `dir` (non-recursive) whose fingerprint matches an earlier image.
///
/// The first path seen per fingerprint is the original; every later match is
/// paired with it, never with an intermediate duplicate. Images that can't be
/// decoded are logged and skipped.
pub fn find_duplicates(dir: &Path, fingerprinter: &dyn Fingerprinter) -> anyhow::Result<Vec<DuplicatePair>> {
    let mut first_seen: HashMap<Fingerprint, PathBuf> = HashMap::new();
    let mut duplicates = Vec::new();

    for path in list_files(dir)?.into_iter().filter(|p| is_scan_candidate(p)) {
        let fingerprint = match fingerprinter.fingerprint(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Error processing {:?}: {}", path, e);
                continue;
            }
        };

        match first_seen.get(&fingerprint) {
            Some(original) => duplicates.push(DuplicatePair {
                duplicate: path,
                original: original.clone(),
            }),
            None => {
                first_seen.insert(fingerprint, path);
            }
        }
    }

    Ok(duplicates)
}
