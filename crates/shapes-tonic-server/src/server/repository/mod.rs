//! In-memory shape store backed by a single JSON document.
//!
//! Shapes live in one bucket per [`ShapeKind`], in creation order. The
//! position of a shape in its bucket is the ordinal in its identifier, so
//! identifiers are never reused.
//!
//! ## Submodules
//!
//! - [`generate`] - randomized shape construction.
//! - [`persist`] - versioned snapshot writer used by the persistence workers.

pub mod generate;
pub mod persist;


use serde::{Deserialize, Serialize};
use shapes_tonic_core::{Error, Result, proto::Shape, types::ShapeKind};
use std::{io::ErrorKind, path::Path};

/// Why an identifier did not resolve to a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// The leading letter names no bucket.
    InvalidShape,
    /// The bucket exists but holds no shape with this identifier.
    ShapeNotFound,
}

/// A serialized repository tagged with the mutation count it reflects.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(rename = "Triangles", default)]
    triangles: Vec<Shape>,
    #[serde(rename = "Rectangles", default)]
    rectangles: Vec<Shape>,
    #[serde(rename = "Pentagons", default)]
    pentagons: Vec<Shape>,
    #[serde(skip)]
    version: u64,
}

impl Repository {
    /// Loads the repository at `path`.
    ///
    /// A missing file yields an empty repository. An unreadable or malformed
    /// file is an error, so a bad path never silently starts from scratch.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Persistence {
                    reason: format!("failed to read {}: {e}", path.display()),
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| Error::Persistence {
            reason: format!("failed to parse {}: {e}", path.display()),
        })
    }

    pub fn bucket(&self, kind: ShapeKind) -> &[Shape] {
        match kind {
            ShapeKind::Triangle => &self.triangles,
            ShapeKind::Rectangle => &self.rectangles,
            ShapeKind::Pentagon => &self.pentagons,
        }
    }

    fn bucket_mut(&mut self, kind: ShapeKind) -> &mut Vec<Shape> {
        match kind {
            ShapeKind::Triangle => &mut self.triangles,
            ShapeKind::Rectangle => &mut self.rectangles,
            ShapeKind::Pentagon => &mut self.pentagons,
        }
    }

    /// Appends a shape built by `build` from the next free ordinal.
    ///
    /// Returns the stored shape. Every insert bumps [`Repository::version`].
    pub fn insert_with(&mut self, kind: ShapeKind, build: impl FnOnce(usize) -> Shape) -> &Shape {
        let ordinal = self.bucket(kind).len();
        let shape = build(ordinal);
        debug_assert_eq!(shape.shape_id, kind.shape_id(ordinal));
        self.version += 1;

        let bucket = self.bucket_mut(kind);
        bucket.push(shape);
        &bucket[ordinal]
    }

    /// Number of mutations applied since the repository was loaded.
    pub const fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        ShapeKind::ALL.iter().map(|&k| self.bucket(k).len()).sum()
    }

    /// All shapes in scan order: buckets in declaration order, then
    /// insertion order within a bucket.
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        ShapeKind::ALL
            .into_iter()
            .flat_map(move |kind| self.bucket(kind).iter())
    }

    /// Resolves an identifier to a stored shape.
    ///
    /// Only the leading character is uppercased before matching; the rest of
    /// the identifier must match exactly.
    pub fn resolve(&self, shape_id: &str) -> core::result::Result<&Shape, LookupError> {
        let mut chars = shape_id.chars();
        let letter = chars.next().ok_or(LookupError::InvalidShape)?;
        let letter = letter.to_ascii_uppercase();
        let kind = ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.bucket_name().starts_with(letter))
            .ok_or(LookupError::InvalidShape)?;

        let rest = chars.as_str();
        self.bucket(kind)
            .iter()
            .find(|shape| {
                shape.shape_id.strip_prefix(kind.letter()) == Some(rest)
            })
            .ok_or(LookupError::ShapeNotFound)
    }

    /// Serializes the repository as pretty-printed JSON.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| Error::Persistence {
            reason: format!("failed to serialize repository: {e}"),
        })?;
        Ok(Snapshot {
            version: self.version,
            bytes,
        })
    }
}
