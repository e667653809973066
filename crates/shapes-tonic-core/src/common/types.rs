//! # Shape Kinds, Call Shapes and Metadata Keys
//!
//! Shared vocabulary for the client and server. Both sides must agree on the
//! exact spelling of shape type names, bucket names and metadata tags, so they
//! are defined once here.
//!
//! ## Overview
//!
//! - [`ShapeKind`] - the three supported polygon types, in scan order
//! - [`CallShape`] - the four gRPC interaction shapes, tagged on every call
//! - [`METHOD_TYPE_HEADER`] / [`CORRELATION_ID_HEADER`] - metadata keys

use crate::Error;
use core::{fmt, str::FromStr};

/// Metadata key declaring the call shape of a request.
pub const METHOD_TYPE_HEADER: &str = "x-method-type";

/// Metadata key carrying the client-generated correlation identifier.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// A supported polygon type.
///
/// Declaration order is the order in which buckets are scanned and persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Triangle,
    Rectangle,
    Pentagon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [Self::Triangle, Self::Rectangle, Self::Pentagon];

    /// Name used in `shape_type` fields.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Triangle => "Triangle",
            Self::Rectangle => "Rectangle",
            Self::Pentagon => "Pentagon",
        }
    }

    /// Name of the repository bucket holding shapes of this kind.
    pub const fn bucket_name(self) -> &'static str {
        match self {
            Self::Triangle => "Triangles",
            Self::Rectangle => "Rectangles",
            Self::Pentagon => "Pentagons",
        }
    }

    /// Leading letter of every identifier in this bucket.
    pub const fn letter(self) -> char {
        match self {
            Self::Triangle => 'T',
            Self::Rectangle => 'R',
            Self::Pentagon => 'P',
        }
    }

    /// Finds the bucket whose name starts with `letter`.
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.letter() == letter)
    }

    /// Builds the identifier for the `ordinal`-th shape of this kind.
    pub fn shape_id(self, ordinal: usize) -> String {
        format!("{}-{}", self.letter(), ordinal)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Exact, case-sensitive match against the type names.
impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.type_name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// The interaction shape of a gRPC method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallShape {
    UnaryUnary,
    UnaryStream,
    StreamUnary,
    StreamStream,
}

impl CallShape {
    pub const ALL: [CallShape; 4] = [
        Self::UnaryUnary,
        Self::UnaryStream,
        Self::StreamUnary,
        Self::StreamStream,
    ];

    /// Tag sent in the [`METHOD_TYPE_HEADER`] metadata entry.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnaryUnary => "unary-unary",
            Self::UnaryStream => "unary-stream",
            Self::StreamUnary => "stream-unary",
            Self::StreamStream => "stream-stream",
        }
    }

    pub const fn client_streaming(self) -> bool {
        matches!(self, Self::StreamUnary | Self::StreamStream)
    }

    pub const fn server_streaming(self) -> bool {
        matches!(self, Self::UnaryStream | Self::StreamStream)
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| Error::UnknownCallShape {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_kind_names_are_exact() {
        assert_eq!("Pentagon".parse::<ShapeKind>(), Ok(ShapeKind::Pentagon));
        assert!("pentagon".parse::<ShapeKind>().is_err());
        assert!("Hexagon".parse::<ShapeKind>().is_err());
        assert!("".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn bucket_letters_match_bucket_names() {
        for kind in ShapeKind::ALL {
            assert!(kind.bucket_name().starts_with(kind.letter()));
            assert!(kind.bucket_name().starts_with(kind.type_name()));
            assert_eq!(ShapeKind::from_letter(kind.letter()), Some(kind));
        }
        assert_eq!(ShapeKind::from_letter('X'), None);
        assert_eq!(ShapeKind::Rectangle.shape_id(7), "R-7");
    }

    #[test]
    fn call_shape_tags_roundtrip() {
        for shape in CallShape::ALL {
            assert_eq!(shape.as_str().parse::<CallShape>().ok(), Some(shape));
        }
        assert!(matches!(
            "unary".parse::<CallShape>(),
            Err(Error::UnknownCallShape { .. })
        ));
    }

    #[test]
    fn call_shape_streaming_flags() {
        assert!(!CallShape::UnaryUnary.client_streaming());
        assert!(CallShape::UnaryStream.server_streaming());
        assert!(CallShape::StreamUnary.client_streaming());
        assert!(!CallShape::StreamUnary.server_streaming());
        assert!(CallShape::StreamStream.client_streaming());
        assert!(CallShape::StreamStream.server_streaming());
    }
}
