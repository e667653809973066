//! Wire messages and generated gRPC bindings for `shapes.ShapeService`.
//!
//! The message types below are the Rust side of the service contract:
//!
//! ```text
//! service ShapeService {
//!   rpc CreateShape(ShapeType) returns (CreateShapeResponse);
//!   rpc GetShape(ShapeId) returns (GetShapeResponse);
//!   rpc GetPerimetersGreaterThan(MinPerimeter) returns (stream GetPerimetersGreaterThanResponse);
//!   rpc GetTotalArea(stream ShapeId) returns (GetTotalAreaResponse);
//!   rpc GetAreas(stream ShapeId) returns (stream GetAreasResponse);
//! }
//! ```
//!
//! Client and server stubs ([`shape_service_client`] and
//! [`shape_service_server`]) are generated by `build.rs`.
//!
//! Every response carries a [`Code`] in `status_code` together with a
//! human-readable `message`. Domain failures (unknown shape, empty result, bad
//! perimeter) travel in these fields; only transport and authentication
//! failures are reported as a gRPC [`tonic::Status`].

use serde::{Deserialize, Serialize};

/// Outcome of a shape operation, carried in every response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Code {
    Ok = 0,
    InvalidShape = 1,
    ShapeNotFound = 2,
    InvalidPerimeter = 3,
    AreaNotFound = 4,
}

impl Code {
    /// Name of the variant as written in the service definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidShape => "INVALID_SHAPE",
            Self::ShapeNotFound => "SHAPE_NOT_FOUND",
            Self::InvalidPerimeter => "INVALID_PERIMETER",
            Self::AreaNotFound => "AREA_NOT_FOUND",
        }
    }
}

impl core::fmt::Display for Code {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// A single vertex. Also the on-disk representation (`{"x": .., "y": ..}`).
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct ShapeCoord {
    #[prost(int32, tag = "1")]
    pub x: i32,
    #[prost(int32, tag = "2")]
    pub y: i32,
}

/// A closed polygon: the last coordinate connects back to the first.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Shape {
    #[prost(string, tag = "1")]
    pub shape_id: String,
    #[prost(string, tag = "2")]
    pub shape_type: String,
    #[prost(message, repeated, tag = "3")]
    pub coords: Vec<ShapeCoord>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShapeType {
    #[prost(string, tag = "1")]
    pub shape_type: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShapeId {
    #[prost(string, tag = "1")]
    pub shape_id: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct MinPerimeter {
    #[prost(double, tag = "1")]
    pub min_perimeter: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateShapeResponse {
    #[prost(enumeration = "Code", tag = "1")]
    pub status_code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, optional, tag = "3")]
    pub shape: Option<Shape>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetShapeResponse {
    #[prost(enumeration = "Code", tag = "1")]
    pub status_code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, optional, tag = "3")]
    pub shape: Option<Shape>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPerimetersGreaterThanResponse {
    #[prost(enumeration = "Code", tag = "1")]
    pub status_code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(double, tag = "3")]
    pub perimeter: f64,
    #[prost(message, optional, tag = "4")]
    pub shape: Option<Shape>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTotalAreaResponse {
    #[prost(enumeration = "Code", tag = "1")]
    pub status_code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(double, tag = "3")]
    pub total_area: f64,
    #[prost(string, repeated, tag = "4")]
    pub valid_ids: Vec<String>,
    #[prost(string, repeated, tag = "5")]
    pub invalid_ids: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAreasResponse {
    #[prost(enumeration = "Code", tag = "1")]
    pub status_code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(double, tag = "3")]
    pub area: f64,
    #[prost(message, optional, tag = "4")]
    pub shape: Option<Shape>,
}

include!(concat!(env!("OUT_DIR"), "/shapes.ShapeService.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_serializes_with_field_names() {
        let shape = Shape {
            shape_id: "R-0".to_string(),
            shape_type: "Rectangle".to_string(),
            coords: vec![ShapeCoord { x: 0, y: 0 }, ShapeCoord { x: 0, y: 3 }],
        };
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "shape_id": "R-0",
                "shape_type": "Rectangle",
                "coords": [{"x": 0, "y": 0}, {"x": 0, "y": 3}],
            })
        );
    }

    #[test]
    fn code_names_match_the_wire_enum() {
        assert_eq!(Code::try_from(4), Ok(Code::AreaNotFound));
        assert_eq!(Code::AreaNotFound.to_string(), "AREA_NOT_FOUND");
        assert_eq!(Code::default(), Code::Ok);
    }
}
