/// Builds the gRPC client and server code for the `shapes.ShapeService`
/// definition using the manual builder from `tonic-build`.
///
/// The service is described in Rust rather than in a `.proto` file, so the
/// build does not depend on a `protoc` installation. The request and response
/// messages are hand-written `prost::Message` types in `src/common/proto.rs`;
/// this script only emits the service traits and stubs around them.
///
/// # Call shapes
///
/// | Method                     | Client stream | Server stream |
/// |----------------------------|---------------|---------------|
/// | `CreateShape`              | no            | no            |
/// | `GetShape`                 | no            | no            |
/// | `GetPerimetersGreaterThan` | no            | yes           |
/// | `GetTotalArea`             | yes           | no            |
/// | `GetAreas`                 | yes           | yes           |
///
/// # Output
///
/// Generated code is written to `$OUT_DIR/shapes.ShapeService.rs` and included
/// by the `proto` module:
///
/// ```rust,ignore
/// include!(concat!(env!("OUT_DIR"), "/shapes.ShapeService.rs"));
/// ```
///
/// # Panics
///
/// Panics if a method definition is incomplete or `OUT_DIR` is not set.
use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic_prost::ProstCodec";

fn method(name: &str, route: &str, input: &str, output: &str) -> tonic_build::manual::MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::proto::{input}"))
        .output_type(format!("crate::proto::{output}"))
        .codec_path(CODEC)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let service = Service::builder()
        .name("ShapeService")
        .package("shapes")
        .method(
            method("create_shape", "CreateShape", "ShapeType", "CreateShapeResponse")
                .comment("Creates a randomized shape of the requested type.")
                .build(),
        )
        .method(
            method("get_shape", "GetShape", "ShapeId", "GetShapeResponse")
                .comment("Looks up a single shape by identifier.")
                .build(),
        )
        .method(
            method(
                "get_perimeters_greater_than",
                "GetPerimetersGreaterThan",
                "MinPerimeter",
                "GetPerimetersGreaterThanResponse",
            )
            .comment("Streams every shape whose perimeter exceeds the minimum.")
            .server_streaming()
            .build(),
        )
        .method(
            method("get_total_area", "GetTotalArea", "ShapeId", "GetTotalAreaResponse")
                .comment("Sums the area of a stream of shape identifiers.")
                .client_streaming()
                .build(),
        )
        .method(
            method("get_areas", "GetAreas", "ShapeId", "GetAreasResponse")
                .comment("Answers each streamed identifier with its shape and area.")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[service]);
}
