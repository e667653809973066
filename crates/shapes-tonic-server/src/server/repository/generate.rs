//! Randomized shape construction.
//!
//! Every shape is anchored at the origin and bounded by the configured
//! maxima. Triangles and pentagons double the drawn width (pentagons also the
//! height) so their midpoints land on integer coordinates.

use rand::Rng;
use shapes_tonic_core::{
    proto::{Shape, ShapeCoord},
    types::ShapeKind,
};

/// Upper bounds for the randomized dimensions, both at least 1.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub max_width: u32,
    pub max_height: u32,
}

const fn coord(x: i32, y: i32) -> ShapeCoord {
    ShapeCoord { x, y }
}

/// Builds the `ordinal`-th shape of `kind` with random dimensions.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    kind: ShapeKind,
    ordinal: usize,
    bounds: Bounds,
) -> Shape {
    let mut draw = |max: u32| rng.random_range(1..=max.max(1)) as i32;

    let coords = match kind {
        ShapeKind::Triangle => {
            let w = 2 * draw(bounds.max_width);
            let h = draw(bounds.max_height);
            vec![coord(0, 0), coord(w / 2, h), coord(w, 0)]
        }
        ShapeKind::Rectangle => {
            let w = draw(bounds.max_width);
            let h = draw(bounds.max_height);
            vec![coord(0, 0), coord(0, h), coord(w, h), coord(w, 0)]
        }
        ShapeKind::Pentagon => {
            let w = 2 * draw(bounds.max_width);
            let h = 2 * draw(bounds.max_height);
            vec![
                coord(0, 0),
                coord(0, h / 2),
                coord(w / 2, h),
                coord(w, h / 2),
                coord(w, 0),
            ]
        }
    };

    Shape {
        shape_id: kind.shape_id(ordinal),
        shape_type: kind.type_name().to_string(),
        coords,
    }
}
