//! Perimeter and area of closed integer polygons.
//!
//! A coordinate list is treated as a closed ring: the last vertex connects
//! back to the first. Both functions are invariant under cyclic rotation of the
//! input and return `0.0` for fewer than two points.

use crate::proto::ShapeCoord;

/// Sum of the Euclidean lengths of every edge, including the closing edge.
pub fn perimeter(coords: &[ShapeCoord]) -> f64 {
    if coords.len() < 2 {
        return 0.0;
    }
    edges(coords)
        .map(|(a, b)| {
            let dx = f64::from(b.x) - f64::from(a.x);
            let dy = f64::from(b.y) - f64::from(a.y);
            dx.hypot(dy)
        })
        .sum()
}

/// Shoelace area: `|sum(x_i * y_{i+1} - x_{i+1} * y_i)| / 2`.
pub fn area(coords: &[ShapeCoord]) -> f64 {
    if coords.len() < 3 {
        return 0.0;
    }
    let twice: i64 = edges(coords)
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    twice.unsigned_abs() as f64 / 2.0
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn edges(coords: &[ShapeCoord]) -> impl Iterator<Item = (&ShapeCoord, &ShapeCoord)> {
    coords.iter().zip(coords.iter().cycle().skip(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(i32, i32)]) -> Vec<ShapeCoord> {
        points.iter().map(|&(x, y)| ShapeCoord { x, y }).collect()
    }

    fn rotations(coords: &[ShapeCoord]) -> impl Iterator<Item = Vec<ShapeCoord>> + '_ {
        (0..coords.len()).map(move |k| {
            let mut rotated = coords.to_vec();
            rotated.rotate_left(k);
            rotated
        })
    }

    #[test]
    fn rectangle() {
        let coords = ring(&[(0, 0), (0, 3), (4, 3), (4, 0)]);
        assert_eq!(perimeter(&coords), 14.0);
        assert_eq!(area(&coords), 12.0);
    }

    #[test]
    fn right_triangle() {
        let coords = ring(&[(0, 0), (0, 4), (3, 0)]);
        assert_eq!(perimeter(&coords), 12.0);
        assert_eq!(area(&coords), 6.0);
    }

    #[test]
    fn winding_does_not_change_area() {
        let mut coords = ring(&[(0, 0), (0, 5), (3, 10), (6, 5), (6, 0)]);
        let clockwise = area(&coords);
        coords.reverse();
        assert_eq!(area(&coords), clockwise);
        assert_eq!(clockwise, 45.0);
    }

    #[test]
    fn invariant_under_rotation() {
        let coords = ring(&[(0, 0), (0, 7), (5, 13), (11, 7), (11, 0)]);
        let p = perimeter(&coords);
        let a = area(&coords);
        for rotated in rotations(&coords) {
            assert!((perimeter(&rotated) - p).abs() < 1e-9);
            assert_eq!(area(&rotated), a);
        }
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(perimeter(&[]), 0.0);
        assert_eq!(area(&[]), 0.0);
        assert_eq!(perimeter(&ring(&[(1, 1)])), 0.0);
        assert_eq!(area(&ring(&[(0, 0), (2, 2)])), 0.0);
        assert_eq!(area(&ring(&[(0, 0), (1, 1), (2, 2)])), 0.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(2.0_f64.sqrt()), 1.41);
        assert_eq!(round2(10.006), 10.01);
        assert_eq!(round2(3.0), 3.0);
    }
}
