//! Console rendering of responses.

use shapes_tonic_core::proto::{Code, Shape};

/// `StatusCode.<CODE> - <message>`
pub fn status_line(code: Code, message: &str) -> String {
    format!("StatusCode.{} - {message}", code.as_str_name())
}

pub fn shape_lines(shape: &Shape) -> Vec<String> {
    let mut lines = vec![
        format!("shape_id: {}", shape.shape_id),
        format!("shape_type: {}", shape.shape_type),
        "coords: [".to_string(),
    ];
    lines.extend(
        shape
            .coords
            .iter()
            .map(|c| format!("{{x: {}, y: {}}}", c.x, c.y)),
    );
    lines.push("]".to_string());
    lines
}

pub fn print_shape(shape: &Shape) {
    for line in shape_lines(shape) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapes_tonic_core::proto::ShapeCoord;

    #[test]
    fn status_line_uses_wire_names() {
        assert_eq!(
            status_line(Code::AreaNotFound, "T-9 does not exist"),
            "StatusCode.AREA_NOT_FOUND - T-9 does not exist"
        );
    }

    #[test]
    fn shape_lists_every_vertex() {
        let shape = Shape {
            shape_id: "T-0".to_string(),
            shape_type: "Triangle".to_string(),
            coords: vec![
                ShapeCoord { x: 0, y: 0 },
                ShapeCoord { x: 2, y: 3 },
                ShapeCoord { x: 4, y: 0 },
            ],
        };
        assert_eq!(
            shape_lines(&shape),
            [
                "shape_id: T-0",
                "shape_type: Triangle",
                "coords: [",
                "{x: 0, y: 0}",
                "{x: 2, y: 3}",
                "{x: 4, y: 0}",
                "]",
            ]
        );
    }
}
