//! Response construction for every shape operation.
//!
//! These functions are pure: they turn a repository lookup (or a scan) into
//! the typed response, with its [`Code`] and message. Domain failures are
//! always expressed here, never as a `tonic::Status`.

use crate::server::repository::{LookupError, Repository};
use shapes_tonic_core::{
    geometry::{area, perimeter, round2},
    proto::{
        Code, CreateShapeResponse, GetAreasResponse, GetPerimetersGreaterThanResponse,
        GetShapeResponse, GetTotalAreaResponse, Shape,
    },
};

pub fn created(shape: &Shape) -> CreateShapeResponse {
    CreateShapeResponse {
        status_code: Code::Ok.into(),
        message: format!("Successfully Created {}: {}", shape.shape_type, shape.shape_id),
        shape: Some(shape.clone()),
    }
}

pub fn unsupported_shape_type(shape_type: &str) -> CreateShapeResponse {
    CreateShapeResponse {
        status_code: Code::InvalidShape.into(),
        message: format!("shape_type {shape_type} is not supported at this time"),
        shape: None,
    }
}

pub fn get_shape(shape_id: &str, lookup: Result<&Shape, LookupError>) -> GetShapeResponse {
    match lookup {
        Ok(shape) => GetShapeResponse {
            status_code: Code::Ok.into(),
            message: format!("Successfully retrieved {shape_id}"),
            shape: Some(shape.clone()),
        },
        Err(LookupError::InvalidShape) => GetShapeResponse {
            status_code: Code::InvalidShape.into(),
            message: format!("shape_id {shape_id} is not a valid shape_id"),
            shape: None,
        },
        Err(LookupError::ShapeNotFound) => GetShapeResponse {
            status_code: Code::ShapeNotFound.into(),
            message: format!("shape_id {shape_id} not found in database"),
            shape: None,
        },
    }
}

/// Every item of a `GetPerimetersGreaterThan` stream, in scan order.
///
/// A negative or NaN minimum yields a single `INVALID_PERIMETER` item, an
/// empty result a single `SHAPE_NOT_FOUND` item.
pub fn perimeters_greater_than(
    repository: &Repository,
    min_perimeter: f64,
) -> Vec<GetPerimetersGreaterThanResponse> {
    if min_perimeter.is_nan() || min_perimeter < 0.0 {
        return vec![GetPerimetersGreaterThanResponse {
            status_code: Code::InvalidPerimeter.into(),
            message: format!(
                "{min_perimeter} is an invalid perimeter value. Perimeters must be greater than or equal to 0"
            ),
            perimeter: 0.0,
            shape: None,
        }];
    }

    let items: Vec<_> = repository
        .iter()
        .filter_map(|shape| {
            let perimeter = round2(perimeter(&shape.coords));
            tracing::debug!("{} - P={perimeter} units", shape.shape_id);
            (perimeter > min_perimeter).then(|| GetPerimetersGreaterThanResponse {
                status_code: Code::Ok.into(),
                message: format!("{} has a perimeter of {perimeter} units", shape.shape_id),
                perimeter,
                shape: Some(shape.clone()),
            })
        })
        .collect();

    if items.is_empty() {
        return vec![GetPerimetersGreaterThanResponse {
            status_code: Code::ShapeNotFound.into(),
            message: format!("No shapes found with perimeter greater than {min_perimeter}."),
            perimeter: 0.0,
            shape: None,
        }];
    }
    items
}

/// Running state of a `GetTotalArea` call.
#[derive(Debug, Default)]
pub struct AreaTotal {
    total: f64,
    valid_ids: Vec<String>,
    invalid_ids: Vec<String>,
}

impl AreaTotal {
    pub fn add(&mut self, shape_id: String, lookup: Result<&Shape, LookupError>) {
        match lookup {
            Ok(shape) => {
                let area = area(&shape.coords);
                self.total += area;
                tracing::info!("{shape_id}: A={area} square units");
                self.valid_ids.push(shape_id);
            }
            Err(reason) => {
                tracing::warn!(?reason, "{shape_id} not in database");
                self.invalid_ids.push(shape_id);
            }
        }
    }

    pub fn finish(self) -> GetTotalAreaResponse {
        if self.total > 0.0 {
            GetTotalAreaResponse {
                status_code: Code::Ok.into(),
                message: format!("Total area of shapes {} square units.", self.total),
                total_area: self.total,
                valid_ids: self.valid_ids,
                invalid_ids: self.invalid_ids,
            }
        } else {
            GetTotalAreaResponse {
                status_code: Code::AreaNotFound.into(),
                message: format!("Invalid Area: {}.", self.total),
                total_area: 0.0,
                valid_ids: Vec::new(),
                invalid_ids: self.invalid_ids,
            }
        }
    }
}

pub fn area_of(shape_id: &str, lookup: Result<&Shape, LookupError>) -> GetAreasResponse {
    match lookup {
        Ok(shape) => {
            let area = area(&shape.coords);
            GetAreasResponse {
                status_code: Code::Ok.into(),
                message: format!("{}: A={area} square units", shape.shape_id),
                area,
                shape: Some(shape.clone()),
            }
        }
        Err(_) => GetAreasResponse {
            status_code: Code::AreaNotFound.into(),
            message: format!("{shape_id} does not exist"),
            area: 0.0,
            shape: None,
        },
    }
}
