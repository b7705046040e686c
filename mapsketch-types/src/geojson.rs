//! Conversion of drawn shapes to and from GeoJSON geometries.
//!
//! Single-vertex point sets become `Point`, larger point sets `MultiPoint`, polylines `LineString`
//! and polygons a single-ring `Polygon`. Elevation is written only when some vertex has a non-zero
//! `z` coordinate.

use geojson::{Geometry, Value};

use crate::error::MapsketchTypesError;
use crate::{Position, Shape, ShapeKind};

impl From<&Shape> for Geometry {
    fn from(shape: &Shape) -> Self {
        let with_z = shape.points().iter().any(|p| p.z != 0.0);
        let convert = |p: &Position| -> geojson::Position {
            if with_z {
                vec![p.x, p.y, p.z]
            } else {
                vec![p.x, p.y]
            }
        };

        let value = match shape.kind() {
            ShapeKind::Points if shape.points().len() == 1 => {
                Value::Point(convert(&shape.points()[0]))
            }
            ShapeKind::Points => Value::MultiPoint(shape.points().iter().map(convert).collect()),
            ShapeKind::Polyline => Value::LineString(shape.points().iter().map(convert).collect()),
            ShapeKind::Polygon => Value::Polygon(vec![shape.points().iter().map(convert).collect()]),
        };

        Geometry::new(value)
    }
}

impl TryFrom<&Geometry> for Shape {
    type Error = MapsketchTypesError;

    fn try_from(geometry: &Geometry) -> Result<Self, Self::Error> {
        match &geometry.value {
            Value::Point(p) => Shape::new(ShapeKind::Points, vec![convert_position(p)?]),
            Value::MultiPoint(points) => Shape::new(ShapeKind::Points, convert_positions(points)?),
            Value::LineString(points) => Shape::new(ShapeKind::Polyline, convert_positions(points)?),
            Value::Polygon(rings) => match rings.as_slice() {
                [ring] => Shape::new(ShapeKind::Polygon, convert_positions(ring)?),
                _ => Err(MapsketchTypesError::Conversion(format!(
                    "expected a polygon with one ring, got {} rings",
                    rings.len()
                ))),
            },
            Value::MultiLineString(_) | Value::MultiPolygon(_) | Value::GeometryCollection(_) => {
                Err(MapsketchTypesError::Conversion(
                    "multi-part geometries cannot be converted into a single shape".into(),
                ))
            }
        }
    }
}

fn convert_positions(points: &[geojson::Position]) -> Result<Vec<Position>, MapsketchTypesError> {
    points.iter().map(convert_position).collect()
}

fn convert_position(p: &geojson::Position) -> Result<Position, MapsketchTypesError> {
    match p.as_slice() {
        [x, y] => Ok(Position::new(*x, *y, 0.0)),
        [x, y, z, ..] => Ok(Position::new(*x, *y, *z)),
        _ => Err(MapsketchTypesError::Conversion(format!(
            "position must have at least 2 coordinates, got {}",
            p.len()
        ))),
    }
}
