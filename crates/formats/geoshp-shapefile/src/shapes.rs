//! Conversion of `geo-types` geometries to shapefile shapes.
//!
//! Every layer holds a single shape type. Point and the three multi
//! geometries are the only layouts accepted; single line strings and polygons
//! are expected to have been promoted before they reach the writer.

use geo_types::{Coord, Geometry, LineString};
use geoshp_core_common::{GeometryType, RecordRef};
use shapefile::{Multipoint, Point, Polygon, PolygonRing, Polyline};

use crate::error::{ShapefileResult, ShapefileWriteError};

/// Geometry subtypes a shapefile layer can hold.
pub const SUPPORTED_GEOMETRY_TYPES: [GeometryType; 4] = [
    GeometryType::Point,
    GeometryType::MultiPoint,
    GeometryType::MultiLineString,
    GeometryType::MultiPolygon,
];

/// A shape ready to be handed to the shapefile encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedShape {
    Point(Point),
    Multipoint(Multipoint),
    Polyline(Polyline),
    Polygon(Polygon),
}

/// Encodes `geometry` for a layer of `layer_type`.
///
/// # Errors
///
/// Fails when the geometry's subtype differs from `layer_type`, or when it
/// cannot be represented (empty parts, degenerate rings).
pub fn encode_geometry(
    geometry: &Geometry<f64>,
    layer_type: GeometryType,
    record: &RecordRef,
) -> ShapefileResult<EncodedShape> {
    let invalid = |message: &str| ShapefileWriteError::InvalidGeometry {
        record: record.clone(),
        message: message.to_string(),
    };

    match (layer_type, geometry) {
        (GeometryType::Point, Geometry::Point(point)) => {
            Ok(EncodedShape::Point(Point::new(point.x(), point.y())))
        },
        (GeometryType::MultiPoint, Geometry::MultiPoint(points)) => {
            if points.0.is_empty() {
                return Err(invalid("multi point has no points"));
            }
            let points = points.iter().map(|p| Point::new(p.x(), p.y())).collect();
            Ok(EncodedShape::Multipoint(Multipoint::new(points)))
        },
        (GeometryType::MultiLineString, Geometry::MultiLineString(lines)) => {
            if lines.0.is_empty() {
                return Err(invalid("multi line string has no lines"));
            }
            if lines.iter().any(|line| line.0.len() < 2) {
                return Err(invalid("line string with fewer than 2 points"));
            }
            let parts = lines.iter().map(to_points).collect();
            Ok(EncodedShape::Polyline(Polyline::with_parts(parts)))
        },
        (GeometryType::MultiPolygon, Geometry::MultiPolygon(polygons)) => {
            if polygons.0.is_empty() {
                return Err(invalid("multi polygon has no polygons"));
            }
            let mut rings = Vec::new();
            for polygon in polygons {
                if polygon.exterior().0.len() < 4 {
                    return Err(invalid("polygon ring with fewer than 4 points"));
                }
                rings.push(PolygonRing::Outer(to_points(polygon.exterior())));
                for interior in polygon.interiors() {
                    if interior.0.len() < 4 {
                        return Err(invalid("polygon ring with fewer than 4 points"));
                    }
                    rings.push(PolygonRing::Inner(to_points(interior)));
                }
            }
            // `with_rings` closes rings and fixes their winding order.
            Ok(EncodedShape::Polygon(Polygon::with_rings(rings)))
        },
        (expected, other) => Err(ShapefileWriteError::GeometryMismatch {
            record: record.clone(),
            expected,
            found: GeometryType::of(other),
        }),
    }
}

fn to_points(line: &LineString<f64>) -> Vec<Point> {
    line.coords()
        .map(|&Coord { x, y }| Point::new(x, y))
        .collect()
}
