//! Spatial-format adapter between GeoJSON geometry objects and the
//! normalized storage form: EWKT text tagged with a fixed coordinate
//! reference system (`SRID=4326;POINT(-55.5 -30.8)`).
//!
//! Validation here is purely syntactic. A geometry that parses as GeoJSON
//! is accepted as-is: rings are not checked for closure, coordinates are
//! not range-checked, and nothing is repaired. Round trips preserve
//! coordinate order and numeric values exactly, including the JSON
//! integer/float distinction.

mod wkt;

use serde_json::Value;
use thiserror::Error;

pub use wkt::from_ewkt;

/// Coordinate reference system for every stored geometry: longitude/latitude.
pub const SRID: u32 = 4326;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("geometry must be a JSON object")]
    NotAnObject,
    #[error("geometry is missing a \"type\" member")]
    MissingType,
    #[error("unsupported geometry type: {0}")]
    UnsupportedType(String),
    #[error("geometry is missing a \"{0}\" member")]
    MissingMember(&'static str),
    #[error("invalid coordinates: {0}")]
    BadCoordinates(&'static str),
    #[error("stored geometry is not valid EWKT: {0}")]
    BadEwkt(String),
}

/// Convert a GeoJSON geometry object to SRID-tagged EWKT.
pub fn to_ewkt(geometry: &Value) -> Result<String, GeometryError> {
    let mut out = format!("SRID={};", SRID);
    write_geometry(geometry, &mut out)?;
    Ok(out)
}

fn write_geometry(geometry: &Value, out: &mut String) -> Result<(), GeometryError> {
    let obj = geometry.as_object().ok_or(GeometryError::NotAnObject)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GeometryError::MissingType)?;

    if kind == "GeometryCollection" {
        let members = obj
            .get("geometries")
            .ok_or(GeometryError::MissingMember("geometries"))?
            .as_array()
            .ok_or(GeometryError::BadCoordinates("geometries must be an array"))?;
        out.push_str("GEOMETRYCOLLECTION");
        if members.is_empty() {
            out.push_str(" EMPTY");
            return Ok(());
        }
        out.push('(');
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_geometry(member, out)?;
        }
        out.push(')');
        return Ok(());
    }

    let coords = obj
        .get("coordinates")
        .ok_or(GeometryError::MissingMember("coordinates"))?;

    match kind {
        "Point" => {
            out.push_str("POINT(");
            write_position(coords, out)?;
            out.push(')');
        }
        "MultiPoint" => write_tagged(out, "MULTIPOINT", coords, write_position)?,
        "LineString" => write_tagged(out, "LINESTRING", coords, write_position)?,
        "MultiLineString" => write_tagged(out, "MULTILINESTRING", coords, write_position_seq)?,
        "Polygon" => write_tagged(out, "POLYGON", coords, write_position_seq)?,
        "MultiPolygon" => write_tagged(out, "MULTIPOLYGON", coords, write_ring_seq)?,
        other => return Err(GeometryError::UnsupportedType(other.to_string())),
    }
    Ok(())
}

/// Write `TAG(...)`, or `TAG EMPTY` when the coordinate array is empty.
fn write_tagged(
    out: &mut String,
    tag: &str,
    coords: &Value,
    mut element: impl FnMut(&Value, &mut String) -> Result<(), GeometryError>,
) -> Result<(), GeometryError> {
    let items = coords
        .as_array()
        .ok_or(GeometryError::BadCoordinates("expected an array"))?;
    out.push_str(tag);
    if items.is_empty() {
        out.push_str(" EMPTY");
        return Ok(());
    }
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        element(item, out)?;
    }
    out.push(')');
    Ok(())
}

/// A single position: two or three finite numbers, written space-separated.
fn write_position(position: &Value, out: &mut String) -> Result<(), GeometryError> {
    let nums = position
        .as_array()
        .ok_or(GeometryError::BadCoordinates("position must be an array"))?;
    if nums.len() < 2 || nums.len() > 3 {
        return Err(GeometryError::BadCoordinates(
            "position must hold 2 or 3 values",
        ));
    }
    for (i, n) in nums.iter().enumerate() {
        let Value::Number(value) = n else {
            return Err(GeometryError::BadCoordinates(
                "position values must be numbers",
            ));
        };
        if i > 0 {
            out.push(' ');
        }
        // The Number's own rendering keeps the integer/float distinction:
        // floats always carry a '.' or an exponent, so the reader can map
        // exponent-free text back to an integer without an f64 detour.
        out.push_str(&value.to_string());
    }
    Ok(())
}

/// A parenthesized sequence of positions (a line or a polygon ring).
fn write_position_seq(seq: &Value, out: &mut String) -> Result<(), GeometryError> {
    let positions = seq
        .as_array()
        .ok_or(GeometryError::BadCoordinates("expected an array of positions"))?;
    out.push('(');
    for (i, position) in positions.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_position(position, out)?;
    }
    out.push(')');
    Ok(())
}

/// A parenthesized sequence of rings (one polygon of a MultiPolygon).
fn write_ring_seq(rings: &Value, out: &mut String) -> Result<(), GeometryError> {
    let items = rings
        .as_array()
        .ok_or(GeometryError::BadCoordinates("expected an array of rings"))?;
    out.push('(');
    for (i, ring) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_position_seq(ring, out)?;
    }
    out.push(')');
    Ok(())
}
