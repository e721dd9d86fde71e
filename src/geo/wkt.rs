//! EWKT reader: turns the normalized storage text back into a GeoJSON
//! geometry object. Only the forms the writer in this module's parent can
//! produce are accepted; anything else is a corrupt row.

use serde_json::{json, Number, Value};

use super::{GeometryError, SRID};

/// Parse SRID-tagged EWKT into a GeoJSON geometry object.
pub fn from_ewkt(text: &str) -> Result<Value, GeometryError> {
    let tag = format!("SRID={};", SRID);
    let body = text
        .strip_prefix(tag.as_str())
        .ok_or_else(|| bad("missing or foreign SRID tag"))?;

    let mut scanner = Scanner::new(body);
    let geometry = parse_geometry(&mut scanner)?;
    scanner.skip_ws();
    if !scanner.at_end() {
        return Err(bad("trailing input after geometry"));
    }
    Ok(geometry)
}

fn bad(msg: &str) -> GeometryError {
    GeometryError::BadEwkt(msg.to_string())
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, ch: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: u8) -> Result<(), GeometryError> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(bad("unexpected character"))
        }
    }

    /// Read an uppercase keyword (geometry tag or EMPTY).
    fn keyword(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_uppercase()) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Read the raw text of one numeric token.
    fn number_token(&mut self) -> Result<&'a str, GeometryError> {
        self.skip_ws();
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.' | b'e' | b'E')
        ) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(bad("expected a number"));
        }
        std::str::from_utf8(&self.input[start..self.pos]).map_err(|_| bad("non-ascii number"))
    }
}

fn parse_geometry(s: &mut Scanner) -> Result<Value, GeometryError> {
    let tag = s.keyword();
    match tag.as_str() {
        "POINT" => {
            s.expect(b'(')?;
            let position = parse_position(s)?;
            s.expect(b')')?;
            Ok(json!({"type": "Point", "coordinates": position}))
        }
        "MULTIPOINT" => parse_body(s, "MultiPoint", parse_position),
        "LINESTRING" => parse_body(s, "LineString", parse_position),
        "MULTILINESTRING" => parse_body(s, "MultiLineString", parse_position_seq),
        "POLYGON" => parse_body(s, "Polygon", parse_position_seq),
        "MULTIPOLYGON" => parse_body(s, "MultiPolygon", parse_ring_seq),
        "GEOMETRYCOLLECTION" => {
            if peek_empty(s) {
                return Ok(json!({"type": "GeometryCollection", "geometries": []}));
            }
            s.expect(b'(')?;
            let mut members = Vec::new();
            loop {
                members.push(parse_geometry(s)?);
                if !s.eat(b',') {
                    break;
                }
            }
            s.expect(b')')?;
            Ok(json!({"type": "GeometryCollection", "geometries": members}))
        }
        _ => Err(bad("unknown geometry tag")),
    }
}

/// `TAG EMPTY` or `TAG(element,element,...)`.
fn parse_body(
    s: &mut Scanner,
    geojson_type: &str,
    mut element: impl FnMut(&mut Scanner) -> Result<Value, GeometryError>,
) -> Result<Value, GeometryError> {
    if peek_empty(s) {
        return Ok(json!({"type": geojson_type, "coordinates": []}));
    }
    s.expect(b'(')?;
    let mut items = Vec::new();
    loop {
        items.push(element(s)?);
        if !s.eat(b',') {
            break;
        }
    }
    s.expect(b')')?;
    Ok(json!({"type": geojson_type, "coordinates": items}))
}

fn peek_empty(s: &mut Scanner) -> bool {
    s.skip_ws();
    if s.input[s.pos..].starts_with(b"EMPTY") {
        s.pos += 5;
        true
    } else {
        false
    }
}

/// Space-separated coordinate values, as many as the writer emitted (2 or 3).
fn parse_position(s: &mut Scanner) -> Result<Value, GeometryError> {
    let mut values = Vec::new();
    values.push(parse_number(s)?);
    loop {
        s.skip_ws();
        match s.peek() {
            Some(b',') | Some(b')') | None => break,
            _ => values.push(parse_number(s)?),
        }
    }
    if values.len() < 2 || values.len() > 3 {
        return Err(bad("position must hold 2 or 3 values"));
    }
    Ok(Value::Array(values))
}

/// Rebuild the JSON number a coordinate was written from. Text with a
/// fraction or exponent is a float; everything else stays integral, so
/// integers beyond 2^53 never pass through f64.
fn parse_number(s: &mut Scanner) -> Result<Value, GeometryError> {
    let text = s.number_token()?;
    let number = if text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E')) {
        let value: f64 = text.parse().map_err(|_| bad("unparseable number"))?;
        Number::from_f64(value).ok_or_else(|| bad("non-finite coordinate"))?
    } else if let Ok(value) = text.parse::<i64>() {
        Number::from(value)
    } else if let Ok(value) = text.parse::<u64>() {
        Number::from(value)
    } else {
        return Err(bad("unparseable number"));
    };
    Ok(Value::Number(number))
}

fn parse_position_seq(s: &mut Scanner) -> Result<Value, GeometryError> {
    s.expect(b'(')?;
    let mut positions = Vec::new();
    loop {
        positions.push(parse_position(s)?);
        if !s.eat(b',') {
            break;
        }
    }
    s.expect(b')')?;
    Ok(Value::Array(positions))
}

fn parse_ring_seq(s: &mut Scanner) -> Result<Value, GeometryError> {
    s.expect(b'(')?;
    let mut rings = Vec::new();
    loop {
        rings.push(parse_position_seq(s)?);
        if !s.eat(b',') {
            break;
        }
    }
    s.expect(b')')?;
    Ok(Value::Array(rings))
}
