//! Well-known text through the `wkt` crate, with the PostGIS `SRID=<n>;`
//! prefix on input and fixed-precision output.
//!
//! Keywords are case-insensitive and a third ordinate needs the `Z` tag.
//! Output is the compact `wkt` form (`POINT(1 2)`, `POINT Z(1 2 3)`) and
//! never carries the SRID.

use crate::convert::ZGeometry;
use geovalue_core::error::ParseError;
use std::str::FromStr;
use wkt::Wkt;

const SRID_PREFIX: &str = "SRID=";

///
/// Parsed
///
/// `srid` is set only when the text carries an `SRID=<n>;` prefix.
///

#[derive(Clone, Debug)]
pub struct Parsed {
    pub geometry: ZGeometry,
    pub srid: Option<i32>,
}

/// Parse WKT, or EWKT with an `SRID=<n>;` prefix.
pub fn read(text: &str) -> Result<Parsed, ParseError> {
    let (srid, body, offset) = split_srid(text)?;

    if body.trim().is_empty() {
        return Err(ParseError::text(offset, "empty geometry text"));
    }
    if let Some(end) = geometry_end(body) {
        let rest = &body[end..];
        if !rest.trim().is_empty() {
            let at = offset + end + (rest.len() - rest.trim_start().len());
            return Err(ParseError::text(at, "unexpected trailing input"));
        }
    }

    let parsed = Wkt::<f64>::from_str(body).map_err(|msg| ParseError::text(offset, msg))?;
    let geometry =
        ZGeometry::read(&parsed).map_err(|err| ParseError::text(offset, err.to_string()))?;

    Ok(Parsed { geometry, srid })
}

/// Render with at most `precision` fractional digits.
#[must_use]
pub fn write(geometry: &ZGeometry, precision: u8) -> String {
    geometry.to_wkt(Some(precision)).to_string()
}

// Returns the SRID, the text after the prefix, and that text's byte offset.
fn split_srid(text: &str) -> Result<(Option<i32>, &str, usize), ParseError> {
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();

    let has_prefix = trimmed
        .get(..SRID_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SRID_PREFIX));
    if !has_prefix {
        return Ok((None, trimmed, lead));
    }

    let start = lead + SRID_PREFIX.len();
    let Some((number, body)) = text[start..].split_once(';') else {
        return Err(ParseError::text(start, "expected ';' after the SRID"));
    };

    let srid = number
        .trim()
        .parse::<i32>()
        .map_err(|_| ParseError::text(start, format!("invalid SRID '{}'", number.trim())))?;

    Ok((Some(srid), body, start + number.len() + 1))
}

// The `wkt` reader stops after the first geometry, so the end is found here:
// the outermost closing parenthesis, or an `EMPTY` before any parenthesis.
// `None` when the text is too broken to tell; the parser reports that.
fn geometry_end(body: &str) -> Option<usize> {
    let open = body.find('(');
    let head = &body[..open.unwrap_or(body.len())];
    if let Some(at) = head.to_ascii_uppercase().find("EMPTY") {
        return Some(at + "EMPTY".len());
    }

    let open = open?;
    let mut depth = 0usize;
    for (i, c) in body[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

///
/// TESTS
///
