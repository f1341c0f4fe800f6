//! Well-known binary through the `wkb` crate, plus the PostGIS EWKB flags.
//!
//! Input may be either byte order and may mark Z with the EWKB flag or the
//! ISO 1000 offset. Output is big-endian ISO WKB; a non-zero SRID sets the
//! EWKB SRID flag on the outer header and follows it.
//!
//! `wkb` trusts the counts and member headers it is given, so every input is
//! framed here first: each header, count, and member is checked against the
//! bytes actually present before the crate sees the buffer.

use crate::convert::{MAX_DEPTH, ZGeometry};
use bitflags::bitflags;
use geovalue_core::error::ParseError;
use wkb::{
    Endianness,
    reader::read_wkb,
    writer::{WriteOptions, geometry_wkb_size, write_geometry},
};

///
/// CONSTANTS
///

/// Byte-order marker for big-endian (XDR) encoding.
pub const BIG_ENDIAN: u8 = 0x00;

/// Byte-order marker for little-endian (NDR) encoding.
pub const LITTLE_ENDIAN: u8 = 0x01;

const POINT: u32 = 1;
const LINESTRING: u32 = 2;
const POLYGON: u32 = 3;
const MULTIPOINT: u32 = 4;
const MULTILINESTRING: u32 = 5;
const MULTIPOLYGON: u32 = 6;
const GEOMETRYCOLLECTION: u32 = 7;

// order byte and type word
const HEADER_LEN: usize = 5;

bitflags! {
    ///
    /// TypeFlags
    ///
    /// High bits of an EWKB type word.
    ///
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct TypeFlags: u32 {
        const Z = 0x8000_0000;
        const M = 0x4000_0000;
        const SRID = 0x2000_0000;
    }
}

///
/// Decoded
///
/// Result of reading a binary geometry. `srid` is 0 when absent.
///

#[derive(Clone, Debug)]
pub struct Decoded {
    pub geometry: ZGeometry,
    pub srid: i32,
}

/// Decode WKB or EWKB. The whole input must be consumed.
pub fn read(bytes: &[u8]) -> Result<Decoded, ParseError> {
    let frame = Frame { bytes };
    let top = frame.header(0, true)?;

    let end = frame.geometry(0, None, 1)?;
    if end != bytes.len() {
        return Err(ParseError::binary(
            end,
            format!("{} trailing bytes", bytes.len() - end),
        ));
    }

    let srid = if top.srid {
        frame.word(HEADER_LEN, top.order)?.cast_signed()
    } else {
        0
    };

    let parsed = read_wkb(bytes).map_err(|err| ParseError::binary(0, err.to_string()))?;
    let geometry = ZGeometry::read(&parsed)
        .map_err(|err| ParseError::binary(bytes.len(), err.to_string()))?;

    Ok(Decoded { geometry, srid })
}

/// Encode as big-endian WKB, with the SRID on the outer header when non-zero.
///
/// An empty point is written as NaN ordinates.
#[must_use]
pub fn write(geometry: &ZGeometry, srid: i32) -> Vec<u8> {
    let source = geometry.to_wkt(None);
    let options = WriteOptions {
        endianness: Endianness::BigEndian,
    };

    let mut out = Vec::with_capacity(geometry_wkb_size(&source) + 4);
    if let Err(err) = write_geometry(&mut out, &source, &options) {
        // only a vector write or an unknown dimension can fail
        tracing::error!(%err, "geometry encoding failed");
    }

    if srid != 0
        && let Some(word) = out.get_mut(1..HEADER_LEN)
    {
        let code =
            u32::from_be_bytes([word[0], word[1], word[2], word[3]]) | TypeFlags::SRID.bits();
        word.copy_from_slice(&code.to_be_bytes());
        out.splice(HEADER_LEN..HEADER_LEN, srid.to_be_bytes());
    }

    out
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Order {
    Big,
    Little,
}

#[derive(Clone, Copy, Debug)]
struct Header {
    order: Order,
    kind: u32,
    z: bool,
    srid: bool,
}

impl Header {
    const fn coord_len(self) -> usize {
        if self.z { 24 } else { 16 }
    }
}

///
/// Frame
///
/// Structural walk over raw bytes. Reads headers and counts only; ordinates
/// are left to `wkb`.
///

struct Frame<'a> {
    bytes: &'a [u8],
}

impl Frame<'_> {
    // Returns the offset just past the geometry starting at `at`.
    // `parent` is the header of the enclosing multi-geometry, if any.
    fn geometry(
        &self,
        at: usize,
        parent: Option<Header>,
        depth: usize,
    ) -> Result<usize, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::binary(at, "geometry nesting too deep"));
        }

        let header = self.header(at, depth == 1)?;
        if let Some(parent) = parent {
            member(at, parent, header)?;
        }

        let body = at + HEADER_LEN + if header.srid { 4 } else { 0 };
        let coord = header.coord_len();

        match header.kind {
            POINT => self.span(body, coord),
            LINESTRING => {
                let (n, next) = self.count(body, header.order, coord)?;
                Ok(next + n * coord)
            }
            POLYGON => {
                let (rings, mut next) = self.count(body, header.order, 4)?;
                for _ in 0..rings {
                    let (n, start) = self.count(next, header.order, coord)?;
                    next = start + n * coord;
                }
                Ok(next)
            }
            MULTIPOINT | MULTILINESTRING | MULTIPOLYGON => {
                let (n, mut next) = self.count(body, header.order, HEADER_LEN)?;
                for _ in 0..n {
                    next = self.geometry(next, Some(header), depth + 1)?;
                }
                Ok(next)
            }
            _ => {
                let (n, mut next) = self.count(body, header.order, HEADER_LEN)?;
                for _ in 0..n {
                    next = self.geometry(next, None, depth + 1)?;
                }
                Ok(next)
            }
        }
    }

    fn header(&self, at: usize, outer: bool) -> Result<Header, ParseError> {
        let order = match self.byte(at)? {
            BIG_ENDIAN => Order::Big,
            LITTLE_ENDIAN => Order::Little,
            other => {
                return Err(ParseError::binary(
                    at,
                    format!("invalid byte order marker {other:#04x}"),
                ));
            }
        };

        let raw = self.word(at + 1, order)?;
        let flags = TypeFlags::from_bits_truncate(raw);
        let base = raw & !TypeFlags::all().bits();

        if flags.contains(TypeFlags::M) {
            return Err(ParseError::binary(at, "measured geometries are not supported"));
        }
        if flags.contains(TypeFlags::SRID) && !outer {
            return Err(ParseError::binary(at, "SRID on a nested geometry"));
        }

        let iso_z = match base / 1000 {
            0 => false,
            1 => true,
            2 | 3 => {
                return Err(ParseError::binary(at, "measured geometries are not supported"));
            }
            _ => return Err(ParseError::binary(at, format!("unknown geometry type {raw:#x}"))),
        };
        let kind = base % 1000;
        if !(POINT..=GEOMETRYCOLLECTION).contains(&kind) {
            return Err(ParseError::binary(at, format!("unknown geometry type {raw:#x}")));
        }

        Ok(Header {
            order,
            kind,
            z: iso_z || flags.contains(TypeFlags::Z),
            srid: flags.contains(TypeFlags::SRID),
        })
    }

    // Reads an element count at `at` and checks it against the bytes left,
    // given the smallest possible encoding of one element.
    fn count(
        &self,
        at: usize,
        order: Order,
        min_size: usize,
    ) -> Result<(usize, usize), ParseError> {
        let n = usize::try_from(self.word(at, order)?)
            .map_err(|_| ParseError::binary(at, "element count overflow"))?;

        let next = at + 4;
        let remaining = self.bytes.len() - next;
        match n.checked_mul(min_size) {
            Some(needed) if needed <= remaining => Ok((n, next)),
            _ => Err(ParseError::binary(
                at,
                format!("count {n} exceeds remaining {remaining} bytes"),
            )),
        }
    }

    fn span(&self, at: usize, len: usize) -> Result<usize, ParseError> {
        at.checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| ParseError::binary(at, "unexpected end of input"))
    }

    fn byte(&self, at: usize) -> Result<u8, ParseError> {
        self.bytes
            .get(at)
            .copied()
            .ok_or_else(|| ParseError::binary(at, "unexpected end of input"))
    }

    fn word(&self, at: usize, order: Order) -> Result<u32, ParseError> {
        let end = self.span(at, 4)?;
        let mut raw = [0; 4];
        raw.copy_from_slice(&self.bytes[at..end]);

        Ok(match order {
            Order::Big => u32::from_be_bytes(raw),
            Order::Little => u32::from_le_bytes(raw),
        })
    }
}

// `wkb` decodes multi-geometry members with the parent's byte order and
// ordinate count, so members must agree with it.
fn member(at: usize, parent: Header, header: Header) -> Result<(), ParseError> {
    let expected = parent.kind - 3;
    if header.kind != expected {
        return Err(ParseError::binary(
            at,
            format!(
                "expected {} member, found {}",
                keyword(expected),
                keyword(header.kind)
            ),
        ));
    }
    if header.z != parent.z {
        return Err(ParseError::binary(at, "mixed ordinate counts inside one geometry"));
    }
    if header.order != parent.order {
        return Err(ParseError::binary(at, "member byte order differs from its parent"));
    }

    Ok(())
}

const fn keyword(kind: u32) -> &'static str {
    match kind {
        POINT => "POINT",
        LINESTRING => "LINESTRING",
        POLYGON => "POLYGON",
        MULTIPOINT => "MULTIPOINT",
        MULTILINESTRING => "MULTILINESTRING",
        MULTIPOLYGON => "MULTIPOLYGON",
        _ => "GEOMETRYCOLLECTION",
    }
}

///
/// TESTS
///
