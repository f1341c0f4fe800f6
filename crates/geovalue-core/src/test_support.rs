//! In-crate backend double.
//!
//! Geometries are axis-aligned boxes. Text form: `BOX(x1 y1, x2 y2)`.
//! Binary form: tag byte `0x42`, SRID as i32 LE, then four f64 LE
//! (`min_x min_y max_x max_y`).

use crate::{
    context::GeometryContext,
    envelope::Envelope,
    error::{GeometryError, ParseError},
    geometry::{BackendId, GeometryBackend, GeometryHandle, peer},
};
use std::{
    any::Any,
    cmp::Ordering,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};

pub const MOCK_A: BackendId = BackendId::new("mock-a");
pub const MOCK_B: BackendId = BackendId::new("mock-b");

const TAG: u8 = 0x42;
const ENCODED_LEN: usize = 1 + 4 + 4 * 8;

///
/// MockBackend
///

#[derive(Debug)]
pub struct MockBackend {
    id: BackendId,
    parses: AtomicUsize,
}

impl MockBackend {
    /// Number of `from_bytes` calls so far.
    pub fn parses(&self) -> usize {
        self.parses.load(AtomicOrdering::SeqCst)
    }
}

pub fn mock_backend(id: BackendId) -> Arc<MockBackend> {
    Arc::new(MockBackend {
        id,
        parses: AtomicUsize::new(0),
    })
}

pub fn mock_context(id: BackendId) -> (Arc<MockBackend>, Arc<GeometryContext>) {
    let backend = mock_backend(id);
    let ctx = GeometryContext::new(backend.clone());

    (backend, ctx)
}

impl GeometryBackend for MockBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn from_text(&self, text: &str) -> Result<Box<dyn GeometryHandle>, ParseError> {
        self.from_text_with_srid(text, 0)
    }

    fn from_text_with_srid(
        &self,
        text: &str,
        srid: i32,
    ) -> Result<Box<dyn GeometryHandle>, ParseError> {
        let body = text
            .trim()
            .strip_prefix("BOX(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ParseError::text(0, "expected BOX(..)"))?;

        let mut numbers = Vec::with_capacity(4);
        for token in body.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let n: f64 = token
                .parse()
                .map_err(|_| ParseError::text(0, format!("bad number '{token}'")))?;
            numbers.push(n);
        }

        let &[x1, y1, x2, y2] = numbers.as_slice() else {
            return Err(ParseError::text(0, "expected four numbers"));
        };

        Ok(Box::new(MockHandle {
            backend: self.id,
            srid,
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }))
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Box<dyn GeometryHandle>, ParseError> {
        self.parses.fetch_add(1, AtomicOrdering::SeqCst);

        if bytes.len() != ENCODED_LEN {
            return Err(ParseError::binary(bytes.len(), "bad length"));
        }
        if bytes[0] != TAG {
            return Err(ParseError::binary(0, "bad tag"));
        }

        let srid = i32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        let mut coords = [0.0f64; 4];
        for (i, chunk) in bytes[5..].chunks_exact(8).enumerate() {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            coords[i] = f64::from_le_bytes(raw);
        }

        Ok(Box::new(MockHandle {
            backend: self.id,
            srid,
            min_x: coords[0],
            min_y: coords[1],
            max_x: coords[2],
            max_y: coords[3],
        }))
    }

    fn from_envelope(&self, envelope: &Envelope) -> Box<dyn GeometryHandle> {
        Box::new(MockHandle {
            backend: self.id,
            srid: 0,
            min_x: envelope.min_x(),
            min_y: envelope.min_y(),
            max_x: envelope.max_x(),
            max_y: envelope.max_y(),
        })
    }
}

///
/// MockHandle
///

#[derive(Clone, Debug)]
pub struct MockHandle {
    backend: BackendId,
    srid: i32,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl MockHandle {
    fn coords(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl GeometryHandle for MockHandle {
    fn backend(&self) -> BackendId {
        self.backend
    }

    fn srid(&self) -> i32 {
        self.srid
    }

    fn geometry_type(&self) -> &'static str {
        "BOX"
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn has_z(&self) -> bool {
        false
    }

    fn to_text(&self) -> String {
        format!(
            "BOX({} {}, {} {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LEN);
        out.push(TAG);
        out.extend_from_slice(&self.srid.to_le_bytes());
        for v in self.coords() {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn envelope(&self) -> Envelope {
        Envelope::new(self.backend, self.min_x, self.max_x, self.min_y, self.max_y)
    }

    fn clone_handle(&self) -> Box<dyn GeometryHandle> {
        Box::new(self.clone())
    }

    fn compare(&self, other: &dyn GeometryHandle) -> Result<Ordering, GeometryError> {
        let other = peer::<Self>(self.backend, other)?;
        let ord = self
            .coords()
            .iter()
            .zip(other.coords().iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal);

        Ok(ord)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
