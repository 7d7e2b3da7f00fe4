//! Geometry primitives for clip polygons and raster extents.
//!
//! Clip polygons arrive as GeoJSON with a named CRS and come in two shapes,
//! `Polygon` and `MultiPolygon`. Before a clip reaches the rectifier or the
//! search document it is sanitized to one canonical polygon ring: duplicate
//! consecutive vertices are dropped and a MultiPolygon is reduced to its
//! largest-area member.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Axis-aligned bounding box, `[minx, miny, maxx, maxy]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

/// EPSG:4314 (DHDN / Gauss-Krüger datum) validity box in degrees.
///
/// Rasters declared 4314 whose bounds fall outside this box are either
/// reprojected (overflow to the east) or rejected.
pub const EPSG_4314_BOUNDS: BBox = BBox {
    minx: 5.87,
    miny: 47.27,
    maxx: 13.84,
    maxy: 55.09,
};

impl BBox {
    /// Builds a bounding box, normalizing min/max order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            minx: x1.min(x2),
            miny: y1.min(y2),
            maxx: x1.max(x2),
            maxy: y1.max(y2),
        }
    }

    /// True if `other` lies fully inside this box.
    pub fn contains(&self, other: &BBox) -> bool {
        other.minx >= self.minx
            && other.miny >= self.miny
            && other.maxx <= self.maxx
            && other.maxy <= self.maxy
    }

    /// True if `other` exceeds this box only across the eastern edge.
    ///
    /// The western, southern and northern bounds must hold; only
    /// `other.maxx` may overflow.
    pub fn overflows_only_east(&self, other: &BBox) -> bool {
        other.minx >= self.minx
            && other.miny >= self.miny
            && other.maxy <= self.maxy
            && other.maxx > self.maxx
    }

    /// Renders the box as a closed GeoJSON Polygon.
    pub fn to_geojson_polygon(&self) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [self.minx, self.miny],
                [self.maxx, self.miny],
                [self.maxx, self.maxy],
                [self.minx, self.maxy],
                [self.minx, self.miny]
            ]]
        })
    }

    /// Extracts the bounding box of a GeoJSON Polygon value.
    pub fn from_geojson_polygon(value: &Value) -> Option<Self> {
        let ring = outer_ring(value)?;
        let mut points = ring.iter();
        let first = points.next()?;
        let mut bbox = Self::new(first[0], first[1], first[0], first[1]);
        for p in points {
            bbox.minx = bbox.minx.min(p[0]);
            bbox.miny = bbox.miny.min(p[1]);
            bbox.maxx = bbox.maxx.max(p[0]);
            bbox.maxy = bbox.maxy.max(p[1]);
        }
        Some(bbox)
    }
}

/// A clip polygon in one of its accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Clip {
    /// No clip configured
    None,
    /// Single polygon: the outer ring, in order
    Polygon(Vec<[f64; 2]>),
    /// Multiple polygons: outer rings, in order
    MultiPolygon(Vec<Vec<[f64; 2]>>),
}

impl Clip {
    /// Parses a GeoJSON geometry into a clip.
    ///
    /// Anything other than a `Polygon` or `MultiPolygon` is treated as no
    /// clip. Inner rings (holes) are ignored; the rectifier only supports
    /// outer cutlines.
    pub fn from_geojson(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("Polygon") => match parse_rings(value.get("coordinates")) {
                Some(rings) if !rings.is_empty() => Clip::Polygon(rings[0].clone()),
                _ => Clip::None,
            },
            Some("MultiPolygon") => {
                let Some(polys) = value.get("coordinates").and_then(Value::as_array) else {
                    return Clip::None;
                };
                let rings: Vec<Vec<[f64; 2]>> = polys
                    .iter()
                    .filter_map(|poly| parse_rings(Some(poly)))
                    .filter_map(|rings| rings.into_iter().next())
                    .collect();
                if rings.is_empty() {
                    Clip::None
                } else {
                    Clip::MultiPolygon(rings)
                }
            }
            _ => Clip::None,
        }
    }

    /// Parses the serialized clip column of a transformation.
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Clip::None;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_geojson(&value),
            Err(_) => Clip::None,
        }
    }

    /// The named CRS of a stored clip, when present (`EPSG:<code>`).
    pub fn stored_epsg(raw: Option<&str>) -> Option<i64> {
        let value: Value = serde_json::from_str(raw?).ok()?;
        let name = value
            .pointer("/crs/properties/name")
            .and_then(Value::as_str)?;
        name.rsplit(':').next()?.parse().ok()
    }

    /// Sanitizes to one canonical polygon ring.
    ///
    /// Drops consecutive duplicate vertices; reduces a MultiPolygon to its
    /// largest-area ring. Returns `None` when nothing valid remains.
    pub fn sanitize(&self) -> Option<Vec<[f64; 2]>> {
        match self {
            Clip::None => None,
            Clip::Polygon(ring) => {
                let ring = dedup_consecutive(ring);
                (ring.len() >= 4).then_some(ring)
            }
            Clip::MultiPolygon(rings) => rings
                .iter()
                .map(|ring| dedup_consecutive(ring))
                .filter(|ring| ring.len() >= 4)
                .max_by(|a, b| {
                    ring_area(a)
                        .partial_cmp(&ring_area(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                }),
        }
    }

    /// Whether this clip may be handed to the rectifier.
    ///
    /// A Polygon must close on itself with no duplicate consecutive
    /// vertices; a MultiPolygon is valid if its largest ring is.
    pub fn is_valid(&self) -> bool {
        match self {
            Clip::None => false,
            Clip::Polygon(ring) => ring_closes(ring) && !has_consecutive_duplicates(ring),
            Clip::MultiPolygon(_) => self.sanitize().is_some(),
        }
    }

    /// Renders the sanitized clip as a GeoJSON Polygon, closing the ring.
    pub fn to_geojson(&self) -> Option<Value> {
        let mut ring = self.sanitize()?;
        if ring.first() != ring.last() {
            let first = ring[0];
            ring.push(first);
        }
        let coordinates: Vec<Vec<f64>> = ring.iter().map(|p| vec![p[0], p[1]]).collect();
        Some(json!({
            "type": "Polygon",
            "coordinates": [coordinates]
        }))
    }
}

/// Shoelace area of a ring (absolute value).
fn ring_area(ring: &[[f64; 2]]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        doubled += ring[i][0] * ring[j][1] - ring[j][0] * ring[i][1];
    }
    doubled.abs() / 2.0
}

fn ring_closes(ring: &[[f64; 2]]) -> bool {
    ring.len() >= 4 && ring.first() == ring.last()
}

fn has_consecutive_duplicates(ring: &[[f64; 2]]) -> bool {
    // The closing vertex repeats the first by definition and is not counted.
    let open = if ring_closes(ring) {
        &ring[..ring.len() - 1]
    } else {
        ring
    };
    open.windows(2).any(|w| w[0] == w[1])
}

/// Removes consecutive duplicate vertices, keeping the ring closed.
fn dedup_consecutive(ring: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut out: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for &p in ring {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    if out.len() >= 3 && out.first() != out.last() {
        let first = out[0];
        out.push(first);
    }
    out
}

fn parse_rings(coordinates: Option<&Value>) -> Option<Vec<Vec<[f64; 2]>>> {
    let rings = coordinates?.as_array()?;
    let parsed: Vec<Vec<[f64; 2]>> = rings
        .iter()
        .filter_map(|ring| {
            let points = ring.as_array()?;
            points
                .iter()
                .map(|p| {
                    let xy = p.as_array()?;
                    Some([xy.first()?.as_f64()?, xy.get(1)?.as_f64()?])
                })
                .collect()
        })
        .collect();
    Some(parsed)
}

fn outer_ring(value: &Value) -> Option<Vec<[f64; 2]>> {
    if value.get("type").and_then(Value::as_str) != Some("Polygon") {
        return None;
    }
    parse_rings(value.get("coordinates"))?.into_iter().next()
}
