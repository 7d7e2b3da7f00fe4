//! Search document publication.

use std::path::Path;

use tracing::{debug, info};

use super::ActionError;
use crate::config::TemplateSettings;
use crate::geometry::Clip;
use crate::id::IdCodec;
use crate::models::{GeorefMap, Metadata, MosaicMap, RawMap};
use crate::search::{derive_geometry, document, SearchIndex};
use crate::toolchain::Toolchain;

const WGS84_EPSG: i64 = 4326;

/// Rebuilds and upserts the search document of a single-sheet map.
///
/// `clip_raw` is the stored clip of the active transformation, when one
/// exists; its ring is reprojected to WGS84 before it becomes the document
/// geometry. Returns the public id the document was stored under.
pub async fn update_index<T: Toolchain, S: SearchIndex>(
    toolchain: &T,
    index: &S,
    raw_map: &RawMap,
    metadata: &Metadata,
    georef: Option<&GeorefMap>,
    clip_raw: Option<&str>,
    codec: &IdCodec,
    templates: &TemplateSettings,
) -> Result<String, ActionError> {
    let clip = normalized_clip(toolchain, clip_raw)?;
    let geometry = derive_geometry(clip.as_ref(), georef);
    let doc = document::document_for_map(raw_map, metadata, georef, geometry, codec, templates);

    index.upsert(&doc.map_id, &doc).await?;
    info!(public_id = %doc.map_id, "indexed map document");
    Ok(doc.map_id)
}

/// Rebuilds and upserts the search document of a mosaic. The geometry is
/// read from the stitched dataset when it exists on disk.
pub async fn update_mosaic_index<T: Toolchain, S: SearchIndex>(
    toolchain: &T,
    index: &S,
    mosaic: &MosaicMap,
    dataset: &Path,
    codec: &IdCodec,
    templates: &TemplateSettings,
) -> Result<String, ActionError> {
    let geometry = if dataset.exists() {
        Some(toolchain.get_extent(dataset)?.to_geojson_polygon())
    } else {
        debug!(dataset = %dataset.display(), "mosaic dataset absent, indexing without geometry");
        None
    };
    let doc = document::document_for_mosaic(mosaic, geometry, codec, templates);

    index.upsert(&doc.map_id, &doc).await?;
    info!(public_id = %doc.map_id, "indexed mosaic document");
    Ok(doc.map_id)
}

/// Parses a stored clip and reprojects its ring to WGS84 when it carries a
/// different named CRS.
fn normalized_clip<T: Toolchain>(
    toolchain: &T,
    clip_raw: Option<&str>,
) -> Result<Option<Clip>, ActionError> {
    let clip = Clip::from_stored(clip_raw);
    if matches!(clip, Clip::None) {
        return Ok(None);
    }
    let Some(epsg) = Clip::stored_epsg(clip_raw) else {
        return Ok(Some(clip));
    };
    if epsg == WGS84_EPSG {
        return Ok(Some(clip));
    }
    let Some(ring) = clip.sanitize() else {
        return Ok(Some(clip));
    };
    let reprojected = toolchain.transform_points(&ring, epsg, WGS84_EPSG)?;
    Ok(Some(Clip::Polygon(reprojected)))
}
