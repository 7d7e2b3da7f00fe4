//! Search document schema and builders.
//!
//! The schema is fixed; consumers (the discovery frontend) rely on every
//! field being present with these exact names. Documents come in two
//! flavors, `single_sheet` and `mosaic`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TemplateSettings;
use crate::geometry::Clip;
use crate::id::IdCodec;
use crate::models::{GeorefMap, Metadata, MosaicMap, RawMap};

/// A link published alongside a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineResource {
    pub url: String,
    /// One of `Permalink`, `WMS`, `WCS`, `download`
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// The denormalized discovery view of a map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Public id, also the document key
    pub map_id: String,
    pub file_name: String,
    pub description: String,
    pub map_scale: Option<i64>,
    pub zoomify_url: Option<String>,
    /// Lowercased map type
    pub map_type: String,
    /// Joined from map type and technique
    pub keywords: String,
    pub title_long: String,
    pub title: String,
    pub permalink: Option<String>,
    pub online_resources: Vec<OnlineResource>,
    /// Templated tile URLs; present only when a georef product exists
    pub tms_urls: Vec<String>,
    pub thumb_url: Option<String>,
    /// GeoJSON polygon or null
    pub geometry: Option<Value>,
    pub has_georeference: bool,
    /// ISO date
    pub time_published: String,
    /// `single_sheet` or `mosaic`
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// Geometry for a single sheet: the sanitized clip polygon when present
/// and valid, else the georef extent polygon, else null.
///
/// The caller normalizes the clip's CRS to WGS84 before handing it in.
pub fn derive_geometry(clip: Option<&Clip>, georef: Option<&GeorefMap>) -> Option<Value> {
    if let Some(clip) = clip {
        if clip.is_valid() || clip.sanitize().is_some() {
            if let Some(geojson) = clip.to_geojson() {
                return Some(geojson);
            }
        }
    }
    let bbox = georef?.parsed_extent()?;
    Some(bbox.to_geojson_polygon())
}

/// Builds the document for a single-sheet map.
pub fn document_for_map(
    raw_map: &RawMap,
    metadata: &Metadata,
    georef: Option<&GeorefMap>,
    geometry: Option<Value>,
    codec: &IdCodec,
    templates: &TemplateSettings,
) -> SearchDocument {
    let public_id = codec.encode_map_id(raw_map.id);
    let has_georeference = georef.is_some();

    let permalink = metadata.permalink.clone().or_else(|| {
        metadata
            .ppn
            .as_ref()
            .map(|ppn| format!("{}{}", templates.global_permalink_resolver, ppn))
    });

    let mut online_resources = Vec::new();
    if let Some(url) = &permalink {
        online_resources.push(OnlineResource {
            url: url.clone(),
            resource_type: "Permalink".to_string(),
        });
    }
    if has_georeference {
        let id = raw_map.id.to_string();
        online_resources.push(OnlineResource {
            url: TemplateSettings::fill(&templates.wms_url_template, &id),
            resource_type: "WMS".to_string(),
        });
        online_resources.push(OnlineResource {
            url: TemplateSettings::fill(&templates.wcs_url_template, &id),
            resource_type: "WCS".to_string(),
        });
        if raw_map.allow_download {
            online_resources.push(OnlineResource {
                url: TemplateSettings::fill(
                    &templates.wcs_url_template,
                    &format!("{}?request=GetCoverage", id),
                ),
                resource_type: "download".to_string(),
            });
        }
    }

    let tms_urls = if has_georeference {
        let stem = format!("{}/{}", raw_map.map_type.to_lowercase(), raw_map.file_name);
        templates
            .tms_url_templates
            .iter()
            .map(|template| TemplateSettings::fill(template, &stem))
            .collect()
    } else {
        Vec::new()
    };

    let keywords = match metadata.technique.as_deref() {
        Some(technique) if !technique.is_empty() => {
            format!("{}, {}", raw_map.map_type.to_lowercase(), technique)
        }
        _ => raw_map.map_type.to_lowercase(),
    };

    SearchDocument {
        map_id: public_id,
        file_name: raw_map.file_name.clone(),
        description: metadata.description.clone(),
        map_scale: raw_map.map_scale,
        zoomify_url: metadata.link_zoomify.clone(),
        map_type: raw_map.map_type.to_lowercase(),
        keywords,
        title_long: metadata.title.clone(),
        title: metadata.title_short.clone(),
        permalink,
        online_resources,
        tms_urls,
        thumb_url: metadata
            .link_thumb_mid
            .clone()
            .or_else(|| metadata.link_thumb_small.clone()),
        geometry,
        has_georeference,
        time_published: metadata.time_of_publication.clone(),
        doc_type: "single_sheet".to_string(),
    }
}

/// Builds the document for a mosaic map.
///
/// Mosaics publish a WMS resource only; the geometry is the WGS84 extent of
/// the stitched dataset.
pub fn document_for_mosaic(
    mosaic: &MosaicMap,
    geometry: Option<Value>,
    codec: &IdCodec,
    templates: &TemplateSettings,
) -> SearchDocument {
    let public_id = codec.encode_mosaic_id(mosaic.id);

    SearchDocument {
        map_id: public_id,
        file_name: mosaic.name.clone(),
        description: String::new(),
        map_scale: mosaic.map_scale,
        zoomify_url: None,
        map_type: "mosaic".to_string(),
        keywords: "mosaic".to_string(),
        title_long: mosaic.title.clone(),
        title: mosaic.title_short.clone(),
        permalink: None,
        online_resources: vec![OnlineResource {
            url: TemplateSettings::fill(&templates.wms_url_template, &mosaic.name),
            resource_type: "WMS".to_string(),
        }],
        tms_urls: Vec::new(),
        thumb_url: mosaic.link_thumb.clone(),
        geometry,
        has_georeference: true,
        time_published: mosaic.time_of_publication.format("%Y-%m-%d").to_string(),
        doc_type: "mosaic".to_string(),
    }
}
