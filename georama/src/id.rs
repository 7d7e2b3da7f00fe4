//! Public identifier codec.
//!
//! Internal integer ids are published as opaque strings, e.g.
//! `oai:de:slub-dresden:vk:id-42` for single sheets and
//! `oai:de:slub-dresden:vk:mosaic:id-42` for mosaics. Both directions are
//! exact inverses; decoding verifies the configured prefix.

use thiserror::Error;

use crate::config::TemplateSettings;

/// Malformed public identifier.
#[derive(Debug, Error)]
pub enum IdFormatError {
    /// The identifier does not start with the configured prefix
    #[error("public id '{id}' does not match prefix '{prefix}'")]
    PrefixMismatch { id: String, prefix: String },

    /// The trailing segment is not an integer
    #[error("public id '{id}' has a non-numeric payload")]
    NonNumericPayload { id: String },
}

/// Bidirectional mapping between internal ids and public identifiers.
#[derive(Debug, Clone)]
pub struct IdCodec {
    map_template: String,
    mosaic_template: String,
}

impl IdCodec {
    /// Builds a codec from the configured id templates.
    pub fn new(templates: &TemplateSettings) -> Self {
        Self {
            map_template: templates.map_id_template.clone(),
            mosaic_template: templates.mosaic_map_id_template.clone(),
        }
    }

    /// Public id of a single-sheet map.
    pub fn encode_map_id(&self, id: i64) -> String {
        TemplateSettings::fill(&self.map_template, &id.to_string())
    }

    /// Public id of a mosaic map.
    pub fn encode_mosaic_id(&self, id: i64) -> String {
        TemplateSettings::fill(&self.mosaic_template, &id.to_string())
    }

    /// Internal id of a single-sheet public id.
    pub fn decode_map_id(&self, public_id: &str) -> Result<i64, IdFormatError> {
        decode(public_id, &self.map_template)
    }

    /// Internal id of a mosaic public id.
    pub fn decode_mosaic_id(&self, public_id: &str) -> Result<i64, IdFormatError> {
        decode(public_id, &self.mosaic_template)
    }
}

/// Splits on the last `-`, verifies the prefix against the template and
/// parses the integer payload.
fn decode(public_id: &str, template: &str) -> Result<i64, IdFormatError> {
    let expected_prefix = template.split("{}").next().unwrap_or(template);
    let Some((prefix, payload)) = public_id.rsplit_once('-') else {
        return Err(IdFormatError::PrefixMismatch {
            id: public_id.to_string(),
            prefix: expected_prefix.to_string(),
        });
    };
    // The template prefix itself ends with the '-' we split on.
    if format!("{}-", prefix) != expected_prefix {
        return Err(IdFormatError::PrefixMismatch {
            id: public_id.to_string(),
            prefix: expected_prefix.to_string(),
        });
    }
    payload
        .parse()
        .map_err(|_| IdFormatError::NonNumericPayload {
            id: public_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdCodec {
        IdCodec::new(&crate::config::Settings::default().templates)
    }

    #[test]
    fn test_encode_map_id() {
        assert_eq!(codec().encode_map_id(42), "oai:de:slub-dresden:vk:id-42");
    }

    #[test]
    fn test_encode_mosaic_id() {
        assert_eq!(
            codec().encode_mosaic_id(7),
            "oai:de:slub-dresden:vk:mosaic:id-7"
        );
    }

    #[test]
    fn test_decode_roundtrip() {
        let codec = codec();
        for id in [0, 1, 42, 10_000_000] {
            assert_eq!(
                codec.decode_map_id(&codec.encode_map_id(id)).expect("decode"),
                id
            );
            assert_eq!(
                codec
                    .decode_mosaic_id(&codec.encode_mosaic_id(id))
                    .expect("decode"),
                id
            );
        }
    }

    #[test]
    fn test_encode_of_decode_is_identity() {
        let codec = codec();
        let public = "oai:de:slub-dresden:vk:id-815";
        let id = codec.decode_map_id(public).expect("decode");
        assert_eq!(codec.encode_map_id(id), public);
    }

    #[test]
    fn test_decode_rejects_wrong_prefix() {
        let err = codec()
            .decode_map_id("oai:de:other:vk:id-42")
            .expect_err("must fail");
        assert!(matches!(err, IdFormatError::PrefixMismatch { .. }));
    }

    #[test]
    fn test_decode_rejects_mosaic_id_as_map_id() {
        assert!(codec()
            .decode_map_id("oai:de:slub-dresden:vk:mosaic:id-42")
            .is_err());
    }

    #[test]
    fn test_decode_rejects_non_numeric_payload() {
        let err = codec()
            .decode_map_id("oai:de:slub-dresden:vk:id-abc")
            .expect_err("must fail");
        assert!(matches!(err, IdFormatError::NonNumericPayload { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_dash() {
        assert!(codec().decode_map_id("oai:de:slub-dresden:vk:id42").is_err());
    }
}
