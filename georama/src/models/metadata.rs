//! Descriptive metadata for a raw map.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Descriptive fields for a raw map (one-to-one).
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Metadata {
    /// Foreign key to the raw map
    pub raw_map_id: i64,
    /// Long title
    pub title: String,
    /// Short title, bounded length (truncated on insert)
    pub title_short: String,
    /// Free-text description
    pub description: String,
    /// License string (e.g. "CC-0")
    pub license: String,
    /// Publication date, ISO `YYYY-MM-DD`
    pub time_of_publication: String,
    /// Owner / holding institution
    pub owner: String,
    /// Small thumbnail URL (120x120), internal or external
    pub link_thumb_small: Option<String>,
    /// Mid thumbnail URL (400x400), internal or external
    pub link_thumb_mid: Option<String>,
    /// Image pyramid URL, internal or external
    pub link_zoomify: Option<String>,
    /// Stable permalink, when hosted elsewhere
    pub permalink: Option<String>,
    /// Library record identifier
    pub ppn: Option<String>,
    /// Production technique (e.g. "Lithografie")
    pub technique: Option<String>,
}

/// Maximum stored length of `title_short`.
pub const TITLE_SHORT_MAX: usize = 70;

impl Metadata {
    /// Truncates the short title to its bounded length.
    pub fn clamp_title_short(&mut self) {
        if self.title_short.len() > TITLE_SHORT_MAX {
            let mut cut = TITLE_SHORT_MAX;
            while !self.title_short.is_char_boundary(cut) {
                cut -= 1;
            }
            self.title_short.truncate(cut);
        }
    }
}

/// Incoming metadata changes for MAPS_UPDATE.
///
/// The set of permitted fields is closed: anything not named here cannot be
/// changed through an update job. `Some(None)` is not representable; an
/// explicit JSON `null` clears an optional link field, which is modeled by
/// the dedicated `clear_*` accessors on the descriptor side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub title_short: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub time_of_publication: Option<String>,
    pub owner: Option<String>,
    /// `Some(None)` clears the link, `Some(Some(url))` replaces it
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_double_option"
    )]
    pub link_thumb_small: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_double_option"
    )]
    pub link_thumb_mid: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_double_option"
    )]
    pub link_zoomify: Option<Option<String>>,
    pub permalink: Option<String>,
    pub ppn: Option<String>,
    pub technique: Option<String>,
}

impl MetadataUpdate {
    /// Returns true if the update names the given link key at all.
    pub fn names_link(&self, key: &str) -> bool {
        match key {
            "link_thumb_small" => self.link_thumb_small.is_some(),
            "link_thumb_mid" => self.link_thumb_mid.is_some(),
            "link_zoomify" => self.link_zoomify.is_some(),
            _ => false,
        }
    }

    /// The incoming value for a link key, flattened.
    ///
    /// `None` both when the key is absent and when it is an explicit clear;
    /// use [`Self::names_link`] to distinguish.
    pub fn link_value(&self, key: &str) -> Option<&str> {
        let v = match key {
            "link_thumb_small" => &self.link_thumb_small,
            "link_thumb_mid" => &self.link_thumb_mid,
            "link_zoomify" => &self.link_zoomify,
            _ => &None,
        };
        v.as_ref().and_then(|inner| inner.as_deref())
    }

    /// Folds this update into an existing metadata record.
    pub fn apply_to(&self, metadata: &mut Metadata) {
        if let Some(v) = &self.title {
            metadata.title = v.clone();
        }
        if let Some(v) = &self.title_short {
            metadata.title_short = v.clone();
            metadata.clamp_title_short();
        }
        if let Some(v) = &self.description {
            metadata.description = v.clone();
        }
        if let Some(v) = &self.license {
            metadata.license = v.clone();
        }
        if let Some(v) = &self.time_of_publication {
            metadata.time_of_publication = v.clone();
        }
        if let Some(v) = &self.owner {
            metadata.owner = v.clone();
        }
        if let Some(v) = &self.link_thumb_small {
            metadata.link_thumb_small = v.clone();
        }
        if let Some(v) = &self.link_thumb_mid {
            metadata.link_thumb_mid = v.clone();
        }
        if let Some(v) = &self.link_zoomify {
            metadata.link_zoomify = v.clone();
        }
        if let Some(v) = &self.permalink {
            metadata.permalink = Some(v.clone());
        }
        if let Some(v) = &self.ppn {
            metadata.ppn = Some(v.clone());
        }
        if let Some(v) = &self.technique {
            metadata.technique = Some(v.clone());
        }
    }
}

/// Serde helper distinguishing "absent" from "explicit null" for link fields.
mod serde_double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}
