use serde::{Deserialize, Serialize};
use shapemap_types::DEFAULT_FRAGMENT_PREFIX;

use crate::error::ShapeResult;

/// Runtime settings of a [`Shape`](crate::Shape).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Content type of full-document writes.
    pub content_type: String,
    /// Fragment prefix of minted node identities.
    pub id_fragment_prefix: String,
    /// Re-validate the local store after a write instead of returning the
    /// prospective projection.
    pub reproject_after_write: bool,
    /// Prefix bound to the RDF namespace unless the schema binds it.
    pub rdf_prefix: String,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            content_type: "text/turtle".into(),
            id_fragment_prefix: DEFAULT_FRAGMENT_PREFIX.into(),
            reproject_after_write: true,
            rdf_prefix: "rdf".into(),
        }
    }
}

impl ShapeConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> ShapeResult<Self> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ShapeConfig::default();
        assert_eq!(c.content_type, "text/turtle");
        assert_eq!(c.id_fragment_prefix, "id");
        assert!(c.reproject_after_write);
        assert_eq!(c.rdf_prefix, "rdf");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ShapeConfig::from_toml_str("content_type = \"application/ld+json\"\nreproject_after_write = false\n").unwrap();
        assert_eq!(c.content_type, "application/ld+json");
        assert!(!c.reproject_after_write);
        assert_eq!(c.id_fragment_prefix, "id");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(ShapeConfig::from_toml_str("reproject_after_write = \"yes\"").is_err());
    }
}
