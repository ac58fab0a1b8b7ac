use std::fmt;

use hrp_config::RegistrySettings;
use serde::{Deserialize, Serialize};

/// Location of one stored artifact. Built from configuration, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub bucket: String,
    pub key: String,
}

impl ArtifactRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The production model location named by the settings.
    pub fn production_model(settings: &RegistrySettings) -> Self {
        Self::new(settings.bucket.clone(), settings.model_key.clone())
    }

    /// Another key in the same bucket.
    pub fn sibling(&self, key: impl Into<String>) -> Self {
        Self::new(self.bucket.clone(), key)
    }

    /// Everything before the last `/`, if the key has a folder component.
    pub fn parent_folder(&self) -> Option<&str> {
        self.key
            .rfind('/')
            .map(|i| &self.key[..i])
            .filter(|p| !p.is_empty())
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parent() {
        let r = ArtifactRef::new("heart-attack-predictor", "model-registry/model.json");
        assert_eq!(r.to_string(), "s3://heart-attack-predictor/model-registry/model.json");
        assert_eq!(r.parent_folder(), Some("model-registry"));
        assert_eq!(ArtifactRef::new("b", "model.json").parent_folder(), None);
        assert_eq!(ArtifactRef::new("b", "a/b/c.json").parent_folder(), Some("a/b"));
    }
}
