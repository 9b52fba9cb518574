//! Container image references.
//!
//! Images are addressed as `name:tag`. The tag separator is the last colon
//! that is not followed by a path segment, so a registry port such as
//! `registry.local:5000/app` stays part of the name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// A container image split into its name and tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef {
    name: String,
    tag: String,
}

impl ImageRef {
    /// Parse a `name:tag` image string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyImage`] for an empty string or empty name and
    /// [`CoreError::UntaggedImage`] when no tag is present. Digest references
    /// (`name@sha256:...`) count as untagged.
    pub fn parse(image: &str) -> Result<Self> {
        let image = image.trim();
        if image.is_empty() {
            return Err(CoreError::EmptyImage);
        }
        if image.contains('@') {
            return Err(CoreError::UntaggedImage(image.to_string()));
        }

        match image.rsplit_once(':') {
            Some((name, tag)) if !tag.is_empty() && !tag.contains('/') => {
                if name.is_empty() {
                    return Err(CoreError::EmptyImage);
                }
                Ok(Self {
                    name: name.to_string(),
                    tag: tag.to_string(),
                })
            }
            _ => Err(CoreError::UntaggedImage(image.to_string())),
        }
    }

    /// The image name, including any registry prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The image tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether `other` names the same image, ignoring tags.
    #[must_use]
    pub fn same_name(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

impl FromStr for ImageRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.to_string()
    }
}
