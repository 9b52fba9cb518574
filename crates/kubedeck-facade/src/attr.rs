//! Dotted attribute paths into JSON objects.
//!
//! A path such as `spec.template.spec.containers[0].image` is a list of keys,
//! each with at most one list index.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::{FacadeError, Result};

/// One `key` or `key[index]` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Object key.
    pub key: String,
    /// Optional list index applied after the key.
    pub index: Option<usize>,
}

impl FromStr for Segment {
    type Err = FacadeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FacadeError::InvalidArguments(format!("invalid path segment: {s:?}"));

        let (key, index) = match s.split_once('[') {
            Some((key, rest)) => {
                let digits = rest.strip_suffix(']').ok_or_else(invalid)?;
                let index = digits.parse::<usize>().map_err(|_| invalid())?;
                (key, Some(index))
            }
            None => (s, None),
        };

        if key.is_empty() || key.contains(']') {
            return Err(invalid());
        }

        Ok(Self {
            key: key.to_string(),
            index,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.key),
            None => f.write_str(&self.key),
        }
    }
}

/// A parsed attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrPath {
    segments: Vec<Segment>,
}

impl AttrPath {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::InvalidArguments`] for empty paths or malformed segments.
    pub fn parse(path: &str) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(FacadeError::InvalidArguments(
                "attribute path is empty".to_string(),
            ));
        }
        let segments = path
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<Segment>>>()?;
        Ok(Self { segments })
    }

    /// The path's segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Key of the first segment.
    #[must_use]
    pub fn root_key(&self) -> &str {
        &self.segments[0].key
    }

    /// Overwrite or insert the leaf under `root`.
    ///
    /// Every segment before the leaf must already exist. The leaf key is
    /// created when missing; an indexed leaf must address an existing element.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::InvalidArguments`] when an intermediate segment
    /// does not resolve.
    pub fn assign(&self, root: &mut Value, value: Value) -> Result<()> {
        let Some((leaf, parents)) = self.segments.split_last() else {
            return Err(FacadeError::InvalidArguments("attribute path is empty".to_string()));
        };

        let mut cursor = root;
        for segment in parents {
            cursor = step(cursor, segment).ok_or_else(|| self.unresolved(segment))?;
        }

        let object = cursor
            .as_object_mut()
            .ok_or_else(|| self.unresolved(leaf))?;

        match leaf.index {
            None => {
                object.insert(leaf.key.clone(), value);
            }
            Some(index) => {
                let slot = object
                    .get_mut(&leaf.key)
                    .and_then(Value::as_array_mut)
                    .and_then(|items| items.get_mut(index))
                    .ok_or_else(|| self.unresolved(leaf))?;
                *slot = value;
            }
        }
        Ok(())
    }

    /// Merge patch that carries only the path's root key from `object`.
    #[must_use]
    pub fn root_patch(&self, object: &Value) -> Value {
        let key = self.root_key();
        let mut patch = Map::new();
        patch.insert(
            key.to_string(),
            object.get(key).cloned().unwrap_or(Value::Null),
        );
        Value::Object(patch)
    }

    fn unresolved(&self, segment: &Segment) -> FacadeError {
        FacadeError::InvalidArguments(format!("{segment} does not resolve in {self}"))
    }
}

fn step<'a>(value: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    let next = value.as_object_mut()?.get_mut(&segment.key)?;
    match segment.index {
        Some(index) => next.as_array_mut()?.get_mut(index),
        None => Some(next),
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for AttrPath {
    type Err = FacadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment() -> Value {
        json!({
            "metadata": {"name": "api"},
            "spec": {
                "replicas": 1,
                "template": {"spec": {"containers": [
                    {"name": "api", "image": "api:1.0"},
                    {"name": "sidecar", "image": "envoy:1.2"}
                ]}}
            }
        })
    }

    #[test]
    fn parses_indexed_segments() {
        let path = AttrPath::parse("spec.template.spec.containers[1].image").unwrap();
        assert_eq!(path.segments().len(), 5);
        assert_eq!(path.segments()[3].index, Some(1));
        assert_eq!(path.to_string(), "spec.template.spec.containers[1].image");
        assert_eq!(path.root_key(), "spec");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(AttrPath::parse("").is_err());
        assert!(AttrPath::parse("spec..image").is_err());
        assert!(AttrPath::parse("containers[x]").is_err());
        assert!(AttrPath::parse("containers[0").is_err());
    }

    #[test]
    fn overwrites_existing_leaf() {
        let mut object = deployment();
        AttrPath::parse("spec.template.spec.containers[1].image")
            .unwrap()
            .assign(&mut object, json!("envoy:1.3"))
            .unwrap();
        assert_eq!(
            object["spec"]["template"]["spec"]["containers"][1]["image"],
            "envoy:1.3"
        );
        assert_eq!(
            object["spec"]["template"]["spec"]["containers"][0]["image"],
            "api:1.0"
        );
    }

    #[test]
    fn inserts_missing_leaf() {
        let mut object = deployment();
        let path = AttrPath::parse("spec.minReadySeconds").unwrap();
        path.assign(&mut object, json!(10)).unwrap();
        assert_eq!(object["spec"]["minReadySeconds"], 10);
        assert_eq!(path.root_patch(&object)["spec"]["replicas"], 1);
        assert!(path.root_patch(&object).get("metadata").is_none());
    }

    #[test]
    fn missing_intermediate_is_an_error() {
        let mut object = deployment();
        let err = AttrPath::parse("spec.strategy.type")
            .unwrap()
            .assign(&mut object, json!("Recreate"))
            .unwrap_err();
        assert!(matches!(err, FacadeError::InvalidArguments(_)));

        let err = AttrPath::parse("spec.template.spec.containers[5].image")
            .unwrap()
            .assign(&mut object, json!("x"))
            .unwrap_err();
        assert!(matches!(err, FacadeError::InvalidArguments(_)));
    }
}
