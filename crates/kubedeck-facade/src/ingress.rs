//! Path-rule patching inside an ingress spec.
//!
//! Rules use the legacy backend shape `{serviceName, servicePort}`. After a
//! patch, each `(host, path)` pair appears at most once.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use kubedeck_core::ResourceKind;

use crate::canonical::canonicalize;
use crate::facade::ResourceFacade;
use crate::{FacadeError, Result};

/// Backend service of one path entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressBackend {
    /// Service name.
    #[serde(rename = "serviceName", alias = "service_name")]
    pub service_name: String,
    /// Service port, by number or name.
    #[serde(rename = "servicePort", alias = "service_port")]
    pub service_port: IntOrString,
}

/// What a patch did to the path list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// An existing entry's backend was replaced.
    Replaced,
    /// A new entry was appended.
    Appended,
    /// Matching entries were removed.
    Removed,
    /// Nothing matched a removal.
    Unchanged,
}

/// Upsert or delete of one path entry under one host rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngressPatch {
    /// Host of the rule to patch; `None` selects a host-less rule.
    #[serde(default)]
    pub host: Option<String>,
    /// Path of the entry.
    pub location: String,
    /// New backend, or `None` to delete the entry.
    #[serde(default)]
    pub service: Option<IngressBackend>,
}

impl IngressPatch {
    /// Apply the patch to an ingress `spec` value in place.
    ///
    /// The first rule whose host equals the requested host is patched. Rules
    /// are never created.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if no rule has the requested host.
    pub fn apply(&self, spec: &mut Value) -> Result<PatchOutcome> {
        let host = self.host.as_deref();
        let rule = spec
            .get_mut("rules")
            .and_then(Value::as_array_mut)
            .and_then(|rules| {
                rules
                    .iter_mut()
                    .find(|rule| rule.get("host").and_then(Value::as_str) == host)
            })
            .ok_or_else(|| FacadeError::NotFound("rule not found".to_string()))?;

        let location = self.location.as_str();
        let matches = |entry: &Value| entry.get("path").and_then(Value::as_str) == Some(location);

        match &self.service {
            Some(backend) => {
                let paths = paths_mut(rule)?;
                let backend = serde_json::to_value(backend)
                    .map_err(|e| FacadeError::InvalidArguments(e.to_string()))?;

                match paths.iter().position(matches) {
                    Some(first) => {
                        paths[first]["backend"] = backend;
                        let mut index = 0;
                        paths.retain(|entry| {
                            let keep = index <= first || !matches(entry);
                            index += 1;
                            keep
                        });
                        Ok(PatchOutcome::Replaced)
                    }
                    None => {
                        paths.push(json!({ "path": location, "backend": backend }));
                        Ok(PatchOutcome::Appended)
                    }
                }
            }
            None => {
                let Some(paths) = rule
                    .pointer_mut("/http/paths")
                    .and_then(Value::as_array_mut)
                else {
                    return Ok(PatchOutcome::Unchanged);
                };
                let before = paths.len();
                paths.retain(|entry| !matches(entry));
                if paths.len() == before {
                    Ok(PatchOutcome::Unchanged)
                } else {
                    Ok(PatchOutcome::Removed)
                }
            }
        }
    }
}

/// The rule's path list, created when missing.
fn paths_mut(rule: &mut Value) -> Result<&mut Vec<Value>> {
    let rule = rule
        .as_object_mut()
        .ok_or_else(|| FacadeError::InvalidObject("ingress rule is not an object".to_string()))?;
    let http = rule.entry("http").or_insert_with(|| json!({}));
    if http.is_null() {
        *http = json!({});
    }
    let http = http
        .as_object_mut()
        .ok_or_else(|| FacadeError::InvalidObject("ingress http is not an object".to_string()))?;
    let paths = http.entry("paths").or_insert_with(|| json!([]));
    if paths.is_null() {
        *paths = json!([]);
    }
    paths
        .as_array_mut()
        .ok_or_else(|| FacadeError::InvalidObject("ingress paths is not a list".to_string()))
}

impl ResourceFacade {
    /// Read an ingress, apply `patch` to its rules and write them back.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the ingress or the host rule does not exist.
    pub async fn patch_ingress(
        &self,
        name: &str,
        namespace: &str,
        patch: &IngressPatch,
    ) -> Result<Value> {
        let ingress = self
            .get_dynamic(ResourceKind::Ingress, name, namespace)
            .await?;
        let mut spec = ingress.data.get("spec").cloned().unwrap_or_else(|| json!({}));
        let outcome = patch.apply(&mut spec)?;

        let body = json!({ "spec": { "rules": spec.get("rules").cloned().unwrap_or(Value::Null) } });
        let updated = self
            .patch_dynamic(ResourceKind::Ingress, name, namespace, &body)
            .await?;
        info!(
            ingress = name,
            namespace,
            host = ?patch.host,
            location = %patch.location,
            outcome = ?outcome,
            "Patched ingress"
        );
        Ok(canonicalize(&updated))
    }
}
