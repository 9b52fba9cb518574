//! Container image rollout for deployments.

use std::collections::BTreeMap;

use kube::api::DynamicObject;
use kube::ResourceExt;
use serde_json::{json, Value};
use tracing::{info, warn};

use kubedeck_core::{ImageRef, ResourceKind};

use crate::facade::{first_image, replace_first_image, ResourceFacade};
use crate::Result;

/// Updates the first container image of deployments.
pub struct ImageRolloutEngine<'a> {
    facade: &'a ResourceFacade,
}

impl<'a> ImageRolloutEngine<'a> {
    /// Create an engine over a façade.
    #[must_use]
    pub fn new(facade: &'a ResourceFacade) -> Self {
        Self { facade }
    }

    /// Set the first container image of one deployment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FacadeError::NotFound`] if the deployment does not exist.
    pub async fn set_image(&self, image: &str, deployment: &str, namespace: &str) -> Result<()> {
        let current = self
            .facade
            .get_dynamic(ResourceKind::Deployment, deployment, namespace)
            .await?;
        let previous = self.apply(current, namespace, image).await?;
        info!(deployment, namespace, previous = %previous, image, "Deployment image updated");
        Ok(())
    }

    /// Apply `{deployment: image}` entries one after another.
    ///
    /// The first failure aborts the remaining entries; earlier updates stay.
    ///
    /// # Errors
    ///
    /// Returns the first per-entry error.
    pub async fn set_images_bulk(
        &self,
        images: &BTreeMap<String, String>,
        namespace: &str,
    ) -> Result<()> {
        for (deployment, image) in images {
            self.set_image(image, deployment, namespace).await?;
        }
        Ok(())
    }

    /// Update every deployment whose first image has the same name as `new_image`.
    ///
    /// Deployments with untagged images are skipped. Returns the updated names.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FacadeError::InvalidImage`] if `new_image` has no tag.
    pub async fn set_image_by_name(&self, namespace: &str, new_image: &str) -> Result<Vec<String>> {
        let target = ImageRef::parse(new_image)?;
        let deployments = self
            .facade
            .list_dynamic(ResourceKind::Deployment, Some(namespace))
            .await?;

        let mut updated = Vec::new();
        for deploy in deployments.items {
            let name = deploy.name_any();
            let Some(image) = first_image(&deploy) else {
                warn!(deployment = %name, "Deployment has no container image, skipping");
                continue;
            };
            match ImageRef::parse(&image) {
                Ok(current) if current.same_name(&target) => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(deployment = %name, image = %image, error = %e, "Wrong image format, skipping");
                    continue;
                }
            }

            self.apply(deploy, namespace, new_image).await?;
            info!(deployment = %name, namespace, image = new_image, "Deployment image updated by name");
            updated.push(name);
        }
        Ok(updated)
    }

    /// Patch `deploy` with its first image replaced. Returns the previous image.
    async fn apply(&self, mut deploy: DynamicObject, namespace: &str, image: &str) -> Result<String> {
        let name = deploy.name_any();
        let previous = replace_first_image(&mut deploy, image)?;
        let patch = containers_patch(&deploy);
        self.facade
            .patch_dynamic(ResourceKind::Deployment, &name, namespace, &patch)
            .await?;
        Ok(previous)
    }
}

/// Merge patch carrying the full container list. Merge patches replace lists.
fn containers_patch(deploy: &DynamicObject) -> Value {
    let containers = deploy
        .data
        .pointer("/spec/template/spec/containers")
        .cloned()
        .unwrap_or_else(|| json!([]));
    json!({ "spec": { "template": { "spec": { "containers": containers } } } })
}

impl ResourceFacade {
    /// Image rollout operations over this façade.
    #[must_use]
    pub fn rollout(&self) -> ImageRolloutEngine<'_> {
        ImageRolloutEngine::new(self)
    }
}
