//! Project provisioner: analysis targets, quality profiles and the bindings
//! between them.
//!
//! The provisioner remembers everything it created so that [`Provisioner::reset`]
//! can remove it again. The scenario harness calls `reset` around every
//! scenario; the provisioner itself never assumes a clean server.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rig_core::ProjectKey;
use rig_core::entities::{AnalysisTarget, ProfileHandle};

use crate::profile_xml::load_profile_file;
use crate::{ServerClient, error::ProvisionError, error::ServerError};

pub struct Provisioner<'a> {
    client: &'a ServerClient,
    targets: BTreeMap<String, AnalysisTarget>,
    profiles: BTreeSet<ProfileHandle>,
}

impl<'a> Provisioner<'a> {
    #[must_use]
    pub const fn new(client: &'a ServerClient) -> Self {
        Self {
            client,
            targets: BTreeMap::new(),
            profiles: BTreeSet::new(),
        }
    }

    /// Register an analysis target. Repeating the call with the same key and
    /// name is a no-op.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::InvalidKey`] if `key` is malformed (nothing is sent)
    /// - [`ProvisionError::Conflict`] if `key` was already provisioned under
    ///   another name
    /// - [`ProvisionError::Server`] if the server rejects the request
    pub async fn provision(&mut self, key: &str, name: &str) -> Result<&AnalysisTarget, ProvisionError> {
        let key = ProjectKey::new(key)?;

        if let Some(existing) = self.targets.get(key.as_str()) {
            if existing.name != name {
                return Err(ProvisionError::Conflict {
                    key: key.to_string(),
                    existing: existing.name.clone(),
                    requested: name.to_string(),
                });
            }
        } else {
            let context = format!("provisioning project '{key}'");
            let on_server = self
                .client
                .find_project(key.as_str())
                .await
                .map_err(ProvisionError::server(&context))?;

            match on_server {
                Some(existing) if existing != name => {
                    return Err(ProvisionError::Conflict {
                        key: key.to_string(),
                        existing,
                        requested: name.to_string(),
                    });
                }
                Some(_) => tracing::debug!(%key, "project already present on server"),
                None => {
                    self.client
                        .create_project(key.as_str(), name)
                        .await
                        .map_err(ProvisionError::server(&context))?;
                    tracing::info!(%key, name, "provisioned project");
                }
            }
            self.targets
                .insert(key.to_string(), AnalysisTarget::new(key.clone(), name));
        }

        self.targets
            .get(key.as_str())
            .ok_or_else(|| ProvisionError::MissingTarget(key.to_string()))
    }

    /// Parse the profile backup at `definition` and restore it on the server.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::ProfileUnreadable`] / [`ProvisionError::ProfileMalformed`]
    ///   if the definition cannot be used (nothing is sent)
    /// - [`ProvisionError::Server`] if the server rejects the upload
    pub async fn load_profile(&mut self, definition: &Path) -> Result<ProfileHandle, ProvisionError> {
        let (profile, xml) = load_profile_file(definition).await?;
        let file_name = definition
            .file_name()
            .map_or_else(|| "profile.xml".to_string(), |n| n.to_string_lossy().into_owned());

        self.client
            .restore_profile(&file_name, xml)
            .await
            .map_err(ProvisionError::server(format!(
                "restoring profile '{}' from {}",
                profile.name,
                definition.display()
            )))?;

        let handle = profile.handle();
        tracing::info!(
            profile = %handle.name,
            language = %handle.language,
            rules = profile.rules.len(),
            "loaded quality profile"
        );
        self.profiles.insert(handle.clone());
        Ok(handle)
    }

    /// Bind the loaded profile `profile_name` to the provisioned target `key`
    /// for `language`.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::MissingTarget`] if `key` was not provisioned
    /// - [`ProvisionError::MissingProfile`] if no such profile was loaded
    /// - [`ProvisionError::Server`] if the server rejects the binding
    pub async fn associate(
        &mut self,
        key: &str,
        language: &str,
        profile_name: &str,
    ) -> Result<(), ProvisionError> {
        if !self.targets.contains_key(key) {
            return Err(ProvisionError::MissingTarget(key.to_string()));
        }
        let handle = ProfileHandle {
            name: profile_name.to_string(),
            language: language.to_string(),
        };
        if !self.profiles.contains(&handle) {
            return Err(ProvisionError::MissingProfile {
                name: handle.name,
                language: handle.language,
            });
        }

        self.client
            .add_project_to_profile(key, language, profile_name)
            .await
            .map_err(ProvisionError::server(format!(
                "binding profile '{profile_name}' to '{key}' for {language}"
            )))?;

        if let Some(target) = self.targets.get_mut(key) {
            target.bind(language, profile_name);
        }
        tracing::info!(key, language, profile = profile_name, "associated profile");
        Ok(())
    }

    /// The profile the server will actually use for `key` in `language`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Server`] if the query fails.
    pub async fn effective_profile(
        &self,
        key: &str,
        language: &str,
    ) -> Result<Option<ProfileHandle>, ProvisionError> {
        self.client
            .effective_profile(key, language)
            .await
            .map_err(ProvisionError::server(format!(
                "reading effective {language} profile of '{key}'"
            )))
    }

    #[must_use]
    pub fn target(&self, key: &str) -> Option<&AnalysisTarget> {
        self.targets.get(key)
    }

    /// Delete every project and profile this provisioner created.
    ///
    /// Entities that are already gone are skipped. The local records are
    /// cleared even if a deletion fails.
    ///
    /// # Errors
    ///
    /// Returns the first deletion failure other than "not found".
    pub async fn reset(&mut self) -> Result<(), ProvisionError> {
        let targets = std::mem::take(&mut self.targets);
        let profiles = std::mem::take(&mut self.profiles);
        let mut first_error = None;

        for key in targets.keys() {
            if let Err(err) = purge(self.client, key).await {
                first_error.get_or_insert(err);
            }
        }
        for profile in &profiles {
            match self.client.delete_profile(profile).await {
                Ok(()) | Err(ServerError::NotFound(_)) => {}
                Err(source) => {
                    first_error.get_or_insert(ProvisionError::Server {
                        context: format!("deleting profile '{}'", profile.name),
                        source,
                    });
                }
            }
        }

        tracing::debug!(
            projects = targets.len(),
            profiles = profiles.len(),
            "reset provisioned state"
        );
        first_error.map_or(Ok(()), Err)
    }
}

/// Delete project `key` from the server if it exists.
///
/// # Errors
///
/// Returns [`ProvisionError::Server`] for any failure other than "not found".
pub async fn purge(client: &ServerClient, key: &str) -> Result<(), ProvisionError> {
    match client.delete_project(key).await {
        Ok(()) => {
            tracing::info!(key, "deleted project");
            Ok(())
        }
        Err(ServerError::NotFound(_)) => Ok(()),
        Err(source) => Err(ProvisionError::Server {
            context: format!("deleting project '{key}'"),
            source,
        }),
    }
}
