//! Quality profile endpoints.

use rig_core::entities::ProfileHandle;

use crate::{ServerClient, error::ServerError, http::query};

#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    profiles: Vec<ProfileSummary>,
}

#[derive(Debug, serde::Deserialize)]
struct ProfileSummary {
    name: String,
    language: String,
}

impl ServerClient {
    /// `POST api/qualityprofiles/restore` with the backup XML as the `backup` part.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Api`] if the server rejects the definition.
    pub async fn restore_profile(&self, file_name: &str, xml: String) -> Result<(), ServerError> {
        let part = reqwest::multipart::Part::text(xml)
            .file_name(file_name.to_string())
            .mime_str("application/xml")?;
        let form = reqwest::multipart::Form::new().part("backup", part);
        self.post_multipart("api/qualityprofiles/restore", form)
            .await?;
        Ok(())
    }

    /// `POST api/qualityprofiles/add_project`: bind `profile` to `project` for `language`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if either side is unknown to the server.
    pub async fn add_project_to_profile(
        &self,
        project: &str,
        language: &str,
        profile: &str,
    ) -> Result<(), ServerError> {
        let q = query(&[
            ("project", project),
            ("language", language),
            ("qualityProfile", profile),
        ]);
        self.post(&format!("api/qualityprofiles/add_project?{q}"))
            .await?;
        Ok(())
    }

    /// `GET api/qualityprofiles/search?project=&language=` → the profile the
    /// server will use for `project` in `language`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the request fails or the body cannot be parsed.
    pub async fn effective_profile(
        &self,
        project: &str,
        language: &str,
    ) -> Result<Option<ProfileHandle>, ServerError> {
        let q = query(&[("project", project), ("language", language)]);
        let resp: SearchResponse = self
            .get(&format!("api/qualityprofiles/search?{q}"))
            .await?
            .json()
            .await?;
        Ok(resp
            .profiles
            .into_iter()
            .find(|p| p.language == language)
            .map(|p| ProfileHandle {
                name: p.name,
                language: p.language,
            }))
    }

    /// `POST api/qualityprofiles/delete`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if the profile does not exist.
    pub async fn delete_profile(&self, profile: &ProfileHandle) -> Result<(), ServerError> {
        let q = query(&[
            ("language", profile.language.as_str()),
            ("qualityProfile", profile.name.as_str()),
        ]);
        self.post(&format!("api/qualityprofiles/delete?{q}"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeServer, Route};
    use serde_json::json;

    #[tokio::test]
    async fn restore_uploads_backup_part() {
        let server = FakeServer::start(vec![
            Route::post("/api/qualityprofiles/restore").json(200, json!({})),
        ]);
        let client = ServerClient::for_url(server.url()).unwrap();

        client
            .restore_profile("TestQualityProfileCpp.xml", "<profile/>".into())
            .await
            .unwrap();

        let sent = server.requests_to("POST", "/api/qualityprofiles/restore");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("name=\"backup\""));
        assert!(sent[0].body.contains("<profile/>"));
    }

    #[tokio::test]
    async fn effective_profile_filters_by_language() {
        let server = FakeServer::start(vec![
            Route::get("/api/qualityprofiles/search").json(
                200,
                json!({"profiles": [
                    {"key": "a", "name": "Sonar way", "language": "cs"},
                    {"key": "b", "name": "ProfileForTestVBNet", "language": "vbnet"}
                ]}),
            ),
        ]);
        let client = ServerClient::for_url(server.url()).unwrap();

        let profile = client
            .effective_profile("my.project", "vbnet")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.name, "ProfileForTestVBNet");
        assert!(client.effective_profile("my.project", "cpp").await.unwrap().is_none());
    }
}
