//! Project (analysis target) endpoints.

use crate::{ServerClient, error::ServerError, http::query};

#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    components: Vec<ProjectComponent>,
}

#[derive(Debug, serde::Deserialize)]
struct ProjectComponent {
    key: String,
    name: String,
}

impl ServerClient {
    /// `POST api/projects/create`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Api`] if the server rejects the key (for
    /// example because it already exists).
    pub async fn create_project(&self, key: &str, name: &str) -> Result<(), ServerError> {
        let q = query(&[("project", key), ("name", name)]);
        self.post(&format!("api/projects/create?{q}")).await?;
        Ok(())
    }

    /// `GET api/projects/search?projects=<key>` → the project's display name.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the request fails or the body cannot be parsed.
    pub async fn find_project(&self, key: &str) -> Result<Option<String>, ServerError> {
        let q = query(&[("projects", key)]);
        let resp: SearchResponse = self
            .get(&format!("api/projects/search?{q}"))
            .await?
            .json()
            .await?;
        Ok(resp
            .components
            .into_iter()
            .find(|c| c.key == key)
            .map(|c| c.name))
    }

    /// `POST api/projects/delete`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if the project does not exist.
    pub async fn delete_project(&self, key: &str) -> Result<(), ServerError> {
        let q = query(&[("project", key)]);
        self.post(&format!("api/projects/delete?{q}")).await?;
        Ok(())
    }
}
