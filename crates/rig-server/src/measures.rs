//! Component measures endpoint.

use crate::{ServerClient, error::ServerError, http::query};

/// A raw measure as the server reports it. Values are text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Measure {
    pub metric: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ComponentResponse {
    component: ComponentMeasures,
}

#[derive(Debug, serde::Deserialize)]
struct ComponentMeasures {
    #[serde(default)]
    measures: Vec<Measure>,
}

impl ServerClient {
    /// `GET api/measures/component?component=&metricKeys=`.
    ///
    /// Returns the measures exactly as reported (possibly none, possibly
    /// several for the same metric); interpreting them is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if the component does not exist.
    pub async fn component_measures(
        &self,
        component: &str,
        metrics: &[&str],
    ) -> Result<Vec<Measure>, ServerError> {
        let metric_keys = metrics.join(",");
        let q = query(&[("component", component), ("metricKeys", &metric_keys)]);
        let resp: ComponentResponse = self
            .get(&format!("api/measures/component?{q}"))
            .await?
            .json()
            .await?;
        Ok(resp.component.measures)
    }
}
