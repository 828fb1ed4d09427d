//! Azure DevOps REST client.

use super::gateway::WorkGateway;
use super::types::{FieldMap, SuiteRef, TestCaseRef, TestPointRef, WorkItem, WorkItemQuery};
use crate::config::Config;
use crate::error::Error;
use crate::version::USER_AGENT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// API version for the test-plan endpoints.
pub const TESTPLAN_API_VERSION: &str = "7.1-preview.1";

/// API version for WIQL and work-item batch endpoints.
pub const WIT_API_VERSION: &str = "7.0";

/// Connection to the remote API, shared by every project handle.
#[derive(Clone)]
pub struct AdoClient {
    base_url: Url,
    http: Client,
    pat: String,
}

impl std::fmt::Debug for AdoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdoClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AdoClient {
    /// Create a new client with the given base URL and personal access token.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be created.
    pub fn new(base_url: &str, pat: impl Into<String>) -> Result<Self, Error> {
        let parsed = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: parsed,
            http,
            pat: pat.into(),
        })
    }

    /// Create a client from configuration. Fails when the credential is missing.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let pat = config.credential()?;
        Self::new(&config.base_url, pat)
    }

    /// Scope this client to one organization and project.
    #[must_use]
    pub fn project(&self, organization: impl Into<String>, project: impl Into<String>) -> AdoProject {
        AdoProject {
            client: self.clone(),
            organization: organization.into(),
            project: project.into(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth("", Some(&self.pat))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, Error> {
        debug!(url = %url, "GET");
        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| Error::from_reqwest(&e, context))?;
        decode(response, context).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B, context: &str) -> Result<T, Error>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(url = %url, "POST");
        let response = self
            .authorize(self.http.post(url).json(body))
            .send()
            .await
            .map_err(|e| Error::from_reqwest(&e, context))?;
        decode(response, context).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T, Error> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::status(status.as_u16(), context));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| Error::transient(format!("{context}: invalid response body: {e}")))
}

/// A client scoped to one organization/project; the live [`WorkGateway`].
#[derive(Debug, Clone)]
pub struct AdoProject {
    client: AdoClient,
    organization: String,
    project: String,
}

impl AdoProject {
    /// Build `{base}/{org}/{project}/{segments...}?api-version={version}`.
    ///
    /// Segments are percent-encoded, so project names with spaces are safe.
    pub fn endpoint(&self, segments: &[&str], api_version: &str) -> Result<Url, Error> {
        let mut url = self.client.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl {
                url: self.client.base_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .push(&self.organization)
            .push(&self.project)
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }
}

/// Append the api-version to a link handed out by the remote API.
fn versioned_link(link: &str, api_version: &str) -> Result<Url, Error> {
    let mut url = Url::parse(link).map_err(|e| Error::InvalidUrl {
        url: link.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

impl WorkGateway for AdoProject {
    async fn list_child_suites(
        &self,
        plan_id: i64,
        parent: Option<i64>,
    ) -> Result<Vec<SuiteRef>, Error> {
        let plan = plan_id.to_string();
        let (url, context) = match parent {
            Some(parent_id) => {
                let parent = parent_id.to_string();
                (
                    self.endpoint(
                        &["_apis", "testplan", "Plans", plan.as_str(), "suites", parent.as_str(), "suites"],
                        TESTPLAN_API_VERSION,
                    )?,
                    format!("listing child suites of suite {parent_id} in plan {plan_id}"),
                )
            }
            None => (
                self.endpoint(
                    &["_apis", "testplan", "Plans", plan.as_str(), "suites"],
                    TESTPLAN_API_VERSION,
                )?,
                format!("listing root suites of plan {plan_id}"),
            ),
        };

        let envelope: Envelope<wire::Suite> = self.client.get_json(url, &context).await?;
        Ok(envelope.value.into_iter().map(SuiteRef::from).collect())
    }

    async fn list_test_cases(&self, link: &str) -> Result<Vec<TestCaseRef>, Error> {
        let url = versioned_link(link, TESTPLAN_API_VERSION)?;
        let envelope: Envelope<wire::TestCase> =
            self.client.get_json(url, "listing test cases").await?;
        Ok(envelope
            .value
            .into_iter()
            .filter_map(|tc| {
                let item = tc.work_item?;
                Some(TestCaseRef {
                    work_item_id: item.id?,
                    work_item_name: item.name,
                })
            })
            .collect())
    }

    async fn list_test_points(&self, link: &str) -> Result<Vec<TestPointRef>, Error> {
        let url = versioned_link(link, TESTPLAN_API_VERSION)?;
        let envelope: Envelope<wire::TestPoint> =
            self.client.get_json(url, "listing test points").await?;
        Ok(envelope
            .value
            .into_iter()
            .filter_map(|tp| {
                Some(TestPointRef {
                    test_case_id: tp.test_case?.id?,
                    assigned_tester: tp
                        .assigned_to
                        .and_then(|who| who.display_name)
                        .filter(|name| !name.is_empty()),
                })
            })
            .collect())
    }

    async fn batch_fetch_fields(&self, ids: &[i64], fields: &[String]) -> Result<Vec<WorkItem>, Error> {
        let url = self.endpoint(&["_apis", "wit", "workitemsbatch"], WIT_API_VERSION)?;
        let body = wire::BatchRequest { ids, fields };
        let context = format!("fetching fields for {} work items", ids.len());
        let envelope: Envelope<wire::WorkItem> = self.client.post_json(url, &body, &context).await?;
        Ok(envelope
            .value
            .into_iter()
            .map(|wi| WorkItem {
                id: wi.id,
                fields: wi.fields,
            })
            .collect())
    }

    async fn query_ids(&self, query: &WorkItemQuery) -> Result<Vec<i64>, Error> {
        let url = self.endpoint(&["_apis", "wit", "wiql"], WIT_API_VERSION)?;
        let body = wire::WiqlRequest {
            query: query.to_wiql(),
        };
        let context = format!("querying {} work items", query.work_item_type);
        let result: wire::WiqlResult = self.client.post_json(url, &body, &context).await?;
        Ok(result.work_items.into_iter().map(|r| r.id).collect())
    }

    fn project(&self) -> &str {
        &self.project
    }
}

/// The `{"value": [...]}` wrapper around every list response.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

impl From<wire::Suite> for SuiteRef {
    fn from(suite: wire::Suite) -> Self {
        Self {
            id: suite.id,
            name: suite.name,
            has_children: suite.has_children,
            test_cases_link: suite.links.test_cases.map(|l| l.href),
            test_points_link: suite.links.test_points.map(|l| l.href),
        }
    }
}

mod wire {
    use super::FieldMap;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Suite {
        pub id: i64,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub has_children: bool,
        #[serde(default, rename = "_links")]
        pub links: SuiteLinks,
    }

    #[derive(Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct SuiteLinks {
        pub test_cases: Option<Href>,
        pub test_points: Option<Href>,
    }

    #[derive(Deserialize)]
    pub struct Href {
        pub href: String,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TestCase {
        pub work_item: Option<Reference>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TestPoint {
        #[serde(alias = "testCaseReference")]
        pub test_case: Option<Reference>,
        pub assigned_to: Option<Identity>,
    }

    #[derive(Deserialize)]
    pub struct Reference {
        pub id: Option<i64>,
        pub name: Option<String>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Identity {
        pub display_name: Option<String>,
    }

    #[derive(Deserialize)]
    pub struct WorkItem {
        pub id: i64,
        #[serde(default)]
        pub fields: FieldMap,
    }

    #[derive(Serialize)]
    pub struct BatchRequest<'a> {
        pub ids: &'a [i64],
        pub fields: &'a [String],
    }

    #[derive(Serialize)]
    pub struct WiqlRequest {
        pub query: String,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WiqlResult {
        #[serde(default)]
        pub work_items: Vec<WiqlRef>,
    }

    #[derive(Deserialize)]
    pub struct WiqlRef {
        pub id: i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> AdoProject {
        AdoClient::new("https://dev.azure.com/", "pat")
            .unwrap()
            .project("contoso", "Cloud Platform")
    }

    #[test]
    fn test_client_invalid_url() {
        assert!(AdoClient::new("not-a-url", "pat").is_err());
        assert!(AdoClient::new("mailto:qa@example.com", "pat").is_err());
    }

    #[test]
    fn test_from_config_requires_pat() {
        let err = AdoClient::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_endpoint_encodes_project() {
        let url = project()
            .endpoint(&["_apis", "testplan", "Plans", "12", "suites"], TESTPLAN_API_VERSION)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/Cloud%20Platform/_apis/testplan/Plans/12/suites?api-version=7.1-preview.1"
        );
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let url = AdoClient::new("http://tfs.local/tfs/", "pat")
            .unwrap()
            .project("Default", "Edge")
            .endpoint(&["_apis", "wit", "wiql"], WIT_API_VERSION)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://tfs.local/tfs/Default/Edge/_apis/wit/wiql?api-version=7.0"
        );
    }

    #[test]
    fn test_versioned_link_keeps_existing_query() {
        let url = versioned_link("https://dev.azure.com/x/y/TestCases?continuation=abc", "7.0").unwrap();
        assert_eq!(url.query(), Some("continuation=abc&api-version=7.0"));
    }

    #[test]
    fn test_suite_wire_mapping() {
        let json = serde_json::json!({
            "value": [
                {
                    "id": 3,
                    "name": "Smoke",
                    "hasChildren": true,
                    "_links": {
                        "testCases": { "href": "https://x/cases" },
                        "testPoints": { "href": "https://x/points" }
                    }
                },
                { "id": 4, "name": "Regression" }
            ]
        });
        let envelope: Envelope<wire::Suite> = serde_json::from_value(json).unwrap();
        let suites: Vec<SuiteRef> = envelope.value.into_iter().map(SuiteRef::from).collect();

        assert_eq!(suites[0].name, "Smoke");
        assert!(suites[0].has_children);
        assert_eq!(suites[0].test_cases_link.as_deref(), Some("https://x/cases"));
        assert_eq!(suites[1], SuiteRef::leaf(4, "Regression"));
    }

    #[test]
    fn test_missing_value_is_empty() {
        let envelope: Envelope<wire::Suite> = serde_json::from_str("{}").unwrap();
        assert!(envelope.value.is_empty());
    }
}
