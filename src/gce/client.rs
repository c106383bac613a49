//! `reqwest` implementation of [`ComputeApi`] against Compute Engine v1.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::GceConfig;

use super::GceError;
use super::api::{ApiFuture, ComputeApi, ComputeInstance, ComputeZone, NewInstance};
use super::auth::{TOKEN_URL, TokenSource};

const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";
const HTTP_SERVER_TAG: &str = "http-server";

/// One page of a list response.
trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatedInstancesPage {
    #[serde(default)]
    items: BTreeMap<String, InstancesScope>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct InstancesScope {
    #[serde(default)]
    instances: Vec<Value>,
}

impl Page for AggregatedInstancesPage {
    type Item = Value;

    fn into_parts(self) -> (Vec<Value>, Option<String>) {
        let instances = self
            .items
            .into_values()
            .flat_map(|scope| scope.instances)
            .collect();
        (instances, self.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZonesPage {
    #[serde(default)]
    items: Vec<ComputeZone>,
    next_page_token: Option<String>,
}

impl Page for ZonesPage {
    type Item = ComputeZone;

    fn into_parts(self) -> (Vec<ComputeZone>, Option<String>) {
        (self.items, self.next_page_token)
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Compute Engine REST client authenticated with a service account.
#[derive(Clone, Debug)]
pub struct GceClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    tokens: Arc<TokenSource>,
}

impl GceClient {
    /// Builds a client for the project and service account in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GceError::Config`] when the private key cannot be parsed or
    /// the HTTP client cannot be initialised.
    pub fn new(config: &GceConfig) -> Result<Self, GceError> {
        let http = http_client()?;
        let tokens = TokenSource::new(
            config.client_email.trim(),
            &config.private_key_pem(),
            TOKEN_URL,
        )?;
        Ok(Self {
            http,
            base_url: COMPUTE_API_BASE.to_owned(),
            project_id: config.project_id.trim().to_owned(),
            tokens: Arc::new(tokens),
        })
    }

    /// Points the client at another API root, such as a local emulator.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/projects/{}/{path}", self.base_url, self.project_id)
    }

    fn instance_url(&self, zone: &str, name: &str) -> String {
        self.project_url(&format!("zones/{zone}/instances/{name}"))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Vec<u8>, GceError> {
        let token = self.tokens.bearer(&self.http).await?;
        execute(request.bearer_auth(token), url).await
    }

    async fn list_all<P: Page>(&self, path: &str, resource: &str) -> Result<Vec<P::Item>, GceError> {
        let url = self.project_url(path);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }
            let body = self.send(request, &url).await?;
            let page: P = decode(&body, resource)?;
            let (mut batch, next) = page.into_parts();
            items.append(&mut batch);
            let Some(token) = next.filter(|token| !token.is_empty()) else {
                return Ok(items);
            };
            page_token = Some(token);
        }
    }

    fn insert_body(request: &NewInstance) -> serde_json::Value {
        let mut tags = request.tags.clone();
        if request.allow_http && !tags.iter().any(|tag| tag == HTTP_SERVER_TAG) {
            tags.push(HTTP_SERVER_TAG.to_owned());
        }
        json!({
            "name": request.name,
            "machineType": format!("zones/{}/machineTypes/{}", request.zone, request.machine_type),
            "tags": { "items": tags },
            "disks": [{
                "boot": true,
                "autoDelete": true,
                "initializeParams": { "sourceImage": request.source_image },
            }],
            "networkInterfaces": [{
                "network": "global/networks/default",
                "accessConfigs": [{ "type": "ONE_TO_ONE_NAT", "name": "External NAT" }],
            }],
        })
    }
}

/// Builds the HTTP client shared by API and token calls.
///
/// No request timeout is set: an issued call runs until the API answers or
/// the connection fails, so an accepted insert is never reported as lost.
fn http_client() -> Result<reqwest::Client, GceError> {
    reqwest::Client::builder()
        .build()
        .map_err(|err| GceError::Config(format!("failed to build HTTP client: {err}")))
}

async fn execute(request: reqwest::RequestBuilder, url: &str) -> Result<Vec<u8>, GceError> {
    let response = request.send().await.map_err(|err| GceError::Transport {
        url: url.to_owned(),
        message: err.to_string(),
    })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|err| GceError::Transport {
        url: url.to_owned(),
        message: err.to_string(),
    })?;

    if status.is_success() {
        return Ok(body.to_vec());
    }

    let message = serde_json::from_slice::<ApiErrorBody>(&body).map_or_else(
        |_| String::from_utf8_lossy(&body).into_owned(),
        |parsed| parsed.error.message,
    );
    Err(GceError::Api {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(body: &[u8], resource: &str) -> Result<T, GceError> {
    serde_json::from_slice(body).map_err(|err| GceError::Decode {
        resource: resource.to_owned(),
        message: err.to_string(),
    })
}

impl ComputeApi for GceClient {
    fn list_instances(&self) -> ApiFuture<'_, Vec<ComputeInstance>> {
        Box::pin(async move {
            self.list_all::<AggregatedInstancesPage>("aggregated/instances", "instances")
                .await?
                .into_iter()
                .map(|record| {
                    ComputeInstance::from_native(record).map_err(|err| GceError::Decode {
                        resource: String::from("instances"),
                        message: err.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, GceError>>()
        })
    }

    fn list_zones(&self) -> ApiFuture<'_, Vec<ComputeZone>> {
        Box::pin(async move { self.list_all::<ZonesPage>("zones", "zones").await })
    }

    fn insert_instance<'a>(&'a self, request: &'a NewInstance) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let url = self.project_url(&format!("zones/{}/instances", request.zone));
            let body = Self::insert_body(request);
            self.send(self.http.post(&url).json(&body), &url).await?;
            Ok(())
        })
    }

    fn start_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let url = format!("{}/start", self.instance_url(zone, name));
            self.send(self.http.post(&url), &url).await?;
            Ok(())
        })
    }

    fn delete_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let url = self.instance_url(zone, name);
            self.send(self.http.delete(&url), &url).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn aggregated_page_flattens_zone_scopes() {
        let page: AggregatedInstancesPage = serde_json::from_str(
            r#"{
                "items": {
                    "zones/z1": { "instances": [{ "id": "1", "name": "proxy-a" }] },
                    "zones/z2": { "warning": { "code": "NO_RESULTS_ON_PAGE" } },
                    "zones/z3": { "instances": [{ "id": "3", "name": "proxy-c" }] }
                },
                "nextPageToken": "next"
            }"#,
        )
        .unwrap_or_else(|err| panic!("decode page: {err}"));

        let (instances, next) = page.into_parts();
        assert_eq!(
            instances,
            vec![
                json!({ "id": "1", "name": "proxy-a" }),
                json!({ "id": "3", "name": "proxy-c" }),
            ]
        );
        assert_eq!(next.as_deref(), Some("next"));
    }

    #[rstest]
    #[case(vec![], vec!["http-server"])]
    #[case(vec!["proxy", "http-server"], vec!["proxy", "http-server"])]
    #[case(vec!["proxy"], vec!["proxy", "http-server"])]
    fn insert_body_enables_inbound_http(#[case] tags: Vec<&str>, #[case] expected: Vec<&str>) {
        let request = NewInstance {
            name: String::from("proxy-ab12cd34"),
            zone: String::from("europe-west1-b"),
            machine_type: String::from("n1-standard-1"),
            source_image: String::from("projects/p/global/images/forward-proxy"),
            tags: tags.into_iter().map(str::to_owned).collect(),
            allow_http: true,
        };
        let body = GceClient::insert_body(&request);
        assert_eq!(body["tags"]["items"], json!(expected));
        assert_eq!(
            body["machineType"],
            json!("zones/europe-west1-b/machineTypes/n1-standard-1")
        );
        assert_eq!(
            body["disks"][0]["initializeParams"]["sourceImage"],
            json!("projects/p/global/images/forward-proxy")
        );
    }

    #[rstest]
    fn decode_reports_resource_on_failure() {
        let err = decode::<ZonesPage>(b"not json", "zones").expect_err("decode should fail");
        assert!(matches!(err, GceError::Decode { ref resource, .. } if resource == "zones"));
    }

    #[rstest]
    fn zones_page_tolerates_missing_items() {
        let page: ZonesPage = serde_json::from_str("{}")
            .unwrap_or_else(|err| panic!("decode page: {err}"));
        let (zones, next) = page.into_parts();
        assert!(zones.is_empty());
        assert!(next.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_responses_are_awaited_to_completion() {
        use std::time::Duration;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|err| panic!("bind: {err}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|err| panic!("local addr: {err}"));
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener
                .accept()
                .await
                .unwrap_or_else(|err| panic!("accept: {err}"));
            let mut request = vec![0_u8; 4096];
            socket
                .read(&mut request)
                .await
                .unwrap_or_else(|err| panic!("read: {err}"));
            tokio::time::sleep(Duration::from_secs(600)).await;
            let body = r#"{"items":[{"name":"z1","status":"UP"}]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .unwrap_or_else(|err| panic!("write: {err}"));
        });

        let http = http_client().unwrap_or_else(|err| panic!("client: {err}"));
        let url = format!("http://{addr}/zones");
        let body = execute(http.get(&url), &url)
            .await
            .unwrap_or_else(|err| panic!("slow call should complete: {err}"));
        let page: ZonesPage = decode(&body, "zones").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(page.items.len(), 1);
        server.await.unwrap_or_else(|err| panic!("server: {err}"));
    }
}
