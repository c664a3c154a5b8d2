use std::time::Duration;

use rama::{
    Layer as _, Service as _,
    error::{ErrorContext as _, extra::OpaqueError},
    http::{
        BodyExtractExt as _, HeaderValue, Request, Response,
        client::{
            EasyHttpWebClient, ProxyConnectorLayer,
            proxy::layer::{HttpProxyConnectorLayer, SetProxyAuthHttpHeaderLayer},
        },
        layer::{
            map_request_body::MapRequestBodyLayer, map_response_body::MapResponseBodyLayer,
            required_header::AddRequiredRequestHeadersLayer, timeout::TimeoutLayer,
        },
        service::client::HttpClientExt as _,
    },
    layer::{AddInputExtensionLayer, MapErrLayer},
    net::address::ProxyAddress,
    proxy::socks5::Socks5ProxyConnectorLayer,
    rt::Executor,
    service::BoxService,
    telemetry::tracing,
};

use super::generator::DispatchTask;

/// Maximum number of response-body characters kept as failure detail.
const DETAIL_LIMIT: usize = 200;

/// Outcome of a single spark delivery.
///
/// A completed HTTP exchange always carries its status code; transport
/// failures (timeout, refused connection, dns, ...) carry `None` and a
/// non-empty description instead. Nothing ever escapes the client as an
/// error, so the dispatch loop continues unaffected.
#[derive(Debug, Clone)]
pub(super) struct SparkOutcome {
    pub(super) status: Option<u16>,
    pub(super) detail: Option<String>,
}

/// Web client used to deliver spark payloads.
#[derive(Clone)]
pub(super) struct SparkClient {
    inner: BoxService<Request, Response, OpaqueError>,
}

impl SparkClient {
    /// Create the client stack: pooled transport connectors with a fixed
    /// per-request timeout. Failed sparks are not retried.
    pub(super) fn try_new(
        timeout: Duration,
        proxy: Option<ProxyAddress>,
    ) -> Result<Self, OpaqueError> {
        let transport = EasyHttpWebClient::connector_builder()
            .with_default_transport_connector()
            .without_tls_proxy_support()
            .with_custom_proxy_connector(ProxyConnectorLayer::optional(
                Socks5ProxyConnectorLayer::required(),
                HttpProxyConnectorLayer::required(),
            ))
            .with_tls_support_using_boringssl(None)
            .with_default_http_connector(Executor::default())
            .try_with_default_connection_pool()
            .context("create connection pool for spark web client")?
            .build_client();

        let client = (
            MapResponseBodyLayer::new_boxed_streaming_body(),
            MapErrLayer::into_opaque_error(),
            TimeoutLayer::new(timeout),
            AddRequiredRequestHeadersLayer::new().with_user_agent_header_value(
                HeaderValue::from_static(crate::utils::env::server_identifier()),
            ),
            MapRequestBodyLayer::new_boxed_streaming_body(),
        )
            .into_layer(transport);

        Ok(match proxy {
            Some(address) => Self {
                inner: (
                    AddInputExtensionLayer::new(address),
                    SetProxyAuthHttpHeaderLayer::new(),
                )
                    .into_layer(client)
                    .boxed(),
            },
            None => Self {
                inner: client.boxed(),
            },
        })
    }

    #[cfg(test)]
    pub(super) fn from_service(inner: BoxService<Request, Response, OpaqueError>) -> Self {
        Self { inner }
    }

    /// Deliver one spark. All failures are folded into the outcome.
    pub(super) async fn send(&self, task: &DispatchTask) -> SparkOutcome {
        let resp = match self
            .inner
            .post(task.url.clone())
            .json(&task.payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::trace!(url = %task.url, "spark delivery failed: {err}");
                return SparkOutcome {
                    status: None,
                    detail: Some(err.to_string()),
                };
            }
        };

        let status = resp.status().as_u16();
        if (200..400).contains(&status) {
            return SparkOutcome {
                status: Some(status),
                detail: None,
            };
        }

        let detail = match resp.try_into_string().await {
            Ok(body) => body.chars().take(DETAIL_LIMIT).collect(),
            Err(err) => format!("failed to read response body: {err}"),
        };
        SparkOutcome {
            status: Some(status),
            detail: Some(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spark::SparkPayload;

    fn spark_task(url: String) -> DispatchTask {
        DispatchTask {
            index: 0,
            x: 1,
            y: 2,
            url,
            payload: SparkPayload {
                color: [120, 90, 50],
                radius: 30.0,
                transparency: 0.5,
                time_to_grow: 400,
            },
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transport_failure_stays_inside_the_client() {
        // Bind an ephemeral port and drop it again, so the address is
        // almost certainly refusing connections.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind probe listener");
        let addr = listener.local_addr().expect("probe listener addr");
        drop(listener);

        let client = SparkClient::try_new(Duration::from_secs(2), None).expect("create client");
        let task = spark_task(format!("http://{addr}/api/1/2"));

        let outcome = client.send(&task).await;
        assert_eq!(None, outcome.status);
        assert!(!outcome.detail.unwrap_or_default().is_empty());
    }
}
