//! HTTP front end
//!
//! Every request is turned into an `ApiRequest` and handed to the router,
//! so the HTTP server and gateway events share one code path.

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::router::ApiRouter;

const REQUEST_ID_HEADER: &str = "x-request-id";

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => log::warn!("Dropping invalid response header {}", name),
            }
        }

        (status, headers, self.body).into_response()
    }
}

async fn dispatch(
    State(router): State<Arc<ApiRouter>>,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ApiResponse {
    let request = ApiRequest {
        path: uri.path().to_string(),
        query_string_parameters: Some(parse_query(query.as_deref().unwrap_or_default())),
        request_id: headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };

    router.handle(request).await
}

/// Decode `a=1&b=2`; malformed escapes are kept verbatim, the last
/// duplicate key wins
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Axum application forwarding every path to `router`
pub fn app(router: Arc<ApiRouter>) -> Router {
    Router::new().fallback(dispatch).with_state(router)
}

/// Bind `config.server.bind_address` and serve until the process exits
pub async fn serve(config: &ServiceConfig) -> anyhow::Result<()> {
    let router = Arc::new(ApiRouter::from_config(config));
    let addr = &config.server.bind_address;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;
    log::info!("Listening on {}", addr);

    axum::serve(listener, app(router))
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
