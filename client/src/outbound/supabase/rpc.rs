//! PostgREST procedure calls.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::client::SupabaseClient;
use super::dto::PostgrestErrorDto;
use super::{body_preview, status_message};
use crate::domain::ports::{Procedure, RpcError, RpcGateway};

#[async_trait]
impl RpcGateway for SupabaseClient {
    async fn call(&self, procedure: Procedure, args: Value) -> Result<Value, RpcError> {
        let endpoint = self
            .endpoint(&format!("rest/v1/rpc/{procedure}"))
            .map_err(|error| RpcError::transport(format!("invalid rpc endpoint: {error}")))?;
        let bearer = self.bearer().await;
        let response = self
            .http
            .post(endpoint)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(bearer.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&args)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(procedure, status, body.as_ref()));
        }
        parse_result(procedure, body.as_ref())
    }
}

fn parse_result(procedure: Procedure, body: &[u8]) -> Result<Value, RpcError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|error| RpcError::decode(format!("{procedure}: invalid JSON payload: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> RpcError {
    if error.is_timeout() {
        RpcError::timeout(error.to_string())
    } else {
        RpcError::transport(error.to_string())
    }
}

fn map_status_error(procedure: Procedure, status: StatusCode, body: &[u8]) -> RpcError {
    let postgrest = serde_json::from_slice::<PostgrestErrorDto>(body).ok();
    if let Some(dto) = &postgrest {
        debug!(
            procedure = %procedure,
            status = status.as_u16(),
            details = dto.details.as_deref().unwrap_or_default(),
            hint = dto.hint.as_deref().unwrap_or_default(),
            "procedure returned an error body"
        );
    }
    let backend_message = postgrest
        .as_ref()
        .and_then(|dto| dto.message.clone())
        .unwrap_or_else(|| body_preview(body));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RpcError::unauthenticated(status_message(status, &backend_message))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RpcError::timeout(status_message(status, &backend_message))
        }
        _ if status.is_client_error() => {
            let code = postgrest
                .and_then(|dto| dto.code)
                .unwrap_or_else(|| status.as_u16().to_string());
            RpcError::rejected(procedure.as_str(), code, backend_message)
        }
        _ => RpcError::transport(status_message(status, &backend_message)),
    }
}
