//! Shared mocks and payloads for the domain service tests.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::broadcast;

use super::ports::{MockAuthProvider, MockRpcGateway, Procedure, RpcError};
use super::{BackendProcedures, Identity, UserId};

pub(crate) const USER: &str = "1fa85f64-5717-4562-b3fc-2c963f66afa6";
pub(crate) const OTHER_USER: &str = "2fa85f64-5717-4562-b3fc-2c963f66afa6";
pub(crate) const FAMILY: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

pub(crate) fn user_id() -> UserId {
    UserId::new(USER).expect("fixture user id")
}

pub(crate) fn identity() -> Identity {
    Identity::new(user_id(), "ada").with_email("ada@example.com")
}

/// Auth provider that always reports `identity`.
pub(crate) fn auth_reporting(identity: Option<Identity>) -> MockAuthProvider {
    let mut auth = MockAuthProvider::new();
    auth.expect_current_identity()
        .returning(move || Ok(identity.clone()));
    auth.expect_subscribe()
        .returning(|| broadcast::channel(1).1);
    auth
}

pub(crate) fn context_row(username: &str, in_family: bool) -> Value {
    if in_family {
        json!([{
            "user_id": USER,
            "username": username,
            "avatar_url": null,
            "family_id": FAMILY,
            "role": "admin",
            "family_name": "Smiths",
            "join_code": "ABC123",
            "monthly_spending_limit": 1000
        }])
    } else {
        json!([{
            "user_id": USER,
            "username": username,
            "avatar_url": null,
            "family_id": null,
            "role": null,
            "family_name": null,
            "join_code": null,
            "monthly_spending_limit": null
        }])
    }
}

pub(crate) fn member_rows() -> Value {
    json!([
        {
            "user_id": USER,
            "role": "admin",
            "joined_at": "2024-05-01T10:00:00+00:00",
            "username": "ada",
            "avatar_url": null
        },
        {
            "user_id": OTHER_USER,
            "role": "member",
            "joined_at": "2024-05-02T10:00:00+00:00",
            "username": "bob",
            "avatar_url": null
        }
    ])
}

/// Expect `procedure` exactly `times` times, answering with `answer`.
pub(crate) fn expect_procedure(
    gateway: &mut MockRpcGateway,
    procedure: Procedure,
    times: usize,
    answer: Result<Value, RpcError>,
) {
    gateway
        .expect_call()
        .withf(move |called, _| *called == procedure)
        .times(times)
        .returning(move |_, _| answer.clone());
}

pub(crate) fn procedures(gateway: MockRpcGateway) -> BackendProcedures {
    BackendProcedures::new(Arc::new(gateway))
}
