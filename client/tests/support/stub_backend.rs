//! In-process stub of the PostgREST procedure and GoTrue auth endpoints.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use famspend::outbound::supabase::SupabaseConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;
use zeroize::Zeroizing;

pub const ANON_KEY: &str = "anon-key";
pub const GOOD_TOKEN: &str = "good-token";
pub const REFRESHED_TOKEN: &str = "refreshed-token";
/// Refresh token whose exchange is answered after a delay.
pub const SLOW_REFRESH_TOKEN: &str = "refresh-slow";
pub const PASSWORD: &str = "secret";
pub const USER_ID: &str = "1fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const FAMILY_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// One request observed by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct Recorder(Mutex<Vec<RecordedRequest>>);

impl Recorder {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.0.lock().expect("recorder mutex").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.path)
            .collect()
    }

    fn record(&self, request: &HttpRequest, body: &[u8]) {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        let recorded = RecordedRequest {
            path: request.path().to_owned(),
            apikey: header("apikey"),
            authorization: header("authorization"),
            body: serde_json::from_slice(body).ok(),
        };
        self.0.lock().expect("recorder mutex").push(recorded);
    }
}

/// Running stub server.
pub struct StubBackend {
    pub base_url: String,
    pub recorder: Arc<Recorder>,
    handle: ServerHandle,
}

impl StubBackend {
    pub fn config(&self) -> SupabaseConfig {
        SupabaseConfig {
            url: Url::parse(&self.base_url).expect("stub url"),
            anon_key: Zeroizing::new(ANON_KEY.to_owned()),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

pub fn spawn_stub_backend() -> StubBackend {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    let recorder = Arc::new(Recorder::default());
    let data = web::Data::from(Arc::clone(&recorder));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/rest/v1/rpc/{procedure}", web::post().to(rpc_handler))
            .route("/auth/v1/user", web::get().to(user_handler))
            .route("/auth/v1/token", web::post().to(token_handler))
            .route("/auth/v1/logout", web::post().to(logout_handler))
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .expect("listen on stub address")
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    StubBackend {
        base_url: format!("http://{addr}"),
        recorder,
        handle,
    }
}

fn postgrest_error(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "code": code,
        "message": message,
        "details": null,
        "hint": null
    }))
}

async fn rpc_handler(
    request: HttpRequest,
    procedure: web::Path<String>,
    body: web::Bytes,
    recorder: web::Data<Recorder>,
) -> HttpResponse {
    recorder.record(&request, body.as_ref());
    match procedure.as_str() {
        "get_my_context" => HttpResponse::Ok().json(json!([{
            "user_id": USER_ID,
            "username": "ada",
            "avatar_url": null,
            "family_id": FAMILY_ID,
            "role": "admin",
            "family_name": "Smiths",
            "join_code": "ABC123",
            "monthly_spending_limit": 1000
        }])),
        "get_categories_for_my_family" => HttpResponse::Ok().json(Value::Null),
        "leave_family" => HttpResponse::NoContent().finish(),
        "join_family" => postgrest_error(StatusCode::BAD_REQUEST, "P0001", "Invalid join code"),
        "delete_family" => postgrest_error(
            StatusCode::FORBIDDEN,
            "42501",
            "Only admins can delete the family",
        ),
        "create_category_for_my_family" => {
            HttpResponse::Conflict().body("duplicate category name")
        }
        "get_family_members" => HttpResponse::InternalServerError().body("upstream exploded"),
        _ => postgrest_error(
            StatusCode::NOT_FOUND,
            "PGRST202",
            "Could not find the function",
        ),
    }
}

fn user_body() -> Value {
    json!({
        "id": USER_ID,
        "email": "ada@example.com",
        "user_metadata": { "username": "ada", "avatar_url": null }
    })
}

async fn user_handler(request: HttpRequest, recorder: web::Data<Recorder>) -> HttpResponse {
    recorder.record(&request, &[]);
    let authorised = request
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value == format!("Bearer {GOOD_TOKEN}") || value == format!("Bearer {REFRESHED_TOKEN}")
        });
    if authorised {
        HttpResponse::Ok().json(user_body())
    } else {
        HttpResponse::Unauthorized().json(json!({ "msg": "invalid JWT" }))
    }
}

#[derive(Deserialize)]
struct GrantQuery {
    grant_type: String,
}

async fn token_handler(
    request: HttpRequest,
    query: web::Query<GrantQuery>,
    body: web::Bytes,
    recorder: web::Data<Recorder>,
) -> HttpResponse {
    recorder.record(&request, body.as_ref());
    let payload: Value = serde_json::from_slice(body.as_ref()).unwrap_or(Value::Null);
    if query.grant_type == "refresh_token" && payload["refresh_token"] == SLOW_REFRESH_TOKEN {
        actix_web::rt::time::sleep(Duration::from_millis(300)).await;
        return HttpResponse::Ok().json(json!({
            "access_token": REFRESHED_TOKEN,
            "refresh_token": "refresh-2",
            "user": user_body()
        }));
    }
    match query.grant_type.as_str() {
        "password" if payload["password"] == PASSWORD => HttpResponse::Ok().json(json!({
            "access_token": GOOD_TOKEN,
            "refresh_token": "refresh-1",
            "user": user_body()
        })),
        "refresh_token" if payload["refresh_token"] == "refresh-1" => {
            HttpResponse::Ok().json(json!({
                "access_token": REFRESHED_TOKEN,
                "refresh_token": "refresh-2",
                "user": user_body()
            }))
        }
        _ => HttpResponse::BadRequest().json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })),
    }
}

async fn logout_handler(request: HttpRequest, recorder: web::Data<Recorder>) -> HttpResponse {
    recorder.record(&request, &[]);
    HttpResponse::NoContent().finish()
}
