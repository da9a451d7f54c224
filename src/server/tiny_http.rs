//! tiny_http server adapter
//!
//! Handles routing, identity headers, body parsing, and response conversion
//! for tiny_http. Requests are served by a fixed pool of worker threads that
//! share one workspace; the config file is watched and reloaded in place.
//!
//! ## Routes
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | POST | `/api/contributions` | submit |
//! | GET | `/api/contributions?council=&field=&year=&status=&submitted_by=&page=&per_page=` | list pending |
//! | GET | `/api/contributions/{id}` | get contribution |
//! | POST | `/api/contributions/{id}/review` | review |
//! | GET | `/api/issues?kind=&council=&field=&year=&page=&per_page=` | list issues |
//! | POST | `/api/issues/invalidate` | invalidate issue |
//! | GET | `/api/records/{council}/{field}/{year}` | current record |
//! | GET | `/api/records/{council}/{field}/{year}/history` | audit trail |
//!
//! The caller is identified by `X-User`, `X-Tier` and `X-Superuser` headers,
//! set by the authenticating proxy in front of this server.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Serialize, de::DeserializeOwned};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use civic_ledger::Workspace;
use civic_ledger::api::{self, ApiError, ApiResponse};
use civic_ledger::core::models::{PageRequest, Triple, User};
use civic_ledger::core::ports::LedgerFilter;
use civic_ledger::core::services::IssueFilter;

type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Largest request body accepted, in bytes
const MAX_BODY_BYTES: u64 = 64 * 1024;

// =============================================================================
// SERVER LOOP
// =============================================================================

/// Serve the API on `port` until the process is stopped
pub fn run(workspace: Workspace, port: u16, workers: usize) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let server =
        Arc::new(Server::http(&addr).map_err(|e| anyhow::anyhow!("Failed to start server: {e}"))?);
    let workspace = Arc::new(workspace);

    let _watcher = watch_config(Arc::clone(&workspace))?;
    log::info!("listening on http://{addr} with {workers} workers");

    let handles: Vec<_> = (0..workers.max(1))
        .map(|n| {
            let server = Arc::clone(&server);
            let workspace = Arc::clone(&workspace);
            thread::Builder::new()
                .name(format!("http-worker-{n}"))
                .spawn(move || {
                    for mut request in server.incoming_requests() {
                        let response = handle_api_request(&workspace, &mut request);
                        if let Err(e) = request.respond(response) {
                            log::warn!("failed to send response: {e}");
                        }
                    }
                })
        })
        .collect::<Result<_, _>>()?;

    for handle in handles {
        if handle.join().is_err() {
            log::error!("http worker panicked");
        }
    }
    Ok(())
}

/// Reload the catalog whenever the config file changes
///
/// The parent directory is watched so editors that replace the file on save
/// are still picked up.
fn watch_config(workspace: Arc<Workspace>) -> anyhow::Result<RecommendedWatcher> {
    let config_path = workspace.config_path().to_path_buf();
    let file_name = config_path.file_name().map(ToOwned::to_owned);
    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                log::warn!("config watch error: {e}");
                return;
            },
        };
        let touches_config = event.paths.iter().any(|p| p.file_name() == file_name.as_deref());
        if touches_config
            && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && let Err(e) = workspace.reload_config()
        {
            log::warn!("config reload failed, keeping previous catalog: {e:#}");
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    log::debug!("watching {} for config changes", dir.display());
    Ok(watcher)
}

// =============================================================================
// REQUEST HANDLING
// =============================================================================

/// Handle an API request and return a response
///
/// This is the main routing function that maps URL paths to handlers.
pub fn handle_api_request(workspace: &Workspace, request: &mut Request) -> HttpResponse {
    let url = request.url().to_string();
    let method = request.method().clone();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let api_path = path
        .strip_prefix("/api/v1")
        .or_else(|| path.strip_prefix("/api"))
        .unwrap_or(path);
    let segments: Vec<&str> = api_path.trim_matches('/').split('/').collect();
    let engine = workspace.engine();

    log::debug!("{method} {api_path}");

    let response = match (&method, segments.as_slice()) {
        (&Method::Get, ["contributions"]) => {
            let filter = LedgerFilter {
                council: param(query, "council"),
                field: param(query, "field"),
                year: param(query, "year"),
                status: match parse_param(query, "status") {
                    Ok(status) => status,
                    Err(e) => return error_response(&e),
                },
                submitted_by: param(query, "submitted_by"),
            };
            handle_result(api::list_pending(engine, &filter, page_request(query)))
        },

        (&Method::Get, ["contributions", id]) => match parse_id(id) {
            Ok(id) => handle_result(api::get_contribution(engine, id)),
            Err(e) => error_response(&e),
        },

        (&Method::Get, ["issues"]) => {
            let filter = IssueFilter {
                kind: match parse_param(query, "kind") {
                    Ok(kind) => kind,
                    Err(e) => return error_response(&e),
                },
                council: param(query, "council"),
                field: param(query, "field"),
                year: param(query, "year"),
            };
            handle_result(api::list_issues(engine, &filter, page_request(query)))
        },

        (&Method::Get, ["records", council, field, year]) => {
            handle_result(api::get_record(engine, Triple::new(*council, *field, *year)))
        },

        (&Method::Get, ["records", council, field, year, "history"]) => {
            handle_result(api::get_history(engine, Triple::new(*council, *field, *year)))
        },

        // Everything below mutates state and needs an identity
        (&Method::Post, ["contributions"]) => with_user(request, |user, request| {
            let req = read_json_body(request)?;
            api::submit(engine, &user, req)
        }),

        (&Method::Post, ["contributions", id, "review"]) => with_user(request, |user, request| {
            let id = parse_id(id)?;
            let req = read_json_body(request)?;
            api::review(engine, &user, id, req)
        }),

        (&Method::Post, ["issues", "invalidate"]) => with_user(request, |user, request| {
            let req = read_json_body(request)?;
            api::invalidate_issue(engine, &user, req)
        }),

        // 404 for unknown API routes
        _ => not_found_response(&format!("API endpoint not found: {method} {api_path}")),
    };

    if method == Method::Post
        && response.status_code().0 < 300
        && let Err(e) = workspace.save()
    {
        log::error!("failed to persist state: {e:#}");
        return error_response(&ApiError::internal("Change applied but could not be saved"));
    }
    response
}

fn with_user<T: Serialize>(
    request: &mut Request,
    handler: impl FnOnce(User, &mut Request) -> Result<T, ApiError>,
) -> HttpResponse {
    handle_result(identify(request).and_then(|user| handler(user, request)))
}

// =============================================================================
// IDENTITY
// =============================================================================

fn header<'r>(request: &'r Request, name: &'static str) -> Option<&'r str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str())
}

/// Build the caller from identity headers
fn identify(request: &Request) -> Result<User, ApiError> {
    let id = header(request, "X-User")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing X-User header"))?;
    let tier = header(request, "X-Tier")
        .map_or(Ok(0), str::parse::<u8>)
        .map_err(|e| ApiError::bad_request(format!("Invalid X-Tier header: {e}")))?;
    let superuser = header(request, "X-Superuser").is_some_and(|v| v == "true" || v == "1");

    Ok(User {
        superuser,
        ..User::new(id, tier)
    })
}

// =============================================================================
// QUERY AND BODY PARSING
// =============================================================================

fn param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.replace('+', " "))
        .filter(|value| !value.is_empty())
}

fn parse_param<T: std::str::FromStr<Err = String>>(
    query: &str,
    name: &str,
) -> Result<Option<T>, ApiError> {
    param(query, name)
        .map(|v| v.parse::<T>())
        .transpose()
        .map_err(ApiError::bad_request)
}

fn page_request(query: &str) -> PageRequest {
    let number = |name, default| {
        param(query, name)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(default)
    };
    let defaults = PageRequest::default();
    PageRequest::new(number("page", defaults.page), number("per_page", defaults.per_page))
}

fn parse_id(id: &str) -> Result<u64, ApiError> {
    id.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid contribution id: {id}")))
}

/// Read and parse JSON body from request
fn read_json_body<T: DeserializeOwned>(request: &mut Request) -> Result<T, ApiError> {
    let body = read_body(request.as_reader(), MAX_BODY_BYTES)?;
    serde_json::from_str(&body).map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))
}

/// Read at most `limit` bytes; anything longer is refused
fn read_body(reader: impl Read, limit: u64) -> Result<String, ApiError> {
    let mut body = String::new();
    reader
        .take(limit + 1)
        .read_to_string(&mut body)
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;
    if body.len() as u64 > limit {
        return Err(ApiError::bad_request(format!(
            "Request body exceeds {limit} bytes"
        )));
    }
    Ok(body)
}

// =============================================================================
// RESPONSE CONVERSION
// =============================================================================

/// Convert a handler result to an HTTP response
fn handle_result<T: Serialize>(result: Result<T, ApiError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_response(&e),
    }
}

/// Create a successful JSON response
fn success_response<T: Serialize>(data: T) -> HttpResponse {
    let response = ApiResponse::success(data);
    json_response(&response, 200)
}

/// Create an error JSON response with appropriate status code
fn error_response(error: &ApiError) -> HttpResponse {
    let response = ApiResponse::<()>::error(error.code.as_str(), &error.message);
    json_response(&response, error.status_code())
}

/// Create a 404 not found response
fn not_found_response(message: &str) -> HttpResponse {
    let response = ApiResponse::<()>::error("NOT_FOUND", message);
    json_response(&response, 404)
}

/// Serialize data to JSON response with status code
fn json_response<T: Serialize>(data: &T, status: u16) -> HttpResponse {
    let json = serde_json::to_string(data).unwrap_or_else(|_| r#"{"success":false}"#.to_string());
    let mut response = Response::from_data(json.into_bytes()).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
        response.add_header(header);
    }
    response
}
