//! Admin routes.
//!
//! Every route answers under both `/api/...` and the bare path, matching the
//! frontend proxy and direct access.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use luxe_backup::ProcessRunner;
use luxe_core::naming;
use luxe_db::{DbError, HandleState};
use serde_json::json;
use tiny_http::{Method, Request};
use tokio::runtime::Handle;

use crate::multipart::{MULTIPART_OVERHEAD, restore_from_body};
use crate::reply::{Operation, Reply, backup_error};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dump,
    Restore,
    Health,
    Artifact(String),
    MethodNotAllowed,
    NotFound,
}

pub fn route(method: &Method, url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path
        .strip_prefix("/api")
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(path);

    let expect = |allowed: &[Method], route: Route| {
        if allowed.contains(method) {
            route
        } else {
            Route::MethodNotAllowed
        }
    };

    match path {
        "/admin/db/dump" => expect(&[Method::Post], Route::Dump),
        "/admin/db/restore" => expect(&[Method::Post], Route::Restore),
        "/health" => expect(&[Method::Get], Route::Health),
        _ => path.strip_prefix("/dumps/").map_or(Route::NotFound, |name| {
            expect(&[Method::Get], Route::Artifact(name.to_string()))
        }),
    }
}

/// Request metadata copied out of the transport before the body is read.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub method: Method,
    pub url: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl Incoming {
    fn from_request(request: &Request) -> Self {
        let content_type = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Content-Type"))
            .map(|h| h.value.as_str().to_string());
        Self {
            method: request.method().clone(),
            url: request.url().to_string(),
            content_type,
            content_length: request.body_length().map(|len| len as u64),
        }
    }
}

/// Serve one request on the calling worker thread.
pub fn handle<R: ProcessRunner + 'static>(
    state: &Arc<AppState<R>>,
    runtime: &Handle,
    mut request: Request,
) {
    let started = Instant::now();
    let incoming = Incoming::from_request(&request);

    let reply = dispatch(state, runtime, &incoming, request.as_reader());
    let status = reply.status();

    if let Err(error) = request.respond(reply.into_response()) {
        tracing::warn!(url = %incoming.url, %error, "failed to send response");
    }
    tracing::info!(
        method = %incoming.method,
        url = %incoming.url,
        status,
        elapsed_ms = started.elapsed().as_millis(),
        "request handled"
    );
}

pub fn dispatch<R: ProcessRunner + 'static>(
    state: &Arc<AppState<R>>,
    runtime: &Handle,
    incoming: &Incoming,
    body: &mut dyn Read,
) -> Reply {
    match route(&incoming.method, &incoming.url) {
        Route::Dump => match runtime.block_on(state.dump.create_dump()) {
            Ok(result) => Reply::json(201, &result),
            Err(error) => backup_error(Operation::Dump, &error),
        },
        Route::Restore => restore(state, runtime, incoming, body),
        Route::Health => health(state, runtime),
        Route::Artifact(name) => artifact(&state.dump_dir, &name),
        Route::MethodNotAllowed => Reply::method_not_allowed(),
        Route::NotFound => Reply::not_found(),
    }
}

fn restore<R: ProcessRunner + 'static>(
    state: &Arc<AppState<R>>,
    runtime: &Handle,
    incoming: &Incoming,
    body: &mut dyn Read,
) -> Reply {
    let limit = state.restore.max_upload_bytes();
    if incoming
        .content_length
        .is_some_and(|len| len > limit.saturating_add(MULTIPART_OVERHEAD))
    {
        return backup_error(
            Operation::Restore,
            &luxe_backup::BackupError::PayloadTooLarge { limit_bytes: limit },
        );
    }

    match restore_from_body(state, runtime, incoming.content_type.as_deref(), body) {
        Ok(result) => Reply::json(200, &result),
        Err(error) => backup_error(Operation::Restore, &error),
    }
}

fn health<R>(state: &AppState<R>, runtime: &Handle) -> Reply {
    let database = match state.handle.state() {
        HandleState::Live => match runtime.block_on(state.handle.ping()) {
            Ok(()) => HandleState::Live.as_str(),
            Err(DbError::ServiceRestoring) => HandleState::Restoring.as_str(),
            Err(error) => {
                tracing::debug!(%error, "health ping failed");
                HandleState::Uninitialized.as_str()
            }
        },
        other => other.as_str(),
    };
    Reply::json(200, &json!({ "status": "ok", "database": database }))
}

/// Serve a finished dump. Scratch files and anything outside the dump
/// directory are never reachable.
fn artifact(dump_dir: &Path, name: &str) -> Reply {
    if !naming::is_plain_file_name(name) || name.starts_with("restore_") {
        return Reply::not_found();
    }

    match std::fs::File::open(dump_dir.join(name)) {
        Ok(file) if file.metadata().is_ok_and(|meta| meta.is_file()) => Reply::File {
            file,
            filename: name.to_string(),
        },
        _ => Reply::not_found(),
    }
}
