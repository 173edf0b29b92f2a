//! HTTP replies and the mapping from domain errors to status codes.

use std::fs::File;

use luxe_backup::BackupError;
use luxe_db::DbError;
use serde::Serialize;
use serde_json::{Value, json};
use tiny_http::{Header, Response, ResponseBox};

/// A handler's answer, independent of the transport.
#[derive(Debug)]
pub enum Reply {
    Json { status: u16, body: Value },
    File { file: File, filename: String },
}

impl Reply {
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self::Json { status, body },
            Err(error) => Self::error(500, format!("failed to encode response: {error}")),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Json {
            status,
            body: json!({ "status": "error", "message": message.into() }),
        }
    }

    pub fn not_found() -> Self {
        Self::error(404, "Not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::error(405, "Method not allowed")
    }

    pub const fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. } => *status,
            Self::File { .. } => 200,
        }
    }

    pub fn into_response(self) -> ResponseBox {
        match self {
            Self::Json { status, body } => {
                let response = Response::from_string(body.to_string()).with_status_code(status);
                with_header(response, "Content-Type", "application/json").boxed()
            }
            Self::File { file, filename } => {
                let response = with_header(
                    Response::from_file(file),
                    "Content-Type",
                    "application/octet-stream",
                );
                with_header(
                    response,
                    "Content-Disposition",
                    &format!("attachment; filename=\"{filename}\""),
                )
                .boxed()
            }
        }
    }
}

fn with_header<R: std::io::Read>(response: Response<R>, name: &str, value: &str) -> Response<R> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

/// Which admin operation failed, for the error message prefix.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    Dump,
    Restore,
}

impl Operation {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Dump => "Error creating dump",
            Self::Restore => "Error restoring database",
        }
    }
}

/// HTTP status for a failed dump or restore.
pub const fn status_for(error: &BackupError) -> u16 {
    match error {
        BackupError::Validation(_) => 400,
        BackupError::PayloadTooLarge { .. } => 413,
        BackupError::Io { .. }
        | BackupError::ExternalTool { .. }
        | BackupError::ArtifactWrite(_) => 500,
        BackupError::Db(
            DbError::ServiceRestoring
            | DbError::NotInitialized
            | DbError::OperationOnClosedHandle
            | DbError::Connection { .. },
        )
        | BackupError::PostRestoreReconnect(_) => 503,
        BackupError::Db(DbError::InvalidConfig(_) | DbError::Query(_)) => 500,
    }
}

/// JSON error body. Tool failures carry the tool's stderr verbatim.
pub fn backup_error(operation: Operation, error: &BackupError) -> Reply {
    let status = status_for(error);
    let message = match error {
        BackupError::PostRestoreReconnect(_) => error.to_string(),
        _ => format!("{}: {error}", operation.prefix()),
    };

    let mut body = json!({ "status": "error", "message": message });
    if let BackupError::ExternalTool { tool, stderr, .. } = error {
        body["tool"] = json!(tool);
        body["stderr"] = json!(stderr);
    }
    Reply::Json { status, body }
}
