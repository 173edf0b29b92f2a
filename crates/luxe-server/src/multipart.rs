//! Bridge a blocking request body into the async multipart parser.
//!
//! `tiny_http` hands each worker a synchronous reader. The worker pumps it in
//! chunks through a bounded channel into a task on the runtime, where `multer`
//! picks the `dump` field and streams it into the restore orchestrator. When
//! the task stops early (oversized, bad field) the channel closes and the pump
//! stops reading.

use std::io::{self, Read};
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use luxe_backup::{BackupError, ProcessRunner, UploadError};
use luxe_core::RestoreResult;
use multer::{Constraints, Multipart, SizeLimit};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::state::AppState;

/// Multipart field that carries the archive.
pub const DUMP_FIELD: &str = "dump";

/// Allowance for boundaries, part headers and small extra fields.
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

const CHUNK_SIZE: usize = 64 * 1024;
const CHANNEL_DEPTH: usize = 8;

/// Parse a `multipart/form-data` body and run the restore.
///
/// Must be called from a plain worker thread, not from inside the runtime.
pub fn restore_from_body<R: ProcessRunner + 'static>(
    state: &Arc<AppState<R>>,
    runtime: &Handle,
    content_type: Option<&str>,
    body: &mut dyn Read,
) -> Result<RestoreResult, BackupError> {
    let content_type = content_type.ok_or_else(|| {
        BackupError::Validation("expected a multipart/form-data upload".to_string())
    })?;
    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        BackupError::Validation(format!("expected a multipart/form-data upload: {e}"))
    })?;

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_DEPTH);
    let task = runtime.spawn({
        let state = Arc::clone(state);
        async move { restore_multipart(&state, channel_stream(rx), boundary).await }
    });

    pump(body, &tx);
    drop(tx);

    runtime.block_on(task).unwrap_or_else(|join_error| {
        Err(BackupError::Io {
            context: "restore task failed",
            source: io::Error::other(join_error.to_string()),
        })
    })
}

fn channel_stream(
    rx: mpsc::Receiver<io::Result<Bytes>>,
) -> impl Stream<Item = io::Result<Bytes>> + Send {
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
}

fn pump(body: &mut dyn Read, tx: &mpsc::Sender<io::Result<Bytes>>) {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let item = match body.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => Ok(Bytes::copy_from_slice(&buf[..n])),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => Err(error),
        };
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() || failed {
            return;
        }
    }
}

async fn restore_multipart<R: ProcessRunner, S>(
    state: &AppState<R>,
    body: S,
    boundary: String,
) -> Result<RestoreResult, BackupError>
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let limit = state.restore.max_upload_bytes();
    let whole_stream = SizeLimit::new().whole_stream(limit.saturating_add(MULTIPART_OVERHEAD));
    let constraints = Constraints::new().size_limit(whole_stream);
    let mut multipart = Multipart::with_constraints(body, boundary, constraints);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, limit))?
    {
        if field.name() != Some(DUMP_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let chunks = field.map(|chunk| chunk.map_err(|e| upload_error(&e)));
        return state.restore.restore(chunks, &filename).await;
    }

    Err(BackupError::Validation(format!("missing multipart field \"{DUMP_FIELD}\"")))
}

/// Errors while reading the `dump` field itself. The whole-stream limit can
/// trip here when extra fields came first.
fn upload_error(error: &multer::Error) -> UploadError {
    match error {
        multer::Error::StreamSizeExceeded { .. } => UploadError::TooLarge,
        other => UploadError::Interrupted(format!("malformed multipart body: {other}")),
    }
}

fn multipart_error(error: &multer::Error, limit: u64) -> BackupError {
    match error {
        multer::Error::StreamSizeExceeded { .. } => {
            BackupError::PayloadTooLarge { limit_bytes: limit }
        }
        other => BackupError::Validation(format!("malformed multipart body: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use luxe_backup::{ToolInvocation, ToolOutput};
    use luxe_config::LuxeConfig;
    use luxe_db::ConnectionManager;
    use tempfile::TempDir;

    use super::*;

    const BOUNDARY: &str = "luxe-test-boundary";
    const LIMIT: u64 = 1024;

    #[derive(Default)]
    struct RecordingRunner {
        programs: Mutex<Vec<String>>,
    }

    impl ProcessRunner for RecordingRunner {
        async fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
            self.programs.lock().unwrap().push(invocation.program.clone());
            Ok(ToolOutput {
                code: Some(0),
                stderr: String::new(),
            })
        }
    }

    fn state(dir: &TempDir) -> (AppState<RecordingRunner>, Arc<RecordingRunner>) {
        let mut config = LuxeConfig::default();
        config.storage.dump_dir = dir.path().join("dumps");
        config.storage.max_upload_bytes = LIMIT;
        let runner = Arc::new(RecordingRunner::default());
        let state = AppState::new(Arc::clone(&runner), &config, ConnectionManager::new()).unwrap();
        (state, runner)
    }

    /// Hand the parser one chunk per wakeup, the way a socket would.
    fn paced(chunks: Vec<Vec<u8>>) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        futures::stream::iter(chunks).then(|chunk| async move {
            tokio::task::yield_now().await;
            Ok(Bytes::from(chunk))
        })
    }

    fn part_header(name: &str, filename: Option<&str>) -> String {
        let filename = filename.map(|f| format!("; filename=\"{f}\"")).unwrap_or_default();
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"{filename}\r\n\r\n"
        )
    }

    #[tokio::test]
    async fn stream_limit_inside_dump_field_is_payload_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let (state, runner) = state(&dir);

        // A large leading field keeps the whole stream just under its cap
        // until the in-limit dump body arrives.
        let mut head = part_header("note", None).into_bytes();
        head.extend(std::iter::repeat_n(b'n', 65_800));
        head.extend_from_slice(b"\r\n");
        head.extend_from_slice(part_header(DUMP_FIELD, Some("x.sql")).as_bytes());
        let whole_stream = LIMIT + MULTIPART_OVERHEAD;
        assert!((head.len() as u64) < whole_stream);
        assert!(head.len() as u64 + 1000 > whole_stream);

        let chunks = vec![
            head,
            vec![b's'; 1000],
            format!("\r\n--{BOUNDARY}--\r\n").into_bytes(),
        ];

        let err = restore_multipart(&state, paced(chunks), BOUNDARY.to_string())
            .await
            .unwrap_err();

        assert!(
            matches!(err, BackupError::PayloadTooLarge { limit_bytes: LIMIT }),
            "got {err:?}"
        );
        assert!(runner.programs.lock().unwrap().is_empty());
        let leftovers = std::fs::read_dir(dir.path().join("dumps"))
            .map(Iterator::count)
            .unwrap_or_default();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn broken_dump_field_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let (state, runner) = state(&dir);

        let chunks = vec![
            part_header(DUMP_FIELD, Some("x.sql")).into_bytes(),
            b"select 1;".to_vec(),
        ];

        let err = restore_multipart(&state, paced(chunks), BOUNDARY.to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Validation(_)), "got {err:?}");
        assert!(runner.programs.lock().unwrap().is_empty());
    }
}
