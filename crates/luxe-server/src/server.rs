use std::sync::Arc;

use luxe_backup::ProcessRunner;
use tokio::runtime::Handle;

use crate::routes;
use crate::state::AppState;

/// Accept loop. Each request gets its own worker thread so a long restore
/// never blocks health checks or artifact downloads.
///
/// Returns once [`tiny_http::Server::unblock`] is called.
pub fn serve<R: ProcessRunner + 'static>(
    http: &tiny_http::Server,
    state: &Arc<AppState<R>>,
    runtime: &Handle,
) {
    for request in http.incoming_requests() {
        let state = Arc::clone(state);
        let runtime = runtime.clone();
        let spawned = std::thread::Builder::new()
            .name("luxe-request".to_string())
            .spawn(move || routes::handle(&state, &runtime, request));
        if let Err(error) = spawned {
            tracing::error!(%error, "failed to spawn request worker");
        }
    }
    tracing::debug!("accept loop stopped");
}
