//! Command lines for the PostgreSQL client tools.
//!
//! The password always travels through `PGPASSWORD`, never argv, so it stays
//! out of process listings and logs.

use std::path::Path;

use luxe_config::{DatabaseConfig, ToolsConfig};
use luxe_core::ArtifactFormat;

use crate::process::ToolInvocation;

const PASSWORD_ENV: &str = "PGPASSWORD";

/// Builds `pg_dump`, `pg_restore` and `psql` invocations.
#[derive(Debug, Clone, Default)]
pub struct PgTools {
    tools: ToolsConfig,
}

impl PgTools {
    #[must_use]
    pub const fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// `pg_dump -F c -f <output>` against the configured database.
    #[must_use]
    pub fn dump(&self, db: &DatabaseConfig, output: &Path) -> ToolInvocation {
        connection_args(ToolInvocation::new(&self.tools.pg_dump), db)
            .arg("-F")
            .arg("c")
            .arg("-f")
            .arg(output.to_string_lossy())
    }

    /// The restore command for an artifact of `format`.
    ///
    /// SQL scripts run through `psql -f`. Anything else is treated as a
    /// custom archive and handed to `pg_restore --clean`, which drops
    /// existing objects before recreating them.
    #[must_use]
    pub fn restore(
        &self,
        db: &DatabaseConfig,
        format: ArtifactFormat,
        input: &Path,
    ) -> ToolInvocation {
        match format {
            ArtifactFormat::SqlText => connection_args(ToolInvocation::new(&self.tools.psql), db)
                .arg("-f")
                .arg(input.to_string_lossy()),
            ArtifactFormat::CustomBinary => {
                connection_args(ToolInvocation::new(&self.tools.pg_restore), db)
                    .arg("-c")
                    .arg("-v")
                    .arg(input.to_string_lossy())
            }
        }
    }
}

fn connection_args(invocation: ToolInvocation, db: &DatabaseConfig) -> ToolInvocation {
    invocation
        .arg("-h")
        .arg(&db.host)
        .arg("-p")
        .arg(db.port.to_string())
        .arg("-U")
        .arg(&db.user)
        .arg("-d")
        .arg(&db.name)
        .env(PASSWORD_ENV, &db.password)
}
