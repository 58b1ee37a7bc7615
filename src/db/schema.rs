//! DDL for the two timestamp tables.
//! Every statement is idempotent so it can run on each connect.

/// One row per `POST /db/requests`
pub const CREATE_REQUESTS: &str = r#"
CREATE TABLE IF NOT EXISTS requests (
    id BIGSERIAL PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// One row per batch job run
pub const CREATE_CRON_RUNS: &str = r#"
CREATE TABLE IF NOT EXISTS cron_runs (
    id BIGSERIAL PRIMARY KEY,
    executed_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub const STATEMENTS: [&str; 2] = [CREATE_REQUESTS, CREATE_CRON_RUNS];
