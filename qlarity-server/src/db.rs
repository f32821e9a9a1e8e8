//! Database connection pool utilities.

#[cfg(test)]
use diesel::RunQueryDsl;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Pooled PostgreSQL connections for the Qlarity server.
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Embedded Diesel migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build a connection pool for `database_url` and run pending migrations.
pub fn init_pool(database_url: &str) -> Result<DbPool, String> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .map_err(|err| format!("failed to create database pool: {err}"))?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Run pending Diesel migrations.
pub fn run_migrations(pool: &DbPool) -> Result<(), String> {
    let mut conn = pool
        .get()
        .map_err(|err| format!("failed to fetch database connection: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("failed to run migrations: {err}"))?;
    Ok(())
}

/// Point a PostgreSQL URL at another database on the same server.
///
/// Returns `None` when the URL has no database segment to replace.
#[cfg(test)]
fn with_database_name(database_url: &str, name: &str) -> Option<String> {
    let split = database_url.find('?').unwrap_or(database_url.len());
    let (location, query) = database_url.split_at(split);
    let (server, current) = location.rsplit_once('/')?;
    if current.is_empty() || server.ends_with('/') {
        return None;
    }
    Some(format!("{server}/{name}{query}"))
}

/// Empty PostgreSQL database that lives as long as the value.
///
/// Created next to the database named by `TEST_DATABASE_URL` (or
/// `DATABASE_URL`) and dropped again on `Drop`.
#[cfg(test)]
pub(crate) struct ScratchDatabase {
    name: String,
    url: String,
    admin_url: String,
}

#[cfg(test)]
impl ScratchDatabase {
    pub(crate) fn create() -> Self {
        use diesel::Connection;

        let configured = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("set TEST_DATABASE_URL or DATABASE_URL for PostgreSQL tests");
        let name = format!("qlarity_scratch_{}", uuid::Uuid::new_v4().simple());
        let url = with_database_name(&configured, &name).expect("database url names a database");
        let admin_url =
            with_database_name(&configured, "postgres").expect("database url names a database");

        let mut admin = PgConnection::establish(&admin_url).expect("connect to postgres");
        diesel::sql_query(format!("CREATE DATABASE \"{name}\""))
            .execute(&mut admin)
            .expect("create scratch database");
        Self {
            name,
            url,
            admin_url,
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// A pool on the scratch database with migrations applied.
    pub(crate) fn migrated_pool(&self) -> DbPool {
        init_pool(&self.url).expect("scratch pool")
    }
}

#[cfg(test)]
impl Drop for ScratchDatabase {
    fn drop(&mut self) {
        use diesel::Connection;

        let Ok(mut admin) = PgConnection::establish(&self.admin_url) else {
            return;
        };
        // FORCE closes pools that outlive the test body (PostgreSQL 13+).
        let statement = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name);
        if let Err(err) = diesel::sql_query(statement).execute(&mut admin) {
            log::warn!("could not drop scratch database {}: {err}", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ScratchDatabase, init_pool, with_database_name};
    use diesel::prelude::*;
    use diesel::sql_types::Text;

    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[test]
    fn with_database_name_keeps_server_and_query() {
        assert_eq!(
            with_database_name("postgres://u:p@localhost:5432/app?sslmode=disable", "scratch")
                .as_deref(),
            Some("postgres://u:p@localhost:5432/scratch?sslmode=disable")
        );
        assert_eq!(
            with_database_name("postgres://localhost/app", "postgres").as_deref(),
            Some("postgres://localhost/postgres")
        );
    }

    #[test]
    fn with_database_name_needs_a_database_segment() {
        assert_eq!(with_database_name("postgres://localhost", "x"), None);
        assert_eq!(with_database_name("postgres://localhost/", "x"), None);
    }

    #[test]
    #[ignore = "requires PostgreSQL via TEST_DATABASE_URL"]
    fn init_pool_runs_migrations() {
        let scratch = ScratchDatabase::create();
        let pool = init_pool(scratch.url()).expect("pool");

        let mut conn = pool.get().expect("conn");
        let tables: Vec<TableName> = diesel::sql_query(
            "SELECT tablename AS name FROM pg_tables WHERE schemaname = 'public' AND tablename = 'coverage_reports'",
        )
        .load(&mut conn)
        .expect("query tables");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "coverage_reports");
    }
}
