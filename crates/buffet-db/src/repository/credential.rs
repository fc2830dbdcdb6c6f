//! # Credential Repository
//!
//! Read/write access to the `passwd` table.
//!
//! Hashes are opaque bytes here. Producing and verifying them is the
//! authentication layer's job.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for stored password hashes.
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    pool: SqlitePool,
}

impl CredentialRepository {
    /// Creates a new CredentialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CredentialRepository { pool }
    }

    /// Gets the stored hash for `user`.
    ///
    /// ## Returns
    /// * `Ok(Some(hash))` - User exists
    /// * `Ok(None)` - Unknown user
    pub async fn password_hash(&self, user: &str) -> DbResult<Option<Vec<u8>>> {
        let hash: Option<Vec<u8>> = sqlx::query_scalar("SELECT pass FROM passwd WHERE name = ?1")
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hash)
    }

    /// Stores the hash for `user`, replacing any previous one.
    pub async fn set_password_hash(&self, user: &str, hash: &[u8]) -> DbResult<()> {
        debug!(user = %user, "Storing password hash");

        sqlx::query(
            r#"
            INSERT INTO passwd (name, pass) VALUES (?1, ?2)
            ON CONFLICT (name) DO UPDATE SET pass = excluded.pass
            "#,
        )
        .bind(user)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes `user`. Returns false if the user didn't exist.
    pub async fn remove(&self, user: &str) -> DbResult<bool> {
        debug!(user = %user, "Removing credentials");

        let result = sqlx::query("DELETE FROM passwd WHERE name = ?1")
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_set_and_replace_hash() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let creds = db.credentials();

        assert_eq!(creds.password_hash("admin").await.unwrap(), None);

        creds.set_password_hash("admin", b"$2a$10$first").await.unwrap();
        creds.set_password_hash("admin", b"$2a$10$second").await.unwrap();
        creds.set_password_hash("cook", b"$2a$10$other").await.unwrap();

        assert_eq!(
            creds.password_hash("admin").await.unwrap(),
            Some(b"$2a$10$second".to_vec())
        );
        assert_eq!(
            creds.password_hash("cook").await.unwrap(),
            Some(b"$2a$10$other".to_vec())
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let creds = db.credentials();

        creds.set_password_hash("admin", b"hash").await.unwrap();
        assert!(creds.remove("admin").await.unwrap());
        assert!(!creds.remove("admin").await.unwrap());
        assert_eq!(creds.password_hash("admin").await.unwrap(), None);
    }
}
