use anyhow::Result;

use footfall_core::event::UserRole;

use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Role recorded for `user_id`, or `None` when the user has no profile.
    ///
    /// An unrecognised role string is treated as a plain user.
    pub async fn user_role(&self, user_id: &str) -> Result<Option<UserRole>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT role FROM user_profiles WHERE user_id = ?1")?;
        let mut rows = stmt.query(duckdb::params![user_id])?;
        match rows.next()? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(raw.parse().unwrap_or(UserRole::User)))
            }
            None => Ok(None),
        }
    }

    /// Create or update the profile for `user_id` with `role`.
    ///
    /// Used at startup to promote configured administrators and by test
    /// fixtures. Safe to call repeatedly.
    pub async fn upsert_user_role(&self, user_id: &str, role: UserRole) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO user_profiles (user_id, role, created_at, updated_at)
               VALUES (?1, ?2, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
               ON CONFLICT (user_id) DO UPDATE SET
                   role = EXCLUDED.role,
                   updated_at = CURRENT_TIMESTAMP"#,
            duckdb::params![user_id, role.as_str()],
        )?;
        tracing::info!(user_id, role = role.as_str(), "User role set");
        Ok(())
    }
}
