use std::collections::HashMap;
use std::sync::Arc;

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::profile::StudentProfile,
};

/// Where student profiles are looked up at sign-in.
#[derive(Clone)]
pub enum ProfileDirectory {
    /// Profiles read from the `student_profiles` table.
    Postgres(Pool),
    /// Profiles held in memory, keyed by lowercase username.
    Memory(Arc<HashMap<String, StudentProfile>>),
}

impl ProfileDirectory {
    /// Builds an in-memory directory from a list of profiles.
    pub fn in_memory(profiles: impl IntoIterator<Item = StudentProfile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|profile| (profile.username.to_lowercase(), profile))
            .collect();
        Self::Memory(Arc::new(map))
    }

    /// Finds an active profile by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<StudentProfile>> {
        match self {
            Self::Postgres(pool) => find_active_by_username(pool, username).await,
            Self::Memory(profiles) => Ok(profiles.get(&username.to_lowercase()).cloned()),
        }
    }
}

/// A helper function to map a `tokio_postgres::Row` to a `StudentProfile`.
fn row_to_profile(row: &Row) -> Result<StudentProfile> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|_| AppError::MissingData("id".to_string()))?;
    let classroom_id: Option<Uuid> = row
        .try_get("classroom_id")
        .map_err(|_| AppError::MissingData("classroom_id".to_string()))?;
    let institution_id: Option<Uuid> = row
        .try_get("institution_id")
        .map_err(|_| AppError::MissingData("institution_id".to_string()))?;

    Ok(StudentProfile {
        profile_id: id.to_string(),
        username: row
            .try_get("username")
            .map_err(|_| AppError::MissingData("username".to_string()))?,
        pin_hash: row
            .try_get("pin_hash")
            .map_err(|_| AppError::MissingData("pin_hash".to_string()))?,
        classroom_id: classroom_id.map(|id| id.to_string()),
        institution_id: institution_id.map(|id| id.to_string()),
    })
}

async fn find_active_by_username(pool: &Pool, username: &str) -> Result<Option<StudentProfile>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, username, pin_hash, classroom_id, institution_id
            FROM student_profiles
            WHERE lower(username) = lower($1) AND is_active = true
            "#,
            &[&username],
        )
        .await?;
    row.map(|r| row_to_profile(&r)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str) -> StudentProfile {
        StudentProfile {
            profile_id: format!("{username}-id"),
            username: username.to_string(),
            pin_hash: "$argon2id$placeholder".to_string(),
            classroom_id: Some("c1".to_string()),
            institution_id: None,
        }
    }

    #[tokio::test]
    async fn test_memory_lookup_is_case_insensitive() {
        let directory = ProfileDirectory::in_memory([profile("Ada_L"), profile("grace")]);

        let found = directory.find_by_username("ada_l").await.unwrap().unwrap();
        assert_eq!(found.profile_id, "Ada_L-id");

        let found = directory.find_by_username("GRACE").await.unwrap().unwrap();
        assert_eq!(found.username, "grace");
    }

    #[tokio::test]
    async fn test_memory_lookup_missing_user() {
        let directory = ProfileDirectory::in_memory([profile("grace")]);

        assert!(directory.find_by_username("alan").await.unwrap().is_none());
    }
}
