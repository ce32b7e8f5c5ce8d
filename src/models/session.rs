use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The kind of principal a session token represents.
///
/// Serialized as a lowercase tag; an unknown tag fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Student,
}

/// The payload carried inside a signed session token.
///
/// Immutable once built: a change of any field means minting a new token.
/// Field order here is the canonical serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    profile_id: String,
    role: SessionRole,
    classroom_id: Option<String>,
    institution_id: Option<String>,
    /// Epoch milliseconds.
    issued_at: i64,
}

impl SessionRecord {
    /// Builds a student session record.
    ///
    /// # Arguments
    ///
    /// * `profile_id` - The subject of the session. Must not be empty.
    /// * `classroom_id` - The student's classroom, if any.
    /// * `institution_id` - The student's institution, if any.
    /// * `issued_at` - Creation time in epoch milliseconds.
    pub fn student(
        profile_id: impl Into<String>,
        classroom_id: Option<String>,
        institution_id: Option<String>,
        issued_at: i64,
    ) -> Result<Self, SessionError> {
        let profile_id = profile_id.into();
        if profile_id.is_empty() {
            return Err(SessionError::EmptyProfileId);
        }

        Ok(Self {
            profile_id,
            role: SessionRole::Student,
            classroom_id,
            institution_id,
            issued_at,
        })
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn classroom_id(&self) -> Option<&str> {
        self.classroom_id.as_deref()
    }

    pub fn institution_id(&self) -> Option<&str> {
        self.institution_id.as_deref()
    }

    /// Creation time in epoch milliseconds.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// Whether a deserialized record satisfies the construction invariants.
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.profile_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_id_is_rejected() {
        let result = SessionRecord::student("", None, None, 0);
        assert!(matches!(result, Err(SessionError::EmptyProfileId)));
    }

    #[test]
    fn test_student_record_fields() {
        let record =
            SessionRecord::student("u1", Some("c1".to_string()), None, 1000).unwrap();

        assert_eq!(record.profile_id(), "u1");
        assert_eq!(record.role(), SessionRole::Student);
        assert_eq!(record.classroom_id(), Some("c1"));
        assert_eq!(record.institution_id(), None);
        assert_eq!(record.issued_at(), 1000);
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let record = SessionRecord::student("u1", None, None, 5).unwrap();
        let json = sonic_rs::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"profile_id":"u1","role":"student","classroom_id":null,"institution_id":null,"issued_at":5}"#
        );
    }
}
