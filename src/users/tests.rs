//! Tests for users module
//!
//! These tests verify the federated user model:
//! - Construction from a Google profile
//! - Profile refresh keeps the provider id

#[cfg(test)]
mod tests {
    use super::super::store::insert_error;
    use super::super::*;
    use crate::services::google::GoogleUserInfo;
    use sqlx::error::{DatabaseError, ErrorKind};

    fn profile(id: &str, name: &str) -> GoogleUserInfo {
        GoogleUserInfo {
            id: id.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            verified_email: true,
            name: name.to_string(),
            picture: format!("https://example.com/{}.png", name.to_lowercase()),
            locale: "en".to_string(),
        }
    }

    #[test]
    fn test_from_profile_copies_every_field() {
        let user = FederatedUser::from_profile(&profile("google-1", "Ada"));

        assert_eq!(user.google_id, "google-1");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.verified_email);
        assert_eq!(user.name, "Ada");
        assert_eq!(user.picture, "https://example.com/ada.png");
        assert_eq!(user.locale, "en");
    }

    #[test]
    fn test_apply_profile_preserves_google_id() {
        let mut user = FederatedUser::from_profile(&profile("google-1", "Ada"));

        let mut newer = profile("some-other-id", "Grace");
        newer.verified_email = false;
        newer.locale = "fr".to_string();
        user.apply_profile(&newer);

        assert_eq!(user.google_id, "google-1");
        assert_eq!(user.name, "Grace");
        assert_eq!(user.email, "grace@example.com");
        assert!(!user.verified_email);
        assert_eq!(user.locale, "fr");
    }

    #[test]
    fn test_store_error_messages() {
        assert_eq!(
            StoreError::Conflict("g-1".to_string()).to_string(),
            "user g-1 already exists"
        );
        assert_eq!(
            StoreError::NotFound("g-1".to_string()).to_string(),
            "user g-1 not found"
        );
    }

    /// Database error with a fixed kind, as the Postgres driver reports it
    #[derive(Debug, thiserror::Error)]
    #[error("duplicate key value violates unique constraint \"google_users_pkey\"")]
    struct PgDbError {
        unique: bool,
    }

    impl DatabaseError for PgDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    #[test]
    fn test_insert_unique_violation_is_conflict() {
        let err = sqlx::Error::Database(Box::new(PgDbError { unique: true }));

        match insert_error(err, "google-1") {
            StoreError::Conflict(id) => assert_eq!(id, "google-1"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_other_errors_stay_database_errors() {
        let err = sqlx::Error::Database(Box::new(PgDbError { unique: false }));
        assert!(matches!(
            insert_error(err, "google-1"),
            StoreError::Database(_)
        ));

        assert!(matches!(
            insert_error(sqlx::Error::PoolTimedOut, "google-1"),
            StoreError::Database(_)
        ));
    }
}
