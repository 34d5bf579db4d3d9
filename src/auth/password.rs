use bcrypt::{hash, verify};

use super::AuthError;

/// Well-formed hash of no real password. Login verifies against it when the
/// email is unknown so both failures cost one bcrypt round.
pub const UNKNOWN_ACCOUNT_HASH: &str = "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p82ldGxad68LJZdL17lhWy";

/// Hash on the blocking pool; bcrypt is CPU bound.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost).map_err(|e| AuthError::PasswordHash(e.to_string())))
        .await
        .map_err(|e| AuthError::PasswordHash(format!("Task join error: {}", e)))?
}

pub async fn verify_password(password: &str, hashed: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || verify(password, &hashed).map_err(|e| AuthError::PasswordHash(e.to_string())))
        .await
        .map_err(|e| AuthError::PasswordHash(format!("Task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("correct horse", 4).await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).await.unwrap());
        assert!(!verify_password("wrong horse", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_account_hash_is_usable_and_never_matches() {
        assert!(!verify_password("", UNKNOWN_ACCOUNT_HASH).await.unwrap());
        assert!(!verify_password("long-enough", UNKNOWN_ACCOUNT_HASH).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(verify_password("x", "not-a-bcrypt-hash").await.is_err());
    }
}
