use crate::error::ApiError;

/// bcrypt work factor.
pub const BCRYPT_COST: u32 = 12;

pub struct PasswordService;

impl PasswordService {
    /// Hashes on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash_password(password: &str) -> Result<String, ApiError> {
        Self::hash_with_cost(password, BCRYPT_COST).await
    }

    pub async fn hash_with_cost(password: &str, cost: u32) -> Result<String, ApiError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch.
    pub async fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .map_err(|e| ApiError::Internal(format!("Password verification task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = PasswordService::hash_with_cost("correct horse", 4).await.unwrap();
        assert!(PasswordService::verify_password("correct horse", &hash).await.unwrap());
        assert!(!PasswordService::verify_password("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_mismatch() {
        assert!(!PasswordService::verify_password("x", "not-a-hash").await.unwrap());
    }
}
