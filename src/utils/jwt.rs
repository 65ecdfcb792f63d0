//! Bearer tokens for the booking API.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};

/// Claims carry exactly what the request path needs: `sub` for
/// ownership-scoped booking/payment lookups and `role` for the route-group
/// gates. Anything else belongs in the database, not the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(account: &user::Model, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: account.id,
        role: account.role.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traveller() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "rider@example.com".to_string(),
            password_hash: "unused".to_string(),
            name: "Rider".to_string(),
            role: UserRole::Traveller,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_issued_token_round_trips_identity_and_role() {
        let account = traveller();
        let token = issue_token(&account, "test-secret", 24).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();

        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.role, UserRole::Traveller);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = issue_token(&traveller(), "test-secret", 24).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
