//! Password hashing and token issuance

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shopfront_common::{Error, Result, Role, User};

const TOKEN_TTL_HOURS: i64 = 12;

/// Signs login tokens and checks passwords
#[derive(Clone)]
pub struct AuthService {
    secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Hash a password with bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| Error::Auth(e.to_string()))
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash).map_err(|e| Error::Auth(e.to_string()))
    }

    /// Issue a signed login token for a user
    pub fn create_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| Error::Auth(e.to_string()))
    }

    /// Verify and decode a login token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| Error::Auth(e.to_string()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_common::{new_id, Provider};

    fn sample_user() -> User {
        User {
            id: new_id(),
            email: "admin@example.com".into(),
            password_hash: String::new(),
            role: Role::Admin,
            provider: Provider::Email,
            first_name: "Admin".into(),
            last_name: "User".into(),
        }
    }

    #[test]
    fn test_password_hashing() {
        let auth = AuthService::new("secret".into());
        let hash = auth.hash_password("P@ssw0rd!").unwrap();
        assert!(auth.verify_password("P@ssw0rd!", &hash).unwrap());
        assert!(!auth.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let auth = AuthService::new("secret".into());
        let user = sample_user();
        let token = auth.create_token(&user).unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);

        let other = AuthService::new("different-secret".into());
        assert!(other.verify_token(&token).is_err());
    }
}
