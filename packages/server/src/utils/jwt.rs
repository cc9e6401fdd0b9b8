use anyhow::Result;
use chrono::{Duration, Utc};
use common::UserRole;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Username
    pub uid: i32,       // User ID
    pub role: UserRole, // Role at sign-in time
    pub exp: usize,     // Expiration timestamp
}

/// Sign a new session token for a user.
pub fn sign(
    user_id: i32,
    username: &str,
    role: UserRole,
    ttl_hours: i64,
    secret: &str,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        role,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let token = sign(7, "ada", UserRole::Teacher, 1, "secret").unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.sub, "ada");
        assert_eq!(claims.role, UserRole::Teacher);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign(7, "ada", UserRole::Student, 1, "secret").unwrap();
        assert!(verify(&token, "other").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign(7, "ada", UserRole::Student, -2, "secret").unwrap();
        assert!(verify(&token, "secret").is_err());
    }
}
