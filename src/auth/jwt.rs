use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Tokens are good for 24 hours; verification is stateless.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

#[derive(Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn issue(secret: &str, user_id: &str) -> Result<String> {
    issue_at(secret, user_id, chrono::Utc::now().timestamp())
}

fn issue_at(secret: &str, user_id: &str, now: i64) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + TOKEN_TTL_SECS) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Returns the embedded user id, or an error for a bad signature or an
/// expired token.
pub fn verify(secret: &str, token: &str) -> Result<String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::{issue, issue_at, verify, TOKEN_TTL_SECS};

    #[test]
    fn fresh_token_round_trips() {
        let token = issue("secret", "user-42").unwrap();
        assert_eq!(verify("secret", &token).unwrap(), "user-42");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("secret", "user-42").unwrap();
        assert!(verify("other-secret", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = chrono::Utc::now().timestamp() - 2 * TOKEN_TTL_SECS;
        let token = issue_at("secret", "user-42", issued).unwrap();
        assert!(verify("secret", &token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify("secret", "not-a-jwt").is_err());
    }
}
