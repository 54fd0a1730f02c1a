//! JWT signing for provider credentials.
//!
//! Stream Chat accepts HS256 tokens signed with the application secret.
//! User tokens carry `user_id`; server-side API calls carry `server: true`.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerClaims {
    pub server: bool,
}

/// Signs a user token. No expiry is set; revocation is the provider's job.
pub fn user_token(secret: &str, user_id: &str) -> Result<String> {
    if user_id.is_empty() {
        return Err(ChatError::EmptyUserId);
    }
    let claims = UserClaims {
        user_id: user_id.to_owned(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Signs the token used to authenticate server-side REST calls.
pub fn server_token(secret: &str) -> Result<String> {
    Ok(encode(
        &Header::default(),
        &ServerClaims { server: true },
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation
    }

    #[test]
    fn test_user_token_carries_user_id() {
        let token = user_token("s3cret", "alice").unwrap();
        assert!(!token.is_empty());

        let data = decode::<UserClaims>(
            &token,
            &DecodingKey::from_secret(b"s3cret"),
            &validation(),
        )
        .unwrap();
        assert_eq!(data.claims.user_id, "alice");
        assert_eq!(data.header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_user_token_rejects_wrong_secret() {
        let token = user_token("s3cret", "alice").unwrap();
        let result = decode::<UserClaims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &validation(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_user_token_is_deterministic() {
        assert_eq!(
            user_token("s3cret", "bob").unwrap(),
            user_token("s3cret", "bob").unwrap()
        );
    }

    #[test]
    fn test_empty_user_id_is_rejected() {
        assert!(matches!(user_token("s3cret", ""), Err(ChatError::EmptyUserId)));
    }

    #[test]
    fn test_server_token_claims() {
        let token = server_token("s3cret").unwrap();
        let data = decode::<ServerClaims>(
            &token,
            &DecodingKey::from_secret(b"s3cret"),
            &validation(),
        )
        .unwrap();
        assert!(data.claims.server);
    }
}
