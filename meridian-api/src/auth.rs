use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AuthConfig;

/// Session resolution is external; all this layer does is verify the bearer
/// token and hand the stable user id to the core as `acting_user_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn authenticate(auth: &AuthConfig, token: &str) -> Result<Uuid, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(e.to_string()))?;

    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::AuthenticationError("subject is not a user id".to_string()))
}

pub fn issue_token(auth: &AuthConfig, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = chrono::Utc::now().timestamp() as usize + auth.expiration as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let auth = config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&auth, user_id).unwrap();
        assert_eq!(authenticate(&auth, &token).unwrap(), user_id);
    }

    #[test]
    fn test_bad_secret_is_rejected() {
        let auth = config();
        let token = issue_token(&auth, Uuid::new_v4()).unwrap();

        let other = AuthConfig {
            secret: "different".to_string(),
            expiration: 3600,
        };
        assert!(matches!(
            authenticate(&other, &token),
            Err(AppError::AuthenticationError(_))
        ));
    }
}
