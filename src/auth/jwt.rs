//! HS256 bearer tokens.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, TokenService};
use crate::models::{User, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    exp: usize,
}

pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl JwtTokens {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }
}

impl TokenService for JwtTokens {
    fn issue(&self, user: &User) -> Result<String, AuthError> {
        let exp = Utc::now().timestamp() as usize + self.lifetime.as_secs() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        data.claims.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}
