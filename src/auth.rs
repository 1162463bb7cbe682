use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Checks credentials minted by the external auth service. Signature
/// and expiry only; issuance lives elsewhere.
#[derive(Clone)]
pub struct Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Verifier {
    pub fn from_secret(secret: &str) -> Verifier {
        Verifier {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| AppError::Unauthorized("invalid token"))?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized("invalid token"))
    }
}

/// The authenticated caller, pulled out of the bearer header on every
/// REST route.
pub struct AuthUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthUser
where
    Verifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<AuthUser, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized("missing bearer token"))?;
        Ok(AuthUser(Verifier::from_ref(state).verify(token)?))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    fn token(secret: &str, sub: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_owned(),
            exp: exp as usize,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp() + 3600
    }

    #[test]
    fn valid_token_binds_the_user() {
        let user_id = Uuid::now_v7();
        let verifier = Verifier::from_secret("sshhh");
        let bound = verifier
            .verify(&token("sshhh", &user_id.to_string(), in_an_hour()))
            .unwrap();
        assert_eq!(bound, user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = Verifier::from_secret("sshhh");
        let err = verifier
            .verify(&token("wrong", &Uuid::now_v7().to_string(), in_an_hour()))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = Verifier::from_secret("sshhh");
        let expired = time::OffsetDateTime::now_utc().unix_timestamp() - 3600;
        let err = verifier
            .verify(&token("sshhh", &Uuid::now_v7().to_string(), expired))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let verifier = Verifier::from_secret("sshhh");
        let err = verifier
            .verify(&token("sshhh", "not-a-user", in_an_hour()))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
