use crate::error::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by access tokens from the external auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id (uuid)
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
}

/// Authenticated caller, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// 仅负责校验第三方认证服务签发的令牌，本服务不签发令牌
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    audience: Option<String>,
    #[cfg(test)]
    secret: String,
}

impl JwtService {
    pub fn new(secret: &str, audience: Option<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience,
            #[cfg(test)]
            secret: secret.to_string(),
        }
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.verify_token(token)?;
        let id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        Ok(AuthUser {
            id,
            email: claims.email.map(|e| e.to_lowercase()),
        })
    }

    /// Signs a token the way the auth provider would. Only used by tests.
    #[cfg(test)]
    pub fn issue(&self, user_id: Uuid, email: Option<&str>) -> String {
        use jsonwebtoken::{EncodingKey, Header, encode};

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
            aud: self.audience.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_round_trip() {
        let svc = JwtService::new("secret", None);
        let id = Uuid::new_v4();
        let token = svc.issue(id, Some("Waiter@Example.com"));

        let user = svc.authenticate(&token).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("waiter@example.com"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtService::new("secret", None);
        let verifier = JwtService::new("other", None);
        let token = issuer.issue(Uuid::new_v4(), None);
        assert!(matches!(
            verifier.authenticate(&token),
            Err(AppError::JwtError(_))
        ));
    }

    #[test]
    fn test_audience_is_enforced_when_configured() {
        let issuer = JwtService::new("secret", Some("authenticated".into()));
        let token = issuer.issue(Uuid::new_v4(), None);
        assert!(issuer.authenticate(&token).is_ok());

        let strict = JwtService::new("secret", Some("other".into()));
        assert!(strict.authenticate(&token).is_err());
    }
}
