use actix_web::{dev::Payload, error, Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{err, ok, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub mod middleware;

/// Claims minted by the identity provider. `sub` is the account id and
/// `admin` carries the role used by the review gateway.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub admin: bool,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub account_id: i32,
    pub is_admin: bool,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Claims are placed in extensions by the auth middleware.
        match req.extensions().get::<Claims>() {
            Some(claims) => match claims.sub.parse::<i32>() {
                Ok(account_id) => ok(AuthenticatedUser {
                    account_id,
                    is_admin: claims.admin,
                }),
                Err(_) => err(error::ErrorUnauthorized("Invalid subject claim")),
            },
            None => err(error::ErrorUnauthorized("User not authenticated")),
        }
    }
}

/// Extractor form of the admin role check: any handler taking an
/// `AdminUser` is unreachable without the admin claim.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub account_id: i32,
}

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) if claims.admin => match claims.sub.parse::<i32>() {
                Ok(account_id) => ok(AdminUser { account_id }),
                Err(_) => err(error::ErrorUnauthorized("Invalid subject claim")),
            },
            Some(_) => err(error::ErrorForbidden("Admin role required")),
            None => err(error::ErrorUnauthorized("User not authenticated")),
        }
    }
}

pub fn create_token(
    account_id: i32,
    admin: bool,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, Error> {
    let now = Utc::now();
    let exp = (now + Duration::seconds(expiration_seconds as i64)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = Claims {
        sub: account_id.to_string(),
        admin,
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| error::ErrorInternalServerError(format!("Token creation error: {}", e)))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            error::ErrorUnauthorized("Token expired")
        }
        _ => error::ErrorUnauthorized("Invalid token"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_with_role() {
        let token = create_token(42, true, "test-secret", 3600).unwrap();
        let claims = validate_token(&token, "test-secret").unwrap();

        assert_eq!(claims.sub, "42");
        assert!(claims.admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(42, false, "test-secret", 3600).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }
}
