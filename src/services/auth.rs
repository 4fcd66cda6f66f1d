//! Accounts and token authentication.
//!
//! Passwords are stored as argon2id hashes. Successful logins receive a
//! short-lived access token and a longer-lived refresh token, both HS256 JWTs
//! that differ only in `token_type` and lifetime.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{NewUser, User},
};

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against an argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string per RFC 7519
    pub sub: String,
    pub username: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing keys and token lifetimes
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Token subject is not a user id".to_string()))
    }
}

impl AuthKeys {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.jwt_access_ttl_secs,
            config.jwt_refresh_ttl_secs,
        )
    }

    fn sign(&self, user_id: i64, username: &str, token_type: TokenType) -> AppResult<String> {
        let now = chrono::Utc::now().timestamp();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type,
            iat: now,
            exp: now + ttl,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Issues an access and a refresh token for the user
    pub fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access: self.sign(user.id, &user.username, TokenType::Access)?,
            refresh: self.sign(user.id, &user.username, TokenType::Refresh)?,
        })
    }

    /// Decodes a token and checks signature, expiry and type
    pub fn verify(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        if claims.token_type != expected {
            return Err(AppError::Unauthorized(
                "Token has wrong type".to_string(),
            ));
        }
        Ok(claims)
    }

    /// Exchanges a valid refresh token for a new access token
    pub fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;
        self.sign(claims.user_id()?, &claims.username, TokenType::Access)
    }
}

/// Registration form
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl Registration {
    fn validate(&self) -> AppResult<()> {
        let username = self.username.trim();
        if username.is_empty() || username.len() > 150 {
            return Err(AppError::InvalidInput(
                "Username must be between 1 and 150 characters.".to_string(),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            return Err(AppError::InvalidInput(
                "Username may contain only letters, digits and @/./+/-/_ characters.".to_string(),
            ));
        }
        let email = self.email.trim();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(AppError::InvalidInput(
                "Enter a valid email address.".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Password may not be blank.".to_string(),
            ));
        }
        if self.password != self.password2 {
            return Err(AppError::InvalidInput(
                "Password fields didn't match.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validates the form and creates the account
pub async fn register(store: &dyn CatalogStore, form: Registration) -> AppResult<User> {
    form.validate()?;

    let password = form.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = store
        .create_user(NewUser {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password_hash,
        })
        .await?
        .ok_or_else(|| {
            AppError::InvalidInput("A user with that username already exists.".to_string())
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Checks credentials and returns the matching user
pub async fn authenticate(
    store: &dyn CatalogStore,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let invalid = || {
        AppError::Unauthorized("No active account found with the given credentials".to_string())
    };

    let user = store
        .find_user_by_username(username.trim())
        .await?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.clone();
    let password = password.to_string();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if valid {
        Ok(user)
    } else {
        Err(invalid())
    }
}
