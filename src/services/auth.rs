use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, Result};
use crate::models::{Role, User, UserProfile};
use crate::repository::EventRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::hours(config.expires_in_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AppError::internal)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn EventRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(repo: Arc<dyn EventRepository>, tokens: TokenService) -> Self {
        Self { repo, tokens }
    }

    /// Unknown user and wrong password get the same answer.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let invalid = || AppError::Unauthorized("Invalid username or password".to_string());
        let username = username.trim().to_lowercase();

        let Some(user) = self.repo.find_user_by_username(&username).await? else {
            warn!("Login attempt for unknown user {}", username);
            return Err(invalid());
        };

        if !verify_password(password, &user.password_hash).await? {
            warn!("Wrong password for {}", username);
            return Err(invalid());
        }

        let token = self.tokens.issue(&user)?;
        info!("User {} ({}) logged in", user.username, user.role);
        Ok(LoginResponse {
            user: user.profile(),
            token,
        })
    }

    /// Resolves a bearer token to the account it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.tokens.verify(token)?;
        self.repo
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
    }
}

// bcrypt is CPU-bound, keep it off the async workers
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}
