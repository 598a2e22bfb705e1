use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::claims::{Claims, TokenKind};
use super::dto::{TokenPair, UserData};
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use crate::{
    error::AppError,
    state::AppState,
    users::{dto::PublicUser, repo::UserStore, repo_types::User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Credential checks plus issuing, storing and rotating token pairs.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
    bcrypt_cost: u32,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            JwtKeys::from_ref(state),
            state.config.auth.bcrypt_cost,
        )
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, bcrypt_cost: u32) -> Self {
        Self {
            users,
            keys,
            bcrypt_cost,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Creates the user and logs them in. Duplicate emails fail with `Conflict`.
    pub async fn register(&self, email: &str, password: &str) -> Result<UserData, AppError> {
        let hash = hash_password(password, self.bcrypt_cost)?;
        let user = self.users.create(email, &hash).await?;
        info!(user_id = user.id, email = %user.email, "user registered");
        self.generate_user_data(&user).await
    }

    /// Returns the user when `password` matches, `None` otherwise.
    pub async fn validate_user(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(email = %email, "login unknown email");
            return Ok(None);
        };
        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "login invalid password");
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub fn generate_tokens(&self, user: &User) -> anyhow::Result<TokenPair> {
        self.keys.sign_pair(user)
    }

    /// Issues a new pair and stores its refresh token, replacing any previous one.
    pub async fn generate_user_data(&self, user: &User) -> Result<UserData, AppError> {
        let TokenPair {
            access_token,
            refresh_token,
        } = self.generate_tokens(user)?;
        self.users
            .update_refresh_token(user.id, Some(&refresh_token))
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {} missing while storing refresh token", user.id))?;
        Ok(UserData {
            access_token,
            refresh_token,
            user: PublicUser::from(user),
        })
    }

    /// Clears the stored refresh token. Unknown tokens are a no-op.
    pub async fn logout(&self, refresh_token: &str) -> Result<String, AppError> {
        match self.users.find_by_refresh_token(refresh_token).await? {
            Some(user) => {
                self.users.update_refresh_token(user.id, None).await?;
                info!(user_id = user.id, "user logged out");
            }
            None => debug!("logout with unknown refresh token"),
        }
        Ok(refresh_token.to_string())
    }

    pub fn validate_token(&self, token: &str) -> Option<Claims> {
        match self.keys.verify(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(error = %e, "token rejected");
                None
            }
        }
    }

    /// Rotates the pair when `refresh_token` is valid and is the one currently stored.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<UserData>, AppError> {
        let Some(claims) = self.validate_token(refresh_token) else {
            return Ok(None);
        };
        if claims.kind != TokenKind::Refresh {
            warn!(user_id = claims.id, "refresh attempted with access token");
            return Ok(None);
        }
        let Some(user) = self.users.find_by_refresh_token(refresh_token).await? else {
            warn!(user_id = claims.id, "refresh token is not the stored one");
            return Ok(None);
        };
        if user.id != claims.id {
            warn!(user_id = user.id, claimed = claims.id, "refresh token subject mismatch");
            return Ok(None);
        }
        self.generate_user_data(&user).await.map(Some)
    }
}
