//! Authentication Service
//!
//! Handles account registration, JWT issuance, refresh-token sessions and
//! profile/password management.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::application::dto::request::{RegisterRequest, UpdateProfileRequest};
use crate::config::JwtSettings;
use crate::domain::{Session, SessionRepository, User, UserRepository, UserRole};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Length of each half of an opaque refresh token.
const REFRESH_TOKEN_PART_LEN: usize = 32;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new customer account
    async fn register(&self, request: RegisterRequest) -> Result<(User, AuthTokens), AuthError>;

    /// Authenticate with email and password
    async fn login(&self, email: &str, password: &str) -> Result<(User, AuthTokens), AuthError>;

    /// Exchange a refresh token for a new token pair (the old one stops working)
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;

    /// Revoke the session behind a refresh token
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Current account
    async fn me(&self, user_id: i64) -> Result<User, AuthError>;

    /// Update name and phone
    async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<User, AuthError>;

    /// Change password and revoke every open session
    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Create or promote the configured admin account
    async fn ensure_admin(&self, email: &str, password: &str) -> Result<User, AuthError>;
}

/// Authentication tokens response
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// `admin` or `customer`
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.role)
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailExists,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::SessionNotFound => AppError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::EmailExists => AppError::Conflict(err.to_string()),
            AuthError::WrongPassword => AppError::BadRequest(err.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::Repository(e) => e,
        }
    }
}

/// Decode and validate an access token (HS256).
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Sign an access token for a user.
pub fn issue_access_token(
    user_id: i64,
    role: UserRole,
    settings: &JwtSettings,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: (now + Duration::minutes(settings.access_token_expiry_minutes)).timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
}

/// Emails are compared and stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// AuthService implementation
pub struct AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
}

impl<U, S> AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    /// Create a new AuthServiceImpl
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            id_generator,
            jwt_settings,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Opaque refresh token, carries no user information.
    fn generate_refresh_token() -> String {
        let part = || -> String {
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(REFRESH_TOKEN_PART_LEN)
                .map(char::from)
                .collect()
        };
        format!("{}.{}", part(), part())
    }

    /// Hash refresh token for storage
    fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn refresh_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days)
    }

    fn generate_tokens(&self, user: &User) -> Result<AuthTokens, AuthError> {
        Ok(AuthTokens {
            access_token: issue_access_token(user.id, user.role, &self.jwt_settings)?,
            refresh_token: Self::generate_refresh_token(),
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }

    /// Issue tokens and persist a session for the refresh token.
    async fn start_session(&self, user: &User) -> Result<AuthTokens, AuthError> {
        let tokens = self.generate_tokens(user)?;
        let session = Session::new(
            user.id,
            Self::hash_refresh_token(&tokens.refresh_token),
            self.refresh_expiry(),
        );
        self.session_repo.create(&session).await?;
        Ok(tokens)
    }
}

#[async_trait]
impl<U, S> AuthService for AuthServiceImpl<U, S>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: RegisterRequest) -> Result<(User, AuthTokens), AuthError> {
        let email = normalize_email(&request.email);

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailExists);
        }

        let password_hash = self.hash_password(&request.password)?;
        let now = Utc::now();
        let user = User {
            id: self.id_generator.generate(),
            email,
            password_hash,
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            role: UserRole::Customer,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created_user = self.user_repo.create(&user).await.map_err(|e| match e {
            AppError::Conflict(_) => AuthError::EmailExists,
            other => AuthError::Repository(other),
        })?;

        let tokens = self.start_session(&created_user).await?;
        info!(user_id = created_user.id, "User registered");
        Ok((created_user, tokens))
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<(User, AuthTokens), AuthError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? || !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.start_session(&user).await?;
        Ok((user, tokens))
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let presented_hash = Self::hash_refresh_token(refresh_token);
        let session = self
            .session_repo
            .find_by_token_hash(&presented_hash)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_active() {
            return Err(AuthError::SessionNotFound);
        }

        let user = self
            .user_repo
            .find_by_id(session.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::SessionNotFound)?;

        // Rotation: the presented token is replaced and can no longer be used.
        let tokens = self.generate_tokens(&user)?;
        let rotated = self
            .session_repo
            .rotate(
                session.id,
                &presented_hash,
                &Self::hash_refresh_token(&tokens.refresh_token),
                self.refresh_expiry(),
            )
            .await?;
        if !rotated {
            warn!(session_id = %session.id, "Refresh token already rotated");
            return Err(AuthError::SessionNotFound);
        }

        Ok(tokens)
    }

    #[instrument(skip_all)]
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let session = self
            .session_repo
            .find_by_token_hash(&Self::hash_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        self.session_repo.revoke(session.id).await?;
        Ok(())
    }

    async fn me(&self, user_id: i64) -> Result<User, AuthError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    #[instrument(skip(self, request))]
    async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        let mut user = self.me(user_id).await?;

        if let Some(full_name) = request.full_name {
            user.full_name = full_name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            user.phone = Some(phone).filter(|p| !p.trim().is_empty());
        }

        Ok(self.user_repo.update(&user).await?)
    }

    #[instrument(skip(self, current_password, new_password))]
    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.me(user_id).await?;

        if !self.verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::WrongPassword);
        }

        let hash = self.hash_password(new_password)?;
        self.user_repo.update_password(user.id, &hash).await?;
        let revoked = self.session_repo.revoke_all_for_user(user.id).await?;
        info!(user_id, revoked, "Password changed, sessions revoked");
        Ok(())
    }

    #[instrument(skip(self, password))]
    async fn ensure_admin(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);

        match self.user_repo.find_by_email(&email).await? {
            Some(mut user) => {
                if user.role == UserRole::Admin && user.is_active {
                    return Ok(user);
                }
                user.role = UserRole::Admin;
                user.is_active = true;
                let user = self.user_repo.update(&user).await?;
                info!(user_id = user.id, "Existing account promoted to admin");
                Ok(user)
            }
            None => {
                let now = Utc::now();
                let user = User {
                    id: self.id_generator.generate(),
                    email,
                    password_hash: self.hash_password(password)?,
                    full_name: "Administrator".into(),
                    phone: None,
                    role: UserRole::Admin,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                let user = self.user_repo.create(&user).await?;
                info!(user_id = user.id, "Admin account created");
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockSessionRepository, MockUserRepository};
    use mockall::predicate::*;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-that-is-at-least-32-characters-long".into(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn service(
        users: MockUserRepository,
        sessions: MockSessionRepository,
    ) -> AuthServiceImpl<MockUserRepository, MockSessionRepository> {
        AuthServiceImpl::new(
            Arc::new(users),
            Arc::new(sessions),
            Arc::new(SnowflakeGenerator::new(1, 1)),
            jwt_settings(),
        )
    }

    fn stored_user(password: &str, role: UserRole) -> User {
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
            .unwrap()
            .to_string();
        User {
            id: 42,
            email: "rose@example.com".into(),
            password_hash: hash,
            full_name: "Rose".into(),
            role,
            ..Default::default()
        }
    }

    #[test]
    fn test_access_token_round_trip_carries_role() {
        let settings = jwt_settings();
        let token = issue_access_token(7, UserRole::Admin, &settings).unwrap();
        let claims = decode_access_token(&token, &settings.secret).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.role(), UserRole::Admin);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let token = issue_access_token(7, UserRole::Customer, &jwt_settings()).unwrap();
        let result = decode_access_token(&token, "another-secret-that-is-also-32-characters");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_refresh_tokens_are_opaque_and_unique() {
        type Svc = AuthServiceImpl<MockUserRepository, MockSessionRepository>;
        let a = Svc::generate_refresh_token();
        let b = Svc::generate_refresh_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), REFRESH_TOKEN_PART_LEN * 2 + 1);
        assert_eq!(Svc::hash_refresh_token(&a).len(), 64);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let mut users = MockUserRepository::new();
        users
            .expect_email_exists()
            .with(eq("rose@example.com"))
            .returning(|_| Ok(true));

        let result = service(users, MockSessionRepository::new())
            .register(RegisterRequest {
                email: "Rose@Example.com".into(),
                password: "long-enough".into(),
                full_name: "Rose".into(),
                phone: None,
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_creates_customer_and_session() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().returning(|_| Ok(false));
        users
            .expect_create()
            .withf(|u| u.role == UserRole::Customer && u.email == "new@example.com")
            .returning(|u| Ok(u.clone()));
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .times(1)
            .returning(|s| Ok(s.clone()));

        let (user, tokens) = service(users, sessions)
            .register(RegisterRequest {
                email: " NEW@example.com ".into(),
                password: "long-enough".into(),
                full_name: "  Lily ".into(),
                phone: None,
            })
            .await
            .unwrap();

        assert_eq!(user.full_name, "Lily");
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 15 * 60);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_invalid_credentials() {
        let mut users = MockUserRepository::new();
        let user = stored_user("correct-horse", UserRole::Customer);
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let result = service(users, MockSessionRepository::new())
            .login("rose@example.com", "battery-staple")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_inactive_account_rejected() {
        let mut users = MockUserRepository::new();
        let mut user = stored_user("correct-horse", UserRole::Customer);
        user.is_active = false;
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let result = service(users, MockSessionRepository::new())
            .login("rose@example.com", "correct-horse")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_refresh_with_revoked_session_rejected() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_token_hash().returning(|hash| {
            let mut session = Session::new(42, hash.to_string(), Utc::now() + Duration::days(1));
            session.revoked_at = Some(Utc::now());
            Ok(Some(session))
        });

        let result = service(MockUserRepository::new(), sessions)
            .refresh("whatever")
            .await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_token_hash().returning(|hash| {
            Ok(Some(Session::new(42, hash.to_string(), Utc::now() + Duration::days(1))))
        });
        sessions
            .expect_rotate()
            .times(1)
            .withf(|_, old, new, _| old != new)
            .returning(|_, _, _, _| Ok(true));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(42))
            .returning(|_| Ok(Some(User { id: 42, ..Default::default() })));

        let tokens = service(users, sessions).refresh("old-token").await.unwrap();
        assert_ne!(tokens.refresh_token, "old-token");
    }

    #[tokio::test]
    async fn test_refresh_losing_concurrent_rotation_rejected() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_token_hash().returning(|hash| {
            Ok(Some(Session::new(42, hash.to_string(), Utc::now() + Duration::days(1))))
        });
        sessions
            .expect_rotate()
            .times(1)
            .returning(|_, _, _, _| Ok(false));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|_| Ok(Some(User { id: 42, ..Default::default() })));

        let result = service(users, sessions).refresh("old-token").await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
        assert!(matches!(
            AppError::from(result.unwrap_err()),
            AppError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let mut users = MockUserRepository::new();
        let user = stored_user("correct-horse", UserRole::Customer);
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_update_password().never();

        let result = service(users, MockSessionRepository::new())
            .change_password(42, "wrong", "new-password")
            .await;
        assert!(matches!(result, Err(AuthError::WrongPassword)));
    }

    #[tokio::test]
    async fn test_ensure_admin_promotes_existing_customer() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(User { id: 5, ..Default::default() })));
        users
            .expect_update()
            .withf(|u| u.role == UserRole::Admin)
            .returning(|u| Ok(u.clone()));

        let user = service(users, MockSessionRepository::new())
            .ensure_admin("owner@example.com", "irrelevant")
            .await
            .unwrap();
        assert!(user.is_admin());
    }
}
