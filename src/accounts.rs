//! Registration and login.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::auth::{AuthError, PasswordHasher, TokenService};
use crate::error::{AppError, Result};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User, UserId};
use crate::store::{bounded, StoreError, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    store_timeout: Duration,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            store_timeout,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        if let Some(message) = request.validate() {
            return Err(AppError::InvalidInput(message));
        }
        let email = normalize_email(&request.email);

        if bounded(self.store_timeout, self.users.find_by_email(&email))
            .await?
            .is_some()
        {
            return Err(already_registered());
        }

        let password_hash = self.hash(request.password).await?;
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email,
            password_hash,
            name: request.name.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        match bounded(self.store_timeout, self.users.insert(user.clone())).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration.
            Err(StoreError::Duplicate(_)) => return Err(already_registered()),
            Err(err) => return Err(err.into()),
        }

        info!(user = %user.id, "user registered");
        self.respond(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        if let Some(message) = request.validate() {
            return Err(AppError::InvalidInput(message));
        }

        let user = bounded(
            self.store_timeout,
            self.users.find_by_email(&normalize_email(&request.email)),
        )
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !self.verify(request.password, user.password_hash.clone()).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        info!(user = %user.id, "user logged in");
        self.respond(&user)
    }

    fn respond(&self, user: &User) -> Result<AuthResponse> {
        Ok(AuthResponse {
            token: self.tokens.issue(user)?,
            user: user.profile(),
        })
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))??;
        Ok(hashed)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))??;
        Ok(matched)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn already_registered() -> AppError {
    AppError::InvalidInput("Email already registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{BcryptHasher, JwtTokens};
    use crate::store::MemoryStore;

    fn service() -> (AccountService, Arc<dyn TokenService>) {
        let tokens: Arc<dyn TokenService> =
            Arc::new(JwtTokens::new("test-secret", Duration::from_secs(600)));
        let service = AccountService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(BcryptHasher::new(4)),
            tokens.clone(),
            Duration::from_secs(1),
        );
        (service, tokens)
    }

    fn register(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: "Ana".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_token_for_new_user() {
        let (service, tokens) = service();
        let response = service
            .register(register("ana@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(response.user.email, "ana@example.com");
        assert_eq!(tokens.verify(&response.token).unwrap(), response.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (service, _) = service();
        service
            .register(register("ana@example.com", "secret1"))
            .await
            .unwrap();

        let err = service
            .register(register("ANA@example.com", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Email already registered"));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (service, _) = service();
        assert!(matches!(
            service.register(register("not-an-email", "secret1")).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register(register("ana@example.com", "123")).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let (service, _) = service();
        let registered = service
            .register(register("ana@example.com", "secret1"))
            .await
            .unwrap();

        let ok = service.login(login("ana@example.com", "secret1")).await.unwrap();
        assert_eq!(ok.user, registered.user);

        assert!(matches!(
            service.login(login("ana@example.com", "wrong-pass")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            service.login(login("nobody@example.com", "secret1")).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
