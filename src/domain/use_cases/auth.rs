use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::entities::token::{AuthResponse, Claims};
use crate::entities::user::{LoginUser, NewUser, NewUserResponse, User};
use crate::errors::{AppError, AuthError};
use crate::auth::password::{hash_password, verify_password};
use crate::repositories::{token::TokenServiceRepository, user::UserRepository};

pub struct AuthHandler {
    pub user_repo: Arc<dyn UserRepository>,
    pub token_service: Arc<dyn TokenServiceRepository>,
}

impl AuthHandler {
    pub fn new(user_repo: Arc<dyn UserRepository>, token_service: Arc<dyn TokenServiceRepository>) -> Self {
        AuthHandler {
            user_repo,
            token_service,
        }
    }

    /// Registers the site owner. The first account becomes the admin and
    /// registration closes once any account exists.
    ///
    /// The count check only skips hashing for the common closed case; the
    /// store's conditional insert is what enforces a single owner.
    pub async fn register(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        request.validate()?;

        if self.user_repo.count_users().await? > 0 {
            tracing::warn!(username = %request.username, "Registration attempted after owner account exists");
            return Err(AppError::ForbiddenAccess);
        }

        let hashed_password = hash_password(&request.password)?;
        let user_insert = request.prepare_for_insert(hashed_password, true);

        let Some(id) = self.user_repo.create_owner(&user_insert).await? else {
            tracing::warn!(username = %request.username, "Registration lost to a concurrent owner registration");
            return Err(AppError::ForbiddenAccess);
        };
        tracing::info!(user_id = %id, "Admin account registered");

        Ok(NewUserResponse {
            id,
            message: "User created successfully".to_string(),
        })
    }

    /// Logs in an admin by validating credentials and generating JWTs
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self.user_repo.get_user_by_username(request.username.trim())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "User lookup failed during login");
                AuthError::WrongCredentials
            })?
            .ok_or(AuthError::WrongCredentials)?;

        let is_password_valid = verify_password(&request.password, &user.password_hash)
            .map_err(|_| AuthError::WrongCredentials)?;
        if !is_password_valid || !user.is_admin {
            return Err(AuthError::WrongCredentials);
        }

        let response = self.create_auth_response(&user)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(response)
    }

    pub fn create_auth_response(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let access_token = self.token_service.create_jwt(user)
            .map_err(|e| {
                tracing::warn!("Failed to create JWT: {}", e);
                AuthError::TokenCreation
            })?;

        let refresh_token = self.token_service.create_refresh_jwt(&user.id)
            .map_err(|e| {
                tracing::warn!("Failed to create refresh JWT: {}", e);
                AuthError::TokenCreation
            })?;
        Ok(AuthResponse::new(access_token, refresh_token))
    }

    /// Issues a fresh token pair for the user named by a refresh token
    pub async fn refresh_token(&self, token: &str) -> Result<AuthResponse, AuthError> {
        let decoded = self.token_service.decode_refresh_jwt(token)?;
        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AuthError::InvalidUserId)?;

        let user = self.user_repo.get_user_by_id(&user_id)
            .await
            .map_err(|_| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        self.create_auth_response(&user)
    }

    /// Decodes and validates an access token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.token_service.decode_jwt(token).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::token::{RefreshClaims, TokenType};
    use crate::repositories::{token::MockTokenServiceRepository, user::MockUserRepository};
    use chrono::Utc;
    use jsonwebtoken::{Header, TokenData};

    fn user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "owner".into(),
            password_hash: hash_password("Sup3r-Secret!Pass").unwrap(),
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tokens() -> MockTokenServiceRepository {
        let mut tokens = MockTokenServiceRepository::new();
        tokens.expect_create_jwt().returning(|_| Ok("access".into()));
        tokens.expect_create_refresh_jwt().returning(|_| Ok("refresh".into()));
        tokens
    }

    fn handler(repo: MockUserRepository, tokens: MockTokenServiceRepository) -> AuthHandler {
        AuthHandler::new(Arc::new(repo), Arc::new(tokens))
    }

    fn registration() -> NewUser {
        NewUser {
            username: "owner".into(),
            password: "Sup3r-Secret!Pass".into(),
        }
    }

    #[actix_rt::test]
    async fn first_registration_creates_admin() {
        let mut repo = MockUserRepository::new();
        repo.expect_count_users().returning(|| Ok(0));
        repo.expect_create_owner()
            .withf(|insert| insert.is_admin && insert.password_hash.starts_with("$argon2id$"))
            .times(1)
            .returning(|_| Ok(Some(Uuid::new_v4())));

        let response = handler(repo, tokens()).register(registration()).await.unwrap();
        assert_eq!(response.message, "User created successfully");
    }

    #[actix_rt::test]
    async fn registration_closes_once_owner_exists() {
        let mut repo = MockUserRepository::new();
        repo.expect_count_users().returning(|| Ok(1));
        repo.expect_create_owner().never();

        let result = handler(repo, tokens()).register(registration()).await;
        assert!(matches!(result, Err(AppError::ForbiddenAccess)));
    }

    #[actix_rt::test]
    async fn registration_that_loses_the_insert_is_forbidden() {
        // Both racers saw an empty table; the store accepted only the other one.
        let mut repo = MockUserRepository::new();
        repo.expect_count_users().returning(|| Ok(0));
        repo.expect_create_owner().times(1).returning(|_| Ok(None));

        let result = handler(repo, tokens()).register(registration()).await;
        assert!(matches!(result, Err(AppError::ForbiddenAccess)));
    }

    #[actix_rt::test]
    async fn weak_password_is_a_validation_error() {
        let mut repo = MockUserRepository::new();
        repo.expect_count_users().never();

        let result = handler(repo, tokens())
            .register(NewUser { username: "owner".into(), password: "password".into() })
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[actix_rt::test]
    async fn login_returns_token_pair_for_admin() {
        let admin = user(true);
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username().returning(move |_| Ok(Some(admin.clone())));

        let response = handler(repo, tokens())
            .login(LoginUser { username: "owner".into(), password: "Sup3r-Secret!Pass".into() })
            .await
            .unwrap();
        assert_eq!(response.access_token, "access");
        assert_eq!(response.refresh_token, "refresh");
        assert_eq!(response.token_type, "Bearer");
    }

    #[actix_rt::test]
    async fn login_rejects_wrong_password_and_non_admins() {
        let admin = user(true);
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username().returning(move |_| Ok(Some(admin.clone())));
        let result = handler(repo, tokens())
            .login(LoginUser { username: "owner".into(), password: "nope".into() })
            .await;
        assert!(matches!(result, Err(AuthError::WrongCredentials)));

        let member = user(false);
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username().returning(move |_| Ok(Some(member.clone())));
        let result = handler(repo, tokens())
            .login(LoginUser { username: "owner".into(), password: "Sup3r-Secret!Pass".into() })
            .await;
        assert!(matches!(result, Err(AuthError::WrongCredentials)));
    }

    #[actix_rt::test]
    async fn refresh_reloads_user_from_subject() {
        let admin = user(true);
        let id = admin.id;
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_id().returning(move |_| Ok(Some(admin.clone())));
        let mut tokens = tokens();
        tokens.expect_decode_refresh_jwt().returning(move |_| {
            Ok(TokenData {
                header: Header::default(),
                claims: RefreshClaims { sub: id.to_string(), token_type: TokenType::Refresh, iat: 0, exp: 0 },
            })
        });

        let response = handler(repo, tokens).refresh_token("refresh").await.unwrap();
        assert_eq!(response.access_token, "access");
    }

    #[test]
    fn verify_surfaces_token_errors() {
        let mut tokens = MockTokenServiceRepository::new();
        tokens.expect_decode_jwt().returning(|_| Err(AuthError::TokenExpired));

        let result = handler(MockUserRepository::new(), tokens).verify("stale");
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }
}
