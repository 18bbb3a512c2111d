use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::infrastructure::jwt::JwtService;

// Well-formed argon2id hash that matches no password. Verified on lookup
// misses so that a miss costs roughly the same as a wrong password.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c3RhdGljLWxvZ2luLXNhbHQ$R5n0uY0PqWZbX1s8a0mL7cD2eF4gH6iJ8kL0mN2oP4Q";

#[derive(Debug, Clone)]
pub(crate) struct AuthResult {
    pub(crate) user: User,
    pub(crate) token: String,
}

pub(crate) struct AuthService<R: UserRepository> {
    repo: R,
    jwt: JwtService,
}

impl<R: UserRepository> AuthService<R> {
    pub(crate) fn new(repo: R, jwt: JwtService) -> Self {
        Self { repo, jwt }
    }

    pub(crate) async fn register(&self, req: RegisterRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;
        let password_hash = hash_password(&req.password)?;

        let user = self
            .repo
            .create_user(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
            })
            .await?;

        self.session_for(user)
    }

    pub(crate) async fn login(&self, req: LoginRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let Some(creds) = self.repo.find_by_username(&req.username).await? else {
            let _ = verify_password(&req.password, DUMMY_PASSWORD_HASH);
            return Err(DomainError::InvalidCredentials);
        };

        verify_password(&req.password, &creds.password_hash)?;
        self.session_for(creds.user)
    }

    fn session_for(&self, user: User) -> Result<AuthResult, DomainError> {
        let token = self
            .jwt
            .issue(user.id)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        Ok(AuthResult { user, token })
    }
}

pub(crate) fn hash_password(raw: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(raw: &str, stored_hash: &str) -> Result<(), DomainError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;

    hasher()?
        .verify_password(raw.as_bytes(), &parsed)
        .map_err(|err| match err {
            PasswordHashError::Password => DomainError::InvalidCredentials,
            other => DomainError::Unexpected(other.to_string()),
        })
}

fn hasher() -> Result<Argon2<'static>, DomainError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::{AuthService, hash_password, verify_password};
    use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::user::{LoginRequest, RegisterRequest, User};
    use crate::infrastructure::jwt::JwtService;

    #[derive(Clone)]
    struct FakeUserRepo {
        created_input: Arc<Mutex<Option<NewUser>>>,
        stored_credentials: Arc<Mutex<Option<UserCredentials>>>,
    }

    impl FakeUserRepo {
        fn new() -> Self {
            Self {
                created_input: Arc::new(Mutex::new(None)),
                stored_credentials: Arc::new(Mutex::new(None)),
            }
        }

        fn store_credentials(&self, creds: UserCredentials) {
            *self
                .stored_credentials
                .lock()
                .expect("stored_credentials mutex poisoned") = Some(creds);
        }
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
            *self
                .created_input
                .lock()
                .expect("created_input mutex poisoned") = Some(input);
            Ok(sample_user(1))
        }

        async fn find_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<UserCredentials>, DomainError> {
            Ok(self
                .stored_credentials
                .lock()
                .expect("stored_credentials mutex poisoned")
                .clone())
        }
    }

    fn sample_user(id: i64) -> User {
        User::new(id, "valid_user", "valid@example.com", Utc::now())
            .expect("sample user must be valid")
    }

    fn service(repo: FakeUserRepo) -> AuthService<FakeUserRepo> {
        AuthService::new(repo, JwtService::new("0123456789abcdef0123456789abcdef", 3600))
    }

    #[tokio::test]
    async fn register_normalizes_input_and_stores_a_hash() {
        let repo = FakeUserRepo::new();
        let service = service(repo.clone());

        let result = service
            .register(RegisterRequest {
                username: "  valid_user  ".to_string(),
                email: "  VALID@EXAMPLE.COM  ".to_string(),
                password: "very-secure-password".to_string(),
            })
            .await
            .expect("register must succeed");

        assert!(!result.token.is_empty());

        let created = repo
            .created_input
            .lock()
            .expect("created_input mutex poisoned")
            .clone()
            .expect("create_user must be called");
        assert_eq!(created.username, "valid_user");
        assert_eq!(created.email, "valid@example.com");
        assert_ne!(created.password_hash, "very-secure-password");
        assert!(verify_password("very-secure-password", &created.password_hash).is_ok());
    }

    #[tokio::test]
    async fn login_rejects_unknown_user_with_invalid_credentials() {
        let service = service(FakeUserRepo::new());

        let err = service
            .login(LoginRequest {
                username: "ghost".to_string(),
                password: "some-password".to_string(),
            })
            .await
            .expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_with_invalid_credentials() {
        let repo = FakeUserRepo::new();
        repo.store_credentials(UserCredentials {
            user: sample_user(1),
            password_hash: hash_password("correct-password").expect("hash must be created"),
        });
        let service = service(repo);

        let err = service
            .login(LoginRequest {
                username: "valid_user".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_issues_a_token_for_valid_credentials() {
        let repo = FakeUserRepo::new();
        repo.store_credentials(UserCredentials {
            user: sample_user(1),
            password_hash: hash_password("correct-password").expect("hash must be created"),
        });
        let service = service(repo);

        let result = service
            .login(LoginRequest {
                username: "valid_user".to_string(),
                password: "correct-password".to_string(),
            })
            .await
            .expect("login must succeed");

        assert_eq!(result.user.id, 1);
        assert!(!result.token.is_empty());
    }
}
