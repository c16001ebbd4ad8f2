use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password::{hash_password, verify_dummy, verify_password},
        repo::DuplicateEmail,
        repo_types::User,
    },
    error::ApiError,
    notify::{self, Notification},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(email: &str, password: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validates, hashes and stores a new account, then schedules the welcome mail.
///
/// Every insert failure is reported as a duplicate email, matching the
/// public contract. The real cause only reaches the log.
pub async fn register(state: &AppState, req: RegisterRequest) -> Result<User, ApiError> {
    let email = normalize_email(&req.email);
    validate_registration(&email, &req.password)?;

    let hash = hash_password(&req.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal("Failed to hash password".into())
    })?;

    let user = match state.users.create(&email, &hash).await {
        Ok(u) => u,
        Err(e) => {
            if e.is::<DuplicateEmail>() {
                warn!(%email, "email already registered");
            } else {
                error!(error = %e, %email, "create user failed; reported as duplicate email");
            }
            return Err(ApiError::Conflict("Email already exists".into()));
        }
    };

    notify::dispatch(state.notifier.clone(), Notification::welcome(&user.email));
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials and issues a session token.
///
/// Unknown email, wrong password and unreadable digests all collapse into
/// `InvalidCredentials` so the response never reveals which accounts exist.
/// Accounts that cannot be loaded still pay for one argon2 verify.
pub async fn login(
    state: &AppState,
    req: LoginRequest,
) -> Result<(User, String, OffsetDateTime), ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required".into()));
    }

    let user = match state.users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            verify_dummy(&req.password);
            warn!(%email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            verify_dummy(&req.password);
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::InvalidCredentials);
        }
    };

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(%email, user_id = user.id, "login invalid password");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "verify_password failed");
            return Err(ApiError::InvalidCredentials);
        }
    }

    let (token, expires_at) = state.jwt.issue(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal("Failed to generate token".into())
    })?;

    notify::dispatch(state.notifier.clone(), Notification::login(&user.email));
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((user, token, expires_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no-at.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration("a@b.com", "secret1").is_ok());
        assert!(matches!(
            validate_registration("a@b.com", "12345"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_registration("nope", "secret1"),
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn register_stores_digest_not_plaintext() {
        let state = AppState::in_memory();
        let user = register(&state, register_req("a@b.com", "secret1")).await.unwrap();
        assert_eq!(user.email, "a@b.com");
        assert_ne!(user.password_hash, "secret1");
        assert!(verify_password("secret1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let state = AppState::in_memory();
        register(&state, register_req("a@b.com", "secret1")).await.unwrap();
        let err = register(&state, register_req(" A@B.com", "another1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "Email already exists"));
    }

    #[test]
    fn duplicate_detection_is_typed() {
        assert!(anyhow::Error::new(DuplicateEmail).is::<DuplicateEmail>());
        let text_only = anyhow::anyhow!("duplicate key value violates unique constraint");
        assert!(!text_only.is::<DuplicateEmail>());
    }

    #[tokio::test]
    async fn login_issues_token_for_the_user() {
        let state = AppState::in_memory();
        let user = register(&state, register_req("a@b.com", "secret1")).await.unwrap();
        let (logged_in, token, _) = login(&state, login_req("a@b.com", "secret1")).await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(state.jwt.validate(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let state = AppState::in_memory();
        register(&state, register_req("a@b.com", "secret1")).await.unwrap();

        let wrong = login(&state, login_req("a@b.com", "wrong")).await.unwrap_err();
        let unknown = login(&state, login_req("nobody@b.com", "secret1")).await.unwrap_err();
        assert!(matches!(wrong, ApiError::InvalidCredentials));
        assert!(matches!(unknown, ApiError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let state = AppState::in_memory();
        let err = login(&state, login_req("", "")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
