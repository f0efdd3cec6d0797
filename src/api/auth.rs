// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    auth::Identity,
    error::ApiError,
    models::{LoginRequest, LoginResponse, SignupRequest, UserResponse},
    state::IdentityState,
    store::StoreError,
};

const MIN_PASSWORD_LENGTH: usize = 8;
const MIN_NICKNAME_LENGTH: usize = 2;

/// `local@domain` where the local part is `[A-Za-z0-9+_.-]+` and the domain
/// is non-empty.
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
        }
        None => false,
    }
}

fn validate_signup(request: &SignupRequest) -> Result<(), ApiError> {
    if !is_valid_email(&request.email) {
        return Err(ApiError::bad_request("INVALID_EMAIL", "Email address is not valid"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(
            "INVALID_PASSWORD",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if request.nickname.chars().count() < MIN_NICKNAME_LENGTH {
        return Err(ApiError::bad_request(
            "INVALID_NICKNAME",
            format!("Nickname must be at least {MIN_NICKNAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => {
                ApiError::conflict("DUPLICATED_EMAIL", "Email is already registered")
            }
            StoreError::DuplicateNickname => {
                ApiError::conflict("DUPLICATED_NICKNAME", "Nickname is already taken")
            }
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    tag = "Auth",
    responses(
        (status = 200, body = UserResponse),
        (status = 400, description = "Invalid email, password or nickname", body = crate::auth::ErrorBody),
        (status = 409, description = "Email or nickname already in use", body = crate::auth::ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<IdentityState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_signup(&request)?;

    {
        let users = state.users.read().await;
        if users.find_by_email(&request.email).is_some() {
            return Err(StoreError::DuplicateEmail.into());
        }
        if users.find_by_nickname(&request.nickname).is_some() {
            return Err(StoreError::DuplicateNickname.into());
        }
    }

    let password_hash = state.hasher.hash(&request.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal("Could not create account")
    })?;

    let user = state
        .users
        .write()
        .await
        .insert(request.email, request.nickname, password_hash)?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok(Json(UserResponse::from(&user)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Wrong password", body = crate::auth::ErrorBody),
        (status = 404, description = "Unknown email", body = crate::auth::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<IdentityState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .read()
        .await
        .find_by_email(&request.email)
        .cloned()
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User does not exist"))?;

    let matches = state
        .hasher
        .verify(&request.password, &user.password_hash)
        .map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Stored password hash is unusable");
            ApiError::internal("Could not verify credentials")
        })?;
    if !matches {
        tracing::warn!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::unauthorized(
            "INVALID_CREDENTIALS",
            "Email or password does not match",
        ));
    }

    let identity = Identity::new(user.id.to_string())
        .with_email(user.email.clone())
        .with_nickname(user.nickname.clone());
    let token = state
        .issuer
        .issue(&identity, state.clock.now())
        .map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Token issuance failed");
            ApiError::internal("Could not issue token")
        })?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        nickname: user.nickname,
        access_token: token.into_string(),
    }))
}

/// Current user, identified by the header the gateway propagates.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    params(
        ("X-User-Id" = u64, Header, description = "Verified user id set by the gateway")
    ),
    responses(
        (status = 200, body = UserResponse),
        (status = 401, description = "Identity header missing or invalid", body = crate::auth::ErrorBody),
        (status = 404, description = "Unknown user", body = crate::auth::ErrorBody)
    )
)]
pub async fn me(
    State(state): State<IdentityState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id: u64 = headers
        .get(&state.identity_header)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ApiError::unauthorized("UNAUTHORIZED", "Missing or invalid identity header"))?;

    let users = state.users.read().await;
    let user = users
        .find_by_id(user_id)
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User does not exist"))?;
    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Clock, SigningSecret, TokenCodec, TokenIssuer};
    use axum::http::{HeaderValue, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;

    const T: i64 = 1_700_000_000;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn state() -> IdentityState {
        let issuer = TokenIssuer::new(SigningSecret::new("test-secret"), Duration::from_secs(3600));
        IdentityState::new(issuer, axum::http::HeaderName::from_static("x-user-id"))
            .with_clock(Arc::new(FixedClock(T)))
    }

    fn signup_request(email: &str, password: &str, nickname: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            nickname: nickname.to_string(),
        }
    }

    async fn register(state: &IdentityState) -> UserResponse {
        let Json(user) = signup(
            State(state.clone()),
            Json(signup_request("test@example.com", "password123", "testuser")),
        )
        .await
        .expect("signup succeeds");
        user
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.io"));
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("test@"));
        assert!(!is_valid_email("te st@example.com"));
    }

    #[tokio::test]
    async fn signup_success() {
        let state = state();
        let user = register(&state).await;

        assert_eq!(user.id, 1);
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.nickname, "testuser");

        let users = state.users.read().await;
        let stored = users.find_by_id(1).unwrap();
        assert_ne!(stored.password_hash, "password123");
        assert!(state.hasher.verify("password123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn signup_validation_errors() {
        let cases = [
            (signup_request("invalid-email", "password123", "testuser"), "INVALID_EMAIL"),
            (signup_request("test@example.com", "123", "testuser"), "INVALID_PASSWORD"),
            (signup_request("test@example.com", "password123", "a"), "INVALID_NICKNAME"),
        ];
        for (request, code) in cases {
            let err = signup(State(state()), Json(request)).await.unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.code, code);
        }
    }

    #[tokio::test]
    async fn signup_duplicates_conflict() {
        let state = state();
        register(&state).await;

        let err = signup(
            State(state.clone()),
            Json(signup_request("test@example.com", "password123", "other")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "DUPLICATED_EMAIL");

        let err = signup(
            State(state.clone()),
            Json(signup_request("other@example.com", "password123", "testuser")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "DUPLICATED_NICKNAME");
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let state = state();
        register(&state).await;

        let Json(response) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "test@example.com".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await
        .expect("login succeeds");

        assert_eq!(response.id, 1);
        assert_eq!(response.nickname, "testuser");

        let claims: Claims = TokenCodec::new(SigningSecret::new("test-secret"))
            .decode(&response.access_token)
            .unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert_eq!(claims.nickname.as_deref(), Some("testuser"));
        assert_eq!(claims.iat, T);
        assert_eq!(claims.exp, T + 3600);
    }

    #[tokio::test]
    async fn login_unknown_user_is_404() {
        let err = login(
            State(state()),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn login_wrong_password_is_401() {
        let state = state();
        register(&state).await;

        let err = login(
            State(state),
            Json(LoginRequest {
                email: "test@example.com".to_string(),
                password: "wrong-password".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn me_reads_identity_header() {
        let state = state();
        register(&state).await;

        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("1"));
        let Json(user) = me(State(state.clone()), headers).await.expect("me succeeds");
        assert_eq!(user.email, "test@example.com");

        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("42"));
        let err = me(State(state.clone()), headers).await.unwrap_err();
        assert_eq!(err.code, "USER_NOT_FOUND");

        let err = me(State(state), HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "UNAUTHORIZED");
    }
}
