use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};

use postdeck_db::Storage;
use postdeck_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use postdeck_types::models::{NewUser, User, UserRole};

use crate::internal_error;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub storage: Arc<dyn Storage>,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Validate input
    if !req.email.contains('@') || req.email.len() > 254 {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.name.trim().is_empty() || req.name.len() > 100 {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Check if the email is taken
    if state
        .storage
        .get_user_by_email(&req.email)
        .await
        .map_err(internal_error)?
        .is_some()
    {
        return Err(StatusCode::CONFLICT);
    }

    let password_hash = hash_password(&req.password)?;

    let user = state
        .storage
        .create_user(NewUser {
            email: req.email,
            name: req.name,
            password_hash,
            avatar_url: None,
            external_id: None,
            role: UserRole::TeamMember,
        })
        .await
        .map_err(internal_error)?;

    let token = create_token(&state.jwt_secret, &user)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = state
        .storage
        .get_user_by_email(&req.email)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    verify_password(&req.password, &user.password_hash)?;

    let token = create_token(&state.jwt_secret, &user)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        token,
    }))
}

pub(crate) fn hash_password(password: &str) -> Result<String, StatusCode> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Bad hash on record is a server problem; a mismatch is the caller's.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> Result<(), StatusCode> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

fn create_token(secret: &str, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};
    use axum::http::StatusCode;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2hunter2", &hash).is_ok());
        assert_eq!(
            verify_password("wrong-password", &hash),
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
    }
}
