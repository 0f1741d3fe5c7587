use crate::{database::MongoDB, models::{User, UserInfo}};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::options::{Collation, CollationStrength, FindOneOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::ValidateEmail;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub email: String,
    pub iat: usize, // issued at
    pub exp: usize, // expiration
    pub jti: String, // JWT ID
    pub aud: String, // audience
    pub iss: String, // issuer
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: UserInfo,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "wallet-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "wallet-api".to_string())
}

// Tolerated clock drift between token issuer and verifier
const CLOCK_SKEW_SECS: u64 = 60;

// Generate JWT access token (1 hour)
pub fn generate_jwt(user: &User) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(1)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

// Generate refresh token (longer expiry)
pub fn generate_refresh_token(user_id: &str) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(30)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.to_string(),
        username: String::new(),
        email: String::new(),
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate refresh token: {}", e))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);
    validation.leeway = CLOCK_SKEW_SECS;

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

// Case-insensitive equality for username lookups
fn username_collation() -> FindOneOptions {
    FindOneOptions::builder()
        .collation(
            Collation::builder()
                .locale("en")
                .strength(CollationStrength::Secondary)
                .build(),
        )
        .build()
}

pub async fn find_user_by_username(db: &MongoDB, username: &str) -> Result<Option<User>, String> {
    let collection = db.collection::<User>("users");

    collection
        .find_one(doc! { "username": username })
        .with_options(username_collation())
        .await
        .map_err(|e| format!("Database error: {}", e))
}

fn validate_register(request: &RegisterRequest) -> Result<(), String> {
    if request.username.trim().is_empty() {
        return Err("Username cannot be null or empty".to_string());
    }
    if request.email.trim().is_empty() {
        return Err("Email cannot be null or empty".to_string());
    }
    if !request.email.validate_email() {
        return Err(format!("{} is not a valid email", request.email));
    }
    if request.password.trim().is_empty() {
        return Err("Password cannot be null or empty".to_string());
    }
    Ok(())
}

// User registration
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, String> {
    validate_register(request)?;

    let collection = db.collection::<User>("users");

    // Check for existing user ("Alice" and "alice" are the same account)
    if find_user_by_username(db, &request.username).await?.is_some() {
        return Err("Username already exists".to_string());
    }

    if collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .is_some()
    {
        return Err("Email already exists".to_string());
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    let new_user_id = ObjectId::new().to_hex();

    let new_user = User {
        _id: None,
        user_id: new_user_id.clone(),
        username: request.username.clone(),
        email: request.email.clone(),
        password: Some(hashed_password),
        wallet_balance: 0.0,
        version: 0,
        is_active: true,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
        last_login: Some(BsonDateTime::now()),
    };

    collection
        .insert_one(&new_user)
        .await
        .map_err(|e| format!("Failed to create user: {}", e))?;

    let token = generate_jwt(&new_user)?;
    let refresh_token = generate_refresh_token(&new_user_id)?;

    log::info!("✅ User registered successfully: {}", new_user.username);

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo::from(&new_user),
    })
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, String> {
    let user = find_user_by_username(db, &request.username)
        .await?
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let stored_password = user
        .password
        .as_ref()
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let valid = verify(&request.password, stored_password)
        .map_err(|e| format!("Password verification error: {}", e))?;

    if !valid {
        return Err("Invalid credentials".to_string());
    }

    if !user.is_active {
        return Err("Account is inactive".to_string());
    }

    let collection = db.collection::<User>("users");
    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": { "last_login": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo::from(&user),
    })
}

// Refresh token
pub async fn refresh_token(
    db: &MongoDB,
    request: &RefreshTokenRequest,
) -> Result<AuthResponse, String> {
    let claims = verify_token(&request.refresh_token)?;

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": &claims.sub })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    if !user.is_active {
        return Err("Account is inactive".to_string());
    }

    let token = generate_jwt(&user)?;
    let new_refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(new_refresh_token),
        user: UserInfo::from(&user),
    })
}

// Get current user
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserInfo, String> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    Ok(UserInfo::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            _id: None,
            user_id: "64f0aa0000000000000000aa".to_string(),
            username: "testUser".to_string(),
            email: "test@example.com".to_string(),
            password: None,
            wallet_balance: 0.0,
            version: 0,
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let user = sample_user();

        let token = generate_jwt(&user).unwrap();
        assert!(token.starts_with("eyJ")); // Valid JWTs start with 'eyJ'

        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.username, "testUser");
        assert_eq!(claims.email, "test@example.com");
    }

    #[test]
    fn test_verify_garbage_token_fails() {
        assert!(verify_token("invalidToken").is_err());
    }

    #[test]
    fn test_tampered_token_fails() {
        let user = sample_user();
        let mut token = generate_jwt(&user).unwrap();

        // Flip a character in the signature segment
        let last = token.pop().unwrap();
        token.push(if last == 'a' { 'b' } else { 'a' });

        assert!(verify_token(&token).is_err());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let token = generate_refresh_token("some-user-id").unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "some-user-id");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_validate_register_rejects_blank_username() {
        let req = RegisterRequest {
            username: "   ".to_string(),
            email: "a@b.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(validate_register(&req).is_err());
    }

    #[test]
    fn test_validate_register_rejects_bad_email() {
        let req = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        };
        let err = validate_register(&req).unwrap_err();
        assert!(err.contains("not a valid email"));
    }

    #[test]
    fn test_validate_register_rejects_blank_password() {
        let req = RegisterRequest {
            username: "alice".to_string(),
            email: "a@b.com".to_string(),
            password: "".to_string(),
        };
        assert!(validate_register(&req).is_err());
    }

    #[test]
    fn test_validate_register_accepts_valid_request() {
        let req = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter2pass".to_string(),
        };
        assert!(validate_register(&req).is_ok());
    }
}
