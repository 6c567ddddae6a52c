use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use sha2::{Digest, Sha256};
use sqlx::Row;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app::users::user_from_row;
use crate::domain::user::User;
use crate::infra::db::Db;

const TOKEN_ISSUER: &str = "blogicum";
const TOKEN_TYPE: &str = "session";

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Validated registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    session_key: [u8; 32],
    session_ttl_minutes: u64,
}

impl AuthService {
    pub fn new(db: Db, session_key: [u8; 32], session_ttl_minutes: u64) -> Self {
        Self {
            db,
            session_key,
            session_ttl_minutes,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<User> {
        let password_hash = hash_password(&registration.password)?;
        let row = sqlx::query(
            "INSERT INTO users (username, email, first_name, last_name, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, username, email, first_name, last_name, date_joined",
        )
        .bind(registration.username)
        .bind(registration.email)
        .bind(registration.first_name)
        .bind(registration.last_name)
        .bind(password_hash)
        .fetch_one(self.db.pool())
        .await?;

        Ok(user_from_row(&row))
    }

    /// Checks the credentials and opens a session. `None` on a bad username or password.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<SessionToken>> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let user_id: i64 = row.get("id");
        let password_hash: String = row.get("password_hash");
        if password_hash.is_empty() {
            return Ok(None);
        }

        if !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        let token = self.start_session(user_id).await?;
        Ok(Some(token))
    }

    pub async fn start_session(&self, user_id: i64) -> Result<SessionToken> {
        let session_id = Uuid::new_v4();
        let (token, expires_at) = self.issue_token(user_id, session_id)?;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(self.db.pool())
        .await?;

        Ok(SessionToken { token, expires_at })
    }

    /// Resolves a cookie token to its user, provided the session is neither
    /// expired nor revoked.
    pub async fn authenticate(&self, token: &str) -> Result<Option<AuthSession>> {
        let Some((user_id, session_id)) = self.decode_token(token)? else {
            return Ok(None);
        };

        let row = sqlx::query(
            "SELECT u.id, u.username \
             FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.id = $1 \
               AND s.user_id = $2 \
               AND s.token_hash = $3 \
               AND s.revoked_at IS NULL \
               AND s.expires_at > now()",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(hash_token(token))
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| AuthSession {
            user_id: row.get("id"),
            username: row.get("username"),
        }))
    }

    pub async fn end_session(&self, token: &str) -> Result<bool> {
        let Some((user_id, session_id)) = self.decode_token(token)? else {
            return Ok(false);
        };

        let result = sqlx::query(
            "UPDATE sessions \
             SET revoked_at = now() \
             WHERE id = $1 AND user_id = $2 AND token_hash = $3 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(hash_token(token))
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn issue_token(&self, user_id: i64, session_id: Uuid) -> Result<(String, OffsetDateTime)> {
        let ttl = Duration::minutes(i64::try_from(self.session_ttl_minutes)?);
        let mut claims = Claims::new_expires_in(&std::time::Duration::try_from(ttl)?)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&user_id.to_string())?;
        claims.token_identifier(&session_id.to_string())?;
        claims.add_additional("typ", TOKEN_TYPE)?;

        let key = SymmetricKey::<V4>::from(&self.session_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        let expires_at = OffsetDateTime::now_utc() + ttl;
        Ok((token, expires_at))
    }

    /// Decrypts and validates the token, returning `(user_id, session_id)`.
    /// Tampered, expired or foreign tokens yield `None`.
    fn decode_token(&self, token: &str) -> Result<Option<(i64, Uuid)>> {
        let key = SymmetricKey::<V4>::from(&self.session_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let Some(claims) = trusted.payload_claims() else {
            return Ok(None);
        };
        if !has_token_type(claims, TOKEN_TYPE) {
            return Ok(None);
        }

        let user_id = claim_str(claims, "sub")?
            .parse::<i64>()
            .map_err(|err| anyhow!("invalid sub claim: {}", err))?;
        let session_id = Uuid::parse_str(claim_str(claims, "jti")?)?;
        Ok(Some((user_id, session_id)))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

fn claim_str<'a>(claims: &'a Claims, name: &str) -> Result<&'a str> {
    claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))
}

fn has_token_type(claims: &Claims, expected: &str) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected)
        .unwrap_or(false)
}
