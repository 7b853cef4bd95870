// auth — password hashing and bearer-token signing.
//
// Both concerns are delegated to off-the-shelf crates: argon2id for password
// storage, HS256 JWTs (jsonwebtoken) for session tokens. The rest of the
// daemon never touches key material directly — it goes through `TokenKeys`.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Hash a password with argon2id and a fresh random salt.
/// The returned PHC string embeds salt and parameters.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
/// A malformed stored hash counts as a failed verification, not an error.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Return the JWT signing secret for this install.
///
/// On first call, generates a random 64-character hex secret and writes it to
/// `{data_dir}/jwt_secret` with user-only read/write permissions (mode 0600
/// on Unix). On subsequent calls, reads and returns the existing secret.
///
/// The secret file must be kept private — anyone holding it can mint valid
/// bearer tokens for any user.
pub fn get_or_create_secret(data_dir: &Path) -> Result<String> {
    let path = data_dir.join("jwt_secret");

    if path.exists() {
        let secret = std::fs::read_to_string(&path)?.trim().to_string();
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    // Two UUID v4s, hex without dashes = 64 chars
    let secret = format!(
        "{}{}",
        Uuid::new_v4().to_string().replace('-', ""),
        Uuid::new_v4().to_string().replace('-', "")
    );

    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&path, &secret)?;

    // Restrict to owner read/write only on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(secret)
}

/// Claims carried by every issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id of the authenticated caller.
    pub sub: i64,
    pub name: String,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// HS256 signing/verification keys plus token lifetime.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issue a token for `user_id` expiring `ttl_secs` from now.
    pub fn issue(&self, user_id: i64, name: &str) -> Result<String> {
        let exp = chrono::Utc::now().timestamp() + self.ttl_secs as i64;
        let claims = Claims {
            sub: user_id,
            name: name.to_string(),
            exp,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify a token and return the caller's user id.
    /// Returns `None` for malformed, mis-signed, or expired tokens.
    pub fn verify(&self, token: &str) -> Option<i64> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .ok()
            .map(|data| data.claims.sub)
    }
}
