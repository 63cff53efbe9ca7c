//! Password hashing, bearer tokens and at-rest encryption of broker secrets.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const PBKDF2_ROUNDS: u32 = 20_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Hash a password as `pbkdf2$<rounds>$<salt hex>$<hash hex>`
pub fn hash_password(plain: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let hash = derive(plain, &salt, PBKDF2_ROUNDS);
    format!("pbkdf2${}${}${}", PBKDF2_ROUNDS, hex::encode(salt), hex::encode(hash))
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 || parts[0] != "pbkdf2" {
        return false;
    }
    let Ok(rounds) = parts[1].parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(parts[2]), hex::decode(parts[3])) else {
        return false;
    };
    if rounds == 0 || expected.len() != HASH_LEN {
        return false;
    }
    let actual = derive(plain, &salt, rounds);
    constant_time_eq(&actual, &expected)
}

fn derive(plain: &str, salt: &[u8], rounds: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(plain.as_bytes(), salt, rounds, &mut out);
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Payload carried by a bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub exp: i64,
}

/// Issues and verifies HMAC-SHA256 signed bearer tokens.
///
/// Token layout: `base64url(json claims) "." base64url(signature)`.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub fn issue(&self, user_id: i64, role: &str, now: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            exp: (now + self.ttl).timestamp(),
        };
        let json = serde_json::to_vec(&claims).map_err(|e| AppError::Crypto(e.to_string()))?;
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(json);
        let signature = general_purpose::URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?);
        Ok(format!("{}.{}", payload, signature))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> AppResult<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AppError::unauthorized("malformed token"))?;
        let signature = general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::unauthorized("malformed token"))?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AppError::unauthorized("invalid token signature"))?;

        let json = general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AppError::unauthorized("malformed token"))?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| AppError::unauthorized("malformed token"))?;
        if claims.exp <= now.timestamp() {
            return Err(AppError::unauthorized("token expired"));
        }
        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> AppResult<Vec<u8>> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> AppResult<HmacSha256> {
        <HmacSha256 as Mac>::new_from_slice(&self.secret).map_err(|e| AppError::Crypto(e.to_string()))
    }
}

/// AES-256-GCM sealing for broker API secrets.
/// The key is the SHA-256 digest of the configured key material.
#[derive(Clone)]
pub struct SecretBox {
    cipher: Aes256Gcm,
}

impl SecretBox {
    pub fn new(key_material: &str) -> Self {
        let key = Sha256::digest(key_material.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Returns base64(nonce || ciphertext)
    pub fn seal(&self, plain: &str) -> AppResult<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plain.as_bytes())
            .map_err(|e| AppError::Crypto(e.to_string()))?;
        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> AppResult<String> {
        let bytes = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|e| AppError::Crypto(e.to_string()))?;
        if bytes.len() <= NONCE_LEN {
            return Err(AppError::Crypto("sealed secret too short".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AppError::Crypto(e.to_string()))?;
        String::from_utf8(plain).map_err(|e| AppError::Crypto(e.to_string()))
    }
}

/// Mask a string, showing only first and last N characters
pub fn mask(s: &str, visible_chars: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= visible_chars * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..visible_chars].iter().collect();
    let tail: String = chars[chars.len() - visible_chars..].iter().collect();
    format!("{}...{}", head, tail)
}

pub const MASKED_SECRET: &str = "********";
const SECRET_VISIBLE_CHARS: usize = 2;

/// Mask a broker secret; short secrets are hidden entirely
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() < SECRET_VISIBLE_CHARS * 4 {
        return MASKED_SECRET.to_string();
    }
    mask(secret, SECRET_VISIBLE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let stored = hash_password("correct horse battery");
        assert!(stored.starts_with("pbkdf2$20000$"));
        assert!(verify_password("correct horse battery", &stored));
        assert!(!verify_password("wrong horse battery", &stored));
    }

    #[test]
    fn test_password_hash_is_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "pbkdf2$abc$00$00"));
        assert!(!verify_password("x", "bcrypt$10$aa$bb"));
        assert!(!verify_password("x", "pbkdf2$0$00$00"));
    }

    #[test]
    fn test_token_issue_and_verify() {
        let signer = TokenSigner::new("top-secret", 24);
        let now = Utc::now();
        let token = signer.issue(42, "admin", now).unwrap();
        let claims = signer.verify(&token, now).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_token_expires() {
        let signer = TokenSigner::new("top-secret", 1);
        let now = Utc::now();
        let token = signer.issue(7, "user", now).unwrap();
        let later = now + Duration::hours(2);
        assert!(matches!(signer.verify(&token, later), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_rejects_other_secret_and_tampering() {
        let now = Utc::now();
        let token = TokenSigner::new("secret-a", 24).issue(1, "user", now).unwrap();
        assert!(TokenSigner::new("secret-b", 24).verify(&token, now).is_err());

        let signer = TokenSigner::new("secret-a", 24);
        let forged_claims = Claims { sub: 1, role: "admin".to_string(), exp: now.timestamp() + 3600 };
        let forged_payload =
            general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", forged_payload, signature);
        assert!(signer.verify(&forged, now).is_err());
        assert!(signer.verify("not-a-token", now).is_err());
    }

    #[test]
    fn test_secret_box_roundtrip() {
        let secret_box = SecretBox::new("encryption-key");
        let sealed = secret_box.seal("broker-secret-123").unwrap();
        assert!(!sealed.contains("broker-secret-123"));
        assert_eq!(secret_box.open(&sealed).unwrap(), "broker-secret-123");
        assert!(SecretBox::new("other-key").open(&sealed).is_err());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("ABCDEFGHIJKL", 4), "ABCD...IJKL");
        assert_eq!(mask("short", 4), "*****");
    }

    #[test]
    fn test_mask_secret_hides_short_secrets() {
        assert_eq!(mask_secret("abcde"), MASKED_SECRET);
        assert_eq!(mask_secret("abcdefg"), MASKED_SECRET);
        assert_eq!(mask_secret("abcdefgh"), "ab...gh");
        assert_eq!(mask_secret("s3cr3t-value"), "s3...ue");
    }
}
