//! 用户密码存储
//! Argon2id 哈希与口令策略校验

use crate::error::AppError;
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use validator::ValidationError;

/// Password hasher backed by Argon2id
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher with the default Argon2id parameters (m=19MiB, t=2, p=1)
    pub fn new() -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::DEFAULT);

        Self { argon2 }
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::Internal(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Check a password against a stored hash
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed_hash) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(e) => {
                tracing::debug!("Failed to parse password hash: {:?}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// 口令策略：至少一个大写、一个小写、一个数字和一个符号
pub fn validate_password_policy(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(ValidationError::new("password_policy").with_message(
            "Password must contain an uppercase letter, a lowercase letter, a digit and a symbol."
                .into(),
        ))
    }
}

/// 用户名策略：仅字母数字，且至少包含一个大写、一个小写和一个数字
pub fn validate_username_policy(username: &str) -> Result<(), ValidationError> {
    let alphanumeric = username.chars().all(|c| c.is_ascii_alphanumeric());
    let has_upper = username.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = username.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = username.chars().any(|c| c.is_ascii_digit());

    if alphanumeric && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("username_policy").with_message(
            "Username must be alphanumeric with an uppercase letter, a lowercase letter and a digit."
                .into(),
        ))
    }
}
