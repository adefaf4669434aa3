use crate::config::StorefrontSettings;
use crate::database::users::{self, NewUser};
use crate::database::Database;
use crate::errors::{is_unique_violation, CheckoutEngineError, Result};
use crate::models::{LoginRequest, RegisterRequest, UserProfile, UserRole};
use crate::notifications::{self, NotificationPublisher};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

pub struct AccountService {
    db: Arc<Database>,
    notifier: Option<Arc<NotificationPublisher>>,
    settings: StorefrontSettings,
}

impl AccountService {
    pub fn new(
        db: Arc<Database>,
        notifier: Option<Arc<NotificationPublisher>>,
        settings: StorefrontSettings,
    ) -> Self {
        AccountService {
            db,
            notifier,
            settings,
        }
    }

    /// Create an account funded with the welcome balance.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        request
            .validate()
            .map_err(|e| CheckoutEngineError::Validation(e.to_string()))?;

        let email = normalize_email(&request.email);
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CheckoutEngineError::Internal(format!("hashing task failed: {}", e)))??;

        let address = request
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let new_user = NewUser {
            email: &email,
            password_hash: &password_hash,
            name: request.name.trim(),
            address,
            role: UserRole::User,
            opening_balance: self.settings.welcome_balance,
        };

        let user = match users::insert(self.db.pool(), &new_user).await {
            Ok(user) => user,
            Err(CheckoutEngineError::Database(ref e)) if is_unique_violation(e) => {
                return Err(CheckoutEngineError::EmailTaken(email));
            }
            Err(e) => return Err(e),
        };

        let profile = UserProfile::from(&user);
        info!(user_id = %profile.id, "user registered");

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier
                .publish_email(&notifications::welcome_email(&profile))
                .await
            {
                error!("Failed to publish welcome email: {}", e);
            }
        }

        Ok(profile)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<UserProfile> {
        let email = normalize_email(&request.email);
        let user = users::find_by_email(self.db.pool(), &email)
            .await?
            .ok_or(CheckoutEngineError::InvalidCredentials)?;

        let stored = user.password_hash.clone();
        let password = request.password;
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| CheckoutEngineError::Internal(format!("hashing task failed: {}", e)))?;

        if !verified {
            return Err(CheckoutEngineError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(UserProfile::from(&user))
    }
}

/// Emails are matched case-sensitively, exactly as stored.
fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Argon2id PHC string with a random 16-byte salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CheckoutEngineError::Internal(format!("salt encoding failed: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CheckoutEngineError::Internal(format!("password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// False for a wrong password and for a stored value that is not a PHC string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
