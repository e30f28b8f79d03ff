use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    auth::{Claims, RefreshClaims},
    profile::{Location, Profile},
    user::{LoginResponse, RefreshToken, RegisterRequest, Role, SessionUser, User},
};
use crate::services::email::EmailService;

pub struct AuthService;

impl AuthService {
    /// Create user + profile + default role in one transaction, so a login
    /// can never find a user without a profile.
    pub async fn register(pool: &PgPool, req: &RegisterRequest) -> anyhow::Result<SessionUser> {
        let email = req.email.trim().to_lowercase();
        let firstname = req.firstname.trim();
        let lastname = req.lastname.trim();
        if email.is_empty()
            || req.password.is_empty()
            || firstname.is_empty()
            || lastname.is_empty()
            || req.location.trim().is_empty()
        {
            anyhow::bail!("Bitte alle Felder ausfüllen!");
        }
        let location: Location = req.location.parse()?;

        let password_hash = bcrypt::hash(&req.password, 12)?;

        let mut tx = pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            anyhow::bail!("Diese Email ist bereits registriert");
        }

        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO profiles (user_id, firstname, lastname, location) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(firstname)
        .bind(lastname)
        .bind(location.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, 'user')")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SessionUser {
            id: user_id,
            email,
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            location,
            role: Role::User,
        })
    }

    /// Validate credentials and issue a JWT pair. A user row without a
    /// profile is a broken account and fails the login outright.
    pub async fn login(
        pool: &PgPool,
        email: &str,
        password: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> anyhow::Result<LoginResponse> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Ungültige Anmeldedaten"))?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|_| anyhow::anyhow!("Ungültige Anmeldedaten"))?;
        if !valid {
            anyhow::bail!("Ungültige Anmeldedaten");
        }

        let session = Self::session_user(pool, user.id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("Profil fehlt oder Fehler beim Laden. Bitte neu registrieren oder Admin informieren.")
            })?;

        let access_token = Self::generate_access_token(user.id, session.role, jwt_secret, access_ttl)?;
        let (refresh_token, refresh_id) =
            Self::generate_refresh_token(&user.id, refresh_secret, refresh_ttl_days)?;

        let hash = bcrypt::hash(&refresh_token, 8)?;
        let expires_at = Utc::now() + chrono::Duration::days(refresh_ttl_days as i64);
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(refresh_id)
        .bind(user.id)
        .bind(hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: session,
        })
    }

    /// Identity + profile + role for one user. None when the profile row is
    /// missing. A failed or missing role lookup counts as plain "user".
    pub async fn session_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<SessionUser>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        let Some(user) = user else {
            return Ok(None);
        };

        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, firstname, lastname, location, created_at
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        let Some(profile) = profile else {
            return Ok(None);
        };
        let location: Location = profile.location.parse()?;

        let role = Self::role_of(pool, user_id).await;

        Ok(Some(SessionUser {
            id: user.id,
            email: user.email,
            firstname: profile.firstname,
            lastname: profile.lastname,
            location,
            role,
        }))
    }

    /// Role lookup fails closed: any error or missing row means "user".
    pub async fn role_of(pool: &PgPool, user_id: Uuid) -> Role {
        sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .ok()
            .flatten()
            .and_then(|r| r.parse().ok())
            .unwrap_or(Role::User)
    }

    pub async fn profile_of(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Profile> {
        sqlx::query_as::<_, Profile>(
            "SELECT user_id, firstname, lastname, location, created_at
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!("Profil fehlt oder Fehler beim Laden. Bitte neu registrieren oder Admin informieren.")
        })
    }

    pub fn generate_access_token(
        user_id: Uuid,
        role: Role,
        secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn generate_refresh_token(
        user_id: &Uuid,
        secret: &str,
        ttl_days: u64,
    ) -> anyhow::Result<(String, Uuid)> {
        let now = Utc::now().timestamp() as usize;
        let jti = Uuid::new_v4();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: jti.to_string(),
            iat: now,
            exp: now + (ttl_days * 86400) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok((token, jti))
    }

    /// Rotate refresh token: revoke old, issue new pair.
    pub async fn refresh(
        pool: &PgPool,
        refresh_token_str: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> anyhow::Result<LoginResponse> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let key = DecodingKey::from_secret(refresh_secret.as_bytes());
        let data = decode::<RefreshClaims>(
            refresh_token_str,
            &key,
            &Validation::new(Algorithm::HS256),
        )?;
        let rc = data.claims;
        let jti: Uuid = rc.jti.parse()?;
        let user_id: Uuid = rc.sub.parse()?;

        let stored: RefreshToken = sqlx::query_as(
            "SELECT id, user_id, token_hash, expires_at, revoked, created_at
             FROM refresh_tokens WHERE id = $1 AND revoked = FALSE",
        )
        .bind(jti)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Refresh-Token unbekannt oder widerrufen"))?;

        if stored.expires_at < Utc::now() {
            anyhow::bail!("Refresh-Token abgelaufen");
        }
        if !bcrypt::verify(refresh_token_str, &stored.token_hash)? {
            anyhow::bail!("Refresh-Token ungültig");
        }

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(jti)
            .execute(pool)
            .await?;

        let session = Self::session_user(pool, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Benutzer nicht gefunden"))?;

        let access_token = Self::generate_access_token(user_id, session.role, jwt_secret, access_ttl)?;
        let (new_refresh, new_jti) =
            Self::generate_refresh_token(&user_id, refresh_secret, refresh_ttl_days)?;

        let hash = bcrypt::hash(&new_refresh, 8)?;
        let expires_at = Utc::now() + chrono::Duration::days(refresh_ttl_days as i64);
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(new_jti)
        .bind(user_id)
        .bind(hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token: new_refresh,
            user: session,
        })
    }

    /// Revoke a refresh token (logout).
    pub async fn logout(
        pool: &PgPool,
        refresh_token_str: &str,
        refresh_secret: &str,
    ) -> anyhow::Result<()> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let key = DecodingKey::from_secret(refresh_secret.as_bytes());
        let data = decode::<RefreshClaims>(
            refresh_token_str,
            &key,
            &Validation::new(Algorithm::HS256),
        )?;
        let jti: Uuid = data.claims.jti.parse()?;

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(jti)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store a one-time reset token and mail the reset link. Whether the
    /// email exists is not revealed to the caller.
    pub async fn forgot_password(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        email: &str,
        base_url: &str,
    ) -> anyhow::Result<()> {
        let email_svc = email_svc
            .ok_or_else(|| anyhow::anyhow!("E-Mail-Versand ist nicht konfiguriert"))?;

        let user_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;
        let Some(user_id) = user_id else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        use rand::Rng;
        let token: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let expires_at = Utc::now() + chrono::Duration::hours(1);

        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token, expires_at)
             VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(expires_at)
        .execute(pool)
        .await?;

        let reset_url = format!("{base_url}/reset-password?token={token}");
        email_svc.send_password_reset(email, &reset_url).await?;
        Ok(())
    }

    /// Consume a reset token, set the new password, revoke all sessions.
    pub async fn reset_password(
        pool: &PgPool,
        token: &str,
        new_password: &str,
    ) -> anyhow::Result<()> {
        if new_password.is_empty() {
            anyhow::bail!("Bitte ein neues Passwort angeben");
        }

        let row: Option<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT id, user_id FROM password_reset_tokens
             WHERE token = $1 AND used = FALSE AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;
        let (token_id, user_id) =
            row.ok_or_else(|| anyhow::anyhow!("Link ungültig oder abgelaufen"))?;

        let password_hash = bcrypt::hash(new_password, 12)?;

        let mut tx = pool.begin().await?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = $1")
            .bind(token_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
