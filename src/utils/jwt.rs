use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// refresh token 所在的 cookie 名
pub const REFRESH_COOKIE: &str = "hifz_refresh";

/// refresh cookie 只随认证接口发送
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

/// token 用途
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户 ID
    pub role: UserRole,
    pub kind: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    fn new(user_id: i64, role: UserRole, kind: TokenKind, ttl: chrono::Duration) -> Self {
        let now = chrono::Utc::now();
        Self {
            sub: user_id.to_string(),
            role,
            kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        }
    }

    /// 解析 sub 中的用户 ID
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| JwtError::from(ErrorKind::InvalidSubject))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn sign(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// 校验签名和过期时间，并要求 token 用途一致
fn verify(token: &str, kind: TokenKind, secret: &str) -> Result<Claims, JwtError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;

    if claims.kind != kind {
        return Err(JwtError::from(ErrorKind::InvalidToken));
    }
    Ok(claims)
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    /// access token 有效期（秒），用于登录响应的 expires_in
    pub fn access_token_ttl_secs() -> i64 {
        AppConfig::get().jwt.access_token_expiry * 60
    }

    pub fn generate_access_token(user_id: i64, role: UserRole) -> Result<String, JwtError> {
        let ttl = chrono::Duration::minutes(AppConfig::get().jwt.access_token_expiry);
        sign(
            &Claims::new(user_id, role, TokenKind::Access, ttl),
            Self::secret(),
        )
    }

    /// 生成 access + refresh token，refresh 有效期未指定时取配置默认值
    pub fn generate_token_pair(
        user_id: i64,
        role: UserRole,
        refresh_ttl: Option<chrono::Duration>,
    ) -> Result<TokenPair, JwtError> {
        let refresh_ttl = refresh_ttl
            .unwrap_or_else(|| chrono::Duration::days(AppConfig::get().jwt.refresh_token_expiry));

        Ok(TokenPair {
            access_token: Self::generate_access_token(user_id, role)?,
            refresh_token: sign(
                &Claims::new(user_id, role, TokenKind::Refresh, refresh_ttl),
                Self::secret(),
            )?,
        })
    }

    pub fn verify_access_token(token: &str) -> Result<Claims, JwtError> {
        verify(token, TokenKind::Access, Self::secret())
    }

    pub fn verify_refresh_token(token: &str) -> Result<Claims, JwtError> {
        verify(token, TokenKind::Refresh, Self::secret())
    }

    /// 用 refresh token 换发新的 access token
    pub fn refresh_access_token(refresh_token: &str) -> Result<String, JwtError> {
        let claims = Self::verify_refresh_token(refresh_token)?;
        Self::generate_access_token(claims.user_id()?, claims.role)
    }

    /// refresh token cookie，max_age 与 token 有效期一致
    pub fn create_refresh_token_cookie(
        refresh_token: &str,
        ttl: chrono::Duration,
    ) -> Cookie<'static> {
        Self::cookie(
            refresh_token.to_string(),
            actix_web::cookie::time::Duration::seconds(ttl.num_seconds()),
        )
    }

    /// 注销时下发的过期 cookie
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        Self::cookie(String::new(), actix_web::cookie::time::Duration::ZERO)
    }

    fn cookie(value: String, max_age: actix_web::cookie::time::Duration) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE, value)
            .path(REFRESH_COOKIE_PATH)
            .max_age(max_age)
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_sign_and_verify() {
        let claims = Claims::new(
            42,
            UserRole::Teacher,
            TokenKind::Access,
            chrono::Duration::minutes(5),
        );
        let token = sign(&claims, SECRET).unwrap();

        let decoded = verify(&token, TokenKind::Access, SECRET).unwrap();
        assert_eq!(decoded.user_id().unwrap(), 42);
        assert_eq!(decoded.role, UserRole::Teacher);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let claims = Claims::new(
            1,
            UserRole::Student,
            TokenKind::Refresh,
            chrono::Duration::days(1),
        );
        let token = sign(&claims, SECRET).unwrap();

        // refresh token 不能当作 access token 使用
        assert!(verify(&token, TokenKind::Access, SECRET).is_err());
        assert!(verify(&token, TokenKind::Refresh, SECRET).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(
            1,
            UserRole::Admin,
            TokenKind::Access,
            chrono::Duration::minutes(5),
        );
        let token = sign(&claims, SECRET).unwrap();
        assert!(verify(&token, TokenKind::Access, "other").is_err());
    }

    #[test]
    fn test_expired_rejected() {
        let claims = Claims::new(
            1,
            UserRole::Student,
            TokenKind::Access,
            chrono::Duration::minutes(-10),
        );
        let token = sign(&claims, SECRET).unwrap();
        assert!(verify(&token, TokenKind::Access, SECRET).is_err());
    }
}
