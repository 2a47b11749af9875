//! 输入格式校验，返回可直接展示给用户的错误消息

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::quran::JUZ_COUNT;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

// 可带国际区号，允许空格与连字符分隔
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 -]{6,18}[0-9]$").expect("Invalid phone regex"));

const COMMON_PASSWORDS: [&str; 10] = [
    "password",
    "password1",
    "12345678",
    "123456789",
    "qwerty123",
    "admin123",
    "iloveyou",
    "abcd1234",
    "bismillah",
    "11111111",
];

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err("用户名长度必须在 3 到 32 个字符之间");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("用户名只能包含字母、数字以及 _ . @ + -");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("邮箱格式不正确");
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), &'static str> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err("显示名称不能为空");
    }
    if len > 64 {
        return Err("显示名称不能超过 64 个字符");
    }
    Ok(())
}

pub fn validate_guardian_phone(phone: &str) -> Result<(), &'static str> {
    if !PHONE_RE.is_match(phone.trim()) {
        return Err("监护人电话格式不正确");
    }
    Ok(())
}

/// halaqa 名称非空且不超过 100 个字符
pub fn validate_halaqa_name(name: &str) -> Result<(), &'static str> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err("halaqa 名称不能为空");
    }
    if len > 100 {
        return Err("halaqa 名称不能超过 100 个字符");
    }
    Ok(())
}

/// juz 范围：各端点在 1..=30 内，同时给出时要求 from <= to
pub fn validate_juz_range(from: Option<i32>, to: Option<i32>) -> Result<(), &'static str> {
    let in_bounds = |v: i32| (1..=JUZ_COUNT).contains(&v);
    if from.is_some_and(|v| !in_bounds(v)) || to.is_some_and(|v| !in_bounds(v)) {
        return Err("juz 必须在 1 到 30 之间");
    }
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err("juz_from 不能大于 juz_to"),
        _ => Ok(()),
    }
}

/// 密码策略
///
/// - 至少 8 个字符
/// - 不能全是数字
/// - 不能是常见密码
/// - 不能与用户名过于相似
pub fn validate_password(password: &str, username: &str) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("密码至少需要 8 个字符");
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("密码不能全部为数字");
    }

    if COMMON_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("密码过于常见");
    }

    let lowered = password.to_lowercase();
    let user = username.to_lowercase();
    if !user.is_empty() && (lowered.contains(&user) || user.contains(&lowered)) {
        errors.push("密码与用户名过于相似");
    }

    errors
}

/// 校验密码，多条错误以分号拼接
pub fn validate_password_simple(password: &str, username: &str) -> Result<(), String> {
    let errors = validate_password(password, username);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(validate_username("abdullah").is_ok());
        assert!(validate_username("a.b@c").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("student@halaqa.org").is_ok());
        assert!(validate_email("no-at-sign.org").is_err());
    }

    #[test]
    fn test_guardian_phone() {
        assert!(validate_guardian_phone("+966 50 123 4567").is_ok());
        assert!(validate_guardian_phone("0501234567").is_ok());
        assert!(validate_guardian_phone("12ab").is_err());
        assert!(validate_guardian_phone("").is_err());
    }

    #[test]
    fn test_juz_range() {
        assert!(validate_juz_range(Some(4), Some(6)).is_ok());
        assert!(validate_juz_range(None, None).is_ok());
        assert!(validate_juz_range(Some(30), None).is_ok());
        assert!(validate_juz_range(Some(6), Some(4)).is_err());
        assert!(validate_juz_range(Some(0), Some(4)).is_err());
        assert!(validate_juz_range(None, Some(31)).is_err());
    }

    #[test]
    fn test_password_ok() {
        assert!(validate_password("Tarteel-2024", "yusuf").is_empty());
        assert!(validate_password_simple("quiet river stone", "yusuf").is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("short", "yusuf").contains(&"密码至少需要 8 个字符"));
        assert!(validate_password("1234567890", "yusuf").contains(&"密码不能全部为数字"));
        assert!(validate_password("Password1", "yusuf").contains(&"密码过于常见"));
        assert!(validate_password("yusuf2024x", "yusuf").contains(&"密码与用户名过于相似"));
    }

    #[test]
    fn test_password_simple_joins_errors() {
        let err = validate_password_simple("123", "yusuf").unwrap_err();
        assert!(err.contains("; "));
    }
}
