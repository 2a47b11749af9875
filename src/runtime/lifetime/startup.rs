use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{HifzError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::RegisterUserRecord;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

async fn build_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 按配置创建缓存，失败时回退到进程内 moka
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = build_cache(cache_type).await {
        return Ok(cache);
    }
    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = build_cache("moka").await {
            return Ok(cache);
        }
    }
    Err(HifzError::cache_connection(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// 数据库为空时创建默认管理员
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!("Database already has {} user(s), skipping admin seed", count);
            return;
        }
        Ok(_) => info!("No users found in database, creating default admin account..."),
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let record = RegisterUserRecord {
        username: "admin".to_string(),
        email: "admin@localhost.localdomain".to_string(),
        password_hash,
        role: UserRole::Admin,
        display_name: Some("Administrator".to_string()),
        halaqa_id: None,
        gender: None,
        birth_date: None,
        guardian_phone: None,
        institution: None,
        bio: None,
    };

    match storage.register_user(record).await {
        Ok(admin) => info!(
            "Default admin account created (ID: {}, username: {})",
            admin.user.id, admin.user.username
        ),
        Err(e) => warn!("Failed to create admin account: {}", e),
    }
}

/// surah 表与配置中的默认 halaqa
async fn seed_reference_data(storage: &Arc<dyn Storage>) -> Result<()> {
    let surahs = storage.seed_surahs().await?;
    if surahs > 0 {
        info!("Seeded {} surahs", surahs);
    }

    let names = &AppConfig::get().seed.halaqat;
    if !names.is_empty() {
        let created = storage.ensure_halaqat(names).await?;
        debug!("Ensured {} configured halaqat ({} created)", names.len(), created);
    }
    Ok(())
}

/// 准备服务器启动的上下文：存储、初始数据、上传目录和缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_reference_data(&storage).await?;
    seed_admin(&storage).await;

    let upload_dir = &AppConfig::get().upload.dir;
    std::fs::create_dir_all(upload_dir)?;
    debug!("Audio upload directory: {}", upload_dir);

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}
