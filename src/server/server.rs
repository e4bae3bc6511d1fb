use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{BlacklistBackend, Settings, StorageBackend};
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::try_new(JwtConfig {
            issuer: settings.jwt.issuer.clone(),
            access_ttl: chrono::Duration::seconds(i64::try_from(settings.jwt.access_ttl_secs)?),
            refresh_ttl: chrono::Duration::seconds(i64::try_from(
                settings.jwt.refresh_ttl_secs,
            )?),
            signing_key: settings.jwt.secret.clone().into_bytes(),
        })?);
        let crypto: Arc<dyn RefreshTokenCrypto> =
            Arc::new(AesGcmRefreshTokenCrypto::try_new(&settings.jwt.secret)?);

        let needs_mysql = settings.storage.backend == StorageBackend::Mysql
            || settings.blacklist.backend == BlacklistBackend::Mysql;
        let pool = if needs_mysql {
            let dsn = settings
                .storage
                .mysql_dsn
                .as_deref()
                .ok_or_else(|| anyhow!("storage.mysql_dsn is not set"))?;
            Some(Pool::<MySql>::connect(dsn).await?)
        } else {
            None
        };
        let mysql_pool = || {
            pool.clone()
                .ok_or_else(|| anyhow!("mysql pool was not initialised"))
        };

        let identity_repo: Arc<dyn IdentityTokenRepo> = match settings.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryIdentityTokenRepo::new()),
            StorageBackend::Mysql => Arc::new(MySqlIdentityTokenRepo::new(mysql_pool()?)),
        };

        let blacklist_store: Arc<dyn BlacklistStore> = match settings.blacklist.backend {
            BlacklistBackend::Memory => Arc::new(MemoryBlacklistStore::new()),
            BlacklistBackend::Mysql => Arc::new(MySqlBlacklistStore::new(mysql_pool()?)),
            BlacklistBackend::Redis => {
                let dsn = settings
                    .blacklist
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("blacklist.redis_dsn is not set"))?;
                let redis_manager = redis::Client::open(dsn)?
                    .get_connection_manager()
                    .await?;
                Arc::new(RedisBlacklistStore::new(
                    redis_manager,
                    settings.blacklist.redis_prefix.clone(),
                ))
            }
        };

        let blacklist = Arc::new(TokenBlacklist::new(
            blacklist_store.clone(),
            token_codec.clone(),
        ));
        let revocation: Arc<dyn RevocationService> = Arc::new(RealRevocationService::new(
            identity_repo.clone(),
            blacklist.clone(),
        ));
        let rotation: Arc<dyn RefreshRotationService> = Arc::new(RealRefreshRotationService::new(
            identity_repo.clone(),
            token_codec.clone(),
            crypto.clone(),
            blacklist.clone(),
            revocation.clone(),
        ));
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            identity_repo,
            token_codec,
            crypto,
            blacklist,
            rotation,
            revocation,
        ));

        // region runtime infra
        let cancel = CancellationToken::new();

        let sweeper_handle = match (settings.blacklist.backend, settings.blacklist.sweep_interval_secs) {
            (BlacklistBackend::Redis, _) => {
                info!("redis expires blacklist entries itself, sweeper disabled");
                None
            }
            (_, 0) => None,
            (_, secs) => {
                let sweeper = BlacklistSweeper::new(
                    blacklist_store,
                    Duration::from_secs(secs),
                    cancel.clone(),
                );
                Some(tokio::spawn(async move {
                    sweeper.run().await;
                }))
            }
        };

        // endregion

        info!(
            storage = ?settings.storage.backend,
            blacklist = ?settings.blacklist.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            sweeper_handle: Mutex::new(sweeper_handle),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = match self.sweeper_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
