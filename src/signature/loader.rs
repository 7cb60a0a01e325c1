//! 签名库加载管理器
//! 负责从本地文件、本地缓存或远程拉取原始签名数据

use std::path::Path;

use reqwest::Client;
use tracing::{debug, warn};

use super::cache::SignatureCacheManager;
use super::model::SignatureFile;
use crate::config::GlobalConfig;
use crate::error::{RswebprobeError, RwpResult};

/// 签名库加载管理器
pub struct SignatureLoader;

impl SignatureLoader {
    /// 解析JSON字符串为原始签名数据
    pub fn parse(data: &str) -> RwpResult<SignatureFile> {
        let file: SignatureFile = serde_json::from_str(data)?;
        if file.apps.is_empty() {
            warn!("签名数据解析成功但不含任何技术项");
        }
        Ok(file)
    }

    /// 加载签名库（优先本地缓存，缓存失效则拉取远程并回写缓存）
    pub async fn load(config: &GlobalConfig) -> RwpResult<SignatureFile> {
        if let Ok(file) = SignatureCacheManager::load_from_cache(config).await {
            debug!("从本地缓存加载签名库成功");
            return Ok(file);
        }
        warn!("本地缓存不存在或损坏，将拉取远程签名库");
        Self::update(config).await
    }

    /// 从本地JSON文件加载
    pub async fn load_from_file(path: &Path) -> RwpResult<SignatureFile> {
        let data = tokio::fs::read_to_string(path).await?;
        Self::parse(&data)
    }

    /// 强制拉取远程签名库并回写本地缓存
    pub async fn update(config: &GlobalConfig) -> RwpResult<SignatureFile> {
        let file = Self::fetch_remote(config).await?;

        if let Err(e) = SignatureCacheManager::save_to_cache(config, &file).await {
            warn!("签名库缓存到本地失败：{}", e);
        } else {
            debug!("远程签名库已缓存到本地");
        }

        Ok(file)
    }

    /// 拉取远程签名库
    pub async fn fetch_remote(config: &GlobalConfig) -> RwpResult<SignatureFile> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout))
            .build()?;

        debug!("开始拉取远程签名库，URL：{}", config.signature_url);
        let response = client
            .get(&config.signature_url)
            .header("User-Agent", &config.user_agent)
            .header("Accept-Encoding", "gzip, deflate")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RswebprobeError::RuleLoadError(format!(
                "URL {} returned status {}",
                config.signature_url,
                response.status()
            )));
        }

        let file: SignatureFile = response.json().await?;
        debug!("远程签名库拉取成功，技术项总数：{}", file.apps.len());
        Ok(file)
    }
}
