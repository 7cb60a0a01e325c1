//! 签名库本地缓存
//! 仅处理原始签名数据的本地序列化（MessagePack）和反序列化

use rmp_serde::{Serializer, from_slice};
use serde::Serialize;
use tracing::debug;

use super::model::SignatureFile;
use crate::config::GlobalConfig;
use crate::error::{RswebprobeError, RwpResult};

/// 签名缓存管理器
pub struct SignatureCacheManager;

impl SignatureCacheManager {
    /// 从本地缓存加载原始签名数据
    pub async fn load_from_cache(config: &GlobalConfig) -> RwpResult<SignatureFile> {
        let cache_path = &config.signature_cache_path;
        let cache_data = tokio::fs::read(cache_path).await?;

        let file: SignatureFile = from_slice(&cache_data)
            .map_err(|e| RswebprobeError::MsgPackError(format!("decode failed: {}", e)))?;

        debug!(
            "缓存文件反序列化成功，技术项数：{}，分类数：{}",
            file.apps.len(),
            file.categories.len()
        );

        Ok(file)
    }

    /// 将原始签名数据缓存到本地
    pub async fn save_to_cache(config: &GlobalConfig, file: &SignatureFile) -> RwpResult<()> {
        let cache_path = &config.signature_cache_path;
        let mut cache_data = Vec::new();

        file.serialize(&mut Serializer::new(&mut cache_data))
            .map_err(|e| RswebprobeError::MsgPackError(format!("encode failed: {}", e)))?;

        debug!("签名数据序列化成功，大小：{} 字节", cache_data.len());

        tokio::fs::write(cache_path, cache_data).await?;
        Ok(())
    }

    /// 清除本地缓存
    pub async fn clear_cache(config: &GlobalConfig) -> RwpResult<()> {
        let cache_path = &config.signature_cache_path;
        if cache_path.exists() {
            tokio::fs::remove_file(cache_path).await?;
            debug!("本地签名缓存已清除");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::signature::loader::SignatureLoader;

    #[tokio::test]
    async fn test_cache_round_trip() {
        // 测试场景：保存-加载往返后数据一致
        let dir = std::env::temp_dir().join("rswebprobe_cache_test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let config = ConfigManager::custom()
            .signature_cache_path(dir.join("sigs.mp"))
            .build();

        let file = SignatureLoader::parse(
            r#"{"apps": {"nginx": {"cats": [22], "headers": {"Server": "nginx"}}}}"#,
        )
        .unwrap();

        SignatureCacheManager::save_to_cache(&config, &file).await.unwrap();
        let loaded = SignatureCacheManager::load_from_cache(&config).await.unwrap();
        assert_eq!(loaded.apps.len(), 1);
        assert!(loaded.apps.contains_key("nginx"));

        SignatureCacheManager::clear_cache(&config).await.unwrap();
        assert!(SignatureCacheManager::load_from_cache(&config).await.is_err());
    }
}
