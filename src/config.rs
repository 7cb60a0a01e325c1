//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 签名库本地缓存路径
    pub signature_cache_path: PathBuf,
    // 远程签名库URL
    pub signature_url: String,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
    // 抓取时使用的User-Agent
    pub user_agent: String,
    // 任务队列/结果队列容量（背压边界）
    pub queue_capacity: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            signature_cache_path: PathBuf::from("rswebprobe_signatures.mp"),
            signature_url: "https://raw.githubusercontent.com/projectdiscovery/wappalyzergo/refs/heads/main/fingerprints_data.json".to_string(),
            http_timeout: 30,
            user_agent: format!("rswebprobe/{}", env!("CARGO_PKG_VERSION")),
            queue_capacity: 64,
        }
    }
}

/// 配置管理器（单例）
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn signature_cache_path(mut self, path: PathBuf) -> Self {
        self.config.signature_cache_path = path;
        self
    }

    pub fn signature_url(mut self, url: String) -> Self {
        self.config.signature_url = url;
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: String) -> Self {
        self.config.user_agent = ua;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
