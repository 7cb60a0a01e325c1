//! 可观测面抓取器
//! 抓取是调度器的外部协作方：以trait接缝注入，便于测试替换；
//! 超时/重试等策略属于抓取器自身，不属于调度内核

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::analyzer::TargetSurface;
use crate::config::GlobalConfig;
use crate::error::RwpResult;
use crate::utils::HeaderConverter;

/// 抓取能力接缝：给定目标URL，产出一份可观测面
#[async_trait]
pub trait SurfaceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> RwpResult<TargetSurface>;
}

/// 生产实现：基于连接池化的reqwest客户端
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &GlobalConfig) -> RwpResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SurfaceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> RwpResult<TargetSurface> {
        // 先做URL合法性校验，非法目标直接以UrlError失败
        let parsed = Url::parse(url)?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status().as_u16();
        // 最终URL取自重定向链末端的响应
        let effective_url = response.url().to_string();
        let headers = HeaderConverter::to_hashmap(response.headers());
        let cookies = HeaderConverter::extract_cookies(&headers);
        let body = response.bytes().await?.to_vec();

        debug!(
            "抓取完成：{} -> {}，状态={}，响应体{}字节",
            url,
            effective_url,
            status,
            body.len()
        );

        Ok(TargetSurface {
            url: effective_url,
            status,
            body,
            headers,
            cookies,
        })
    }
}
