//! 全局错误类型定义
//! 构建期错误（签名库加载/编译）与单任务错误（抓取/解析）共用一个枚举，
//! 单任务错误只隔离到对应 JobResult，不会中断调度器

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum RswebprobeError {
    // 签名库相关错误（构建期，致命）
    #[error("Signature load failed: {0}")]
    RuleLoadError(String),
    #[error("Signature parse failed: {0}")]
    RuleParseError(String),
    #[error("Signature cache operation failed: {0}")]
    RuleCacheError(String),

    // 编译相关错误（构建期，致命：单条正则编译失败即整库加载失败）
    #[error("Regex compilation failed: {0}")]
    RegexCompileError(#[from] RegexError),

    // 单任务错误：目标页面不可解析
    #[error("HTML parse failed: {0}")]
    HtmlParseError(String),

    // 单任务错误：网络抓取失败
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("URL parse failed: {0}")]
    UrlError(#[from] UrlParseError),

    // 序列化/反序列化错误
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("MessagePack encode/decode failed: {0}")]
    MsgPackError(String),

    // 基础错误
    #[error("IO operation failed: {0}")]
    IoError(#[from] IoError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // 调度相关错误
    #[error("Scheduler closed: {0}")]
    SchedulerClosed(String),
}

// 全局Result类型
pub type RwpResult<T> = Result<T, RswebprobeError>;
