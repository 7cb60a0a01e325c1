//! rswebprobe CLI：批量目标指纹扫描，逐行输出JSON结果

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use rswebprobe::{
    ConfigManager, Job, ScanScheduler, SignatureCompiler, SignatureLoader,
};

#[derive(Parser, Debug)]
#[command(name = "rswebprobe", version, about = "Web技术栈指纹批量扫描")]
struct Cli {
    /// 扫描目标（host或URL，可多个）
    targets: Vec<String>,

    /// 从文件读取目标，每行一个
    #[arg(long, value_name = "FILE")]
    hosts: Option<PathBuf>,

    /// 本地签名库JSON文件路径（缺省优先本地缓存，失效则拉取远程）
    #[arg(long, value_name = "FILE")]
    apps: Option<PathBuf>,

    /// 强制拉取远程签名库并刷新本地缓存
    #[arg(long)]
    update: bool,

    /// worker数量
    #[arg(long, default_value_t = 4)]
    worker: usize,

    /// 抓取超时（秒）
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ConfigManager::custom().http_timeout(cli.timeout).build();

    // 1. 加载签名库
    let file = if cli.update {
        SignatureLoader::update(&config)
            .await
            .context("签名库更新失败")?
    } else if let Some(path) = &cli.apps {
        SignatureLoader::load_from_file(path)
            .await
            .with_context(|| format!("签名库文件加载失败：{}", path.display()))?
    } else {
        SignatureLoader::load(&config).await.context("签名库加载失败")?
    };
    let db = Arc::new(SignatureCompiler::compile(&file).context("签名库编译失败")?);

    // 2. 汇总目标
    let mut targets = cli.targets;
    if let Some(hosts_path) = &cli.hosts {
        let data = tokio::fs::read_to_string(hosts_path)
            .await
            .with_context(|| format!("目标文件读取失败：{}", hosts_path.display()))?;
        targets.extend(
            data.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    if targets.is_empty() {
        if cli.update {
            // 仅刷新签名库
            return Ok(());
        }
        anyhow::bail!("未指定扫描目标（位置参数或 --hosts）");
    }

    // 3. 启动调度器：生产端单独task入队，主task排空结果流，避免背压互锁
    let (mut scheduler, mut results) =
        ScanScheduler::new(cli.worker, db.clone(), &config).context("调度器启动失败")?;

    let producer = tokio::spawn(async move {
        for target in targets {
            if scheduler.schedule(Job::online(target)).await.is_err() {
                break;
            }
        }
        scheduler.join().await;
    });

    // 4. 逐行输出结果
    while let Some(result) = results.recv().await {
        let matches: Vec<_> = result
            .matches
            .iter()
            .map(|m| {
                json!({
                    "app_name": &m.name,
                    "version": &m.version,
                    "categories": db.category_names(&m.signature),
                    "website": &m.signature.website,
                })
            })
            .collect();

        let line = json!({
            "hostname": &result.url,
            "matches": matches,
            "error": result.error.as_ref().map(|e| e.to_string()),
        });
        println!("{}", line);
    }

    producer.await?;
    Ok(())
}
