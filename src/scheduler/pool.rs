//! 扫描调度器
//! 固定数量worker共享一个有界任务队列，结果汇入共享结果流。
//! 生命周期：构造即启动 -> close()后不再接收新任务 -> 余量任务跑完、
//! 全部worker退出后结果流恰好关闭一次（发送端全部位于worker内）

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

use super::fetcher::{HttpFetcher, SurfaceFetcher};
use super::job::{Job, JobResult};
use crate::analyzer::MatchEngine;
use crate::config::GlobalConfig;
use crate::error::{RswebprobeError, RwpResult};
use crate::signature::SignatureDb;

/// 扫描调度器
pub struct ScanScheduler {
    job_tx: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ScanScheduler {
    /// 构造调度器并立即启动worker池，返回调度器与结果流接收端
    pub fn new(
        worker_count: usize,
        db: Arc<SignatureDb>,
        config: &GlobalConfig,
    ) -> RwpResult<(Self, mpsc::Receiver<JobResult>)> {
        let fetcher: Arc<dyn SurfaceFetcher> = Arc::new(HttpFetcher::new(config)?);
        Self::with_fetcher(worker_count, db, config, fetcher)
    }

    /// 注入自定义抓取器的构造入口（测试/定制抓取策略用）
    pub fn with_fetcher(
        worker_count: usize,
        db: Arc<SignatureDb>,
        config: &GlobalConfig,
        fetcher: Arc<dyn SurfaceFetcher>,
    ) -> RwpResult<(Self, mpsc::Receiver<JobResult>)> {
        if worker_count == 0 {
            return Err(RswebprobeError::InvalidInput(
                "worker count must be positive".to_string(),
            ));
        }

        let capacity = config.queue_capacity.max(1);
        let (job_tx, job_rx) = mpsc::channel::<Job>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<JobResult>(capacity);

        // 多worker共享单接收端：队列中每个任务恰好被一个worker消费一次
        let job_rx = Arc::new(Mutex::new(job_rx));
        let engine = Arc::new(MatchEngine::new(db));

        let workers = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    job_rx.clone(),
                    result_tx.clone(),
                    engine.clone(),
                    fetcher.clone(),
                ))
            })
            .collect();

        // 结果发送端只存活在worker内：最后一个worker退出时结果流自然关闭
        drop(result_tx);

        Ok((
            Self {
                job_tx: Some(job_tx),
                workers,
            },
            result_rx,
        ))
    }

    /// 入队一个扫描任务；队列满时挂起（背压），close()后入队报错
    pub async fn schedule(&self, job: Job) -> RwpResult<()> {
        let Some(job_tx) = self.job_tx.as_ref() else {
            return Err(RswebprobeError::SchedulerClosed(
                "no more jobs accepted after close".to_string(),
            ));
        };
        job_tx.send(job).await.map_err(|e| {
            RswebprobeError::SchedulerClosed(format!("job queue closed: {}", e.0.url))
        })
    }

    /// 声明不再有新任务：进入排空阶段，worker消费完余量后退出
    pub fn close(&mut self) {
        self.job_tx.take();
    }

    /// 关闭并等待全部worker退出（在途任务跑完，不做中途打断）
    pub async fn join(mut self) {
        self.close();
        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
    }
}

/// worker主循环：取任务 -> 解析可观测面 -> 引擎分析 -> 上报恰好一个结果
async fn worker_loop(
    worker_id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    result_tx: mpsc::Sender<JobResult>,
    engine: Arc<MatchEngine>,
    fetcher: Arc<dyn SurfaceFetcher>,
) {
    loop {
        // 锁的作用域只覆盖取任务，抓取与分析阶段不持锁
        let job = {
            let mut rx = job_rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            debug!("worker#{} 观察到队列耗尽，退出", worker_id);
            break;
        };

        let result = process_job(job, &engine, fetcher.as_ref()).await;
        if result_tx.send(result).await.is_err() {
            // 结果消费端已放弃，继续处理没有意义
            debug!("worker#{} 结果流消费端已关闭，退出", worker_id);
            break;
        }
    }
}

/// 处理单个任务：抓取/分析失败只落到本任务结果，不影响兄弟任务与调度器
async fn process_job(
    job: Job,
    engine: &MatchEngine,
    fetcher: &dyn SurfaceFetcher,
) -> JobResult {
    let Job { url, surface } = job;

    let surface = match surface {
        Some(surface) => surface,
        None => match fetcher.fetch(&url).await {
            Ok(surface) => surface,
            Err(e) => return JobResult::failed(url, e),
        },
    };

    // 匹配使用重定向后的最终URL；离线任务未填最终URL时回退任务URL
    let effective_url = if surface.url.is_empty() {
        url.clone()
    } else {
        surface.url.clone()
    };

    match engine.analyze(&effective_url, &surface) {
        Ok(matches) => JobResult::ok(url, matches),
        Err(e) => JobResult::failed(url, e),
    }
}
