// ==========================================
// 停电抢修调度系统 - 后台移动推进任务
// ==========================================
// 职责: 按固定间隔推进所有 dispatched/en_route 且有任务的班组
// 并发: 每个班组一个 spawn_blocking 单元,班组之间互不依赖
// 停止: watch 通道发出关闭信号后退出,当前批次会先完成
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, CrewApi, SYSTEM_ACTOR};
use crate::domain::types::CrewStatus;

/// 单次推进统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub advanced: usize,
    pub arrived: usize,
    pub failed: usize,
}

/// 推进一轮
pub async fn run_tick(api: &Arc<CrewApi>) -> TickSummary {
    let list_api = api.clone();
    let crews = match tokio::task::spawn_blocking(move || list_api.list_crews(None)).await {
        Ok(Ok(crews)) => crews,
        Ok(Err(e)) => {
            warn!(error = %e, "推进任务读取班组失败");
            return TickSummary::default();
        }
        Err(e) => {
            warn!(error = %e, "推进任务读取班组中断");
            return TickSummary::default();
        }
    };

    let tasks = crews
        .into_iter()
        .filter(|c| c.status.is_moving() && c.assigned_event_id.is_some())
        .map(|crew| {
            let api = api.clone();
            let crew_id = crew.crew_id;
            tokio::task::spawn_blocking(move || {
                let result = api.movement_step_to_assigned_event(&crew_id, SYSTEM_ACTOR);
                (crew_id, result)
            })
        });

    let results = join_all(tasks).await;

    let mut summary = TickSummary::default();
    for joined in results {
        match joined {
            Ok((_, Ok(crew))) => {
                summary.advanced += 1;
                if crew.status == CrewStatus::OnSite {
                    summary.arrived += 1;
                }
            }
            Ok((crew_id, Err(e))) => {
                summary.failed += 1;
                // 并发推进与人工操作竞争属于常态
                match e {
                    ApiError::IllegalTransition { .. } | ApiError::StoreConflict(_) => {
                        debug!(crew_id = %crew_id, error = %e, "推进跳过")
                    }
                    _ => warn!(crew_id = %crew_id, error = %e, "推进失败"),
                }
            }
            Err(e) => {
                summary.failed += 1;
                warn!(error = %e, "推进任务中断");
            }
        }
    }

    if summary.advanced > 0 || summary.failed > 0 {
        debug!(
            advanced = summary.advanced,
            arrived = summary.arrived,
            failed = summary.failed,
            "推进一轮完成"
        );
    }
    summary
}

/// 后台推进任务句柄
pub struct MovementLoopHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl MovementLoopHandle {
    /// 发出关闭信号并等待退出
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            warn!(error = %e, "推进任务退出异常");
        }
    }
}

/// 启动后台推进任务
pub fn spawn_movement_loop(api: Arc<CrewApi>, tick: Duration) -> MovementLoopHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        info!(tick_ms = tick.as_millis() as u64, "后台推进任务启动");
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    run_tick(&api).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("后台推进任务已停止");
    });

    MovementLoopHandle { shutdown_tx, join }
}
