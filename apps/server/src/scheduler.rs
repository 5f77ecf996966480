//! # スケジューラ
//!
//! 通知ジョブを 1 日 1 回、指定したタイムゾーンの壁時計時刻に起動する。
//!
//! ## 設計方針
//!
//! - **次回時刻の計算は純粋関数**: [`DailySchedule::next_run_after`] は現在時刻を引数に取り、
//!   テストで任意の時刻を与えられるようにする
//! - **DST**: 存在しない時刻（夏時間の開始）は 1 時間後ろにずらし、
//!   2 回現れる時刻（夏時間の終了）は早い方を採用する
//! - **多重起動しない**: 前回の実行が終わっていなければ警告を出してスキップする

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use ratewatch_domain::clock::Clock;
use ratewatch_shared::{event_log::event, log_business_event};
use tokio::{sync::Mutex, task::JoinHandle};

/// 次回時刻を探す最大日数
///
/// DST の移行日でも翌日には必ず解決できるため、数日分で十分。
const MAX_LOOKAHEAD_DAYS: u64 = 3;

/// スケジューラから起動されるジョブ
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// ジョブを 1 回実行する。失敗はジョブ自身がログに残す
    async fn run(&self);
}

/// 毎日決まった時刻
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
    pub tz: Tz,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, tz: Tz) -> Self {
        Self { at, tz }
    }

    /// `now` より厳密に後の、最初の実行時刻を返す
    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.with_timezone(&self.tz).date_naive();

        (0..=MAX_LOOKAHEAD_DAYS)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .filter_map(|date| self.occurrence_on(date))
            .find(|candidate| *candidate > now)
    }

    fn occurrence_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let local = date.and_time(self.at);

        let resolved = match self.tz.from_local_datetime(&local) {
            LocalResult::Single(at) => Some(at),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => self
                .tz
                .from_local_datetime(&(local + TimeDelta::hours(1)))
                .earliest(),
        };

        resolved.map(|at| at.with_timezone(&Utc))
    }
}

impl Default for DailySchedule {
    /// 毎日 01:00 (UTC)
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(1, 0, 0).unwrap_or(NaiveTime::MIN),
            tz: Tz::UTC,
        }
    }
}

/// [`Scheduler::trigger`] の結果
#[derive(Debug)]
pub enum Trigger {
    /// ジョブを起動した
    Started(JoinHandle<()>),
    /// 前回の実行中のためスキップした
    Skipped,
}

/// 日次スケジューラ
pub struct Scheduler {
    job:       Arc<dyn ScheduledJob>,
    schedule:  DailySchedule,
    clock:     Arc<dyn Clock>,
    in_flight: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(job: Arc<dyn ScheduledJob>, schedule: DailySchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            job,
            schedule,
            clock,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// ジョブを別タスクで起動する
    ///
    /// 前回の実行が終わっていない場合は起動せず [`Trigger::Skipped`] を返す。
    pub fn trigger(&self) -> Trigger {
        let Ok(guard) = Arc::clone(&self.in_flight).try_lock_owned() else {
            tracing::warn!("前回の通知ジョブが実行中のため今回の起動をスキップ");
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::RUN_SKIPPED,
                event.result = event::result::FAILURE,
                "通知ジョブの起動をスキップ"
            );
            return Trigger::Skipped;
        };

        let job = Arc::clone(&self.job);
        Trigger::Started(tokio::spawn(async move {
            job.run().await;
            drop(guard);
        }))
    }

    /// 次回時刻まで待ってジョブを起動する、を繰り返す
    pub async fn run_forever(self) {
        let mut after = self.clock.now();

        loop {
            let Some(next) = self.schedule.next_run_after(after) else {
                tracing::error!(
                    at = %self.schedule.at,
                    tz = %self.schedule.tz,
                    "次回の実行時刻を計算できないためスケジューラを停止"
                );
                return;
            };

            let wait = (next - self.clock.now()).to_std().unwrap_or_default();
            tracing::info!(next_run = %next, "次回の通知ジョブまで待機");
            tokio::time::sleep(wait).await;

            self.trigger();
            after = next;
        }
    }
}
