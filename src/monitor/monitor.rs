use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use utoipa::ToSchema;

use crate::control::ControlApi;
use crate::monitor::recovery::{FaultPrompt, RecoveryAction};
use crate::monitor::status::{ReportCode, StatusReport};
use crate::schedule::ScheduleService;
use crate::sidebar::SidebarHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MonitorState {
    Polling,
    /// Suspended until the operator resolves the pending fault.
    AwaitingOperator,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonitorView {
    pub state: MonitorState,
    pub prompt: Option<FaultPrompt>,
    pub last_report: Option<StatusReport>,
    pub timer_armed: bool,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("no fault is awaiting the operator")]
    NoPendingFault,
    #[error("action {0} is not offered for this fault")]
    ActionNotOffered(RecoveryAction),
    #[error("status monitor has stopped")]
    Stopped,
}

enum Command {
    Resolve {
        action: RecoveryAction,
        reply: oneshot::Sender<Result<MonitorView, MonitorError>>,
    },
}

enum Event {
    Tick,
    Command(Command),
    Closed,
}

/// Cheap handle to the running monitor. The monitor stops once every handle is dropped.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<MonitorView>,
}

impl MonitorHandle {
    pub fn view(&self) -> MonitorView {
        self.view.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<MonitorView> {
        self.view.clone()
    }

    pub async fn resolve(&self, action: RecoveryAction) -> Result<MonitorView, MonitorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Resolve { action, reply })
            .await
            .map_err(|_| MonitorError::Stopped)?;
        response.await.map_err(|_| MonitorError::Stopped)?
    }
}

/// Polls scan status and drives the fault recovery dialog.
///
/// The task owns the state, the pending prompt and the poll timer. There is never more
/// than one timer: [`StatusMonitor::transition`] is the only code that arms or drops it.
pub struct StatusMonitor<A> {
    schedule: ScheduleService<A>,
    sidebar: Option<SidebarHandle>,
    period: Duration,
    state: MonitorState,
    timer: Option<Interval>,
    last_report: Option<StatusReport>,
    prompt: Option<FaultPrompt>,
    published: watch::Sender<MonitorView>,
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl<A: ControlApi> StatusMonitor<A> {
    pub fn spawn(
        schedule: ScheduleService<A>,
        period: Duration,
        sidebar: Option<SidebarHandle>,
    ) -> MonitorHandle {
        let (commands, receiver) = mpsc::channel(8);
        let (published, view) = watch::channel(MonitorView {
            state: MonitorState::Polling,
            prompt: None,
            last_report: None,
            timer_armed: false,
        });
        let monitor = StatusMonitor {
            schedule,
            sidebar,
            period,
            state: MonitorState::Polling,
            timer: None,
            last_report: None,
            prompt: None,
            published,
        };
        tokio::spawn(monitor.run(receiver));
        MonitorHandle { commands, view }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        log::info!("status monitor polling every {:?}", self.period);
        self.transition(MonitorState::Polling);
        self.poll().await;

        loop {
            let event = tokio::select! {
                _ = next_tick(&mut self.timer) => Event::Tick,
                command = commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => Event::Closed,
                },
            };
            match event {
                Event::Tick => self.poll().await,
                Event::Command(Command::Resolve { action, reply }) => {
                    let result = self.resolve(action).await;
                    let _ = reply.send(result);
                }
                Event::Closed => break,
            }
        }
        log::info!("status monitor stopped");
    }

    /// Moves to `next`, dropping any existing timer. Entering Polling arms a fresh timer
    /// whose first tick is one period away.
    fn transition(&mut self, next: MonitorState) {
        self.timer = None;
        if next == MonitorState::Polling {
            let mut timer = interval_at(Instant::now() + self.period, self.period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.timer = Some(timer);
            self.prompt = None;
        }
        if self.state != next {
            log::info!("status monitor: {} -> {}", self.state, next);
        }
        self.state = next;
        self.publish();
    }

    async fn poll(&mut self) {
        if self.state != MonitorState::Polling {
            return;
        }
        let report = match self.schedule.api().status().await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("status poll missed: {}", e);
                return;
            }
        };
        self.last_report = Some(report.clone());

        match report.code {
            ReportCode::Ok => {
                if let Some(sidebar) = &self.sidebar {
                    sidebar.merge(&report.telemetry);
                }
                self.publish();
            }
            ReportCode::Cancelled => {
                log::info!("scan {} was cancelled", describe(&report));
                self.acknowledge(&report).await;
                self.publish();
            }
            code => match FaultPrompt::for_report(&report) {
                Some(prompt) => {
                    log::warn!("telescope reported {} for scan {}", code, describe(&report));
                    self.prompt = Some(prompt);
                    self.transition(MonitorState::AwaitingOperator);
                }
                None => self.publish(),
            },
        }
    }

    async fn resolve(&mut self, action: RecoveryAction) -> Result<MonitorView, MonitorError> {
        if self.state != MonitorState::AwaitingOperator {
            return Err(MonitorError::NoPendingFault);
        }
        let prompt = self.prompt.as_ref().ok_or(MonitorError::NoPendingFault)?;
        if !prompt.offers(action) {
            return Err(MonitorError::ActionNotOffered(action));
        }
        let scan_id = prompt.scan_id.clone();
        log::info!("operator chose {} for {} fault", action, prompt.code);

        if let Some(report) = self.last_report.clone() {
            self.acknowledge(&report).await;
        }
        if action == RecoveryAction::CancelScan {
            match scan_id {
                Some(id) => {
                    if let Err(e) = self.schedule.cancel(&id).await {
                        log::warn!("failed to dequeue scan {}: {}", id, e);
                    }
                }
                None => log::warn!("fault report carried no scan id, nothing to dequeue"),
            }
        }

        self.transition(MonitorState::Polling);
        Ok(self.view())
    }

    async fn acknowledge(&self, report: &StatusReport) {
        if let Err(e) = self.schedule.api().acknowledge(report).await {
            log::warn!("failed to acknowledge {} report: {}", report.code, e);
        }
    }

    fn view(&self) -> MonitorView {
        MonitorView {
            state: self.state,
            prompt: self.prompt.clone(),
            last_report: self.last_report.clone(),
            timer_armed: self.timer.is_some(),
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.view());
    }
}

fn describe(report: &StatusReport) -> String {
    report
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::fake::{Call, FakeControl};
    use crate::control::Telemetry;
    use crate::scan::request::ScanId;
    use crate::schedule::snapshot::scan;
    use std::sync::Arc;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_secs(10);

    fn report(code: ReportCode, id: u64) -> StatusReport {
        StatusReport::new(code, Some(ScanId::Number(id)))
    }

    fn ok_at(az: f64) -> StatusReport {
        let mut report = report(ReportCode::Ok, 1);
        report.telemetry = Telemetry {
            az: Some(az),
            al: Some(45.0),
            ..Telemetry::default()
        };
        report
    }

    fn polls(api: &FakeControl) -> usize {
        api.count(|c| matches!(c, Call::Status))
    }

    async fn awaiting(handle: &MonitorHandle) -> MonitorView {
        let mut views = handle.subscribe();
        let view = views
            .wait_for(|v| v.state == MonitorState::AwaitingOperator)
            .await
            .unwrap()
            .clone();
        view
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_cancel_dequeues_and_resumes() {
        let api = Arc::new(FakeControl::new().with_schedule(vec![
            scan(42, "blocked", true),
            scan(7, "next", false),
        ]));
        api.push_status(report(ReportCode::Timeout, 42));
        let schedule = ScheduleService::new(api.clone());
        schedule.refresh().await.unwrap();
        let handle = StatusMonitor::spawn(schedule.clone(), PERIOD, None);

        let view = awaiting(&handle).await;
        let prompt = view.prompt.unwrap();
        assert_eq!(prompt.actions, vec![RecoveryAction::CancelScan, RecoveryAction::Resume]);
        assert!(!view.timer_armed);

        // Suspended: no polling while the dialog is up.
        sleep(Duration::from_secs(35)).await;
        assert_eq!(polls(&api), 1);

        let view = handle.resolve(RecoveryAction::CancelScan).await.unwrap();
        assert_eq!(view.state, MonitorState::Polling);
        assert!(view.timer_armed);
        assert!(view.prompt.is_none());

        let after_poll: Vec<_> = api
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Schedule))
            .collect();
        assert_eq!(
            after_poll,
            vec![
                Call::Status,
                Call::Acknowledge(report(ReportCode::Timeout, 42)),
                Call::CancelScan(ScanId::Number(42)),
            ]
        );
        assert!(!schedule.snapshot().contains(&ScanId::Number(42)));
        assert_eq!(schedule.snapshot().scans.len(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(polls(&api), 1);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(polls(&api), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_resumes_polling_when_the_server_refuses() {
        let api = Arc::new(FakeControl::new().with_schedule(vec![scan(42, "blocked", true)]));
        api.push_status(report(ReportCode::Timeout, 42));
        let handle = StatusMonitor::spawn(ScheduleService::new(api.clone()), PERIOD, None);
        awaiting(&handle).await;

        api.fail_acknowledge(true);
        api.fail_schedule(true);
        let view = handle.resolve(RecoveryAction::CancelScan).await.unwrap();
        assert_eq!(view.state, MonitorState::Polling);
        assert!(view.timer_armed);
        assert!(view.prompt.is_none());
        assert_eq!(api.count(|c| matches!(c, Call::Acknowledge(_))), 1);
        assert_eq!(api.count(|c| matches!(c, Call::CancelScan(_))), 1);

        sleep(PERIOD + Duration::from_secs(1)).await;
        assert_eq!(polls(&api), 2);
        assert_eq!(handle.view().state, MonitorState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_keeps_the_schedule() {
        let api = Arc::new(FakeControl::new().with_schedule(vec![scan(42, "blocked", true)]));
        api.push_status(report(ReportCode::Timeout, 42));
        let schedule = ScheduleService::new(api.clone());
        let handle = StatusMonitor::spawn(schedule, PERIOD, None);
        awaiting(&handle).await;

        handle.resolve(RecoveryAction::Resume).await.unwrap();
        assert_eq!(api.count(|c| matches!(c, Call::CancelScan(_))), 0);
        assert_eq!(api.count(|c| matches!(c, Call::Acknowledge(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_station_polls_every_period_and_feeds_sidebar() {
        let api = Arc::new(FakeControl::new());
        for az in [10.0, 20.0, 30.0, 40.0] {
            api.push_status(ok_at(az));
        }
        let sidebar = SidebarHandle::new();
        let handle = StatusMonitor::spawn(
            ScheduleService::new(api.clone()),
            PERIOD,
            Some(sidebar.clone()),
        );

        sleep(Duration::from_secs(5)).await;
        assert_eq!(polls(&api), 1);
        assert_eq!(sidebar.view().azimuth, Some(10.0));

        for (tick, az) in [(2, 20.0), (3, 30.0), (4, 40.0)] {
            sleep(PERIOD).await;
            assert_eq!(polls(&api), tick);
            assert_eq!(sidebar.view().azimuth, Some(az));
            let view = handle.view();
            assert_eq!(view.state, MonitorState::Polling);
            assert!(view.prompt.is_none());
        }
        assert_eq!(api.count(|c| matches!(c, Call::Acknowledge(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_faults_never_stack_timers() {
        let api = Arc::new(FakeControl::new());
        api.push_status(report(ReportCode::InvalidParam, 1));
        api.push_status(ok_at(0.0));
        api.push_status(report(ReportCode::ScheduleFailed, 2));
        api.push_status(ok_at(0.0));
        api.push_status(report(ReportCode::UnknownError, 3));
        let handle = StatusMonitor::spawn(ScheduleService::new(api.clone()), PERIOD, None);

        // t=0 fault, resolved at t=5; polls at 15 (ok) and 25 (fault).
        awaiting(&handle).await;
        sleep(Duration::from_secs(5)).await;
        handle.resolve(RecoveryAction::Acknowledge).await.unwrap();
        sleep(Duration::from_secs(25)).await;
        assert_eq!(polls(&api), 3);
        assert!(!handle.view().timer_armed);

        // Resolved at t=30; polls at 40 (ok) and 50 (fault).
        handle.resolve(RecoveryAction::Acknowledge).await.unwrap();
        sleep(Duration::from_secs(25)).await;
        assert_eq!(polls(&api), 5);

        // Resolved at t=55; polls at 65, 75, 85 then t=90 is reached.
        handle.resolve(RecoveryAction::Acknowledge).await.unwrap();
        sleep(Duration::from_secs(35)).await;
        assert_eq!(polls(&api), 8);
        assert!(handle.view().timer_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_a_transient_miss() {
        let api = Arc::new(FakeControl::new());
        api.push_status_failure();
        let handle = StatusMonitor::spawn(ScheduleService::new(api.clone()), PERIOD, None);

        sleep(Duration::from_secs(15)).await;
        assert_eq!(polls(&api), 2);
        let view = handle.view();
        assert_eq!(view.state, MonitorState::Polling);
        assert_eq!(view.last_report.unwrap().code, ReportCode::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_is_acknowledged_silently() {
        let api = Arc::new(FakeControl::new());
        api.push_status(report(ReportCode::Cancelled, 9));
        let handle = StatusMonitor::spawn(ScheduleService::new(api.clone()), PERIOD, None);

        sleep(Duration::from_secs(5)).await;
        let view = handle.view();
        assert_eq!(view.state, MonitorState::Polling);
        assert!(view.prompt.is_none());
        assert!(view.timer_armed);
        assert_eq!(
            api.calls(),
            vec![Call::Status, Call::Acknowledge(report(ReportCode::Cancelled, 9))]
        );

        sleep(PERIOD).await;
        assert_eq!(polls(&api), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_is_rejected_when_not_applicable() {
        let api = Arc::new(FakeControl::new());
        api.push_status(report(ReportCode::InvalidParam, 1));
        let handle = StatusMonitor::spawn(ScheduleService::new(api.clone()), PERIOD, None);
        awaiting(&handle).await;

        assert!(matches!(
            handle.resolve(RecoveryAction::CancelScan).await,
            Err(MonitorError::ActionNotOffered(RecoveryAction::CancelScan))
        ));
        handle.resolve(RecoveryAction::Acknowledge).await.unwrap();
        assert!(matches!(
            handle.resolve(RecoveryAction::Acknowledge).await,
            Err(MonitorError::NoPendingFault)
        ));
    }
}
