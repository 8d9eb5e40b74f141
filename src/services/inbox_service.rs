//! Inbox poller.
//!
//! The [`InboxPoller`] keeps the message list of the active session fresh. A
//! call to [`start`](InboxPoller::start) fetches the list once right away and
//! then on every interval tick until the returned [`PollerHandle`] is stopped
//! or dropped.
//!
//! Every start and stop bumps an epoch counter. Fetches remember the epoch
//! they started in, and a result that arrives after the epoch moved on is
//! thrown away, so nothing mutates the list after teardown.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::{Account, Message, MessageDetail, MessageId};
use crate::providers::mail::{MailError, MailProvider};

/// Default time between two list fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 64;

/// Errors from inbox operations.
#[derive(Debug, Error)]
pub enum InboxError {
    /// No poller is running, or it was stopped while the call was in flight.
    #[error("inbox is not active")]
    Inactive,

    #[error(transparent)]
    Provider(#[from] MailError),
}

/// Result type for inbox operations.
pub type Result<T> = std::result::Result<T, InboxError>;

/// Notifications published after the list changes.
#[derive(Debug, Clone, PartialEq)]
pub enum InboxEvent {
    /// The list was replaced.
    Refreshed { count: usize },
    /// Messages whose ids were not in the previous list.
    NewMessages(Vec<Message>),
    /// A fetch failed; the list was left as it was.
    RefreshFailed(String),
}

/// What a refresh did with the fetched list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The list was replaced with `count` messages.
    Applied { count: usize },
    /// The poller was stopped or restarted while the fetch was in flight.
    Discarded,
    /// No session with a token is being polled.
    Inactive,
}

#[derive(Default)]
struct InboxState {
    epoch: u64,
    account: Option<Account>,
    messages: Vec<Message>,
    /// Whether a list has been applied since the last start.
    loaded: bool,
    task: Option<AbortHandle>,
}

struct Inner {
    provider: Arc<dyn MailProvider>,
    interval: Duration,
    state: Mutex<InboxState>,
    events: broadcast::Sender<InboxEvent>,
}

/// Periodic message-list fetcher for one session at a time.
#[derive(Clone)]
pub struct InboxPoller {
    inner: Arc<Inner>,
}

impl InboxPoller {
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        Self::with_interval(provider, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(provider: Arc<dyn MailProvider>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                provider,
                interval,
                state: Mutex::new(InboxState::default()),
                events,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, InboxState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Starts polling for `account`.
    ///
    /// Any earlier run is stopped first. An account without a token gets an
    /// inert handle and nothing is fetched.
    pub fn start(&self, account: Account) -> PollerHandle {
        let mut state = self.state();
        if let Some(previous) = state.task.take() {
            tracing::warn!("inbox poller already running, stopping previous run");
            previous.abort();
        }
        state.epoch += 1;
        state.messages.clear();
        state.loaded = false;
        let epoch = state.epoch;

        if account.token().is_none() {
            tracing::debug!(address = %account.address, "no token, inbox polling skipped");
            state.account = None;
            return PollerHandle {
                poller: self.clone(),
                epoch,
                task: None,
            };
        }

        tracing::info!(
            address = %account.address,
            interval_secs = self.inner.interval.as_secs(),
            "inbox polling started"
        );
        state.account = Some(account);

        let poller = self.clone();
        let interval = self.inner.interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures are logged and broadcast inside refresh.
                let _ = poller.refresh().await;
            }
        })
        .abort_handle();
        state.task = Some(task.clone());

        PollerHandle {
            poller: self.clone(),
            epoch,
            task: Some(task),
        }
    }

    /// Whether a session is currently being polled.
    pub fn is_active(&self) -> bool {
        self.state().account.is_some()
    }

    /// Snapshot of the current list, in provider order.
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InboxEvent> {
        self.inner.events.subscribe()
    }

    /// Epoch and token of the active session.
    fn session(&self) -> Option<(u64, String)> {
        let state = self.state();
        let token = state.account.as_ref()?.token()?.to_string();
        Some((state.epoch, token))
    }

    /// Fetches the full list and replaces the local one.
    ///
    /// Overlapping refreshes are not coordinated; the last one to finish wins.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Some((epoch, token)) = self.session() else {
            tracing::debug!("refresh skipped, no active session");
            return Ok(RefreshOutcome::Inactive);
        };

        match self.inner.provider.list_messages(&token).await {
            Ok(messages) => Ok(self.apply(epoch, messages)),
            Err(e) => {
                if self.state().epoch != epoch {
                    return Ok(RefreshOutcome::Discarded);
                }
                tracing::warn!(error = %e, "inbox refresh failed");
                let _ = self
                    .inner
                    .events
                    .send(InboxEvent::RefreshFailed(e.to_string()));
                Err(e.into())
            }
        }
    }

    fn apply(&self, epoch: u64, messages: Vec<Message>) -> RefreshOutcome {
        let count = messages.len();
        let arrived = {
            let mut state = self.state();
            if state.epoch != epoch {
                tracing::debug!(count, "stale inbox listing discarded");
                return RefreshOutcome::Discarded;
            }

            let arrived: Vec<Message> = if state.loaded {
                let known: HashSet<&MessageId> = state.messages.iter().map(|m| &m.id).collect();
                messages
                    .iter()
                    .filter(|m| !known.contains(&m.id))
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };

            state.messages = messages;
            state.loaded = true;
            arrived
        };

        tracing::debug!(count, new = arrived.len(), "inbox refreshed");
        let _ = self.inner.events.send(InboxEvent::Refreshed { count });
        if !arrived.is_empty() {
            let _ = self.inner.events.send(InboxEvent::NewMessages(arrived));
        }
        RefreshOutcome::Applied { count }
    }

    /// Fetches a message's detail and marks it seen locally.
    ///
    /// The seen flag is not sent to the provider, so the next refresh may
    /// reset it. A failed fetch leaves the list untouched.
    pub async fn open_message(&self, id: &MessageId) -> Result<MessageDetail> {
        let (epoch, token) = self.session().ok_or(InboxError::Inactive)?;

        let mut detail = self
            .inner
            .provider
            .get_message_detail(id, &token)
            .await
            .inspect_err(|e| tracing::warn!(message_id = %id, error = %e, "failed to open message"))?;

        let mut state = self.state();
        if state.epoch != epoch {
            return Err(InboxError::Inactive);
        }
        if let Some(message) = state.messages.iter_mut().find(|m| &m.id == id) {
            message.seen = true;
        }
        detail.message.seen = true;
        Ok(detail)
    }

    /// Deletes a message at the provider and drops it from the local list.
    pub async fn delete_message(&self, id: &MessageId) -> Result<bool> {
        let (epoch, token) = self.session().ok_or(InboxError::Inactive)?;

        let deleted = self.inner.provider.delete_message(id, &token).await?;
        if !deleted {
            tracing::warn!(message_id = %id, "provider refused to delete message");
            return Ok(false);
        }

        let mut state = self.state();
        if state.epoch == epoch {
            state.messages.retain(|m| &m.id != id);
        }
        Ok(true)
    }

    fn stop_epoch(&self, epoch: u64) {
        let mut state = self.state();
        if state.epoch != epoch {
            return;
        }
        state.epoch += 1;
        state.account = None;
        state.messages.clear();
        state.loaded = false;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        tracing::info!("inbox polling stopped");
    }
}

/// Cancels its polling run when stopped or dropped.
pub struct PollerHandle {
    poller: InboxPoller,
    epoch: u64,
    task: Option<AbortHandle>,
}

impl PollerHandle {
    /// Stops the timer. Fetches still in flight are discarded when they land.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether this handle's run is still the current one.
    pub fn is_running(&self) -> bool {
        self.poller.state().epoch == self.epoch && self.task.is_some()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.poller.stop_epoch(self.epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, Sender};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, assert_ready, task};

    fn message(id: &str) -> Message {
        Message {
            id: MessageId::from(id),
            from: Sender::new("noreply@github.com", "GitHub"),
            subject: format!("Subject {id}"),
            intro: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            seen: false,
        }
    }

    fn account() -> Account {
        Account::new("janedoe@uni.edu", "pass1", "jwt")
    }

    /// Serves a configurable list. The gates hold list or detail calls until
    /// they are opened.
    #[derive(Default)]
    struct FakeMail {
        messages: Mutex<Vec<Message>>,
        list_calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        detail_gate: Option<Arc<Notify>>,
        fail_list: bool,
        fail_detail: bool,
    }

    impl FakeMail {
        fn with_messages(ids: &[&str]) -> Self {
            Self {
                messages: Mutex::new(ids.iter().map(|id| message(id)).collect()),
                ..Default::default()
            }
        }

        fn set_messages(&self, ids: &[&str]) {
            *self.messages.lock().unwrap() = ids.iter().map(|id| message(id)).collect();
        }

        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MailProvider for FakeMail {
        async fn list_domains(&self) -> crate::providers::mail::Result<Vec<Domain>> {
            Ok(vec![])
        }

        async fn create_account(
            &self,
            address: &str,
            password: &str,
        ) -> crate::providers::mail::Result<Account> {
            Ok(Account::new(address, password, ""))
        }

        async fn obtain_token(
            &self,
            _address: &str,
            _password: &str,
        ) -> crate::providers::mail::Result<String> {
            Ok("jwt".to_string())
        }

        async fn list_messages(&self, token: &str) -> crate::providers::mail::Result<Vec<Message>> {
            assert_eq!(token, "jwt");
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_list {
                return Err(MailError::Network("status 500".into()));
            }
            Ok(self.messages.lock().unwrap().clone())
        }

        async fn get_message_detail(
            &self,
            id: &MessageId,
            _token: &str,
        ) -> crate::providers::mail::Result<MessageDetail> {
            if let Some(gate) = &self.detail_gate {
                gate.notified().await;
            }
            if self.fail_detail {
                return Err(MailError::Network("status 404".into()));
            }
            Ok(MessageDetail {
                message: message(&id.0),
                text: "hello".into(),
                html: vec![],
            })
        }

        async fn delete_message(
            &self,
            _id: &MessageId,
            _token: &str,
        ) -> crate::providers::mail::Result<bool> {
            Ok(true)
        }
    }

    fn poller(fake: &Arc<FakeMail>) -> InboxPoller {
        InboxPoller::with_interval(
            Arc::clone(fake) as Arc<dyn MailProvider>,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn start_fetches_immediately() {
        let fake = Arc::new(FakeMail::with_messages(&["m1", "m2"]));
        let poller = poller(&fake);
        let mut events = poller.subscribe();

        let _handle = poller.start(account());

        assert_eq!(
            events.recv().await.unwrap(),
            InboxEvent::Refreshed { count: 2 }
        );
        let ids: Vec<_> = poller.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![MessageId::from("m1"), MessageId::from("m2")]);
        assert!(poller.is_active());
    }

    #[tokio::test]
    async fn refresh_without_session_is_inactive() {
        let fake = Arc::new(FakeMail::with_messages(&["m1"]));
        let poller = poller(&fake);

        assert_eq!(poller.refresh().await.unwrap(), RefreshOutcome::Inactive);
        assert!(matches!(
            poller.open_message(&MessageId::from("m1")).await,
            Err(InboxError::Inactive)
        ));
        assert_eq!(fake.list_calls(), 0);
    }

    #[tokio::test]
    async fn account_without_token_never_polls() {
        let fake = Arc::new(FakeMail::with_messages(&["m1"]));
        let poller = poller(&fake);

        let handle = poller.start(Account::new("a@uni.edu", "p", ""));
        tokio::task::yield_now().await;

        assert!(!handle.is_running());
        assert!(!poller.is_active());
        assert_eq!(poller.refresh().await.unwrap(), RefreshOutcome::Inactive);
        assert_eq!(fake.list_calls(), 0);
    }

    #[tokio::test]
    async fn new_messages_only_after_first_list() {
        let fake = Arc::new(FakeMail::with_messages(&["m1"]));
        let poller = poller(&fake);
        let mut events = poller.subscribe();

        let _handle = poller.start(account());
        assert_eq!(
            events.recv().await.unwrap(),
            InboxEvent::Refreshed { count: 1 }
        );

        fake.set_messages(&["m2", "m1"]);
        assert_eq!(
            poller.refresh().await.unwrap(),
            RefreshOutcome::Applied { count: 2 }
        );

        assert_eq!(
            events.recv().await.unwrap(),
            InboxEvent::Refreshed { count: 2 }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            InboxEvent::NewMessages(vec![message("m2")])
        );
    }

    #[tokio::test]
    async fn response_after_stop_is_discarded() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakeMail {
            messages: Mutex::new(vec![message("late")]),
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let poller = poller(&fake);

        let handle = poller.start(account());
        let mut pending = task::spawn(poller.refresh());
        assert_pending!(pending.poll());
        assert_eq!(fake.list_calls(), 1);

        handle.stop();
        gate.notify_waiters();

        assert!(pending.is_woken());
        let outcome = assert_ready!(pending.poll()).unwrap();
        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert!(poller.messages().is_empty());
        assert!(!poller.is_active());
    }

    #[tokio::test]
    async fn failure_after_stop_is_not_broadcast() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakeMail {
            gate: Some(Arc::clone(&gate)),
            fail_list: true,
            ..Default::default()
        });
        let poller = poller(&fake);
        let mut events = poller.subscribe();

        let handle = poller.start(account());
        let mut pending = task::spawn(poller.refresh());
        assert_pending!(pending.poll());

        handle.stop();
        gate.notify_waiters();

        let outcome = assert_ready!(pending.poll()).unwrap();
        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn open_after_stop_is_inactive() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakeMail {
            messages: Mutex::new(vec![message("m1")]),
            detail_gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let poller = poller(&fake);
        let handle = poller.start(account());
        poller.refresh().await.unwrap();

        let id = MessageId::from("m1");
        let mut pending = task::spawn(poller.open_message(&id));
        assert_pending!(pending.poll());

        handle.stop();
        gate.notify_waiters();

        let result = assert_ready!(pending.poll());
        assert!(matches!(result, Err(InboxError::Inactive)));
        assert!(poller.messages().is_empty());
    }

    #[tokio::test]
    async fn open_from_previous_run_leaves_new_list_unseen() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakeMail {
            messages: Mutex::new(vec![message("m1")]),
            detail_gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let poller = poller(&fake);
        let first = poller.start(account());
        poller.refresh().await.unwrap();

        let id = MessageId::from("m1");
        let mut pending = task::spawn(poller.open_message(&id));
        assert_pending!(pending.poll());

        first.stop();
        let _second = poller.start(account());
        assert_eq!(
            poller.refresh().await.unwrap(),
            RefreshOutcome::Applied { count: 1 }
        );

        gate.notify_waiters();

        let result = assert_ready!(pending.poll());
        assert!(matches!(result, Err(InboxError::Inactive)));
        let seen: Vec<bool> = poller.messages().iter().map(|m| m.seen).collect();
        assert_eq!(seen, vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ticks_until_stopped() {
        let fake = Arc::new(FakeMail::with_messages(&["m1"]));
        let poller = InboxPoller::with_interval(
            Arc::clone(&fake) as Arc<dyn MailProvider>,
            Duration::from_secs(10),
        );

        let handle = poller.start(account());
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(fake.list_calls(), 3);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.list_calls(), 3);
    }

    #[tokio::test]
    async fn restart_stops_previous_run() {
        let fake = Arc::new(FakeMail::with_messages(&["m1"]));
        let poller = poller(&fake);

        let first = poller.start(account());
        let second = poller.start(account());

        assert!(!first.is_running());
        assert!(second.is_running());

        // Dropping the stale handle must not tear down the new run.
        drop(first);
        assert!(poller.is_active());
        assert!(second.is_running());
    }

    #[tokio::test]
    async fn refresh_failure_keeps_list_and_broadcasts() {
        let fake = Arc::new(FakeMail {
            fail_list: true,
            ..Default::default()
        });
        let poller = poller(&fake);
        let mut events = poller.subscribe();

        let _handle = poller.start(account());

        match events.recv().await.unwrap() {
            InboxEvent::RefreshFailed(reason) => assert!(reason.contains("500")),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(poller.messages().is_empty());
        assert!(poller.is_active());
    }

    #[tokio::test]
    async fn open_message_marks_only_that_entry_seen() {
        let fake = Arc::new(FakeMail::with_messages(&["m1", "m2"]));
        let poller = poller(&fake);
        let mut events = poller.subscribe();
        let _handle = poller.start(account());
        events.recv().await.unwrap();

        let detail = poller.open_message(&MessageId::from("m2")).await.unwrap();
        assert_eq!(detail.text, "hello");
        assert!(detail.message.seen);

        let seen: Vec<bool> = poller.messages().iter().map(|m| m.seen).collect();
        assert_eq!(seen, vec![false, true]);
    }

    #[tokio::test]
    async fn failed_open_leaves_list_unchanged() {
        let fake = Arc::new(FakeMail {
            messages: Mutex::new(vec![message("m1")]),
            fail_detail: true,
            ..Default::default()
        });
        let poller = poller(&fake);
        let mut events = poller.subscribe();
        let _handle = poller.start(account());
        events.recv().await.unwrap();
        let before = poller.messages();

        let result = poller.open_message(&MessageId::from("m1")).await;

        assert!(matches!(result, Err(InboxError::Provider(_))));
        assert_eq!(poller.messages(), before);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let fake = Arc::new(FakeMail::with_messages(&["m1", "m2"]));
        let poller = poller(&fake);
        let mut events = poller.subscribe();
        let _handle = poller.start(account());
        events.recv().await.unwrap();

        assert!(poller.delete_message(&MessageId::from("m1")).await.unwrap());

        let ids: Vec<_> = poller.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![MessageId::from("m2")]);
    }
}
