//! Runs a [`Session`] on its own tokio task.
//!
//! Callers talk to the task through a [`SessionHandle`] and listen on the
//! returned [`SessionEvent`] receiver. The single outstanding page fetch runs
//! in a spawned task whose completion is selected back onto the driver, so
//! every state change happens on one task and nothing needs a lock.

use std::sync::Arc;

use bizscout_core::{Item, SearchApi, SearchCriteria, SearchPage};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};

use crate::error::SessionError;
use crate::filter::FilterState;
use crate::pagination::{PageCursor, PageTicket};
use crate::presentation::{ResultsChanged, ScrollMetrics};
use crate::session::Session;

#[derive(Debug)]
pub enum SessionCommand {
    /// Explicit "load more", e.g. a button.
    LoadMore,
    Scrolled(ScrollMetrics),
    ApplyCriteria(SearchCriteria),
    SetQuery(String),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ResultsChanged(ResultsChanged),
    /// A page fetch started (`true`) or the last one settled (`false`).
    Loading(bool),
    FetchFailed { message: String },
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub cursor: PageCursor,
    pub filter: FilterState,
    pub list: Vec<Arc<Item>>,
    pub exhausted: bool,
    pub criteria: SearchCriteria,
}

impl SessionSnapshot {
    fn of(session: &Session) -> Self {
        Self {
            cursor: session.cursor(),
            filter: session.filter_state().clone(),
            list: session.current_list().to_vec(),
            exhausted: session.is_exhausted(),
            criteria: session.criteria().clone(),
        }
    }
}

/// Sends commands to a running session driver. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver has stopped.
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Closed)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver has stopped.
    pub fn load_more(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::LoadMore)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver has stopped.
    pub fn scrolled(&self, metrics: ScrollMetrics) -> Result<(), SessionError> {
        self.send(SessionCommand::Scrolled(metrics))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver has stopped.
    pub fn apply_criteria(&self, criteria: SearchCriteria) -> Result<(), SessionError> {
        self.send(SessionCommand::ApplyCriteria(criteria))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver has stopped.
    pub fn set_query(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::SetQuery(text.into()))
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver has stopped.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown)
    }

    /// Reads the session state once every earlier command has been handled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the driver stopped before replying.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply))?;
        response.await.map_err(|_| SessionError::Closed)
    }
}

/// Starts a driver task for `session`.
///
/// The task stops on [`SessionCommand::Shutdown`] or when every handle is
/// dropped, and yields the session back through the join handle. A fetch
/// still outstanding at that point is aborted.
pub fn spawn_session<A>(
    api: Arc<A>,
    session: Session,
) -> (
    SessionHandle,
    mpsc::UnboundedReceiver<SessionEvent>,
    JoinHandle<Session>,
)
where
    A: SearchApi + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let driver = Driver {
        api,
        session,
        events: event_tx,
        in_flight: None,
    };
    let task = tokio::spawn(driver.run(command_rx));

    (
        SessionHandle {
            commands: command_tx,
        },
        event_rx,
        task,
    )
}

struct InFlight<E> {
    ticket: PageTicket,
    task: JoinHandle<Result<SearchPage, E>>,
}

struct Driver<A: SearchApi> {
    api: Arc<A>,
    session: Session,
    events: mpsc::UnboundedSender<SessionEvent>,
    in_flight: Option<InFlight<A::Error>>,
}

impl<A> Driver<A>
where
    A: SearchApi + 'static,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) -> Session {
        tracing::debug!("session driver started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(SessionCommand::Shutdown) => break,
                    Some(command) => self.handle(command),
                },
                joined = next_completion(self.in_flight.as_mut().map(|f| &mut f.task)) => {
                    self.complete(joined);
                }
            }
        }

        if let Some(pending) = self.in_flight.take() {
            pending.task.abort();
        }
        tracing::debug!("session driver stopped");
        self.session
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::LoadMore => {
                let ticket = self.session.request_next_page();
                self.start(ticket);
            }
            SessionCommand::Scrolled(metrics) => {
                let ticket = self.session.on_scroll(&metrics);
                self.start(ticket);
            }
            SessionCommand::ApplyCriteria(criteria) => {
                let (ticket, change) = self.session.apply_new_criteria(criteria);
                self.publish(change);
                self.start(ticket);
            }
            SessionCommand::SetQuery(text) => {
                let change = self.session.set_query(&text);
                self.publish(change);
            }
            SessionCommand::Snapshot(reply) => {
                // The caller may have stopped waiting.
                let _ = reply.send(SessionSnapshot::of(&self.session));
            }
            // Stops the run loop before reaching here.
            SessionCommand::Shutdown => {}
        }
    }

    fn start(&mut self, ticket: Option<PageTicket>) {
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
            self.emit(SessionEvent::Loading(true));
        }
    }

    fn spawn_fetch(&mut self, ticket: PageTicket) {
        let api = Arc::clone(&self.api);
        let query = ticket.query().clone();
        let task = tokio::spawn(async move { api.search(&query).await });
        self.in_flight = Some(InFlight { ticket, task });
    }

    fn complete(&mut self, joined: Result<Result<SearchPage, A::Error>, JoinError>) {
        let Some(InFlight { ticket, .. }) = self.in_flight.take() else {
            return;
        };

        let result = match joined {
            Ok(result) => result.map_err(SessionError::fetch),
            Err(err) => Err(SessionError::Fetch(
                format!("search task failed: {err}").into(),
            )),
        };

        match self.session.complete_page(ticket, result) {
            Ok(Some(change)) => self.publish(change),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "page fetch failed");
                self.emit(SessionEvent::FetchFailed {
                    message: err.to_string(),
                });
            }
        }

        match self.session.take_pending_reload() {
            Some(reload) => self.spawn_fetch(reload),
            None => self.emit(SessionEvent::Loading(false)),
        }
    }

    fn publish(&self, change: ResultsChanged) {
        if !change.is_empty() {
            self.emit(SessionEvent::ResultsChanged(change));
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("session event dropped, no listener");
        }
    }
}

async fn next_completion<T>(task: Option<&mut JoinHandle<T>>) -> Result<T, JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}
