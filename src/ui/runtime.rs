//! Model-view-update loop driver.

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tracing::trace;

use crate::ui::element::Element;
use crate::ui::task::Task;

/// A state machine the [`Runtime`] can drive.
pub trait Application {
    type Message: Send + std::fmt::Debug + 'static;

    fn update(&mut self, message: Self::Message) -> Task<Self::Message>;
    fn view(&self) -> Element<Self::Message>;
}

/// Owns the application and every future its tasks have started.
///
/// Futures are polled from a single place and their messages applied one at a time,
/// so `update` never runs concurrently with itself.
pub struct Runtime<A: Application> {
    app: A,
    in_flight: FuturesUnordered<BoxFuture<'static, Option<A::Message>>>,
}

impl<A: Application> Runtime<A> {
    pub fn new(app: A) -> Self {
        Self {
            app,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn view(&self) -> Element<A::Message> {
        self.app.view()
    }

    pub fn dispatch(&mut self, message: A::Message) {
        trace!(?message, "dispatch");
        let task = self.app.update(message);
        self.spawn(task);
    }

    fn spawn(&mut self, task: Task<A::Message>) {
        self.in_flight.extend(task.into_futures());
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Waits for the next in-flight future and applies its message.
    ///
    /// Returns `false` once nothing is left in flight.
    pub async fn step(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(Some(message)) => {
                self.dispatch(message);
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    /// Runs until every started future, including ones started along the way, has finished.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }
}
