//! Voting Engine
//!
//! Owns the poll lifecycle: creation (persist, post, bind, schedule),
//! transactional vote casting with toggle/switch semantics, and the
//! idempotent open -> closed transition triggered by the scheduler.

use super::render;
use super::results::tally;
use super::types::{CastOutcome, CreatePoll, MessageRef, Poll, PollError, PollResults};
use crate::channels::ChatClient;
use crate::cron::Scheduler;
use crate::store::{PollStore, VoteStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Poll lifecycle orchestrator.
///
/// Cheap to clone; all collaborators are shared. One engine is
/// constructed at startup and injected wherever poll commands arrive.
#[derive(Clone)]
pub struct VotingEngine {
    polls: PollStore,
    votes: VoteStore,
    chat: Arc<dyn ChatClient>,
    scheduler: Arc<dyn Scheduler>,
}

impl VotingEngine {
    /// Create an engine over its stores and collaborators.
    pub fn new(
        polls: PollStore,
        votes: VoteStore,
        chat: Arc<dyn ChatClient>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            polls,
            votes,
            chat,
            scheduler,
        }
    }

    /// Start a new poll.
    ///
    /// Persists the poll, posts the interactive message, binds the
    /// returned message reference, and registers the one-shot close
    /// job. A failed post leaves the poll unbound (it still closes on
    /// schedule, with a fresh results post); a failed persist aborts
    /// with no side effects.
    pub async fn create_poll(&self, request: CreatePoll) -> Result<String, PollError> {
        request.validate()?;

        let now = super::types::now_millis();
        let poll = Poll {
            id: uuid::Uuid::new_v4().to_string(),
            topic: request.topic.clone(),
            options: request.options.clone(),
            allow_multiple: request.allow_multiple,
            is_closed: false,
            creator_id: request.creator_id.clone(),
            channel_id: request.channel_id.clone(),
            created_at: now,
            closes_at: now + request.duration_minutes as i64 * 60_000,
            message: None,
        };

        self.polls.create(&poll).await?;
        info!(poll_id = %poll.id, topic = %poll.topic, "poll created");

        let blocks = render::open_poll_blocks(&poll);
        match self
            .chat
            .post_message(&poll.channel_id, &render::open_text(&poll), &blocks)
            .await
        {
            Ok(message) => {
                if let Err(e) = self.polls.bind_message(&poll.id, &message).await {
                    warn!(poll_id = %poll.id, error = %e, "failed to bind poll message");
                }
            }
            Err(e) => {
                // Orphaned poll: no message to update, closing will
                // post a fresh results message instead.
                warn!(poll_id = %poll.id, error = %e, "failed to post poll message");
            }
        }

        let engine = self.clone();
        let channel_id = poll.channel_id.clone();
        let poll_id = poll.id.clone();
        let job_id = format!("close_poll_{}", poll.id);
        self.scheduler.schedule_once(
            Duration::from_secs(request.duration_minutes * 60),
            &job_id,
            Box::pin(async move {
                if let Err(e) = engine.close_poll(&channel_id, &poll_id).await {
                    error!(poll_id = %poll_id, error = %e, "scheduled poll close failed");
                }
            }),
        );

        Ok(poll.id)
    }

    /// Cast, switch, or retract a vote.
    ///
    /// Preconditions are checked in order: poll exists, poll open,
    /// option index in bounds. The mutation itself is one store
    /// transaction; no network I/O happens inside it.
    pub async fn cast_vote(
        &self,
        poll_id: &str,
        user_id: &str,
        option_index: usize,
    ) -> Result<CastOutcome, PollError> {
        let poll = self
            .polls
            .get(poll_id)
            .await?
            .ok_or(PollError::NotFound)?;

        if poll.is_closed {
            warn!(poll_id = %poll_id, user_id = %user_id, "vote on closed poll rejected");
            return Err(PollError::Closed);
        }
        if option_index >= poll.options.len() {
            warn!(poll_id = %poll_id, user_id = %user_id, option = option_index, "vote with out-of-range option rejected");
            return Err(PollError::InvalidOption(option_index));
        }

        let outcome = self
            .votes
            .cast(poll_id, user_id, option_index, poll.allow_multiple)
            .await?;

        Ok(outcome)
    }

    /// Live results for an open or closed poll.
    pub async fn results(&self, poll_id: &str) -> Result<PollResults, PollError> {
        let poll = self
            .polls
            .get(poll_id)
            .await?
            .ok_or(PollError::NotFound)?;

        let counts = self.votes.counts_by_option(poll_id).await?;
        Ok(tally(&poll.id, &poll.options, &counts))
    }

    /// Close a poll and announce the results.
    ///
    /// Safe to invoke any number of times: a missing or already-closed
    /// poll is a no-op, and only the caller whose store UPDATE flips
    /// the flag renders and messages. The closed flag is committed
    /// before any messaging is attempted.
    pub async fn close_poll(&self, channel_id: &str, poll_id: &str) -> Result<(), PollError> {
        let Some(poll) = self.polls.get(poll_id).await? else {
            warn!(poll_id = %poll_id, "close requested for unknown poll");
            return Ok(());
        };
        if poll.is_closed {
            return Ok(());
        }

        if !self.polls.mark_closed(poll_id).await? {
            // Lost the race against another close trigger.
            return Ok(());
        }
        info!(poll_id = %poll_id, topic = %poll.topic, "poll closed");

        let counts = self.votes.counts_by_option(poll_id).await?;
        let results = tally(&poll.id, &poll.options, &counts);

        let blocks = render::closed_poll_blocks(&poll, &results);
        let text = render::closed_text(&poll);

        match &poll.message {
            Some(message) => {
                if let Err(e) = self.chat.update_message(message, &text, &blocks).await {
                    warn!(poll_id = %poll_id, error = %e, "poll message update failed, posting fresh results");
                    self.post_results_fallback(channel_id, &poll, &results).await;
                }
            }
            None => {
                self.post_results_fallback(channel_id, &poll, &results).await;
            }
        }

        Ok(())
    }

    /// Post a fresh results-only message (no binding to update, or the
    /// in-place update failed).
    async fn post_results_fallback(&self, channel_id: &str, poll: &Poll, results: &PollResults) {
        let blocks = vec![crate::channels::MessageBlock::section(&format!(
            "[v] *POLL CLOSED*\n\n{}",
            render::results_text(poll, results)
        ))];
        if let Err(e) = self
            .chat
            .post_message(channel_id, &render::closed_text(poll), &blocks)
            .await
        {
            error!(poll_id = %poll.id, error = %e, "failed to post poll results");
        }
    }

    /// Close every open poll whose deadline has passed.
    ///
    /// Backstop for lost close jobs (failed registration, process
    /// restart). Harmless to run alongside the scheduler because
    /// closing is idempotent.
    pub async fn sweep_overdue(&self) -> Result<usize, PollError> {
        let overdue = self.polls.list_overdue(super::types::now_millis()).await?;
        let count = overdue.len();

        for poll in overdue {
            info!(poll_id = %poll.id, "closing overdue poll");
            if let Err(e) = self.close_poll(&poll.channel_id, &poll.id).await {
                error!(poll_id = %poll.id, error = %e, "overdue poll close failed");
            }
        }

        Ok(count)
    }
}
