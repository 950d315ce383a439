// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch worker: the processing pipeline for admitted inbound events.
//!
//! One event flows through: audit append (best-effort) -> idempotency claim
//! -> per-user lock -> command short-circuit or capped reply generation ->
//! FSM proposal application -> version-checked state persist -> outbox
//! enqueue -> claim completion. Collaborator failures are downgraded to a
//! fallback reply with the state held unchanged; they never leave a claim
//! stuck in `processing` or crash the worker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use paprika_config::model::WorkerConfig;
use paprika_core::types::{
    ClaimOutcome, ClaimResolution, ConversationMode, ConversationState, GeneratedReply,
    InboundEvent, ReplyPayload,
};
use paprika_core::{PaprikaError, ReplyGenerator};
use paprika_storage::queries::{audit, conversation, outbox};
use paprika_storage::Database;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::{merge_summary, MessageWindow};
use crate::fsm::{self, ProposalOutcome};
use crate::generate::STEP_ASK_RESTRICTIONS;
use crate::guard::IdempotencyGuard;

/// Reply for `/help` and unknown sources of confusion.
pub const HELP_TEXT: &str = "I can help you find recipes, answer cooking questions, and \
                             suggest ingredient swaps.\n\nCommands:\n/start -- set up your \
                             preferences\n/help -- this message\n\nJust tell me what you \
                             feel like eating!";

/// Reply for `/start`.
pub const WELCOME_TEXT: &str = "Hi! I'm your recipe assistant. To tailor suggestions, \
                                let's start with the basics: any dietary restrictions I \
                                should know about (allergies, intolerances)?";

/// User-visible reply when generation fails or proposes an invalid move.
pub const FALLBACK_TEXT: &str = "Sorry, I couldn't put together an answer just now. \
                                 Please try again in a minute.";

/// How an event left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Identifier already completed or in flight elsewhere; nothing done.
    Duplicate,
    /// No actionable text (media-only or empty update); claim completed.
    Ignored,
    /// A slash command was answered without invoking the generator.
    Command,
    /// Generated reply enqueued, state transition persisted.
    Replied,
    /// Generation failed or proposed an invalid transition; fallback reply
    /// enqueued with the state held unchanged.
    Fallback,
}

/// Commands handled without the generator.
fn parse_command(text: &str) -> Option<&'static str> {
    let first = text.split_whitespace().next()?;
    match first.to_lowercase().as_str() {
        "/start" => Some("start"),
        "/help" => Some("help"),
        _ => None,
    }
}

/// The dispatch worker. Cheap to share via `Arc`; one instance serves all
/// in-process workers.
pub struct Dispatcher<G: ReplyGenerator> {
    db: Database,
    guard: IdempotencyGuard,
    generator: Arc<G>,
    config: WorkerConfig,
    /// Process-wide cap on concurrent generator calls (backpressure against
    /// the expensive downstream dependency).
    generation_permits: Arc<Semaphore>,
    /// Per-user exclusive sections, held only across load->transition->persist.
    user_locks: StdMutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl<G: ReplyGenerator> Dispatcher<G> {
    pub fn new(db: Database, guard: IdempotencyGuard, generator: Arc<G>, config: WorkerConfig) -> Self {
        let permits = config.max_concurrent_generations.max(1);
        Self {
            db,
            guard,
            generator,
            config,
            generation_permits: Arc::new(Semaphore::new(permits)),
            user_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().expect("user lock registry poisoned");
        locks.entry(user_id).or_default().clone()
    }

    /// Process one inbound event end to end.
    ///
    /// Storage failures on the ledger, state, or outbox propagate as errors
    /// and leave the claim in `processing`: the staleness-reclaim path picks
    /// the event up again rather than losing it or double-completing it.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<DispatchOutcome, PaprikaError> {
        // Audit is best-effort observability; the ledger decides correctness.
        if let Err(e) = audit::insert(&self.db, &event).await {
            warn!(event_id = event.event_id, error = %e, "audit append failed, continuing");
        }

        match self.guard.claim(event.event_id).await? {
            ClaimOutcome::Duplicate => {
                debug!(event_id = event.event_id, "duplicate event, skipping");
                return Ok(DispatchOutcome::Duplicate);
            }
            ClaimOutcome::Admitted | ClaimOutcome::Reclaimed => {}
        }

        let lock = self.user_lock(event.user_id);
        let _user_section = lock.lock().await;
        self.process_admitted(&event).await
    }

    async fn process_admitted(&self, event: &InboundEvent) -> Result<DispatchOutcome, PaprikaError> {
        let text = match event.text.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                // Media-only or empty update: nothing to reply to.
                self.guard
                    .complete(event.event_id, ClaimResolution::Completed)
                    .await?;
                return Ok(DispatchOutcome::Ignored);
            }
        };

        // First contact creates the user's idle state row, commands included.
        let state = conversation::get_or_create(&self.db, event.user_id, event.chat_id).await?;

        if let Some(command) = parse_command(text) {
            return self.handle_command(event, command).await;
        }

        let reply = match self.generate_with_cap(&state, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    event_id = event.event_id,
                    error = %e,
                    "reply generation failed, sending fallback"
                );
                return self
                    .finish_with_fallback(event, ClaimResolution::Failed)
                    .await;
            }
        };

        // Persist under the optimistic version check; one recompute against
        // a concurrent cross-process writer. The in-process per-user lock is
        // already held, so a second conflict means something is wrong.
        let mut base = state;
        for attempt in 0..2 {
            let mut next = base.clone();
            if fsm::apply_proposal(&mut next, &reply) == ProposalOutcome::Held {
                warn!(
                    event_id = event.event_id,
                    current_mode = %base.mode,
                    proposed = ?reply.proposed_mode,
                    "proposed transition not valid for current mode, holding state"
                );
                return self
                    .finish_with_fallback(event, ClaimResolution::Completed)
                    .await;
            }

            if !merge_summary(
                &mut next.context_summary,
                &reply.context_delta,
                self.config.summary_max_bytes,
            ) {
                warn!(
                    user_id = event.user_id,
                    "context summary at size cap, delta dropped pending compaction"
                );
            }

            let mut window = MessageWindow::from_fragments(
                self.config.window_messages,
                std::mem::take(&mut next.recent_messages),
            );
            window.push_exchange(text, &reply.reply_text, self.config.fragment_max_bytes);
            next.recent_messages = window.into_fragments();

            if conversation::update(&self.db, &next).await? {
                break;
            }
            if attempt == 1 {
                return Err(PaprikaError::Internal(format!(
                    "conversation state for user {} kept changing despite the user lock",
                    event.user_id
                )));
            }
            debug!(user_id = event.user_id, "state version conflict, recomputing from fresh read");
            base = conversation::get_or_create(&self.db, event.user_id, event.chat_id).await?;
        }

        outbox::enqueue(
            &self.db,
            event.chat_id,
            &ReplyPayload::text(reply.reply_text),
            Some(event.event_id),
        )
        .await?;
        self.guard
            .complete(event.event_id, ClaimResolution::Completed)
            .await?;
        Ok(DispatchOutcome::Replied)
    }

    /// Enqueue the fallback reply and resolve the claim. The conversation
    /// state is deliberately untouched.
    async fn finish_with_fallback(
        &self,
        event: &InboundEvent,
        resolution: ClaimResolution,
    ) -> Result<DispatchOutcome, PaprikaError> {
        outbox::enqueue(
            &self.db,
            event.chat_id,
            &ReplyPayload::text(FALLBACK_TEXT),
            Some(event.event_id),
        )
        .await?;
        self.guard.complete(event.event_id, resolution).await?;
        Ok(DispatchOutcome::Fallback)
    }

    async fn handle_command(
        &self,
        event: &InboundEvent,
        command: &str,
    ) -> Result<DispatchOutcome, PaprikaError> {
        match command {
            "start" => {
                // Restart onboarding from the top.
                for attempt in 0..2 {
                    let mut state =
                        conversation::get_or_create(&self.db, event.user_id, event.chat_id).await?;
                    state.mode = ConversationMode::Onboarding;
                    state.step = Some(STEP_ASK_RESTRICTIONS.to_string());
                    if conversation::update(&self.db, &state).await? {
                        break;
                    }
                    if attempt == 1 {
                        return Err(PaprikaError::Internal(format!(
                            "conversation state for user {} kept changing despite the user lock",
                            event.user_id
                        )));
                    }
                }
                outbox::enqueue(
                    &self.db,
                    event.chat_id,
                    &ReplyPayload::text(WELCOME_TEXT),
                    Some(event.event_id),
                )
                .await?;
            }
            _ => {
                outbox::enqueue(
                    &self.db,
                    event.chat_id,
                    &ReplyPayload::text(HELP_TEXT),
                    Some(event.event_id),
                )
                .await?;
            }
        }

        self.guard
            .complete(event.event_id, ClaimResolution::Completed)
            .await?;
        Ok(DispatchOutcome::Command)
    }

    /// Run the generator under the global concurrency cap and per-call
    /// timeout. The permit is released on every exit path.
    async fn generate_with_cap(
        &self,
        state: &ConversationState,
        text: &str,
    ) -> Result<GeneratedReply, PaprikaError> {
        let _permit = self
            .generation_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PaprikaError::Internal("generation semaphore closed".into()))?;

        let timeout = Duration::from_secs(self.config.generator_timeout_secs);
        match tokio::time::timeout(timeout, self.generator.generate(state, text)).await {
            Ok(result) => result,
            Err(_) => Err(PaprikaError::Timeout { duration: timeout }),
        }
    }

    /// Consume inbound events until the channel closes or shutdown fires.
    ///
    /// Events are processed one task each: different users run fully in
    /// parallel, same-user events serialize on the per-user lock in
    /// admission order.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<InboundEvent>,
        shutdown: CancellationToken,
    ) {
        info!("dispatch loop started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Some(event) => {
                        let dispatcher = Arc::clone(&self);
                        tokio::spawn(async move {
                            let event_id = event.event_id;
                            if let Err(e) = dispatcher.handle_event(event).await {
                                error!(event_id, error = %e, "event processing failed");
                            }
                        });
                    }
                    None => break,
                },
            }
        }
        info!("dispatch loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_are_parsed() {
        assert_eq!(parse_command("/start"), Some("start"));
        assert_eq!(parse_command("/START"), Some("start"));
        assert_eq!(parse_command("/help now please"), Some("help"));
    }

    #[test]
    fn unknown_commands_fall_through_to_generation() {
        assert_eq!(parse_command("/profile"), None);
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
    }
}
