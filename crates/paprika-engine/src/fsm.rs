// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state machine.
//!
//! Modes:
//!   idle                   -> no active flow; the initial mode
//!   onboarding             -> collecting preferences and restrictions
//!   awaiting_clarification -> a clarifying question is outstanding
//!   recipe_search          -> actively looking for recipes
//!   free_qa                -> answering open questions
//!
//! The FSM is advisory about content: the reply generator proposes
//! transitions, this module validates and applies them. An invalid proposal
//! holds the prior mode and step unchanged and reports [`ProposalOutcome::Held`]
//! so the dispatcher can surface the fallback reply path instead of moving
//! the user into an undefined state.

use paprika_core::types::{ConversationMode, ConversationState, GeneratedReply};

use ConversationMode::*;

/// Valid target modes per current mode. Staying in the same mode is always
/// valid and is not listed.
pub fn allowed_transitions(mode: ConversationMode) -> &'static [ConversationMode] {
    match mode {
        Idle => &[Onboarding, RecipeSearch, FreeQa, AwaitingClarification],
        Onboarding => &[Idle, RecipeSearch, FreeQa],
        AwaitingClarification => &[Idle, RecipeSearch, FreeQa],
        RecipeSearch => &[Idle, FreeQa, AwaitingClarification],
        FreeQa => &[Idle, RecipeSearch, AwaitingClarification],
    }
}

/// Check whether a mode transition is valid.
pub fn is_valid_transition(current: ConversationMode, next: ConversationMode) -> bool {
    current == next || allowed_transitions(current).contains(&next)
}

/// Result of applying a generator proposal to a conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The proposal was valid (or empty) and the state reflects it.
    Applied,
    /// The proposed mode is not reachable from the current mode; the state
    /// was left untouched and the fallback reply path should be used.
    Held,
}

/// Apply a generator's proposed transition to `state`.
///
/// - No proposed mode: the step may still be refined within the current mode.
/// - Valid proposed mode: mode and step are replaced together (a mode change
///   with no proposed step clears the step).
/// - Invalid proposed mode: nothing changes, [`ProposalOutcome::Held`].
pub fn apply_proposal(state: &mut ConversationState, reply: &GeneratedReply) -> ProposalOutcome {
    match reply.proposed_mode {
        None => {
            if let Some(step) = &reply.proposed_step {
                state.step = Some(step.clone());
            }
            ProposalOutcome::Applied
        }
        Some(next) if is_valid_transition(state.mode, next) => {
            state.mode = next;
            state.step = reply.proposed_step.clone();
            ProposalOutcome::Applied
        }
        Some(_) => ProposalOutcome::Held,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_in(mode: ConversationMode, step: Option<&str>) -> ConversationState {
        let mut state = ConversationState::new(200, 100);
        state.mode = mode;
        state.step = step.map(String::from);
        state
    }

    fn proposal(mode: Option<ConversationMode>, step: Option<&str>) -> GeneratedReply {
        GeneratedReply {
            reply_text: "ok".to_string(),
            proposed_mode: mode,
            proposed_step: step.map(String::from),
            context_delta: serde_json::Value::Null,
        }
    }

    #[test]
    fn same_mode_is_always_valid() {
        for mode in [Idle, Onboarding, AwaitingClarification, RecipeSearch, FreeQa] {
            assert!(is_valid_transition(mode, mode));
        }
    }

    #[test]
    fn every_mode_can_return_to_idle() {
        for mode in [Onboarding, AwaitingClarification, RecipeSearch, FreeQa] {
            assert!(is_valid_transition(mode, Idle));
        }
    }

    #[test]
    fn onboarding_is_not_reenterable_from_active_flows() {
        assert!(!is_valid_transition(RecipeSearch, Onboarding));
        assert!(!is_valid_transition(FreeQa, Onboarding));
        assert!(!is_valid_transition(AwaitingClarification, Onboarding));
    }

    #[test]
    fn valid_proposal_moves_mode_and_step() {
        let mut state = state_in(Idle, None);
        let outcome = apply_proposal(
            &mut state,
            &proposal(Some(RecipeSearch), Some("showing_results")),
        );
        assert_eq!(outcome, ProposalOutcome::Applied);
        assert_eq!(state.mode, RecipeSearch);
        assert_eq!(state.step.as_deref(), Some("showing_results"));
    }

    #[test]
    fn invalid_proposal_holds_mode_and_step() {
        let mut state = state_in(RecipeSearch, Some("showing_results"));
        let outcome = apply_proposal(&mut state, &proposal(Some(Onboarding), Some("ask_taste")));
        assert_eq!(outcome, ProposalOutcome::Held);
        assert_eq!(state.mode, RecipeSearch);
        assert_eq!(state.step.as_deref(), Some("showing_results"));
    }

    #[test]
    fn step_refines_within_current_mode() {
        let mut state = state_in(Onboarding, Some("ask_restrictions"));
        let outcome = apply_proposal(&mut state, &proposal(None, Some("ask_taste")));
        assert_eq!(outcome, ProposalOutcome::Applied);
        assert_eq!(state.mode, Onboarding);
        assert_eq!(state.step.as_deref(), Some("ask_taste"));
    }

    #[test]
    fn mode_change_without_step_clears_step() {
        let mut state = state_in(Onboarding, Some("ask_goals"));
        let outcome = apply_proposal(&mut state, &proposal(Some(Idle), None));
        assert_eq!(outcome, ProposalOutcome::Applied);
        assert_eq!(state.mode, Idle);
        assert_eq!(state.step, None);
    }

    #[test]
    fn empty_proposal_is_a_no_op() {
        let mut state = state_in(FreeQa, None);
        let outcome = apply_proposal(&mut state, &proposal(None, None));
        assert_eq!(outcome, ProposalOutcome::Applied);
        assert_eq!(state.mode, FreeQa);
        assert_eq!(state.step, None);
    }
}
