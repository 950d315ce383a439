// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default reply generator: deterministic templates plus keyword
//! classification.
//!
//! This is the shipped stand-in for the LLM-backed collaborator. It walks
//! the onboarding steps, recognizes recipe requests and questions, and asks
//! for clarification otherwise. Anything smarter plugs in behind the same
//! [`ReplyGenerator`] trait.

use async_trait::async_trait;
use paprika_core::types::{ConversationMode, ConversationState, GeneratedReply};
use paprika_core::{PaprikaError, ReplyGenerator};

/// Onboarding sub-steps, walked in order.
pub const STEP_ASK_RESTRICTIONS: &str = "ask_restrictions";
pub const STEP_ASK_TASTE: &str = "ask_taste";
pub const STEP_ASK_GOALS: &str = "ask_goals";

const RECIPE_KEYWORDS: &[&str] = &[
    "recipe", "cook", "dinner", "lunch", "breakfast", "snack", "dessert", "soup", "salad",
    "meal", "hungry", "eat",
];

/// Heuristic: does the message look like a recipe request?
pub fn looks_like_recipe_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    RECIPE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Template-driven generator proposing transitions for the FSM to validate.
#[derive(Debug, Default, Clone)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    fn onboarding_reply(step: Option<&str>) -> GeneratedReply {
        match step {
            Some(STEP_ASK_RESTRICTIONS) => GeneratedReply {
                reply_text: "Noted. Any flavors you particularly enjoy -- savory, spicy, \
                             something sweet?"
                    .to_string(),
                proposed_mode: None,
                proposed_step: Some(STEP_ASK_TASTE.to_string()),
                context_delta: serde_json::json!({"restrictions_captured": true}),
            },
            Some(STEP_ASK_TASTE) => GeneratedReply {
                reply_text: "Great. Last one: what are you hoping to get out of this -- \
                             quick weeknight meals, weight goals, new ideas?"
                    .to_string(),
                proposed_mode: None,
                proposed_step: Some(STEP_ASK_GOALS.to_string()),
                context_delta: serde_json::json!({"taste_captured": true}),
            },
            Some(STEP_ASK_GOALS) => GeneratedReply {
                reply_text: "All set! Ask me for a recipe whenever you're ready, or just \
                             ask a cooking question."
                    .to_string(),
                proposed_mode: Some(ConversationMode::Idle),
                proposed_step: None,
                context_delta: serde_json::json!({"onboarding_completed": true}),
            },
            // Unknown or missing step: restart the flow rather than guess.
            _ => GeneratedReply {
                reply_text: "Let's start with the basics: any dietary restrictions I should \
                             know about (allergies, intolerances)?"
                    .to_string(),
                proposed_mode: None,
                proposed_step: Some(STEP_ASK_RESTRICTIONS.to_string()),
                context_delta: serde_json::Value::Null,
            },
        }
    }
}

#[async_trait]
impl ReplyGenerator for TemplateGenerator {
    async fn generate(
        &self,
        state: &ConversationState,
        inbound_text: &str,
    ) -> Result<GeneratedReply, PaprikaError> {
        if state.mode == ConversationMode::Onboarding {
            return Ok(Self::onboarding_reply(state.step.as_deref()));
        }

        if looks_like_recipe_request(inbound_text) {
            return Ok(GeneratedReply {
                reply_text: "Here's an idea: a one-pan roast chicken with seasonal greens. \
                             Want something quicker, or a vegetarian option?"
                    .to_string(),
                proposed_mode: Some(ConversationMode::RecipeSearch),
                proposed_step: Some("showing_results".to_string()),
                context_delta: serde_json::json!({"last_intent": "recipe_search"}),
            });
        }

        if inbound_text.contains('?') {
            return Ok(GeneratedReply {
                reply_text: "Good question. Short answer: it depends on the ingredients at \
                             hand -- tell me what's in your pantry and I'll be specific."
                    .to_string(),
                proposed_mode: Some(ConversationMode::FreeQa),
                proposed_step: None,
                context_delta: serde_json::json!({"last_intent": "free_qa"}),
            });
        }

        // Nothing recognizable: ask rather than guess.
        Ok(GeneratedReply {
            reply_text: "I can help best with recipes and cooking questions. Are you after \
                         a recipe, or do you have a question?"
                .to_string(),
            proposed_mode: Some(ConversationMode::AwaitingClarification),
            proposed_step: Some("clarify_intent".to_string()),
            context_delta: serde_json::Value::Null,
        })
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

    #[test]
    fn recipe_keywords_are_recognized() {
        assert!(looks_like_recipe_request("what should I cook tonight"));
        assert!(looks_like_recipe_request("Dinner ideas please"));
        assert!(!looks_like_recipe_request("tell me about sodium"));
    }

    #[tokio::test]
    async fn idle_recipe_request_proposes_recipe_search() {
        let generator = TemplateGenerator::new();
        let state = state_in(ConversationMode::Idle, None);
        let reply = generator.generate(&state, "any dinner ideas?").await.unwrap();
        assert_eq!(reply.proposed_mode, Some(ConversationMode::RecipeSearch));
        assert_eq!(reply.proposed_step.as_deref(), Some("showing_results"));
        assert!(!reply.reply_text.is_empty());
    }

    #[tokio::test]
    async fn question_proposes_free_qa() {
        let generator = TemplateGenerator::new();
        let state = state_in(ConversationMode::Idle, None);
        let reply = generator
            .generate(&state, "is olive oil ok at high heat?")
            .await
            .unwrap();
        assert_eq!(reply.proposed_mode, Some(ConversationMode::FreeQa));
    }

    #[tokio::test]
    async fn unclassifiable_text_asks_for_clarification() {
        let generator = TemplateGenerator::new();
        let state = state_in(ConversationMode::Idle, None);
        let reply = generator.generate(&state, "banana").await.unwrap();
        assert_eq!(
            reply.proposed_mode,
            Some(ConversationMode::AwaitingClarification)
        );
    }

    #[tokio::test]
    async fn onboarding_walks_steps_in_order() {
        let generator = TemplateGenerator::new();

        let state = state_in(ConversationMode::Onboarding, Some(STEP_ASK_RESTRICTIONS));
        let reply = generator.generate(&state, "no nuts").await.unwrap();
        assert_eq!(reply.proposed_step.as_deref(), Some(STEP_ASK_TASTE));
        assert_eq!(reply.proposed_mode, None);

        let state = state_in(ConversationMode::Onboarding, Some(STEP_ASK_GOALS));
        let reply = generator.generate(&state, "quick meals").await.unwrap();
        assert_eq!(reply.proposed_mode, Some(ConversationMode::Idle));
        assert_eq!(reply.context_delta["onboarding_completed"], true);
    }

    #[tokio::test]
    async fn onboarding_with_unknown_step_restarts() {
        let generator = TemplateGenerator::new();
        let state = state_in(ConversationMode::Onboarding, Some("bogus_step"));
        let reply = generator.generate(&state, "hello").await.unwrap();
        assert_eq!(reply.proposed_step.as_deref(), Some(STEP_ASK_RESTRICTIONS));
    }
}
