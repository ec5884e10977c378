//! Conversation flow integration tests
//!
//! Drives the orchestrator through full conversations over in-memory
//! collaborators and checks what the user sees and what gets stored.

mod common;

use std::time::Duration;

use planpal_conversations::orchestrator::{
    DEFAULT_GREETING, DISPATCH_APOLOGY, START_INSTRUCTIONS, TURN_APOLOGY,
};
use planpal_conversations::{ChatStateStore, Exchange};
use planpal_llm::mock::MockOutcome;

use crate::common::TestApp;

mod test_scenarios {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_new_conversation_start() {
        let app = TestApp::new();
        app.llm
            .behavior()
            .set_outcome(MockOutcome::Reply("Hi! Looking for insurance?".to_string()));

        app.say(42, "/start").await;

        assert_eq!(app.sender.texts_for(42), vec!["Hi! Looking for insurance?"]);
        assert_eq!(app.step(42).await, 1);
        assert_eq!(app.history_len(42).await, 0);
    }

    #[tokio::test]
    async fn test_engaged_reply_is_recorded() {
        let app = TestApp::new();
        app.say(42, "/start").await;
        app.llm.behavior().set_outcome(MockOutcome::Reply(
            "Great, let's find you a plan.".to_string(),
        ));

        app.say(42, "yes").await;

        assert_eq!(
            app.sender.last_text_for(42).as_deref(),
            Some("Great, let's find you a plan.")
        );
        let state = app.store.find(42).await.unwrap().unwrap();
        assert_eq!(state.step, 1);
        assert_eq!(
            state.history(),
            &[Exchange::new("yes", "Great, let's find you a plan.")]
        );
    }

    #[tokio::test]
    async fn test_fresh_conversation_without_start() {
        let app = TestApp::new();

        app.say(7, "hello").await;

        assert_eq!(app.sender.texts_for(7), vec![START_INSTRUCTIONS]);
        assert_eq!(app.step(7).await, 0);
        assert_eq!(app.history_len(7).await, 0);
    }

    #[tokio::test]
    async fn test_generation_timeout_mid_conversation() {
        let app = TestApp::with_timeout(Duration::from_millis(50));
        app.say(42, "/start").await;
        app.say(42, "yes").await;
        let before = app.history_len(42).await;

        app.llm.behavior().set_outcome(MockOutcome::Hang);
        app.say(42, "more info").await;

        assert_eq!(app.sender.last_text_for(42).as_deref(), Some(TURN_APOLOGY));
        assert_eq!(app.history_len(42).await, before);
        assert_eq!(app.failures.operations(), vec!["generate_reply"]);
    }
}

mod test_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_full_conversation_history_in_order() {
        let app = TestApp::new();

        app.say(1, "hi").await;
        app.say(1, "/start").await;
        for text in ["yes", "family plan", "under 500"] {
            app.say(1, text).await;
        }

        let state = app.store.find(1).await.unwrap().unwrap();
        assert_eq!(state.step, 1);
        let users: Vec<_> = state
            .history()
            .iter()
            .map(|e| e.user_text.as_str())
            .collect();
        assert_eq!(users, vec!["yes", "family plan", "under 500"]);
        // instructions, greeting and three replies
        assert_eq!(app.sender.texts_for(1).len(), 5);
    }

    #[tokio::test]
    async fn test_failed_greeting_still_engages() {
        let app = TestApp::new();
        app.llm.behavior().set_outcome(MockOutcome::Fail);

        app.say(5, "/start").await;
        assert_eq!(app.sender.texts_for(5), vec![DEFAULT_GREETING]);
        assert_eq!(app.step(5).await, 1);

        app.llm.behavior().reset();
        app.say(5, "yes").await;
        assert_eq!(app.history_len(5).await, 1);
    }

    #[tokio::test]
    async fn test_step_never_decreases() {
        let app = TestApp::new();
        let mut last = 0;

        for text in ["hello", "/start", "/start", "yes", "/start"] {
            app.say(3, text).await;
            let step = app.step(3).await;
            assert!(step >= last, "step went from {} to {}", last, step);
            last = step;
        }

        assert_eq!(last, 1);
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let app = TestApp::new();

        app.say(1, "/start").await;
        app.say(2, "hello").await;
        app.say(1, "yes").await;

        assert_eq!(app.step(1).await, 1);
        assert_eq!(app.history_len(1).await, 1);
        assert_eq!(app.step(2).await, 0);
        assert_eq!(app.history_len(2).await, 0);
    }
}

mod test_failures {
    use super::*;

    #[tokio::test]
    async fn test_store_outage_answers_with_apology() {
        let app = TestApp::new();
        app.store.set_available(false);

        app.say(9, "/start").await;

        assert_eq!(app.sender.texts_for(9), vec![DISPATCH_APOLOGY]);
        let reports = app.failures.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context.conversation_id, Some(9));
        assert_eq!(reports[0].context.operation, "dispatch");
    }

    #[tokio::test]
    async fn test_service_recovers_after_outage() {
        let app = TestApp::new();
        app.store.set_available(false);
        app.say(9, "/start").await;

        app.store.set_available(true);
        app.say(9, "/start").await;

        assert_eq!(app.step(9).await, 1);
        assert_eq!(app.sender.texts_for(9).len(), 2);
    }

    #[tokio::test]
    async fn test_user_never_sees_error_detail() {
        let app = TestApp::new();
        app.say(4, "/start").await;
        app.llm.behavior().set_outcome(MockOutcome::Fail);

        app.say(4, "yes").await;

        let last = app.sender.last_text_for(4).unwrap();
        assert_eq!(last, TURN_APOLOGY);
        assert!(!app.failures.reports()[0].message.is_empty());
    }
}

mod test_concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_burst_of_messages_for_one_conversation() {
        let app = TestApp::new();
        app.say(11, "/start").await;
        app.llm.behavior().set_delay_ms(5);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let orchestrator = app.orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .handle_message(planpal_common::InboundMessage::new(
                            11,
                            format!("message {}", i),
                        ))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(app.step(11).await, 1);
        assert_eq!(app.history_len(11).await, 8);
        assert!(app.failures.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_contact_burst_creates_one_record() {
        let app = TestApp::new();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let orchestrator = app.orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .handle_message(planpal_common::InboundMessage::new(12, "hello"))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.step(12).await, 0);
        assert_eq!(app.sender.texts_for(12).len(), 8);
    }
}
