use serde_json::{Value, json};

use crate::common::{TestApp, routes};

/// Two students on one problem: alice submits a passing solution, bob a buggy
/// one. Returns the challenge id once peer review has started.
pub(crate) struct ReviewFixture {
    pub app: TestApp,
    pub teacher: String,
    pub alice: String,
    pub bob: String,
    pub challenge_id: i32,
}

pub(crate) async fn run_to_peer_review() -> ReviewFixture {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("tina").await;
    let alice = app.create_student("alice").await;
    let bob = app.create_student("bob").await;
    let ms = app.create_ready_match_setting(&teacher, "Sum").await;
    let challenge_id = app.create_challenge(&teacher, "Week 1", 30, &[ms]).await;

    for token in [&alice, &bob] {
        let joined = app
            .post_with_token(&routes::challenge_action(challenge_id, "join"), &json!({}), token)
            .await;
        assert_eq!(joined.status, 200, "{}", joined.text);
    }
    app.phase(challenge_id, "assign", &teacher).await;
    app.phase(challenge_id, "start", &teacher).await;

    let alice_match = app.my_match_id(challenge_id, &alice).await;
    let bob_match = app.my_match_id(challenge_id, &bob).await;
    assert_eq!(app.submit(alice_match, "print(a + b)", &alice).await.status, 201);
    assert_eq!(app.submit(bob_match, "print(a - b) # BUG", &bob).await.status, 201);

    app.phase(challenge_id, "end-coding", &teacher).await;
    let started = app.phase(challenge_id, "peer-review/start", &teacher).await;
    assert_eq!(started.body["data"]["assignmentsCreated"], 2);

    ReviewFixture {
        app,
        teacher,
        alice,
        bob,
        challenge_id,
    }
}

async fn only_assignment(f: &ReviewFixture, token: &str) -> Value {
    let res = f
        .app
        .get_with_token(&routes::challenge_action(f.challenge_id, "peer-reviews"), token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let list = res.body["data"].as_array().expect("assignment list").clone();
    assert_eq!(list.len(), 1);
    list[0].clone()
}

fn assignment_id(assignment: &Value) -> i32 {
    assignment["id"].as_i64().expect("assignment id") as i32
}

mod voting {
    use super::*;

    #[tokio::test]
    async fn reviewers_see_the_other_submission() {
        let f = run_to_peer_review().await;

        let for_alice = only_assignment(&f, &f.alice).await;
        let for_bob = only_assignment(&f, &f.bob).await;

        assert!(for_alice["code"].as_str().unwrap().contains("BUG"));
        assert!(!for_bob["code"].as_str().unwrap().contains("BUG"));
        assert!(for_alice["vote"].is_null());
    }

    #[tokio::test]
    async fn proven_bug_is_recorded_once() {
        let f = run_to_peer_review().await;
        let id = assignment_id(&only_assignment(&f, &f.alice).await);
        let vote = json!({
            "vote": "incorrect",
            "testCaseInput": "[1,2]",
            "expectedOutput": "[3]",
        });

        let first = f.app.post_with_token(&routes::vote(id), &vote, &f.alice).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["data"]["isBugProven"], true);
        assert_eq!(first.body["data"]["alreadyVoted"], false);

        let again = f
            .app
            .post_with_token(&routes::vote(id), &json!({"vote": "correct"}), &f.alice)
            .await;
        assert_eq!(again.status, 200);
        assert_eq!(again.body["data"]["alreadyVoted"], true);
        assert_eq!(again.body["data"]["vote"], "incorrect");
    }

    #[tokio::test]
    async fn incorrect_vote_needs_array_evidence() {
        let f = run_to_peer_review().await;
        let id = assignment_id(&only_assignment(&f, &f.alice).await);

        let res = f
            .app
            .post_with_token(
                &routes::vote(id),
                &json!({"vote": "incorrect", "testCaseInput": "1 2", "expectedOutput": "[3]"}),
                &f.alice,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_TEST_CASE");
    }

    #[tokio::test]
    async fn only_the_assigned_reviewer_may_vote() {
        let f = run_to_peer_review().await;
        let id = assignment_id(&only_assignment(&f, &f.alice).await);

        let res = f
            .app
            .post_with_token(&routes::vote(id), &json!({"vote": "correct"}), &f.bob)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn reviewer_check_precedes_vote_validation() {
        let f = run_to_peer_review().await;
        let id = assignment_id(&only_assignment(&f, &f.alice).await);

        let bad_value = f
            .app
            .post_with_token(&routes::vote(id), &json!({"vote": "maybe"}), &f.bob)
            .await;
        assert_eq!(bad_value.status, 403, "{}", bad_value.text);

        let bad_evidence = f
            .app
            .post_with_token(
                &routes::vote(id),
                &json!({"vote": "incorrect", "testCaseInput": "1 2"}),
                &f.bob,
            )
            .await;
        assert_eq!(bad_evidence.status, 403, "{}", bad_evidence.text);

        let unknown = f
            .app
            .post_with_token(&routes::vote(999_999), &json!({"vote": "maybe"}), &f.alice)
            .await;
        assert_eq!(unknown.status, 404, "{}", unknown.text);
    }

    #[tokio::test]
    async fn voting_closes_with_the_review_phase() {
        let f = run_to_peer_review().await;
        let id = assignment_id(&only_assignment(&f, &f.alice).await);
        f.app
            .phase(f.challenge_id, "peer-review/end", &f.teacher)
            .await;

        let res = f
            .app
            .post_with_token(&routes::vote(id), &json!({"vote": "abstain"}), &f.alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_PHASE");
    }
}

mod finalization {
    use super::*;

    #[tokio::test]
    async fn requires_ended_review_unless_early() {
        let f = run_to_peer_review().await;

        let blocked = f
            .app
            .post_with_token(
                routes::FINALIZE,
                &json!({"challengeId": f.challenge_id}),
                &f.teacher,
            )
            .await;
        assert_eq!(blocked.status, 409, "{}", blocked.text);
        assert_eq!(blocked.body["code"], "INVALID_PHASE");

        let untouched = f
            .app
            .get_with_token(&routes::challenge(f.challenge_id), &f.teacher)
            .await;
        assert_eq!(untouched.body["data"]["status"], "started_phase_two");
        assert_eq!(untouched.body["data"]["scoringStatus"], "pending");

        let early = f
            .app
            .post_with_token(
                routes::FINALIZE,
                &json!({"challengeId": f.challenge_id, "allowEarly": true}),
                &f.teacher,
            )
            .await;
        assert_eq!(early.status, 200, "{}", early.text);

        let challenge = f
            .app
            .get_with_token(&routes::challenge(f.challenge_id), &f.teacher)
            .await;
        assert_eq!(challenge.body["data"]["status"], "ended_phase_two");
        assert_eq!(challenge.body["data"]["scoringStatus"], "completed");
    }

    #[tokio::test]
    async fn awards_badges_once() {
        let f = run_to_peer_review().await;
        let alice_task = assignment_id(&only_assignment(&f, &f.alice).await);
        let bob_task = assignment_id(&only_assignment(&f, &f.bob).await);
        f.app
            .post_with_token(
                &routes::vote(alice_task),
                &json!({"vote": "incorrect", "testCaseInput": "[1,2]", "expectedOutput": "[3]"}),
                &f.alice,
            )
            .await;
        f.app
            .post_with_token(&routes::vote(bob_task), &json!({"vote": "correct"}), &f.bob)
            .await;
        f.app
            .phase(f.challenge_id, "peer-review/end", &f.teacher)
            .await;

        let body = json!({"challengeId": f.challenge_id});
        let first = f
            .app
            .post_with_token(routes::FINALIZE, &body, &f.teacher)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["data"]["finalized"], true);

        let results = first.body["data"]["badgeResults"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        let earned: Vec<&str> = results
            .iter()
            .flat_map(|r| r["newBadges"].as_array().unwrap())
            .map(|b| b["key"].as_str().unwrap())
            .collect();
        assert!(earned.contains(&"challenge_1"));
        assert!(earned.contains(&"review_1"));

        let second = f
            .app
            .post_with_token(routes::FINALIZE, &body, &f.teacher)
            .await;
        assert_eq!(second.status, 200, "{}", second.text);
        let repeated: usize = second.body["data"]["badgeResults"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["newBadges"].as_array().unwrap().len())
            .sum();
        assert_eq!(repeated, 0);
    }

    #[tokio::test]
    async fn rejects_missing_and_unknown_challenges() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;

        let missing = app
            .post_with_token(routes::FINALIZE, &json!({}), &teacher)
            .await;
        assert_eq!(missing.status, 400);

        let unknown = app
            .post_with_token(routes::FINALIZE, &json!({"challengeId": 9999}), &teacher)
            .await;
        assert_eq!(unknown.status, 404);
    }

    #[tokio::test]
    async fn students_cannot_finalize() {
        let f = run_to_peer_review().await;

        let res = f
            .app
            .post_with_token(
                routes::FINALIZE,
                &json!({"challengeId": f.challenge_id, "allowEarly": true}),
                &f.alice,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}
