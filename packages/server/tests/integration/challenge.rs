use serde_json::json;

use crate::common::{TestApp, routes};

mod catalog {
    use super::*;

    #[tokio::test]
    async fn students_cannot_create_challenges() {
        let app = TestApp::spawn().await;
        let student = app.create_student("alice").await;

        let res = app
            .post_with_token(
                routes::CHALLENGES,
                &json!({
                    "title": "Week 1",
                    "duration": 30,
                    "allowedNumberOfReview": 2,
                    "startDatetime": "2030-01-01T10:00:00Z",
                }),
                &student,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn assignment_skips_draft_problems() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let alice = app.create_student("alice").await;
        let draft = app
            .post_with_token(
                routes::MATCH_SETTINGS,
                &json!({
                    "problemTitle": "Draft",
                    "problemDescription": "d",
                    "referenceSolution": "s",
                    "publicTests": [{"input": "[1]", "output": "[1]"}],
                }),
                &teacher,
            )
            .await;
        assert_eq!(draft.status, 201, "{}", draft.text);
        assert_eq!(draft.body["data"]["status"], "draft");

        let id = app
            .create_challenge(&teacher, "Week 1", 30, &[draft.id()])
            .await;
        app.post_with_token(&routes::challenge_action(id, "join"), &json!({}), &alice)
            .await;

        let res = app
            .post_with_token(&routes::challenge_action(id, "assign"), &json!({}), &teacher)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn students_only_see_public_or_joined_challenges() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let student = app.create_student("alice").await;

        let public = app.create_challenge(&teacher, "Open", 30, &[]).await;
        let hidden = app
            .post_with_token(
                routes::CHALLENGES,
                &json!({
                    "title": "Hidden",
                    "duration": 30,
                    "allowedNumberOfReview": 2,
                    "startDatetime": "2030-01-01T10:00:00Z",
                    "status": "private",
                }),
                &teacher,
            )
            .await
            .id();

        let listed = app.get_with_token(routes::CHALLENGES, &student).await;
        assert_eq!(listed.status, 200);
        let ids: Vec<i64> = listed.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert!(ids.contains(&(public as i64)));
        assert!(!ids.contains(&(hidden as i64)));

        let direct = app.get_with_token(&routes::challenge(hidden), &student).await;
        assert_eq!(direct.status, 404);

        let staff_view = app.get_with_token(routes::CHALLENGES, &teacher).await;
        assert_eq!(staff_view.body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_titles_conflict() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        app.create_challenge(&teacher, "Week 1", 30, &[]).await;

        let res = app
            .post_with_token(
                routes::CHALLENGES,
                &json!({
                    "title": "Week 1",
                    "duration": 30,
                    "allowedNumberOfReview": 2,
                    "startDatetime": "2030-01-01T10:00:00Z",
                }),
                &teacher,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod enrollment {
    use super::*;

    #[tokio::test]
    async fn joining_twice_is_idempotent() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let student = app.create_student("alice").await;
        let id = app.create_challenge(&teacher, "Week 1", 30, &[]).await;

        let first = app
            .post_with_token(&routes::challenge_action(id, "join"), &json!({}), &student)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["data"]["alreadyJoined"], false);

        let second = app
            .post_with_token(&routes::challenge_action(id, "join"), &json!({}), &student)
            .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["data"]["alreadyJoined"], true);

        let detail = app.get_with_token(&routes::challenge(id), &student).await;
        assert_eq!(detail.body["data"]["participantCount"], 1);
        assert_eq!(detail.body["data"]["joined"], true);
    }

    #[tokio::test]
    async fn private_challenges_reject_self_join() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let student = app.create_student("alice").await;
        let id = app
            .post_with_token(
                routes::CHALLENGES,
                &json!({
                    "title": "Invite only",
                    "duration": 30,
                    "allowedNumberOfReview": 2,
                    "startDatetime": "2030-01-01T10:00:00Z",
                    "status": "private",
                }),
                &teacher,
            )
            .await
            .id();

        let res = app
            .post_with_token(&routes::challenge_action(id, "join"), &json!({}), &student)
            .await;

        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.body["code"], "INVALID_PHASE");
    }

    #[tokio::test]
    async fn joining_closes_once_matches_are_assigned() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let alice = app.create_student("alice").await;
        let bob = app.create_student("bob").await;
        let ms = app.create_ready_match_setting(&teacher, "Sum").await;
        let id = app.create_challenge(&teacher, "Week 1", 30, &[ms]).await;

        app.post_with_token(&routes::challenge_action(id, "join"), &json!({}), &alice)
            .await;
        app.phase(id, "assign", &teacher).await;

        let late = app
            .post_with_token(&routes::challenge_action(id, "join"), &json!({}), &bob)
            .await;
        assert_eq!(late.status, 409);
        assert_eq!(late.body["code"], "INVALID_PHASE");
    }
}

mod phases {
    use super::*;

    #[tokio::test]
    async fn coding_cannot_start_before_assignment() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let id = app.create_challenge(&teacher, "Week 1", 30, &[]).await;

        let res = app
            .post_with_token(&routes::challenge_action(id, "start"), &json!({}), &teacher)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_PHASE");
    }

    #[tokio::test]
    async fn assign_without_participants_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let ms = app.create_ready_match_setting(&teacher, "Sum").await;
        let id = app.create_challenge(&teacher, "Week 1", 30, &[ms]).await;

        let res = app
            .post_with_token(&routes::challenge_action(id, "assign"), &json!({}), &teacher)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
    }

    #[tokio::test]
    async fn submissions_follow_the_coding_phase() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let alice = app.create_student("alice").await;
        let ms = app.create_ready_match_setting(&teacher, "Sum").await;
        let id = app.create_challenge(&teacher, "Week 1", 30, &[ms]).await;
        app.post_with_token(&routes::challenge_action(id, "join"), &json!({}), &alice)
            .await;

        let assigned = app.phase(id, "assign", &teacher).await;
        assert_eq!(assigned.body["data"]["matchesCreated"], 1);
        let match_id = app.my_match_id(id, &alice).await;

        let early = app.submit(match_id, "print(sum)", &alice).await;
        assert_eq!(early.status, 409);

        app.phase(id, "start", &teacher).await;

        let wrong = app.submit(match_id, "BUG", &alice).await;
        assert_eq!(wrong.status, 201, "{}", wrong.text);
        assert_eq!(wrong.body["data"]["status"], "wrong");

        let good = app.submit(match_id, "print(sum)", &alice).await;
        assert_eq!(good.status, 201);
        assert_eq!(good.body["data"]["status"], "probably_correct");
        assert_eq!(good.body["data"]["isFinal"], true);

        let first = app
            .get_with_token(&format!("{}/{}", routes::SUBMISSIONS, wrong.id()), &alice)
            .await;
        assert_eq!(first.body["data"]["isFinal"], false);

        app.phase(id, "end-coding", &teacher).await;
        let late = app.submit(match_id, "print(sum)", &alice).await;
        assert_eq!(late.status, 409);
    }

    #[tokio::test]
    async fn other_students_cannot_submit_to_a_match() {
        let app = TestApp::spawn().await;
        let teacher = app.create_teacher("tina").await;
        let alice = app.create_student("alice").await;
        let mallory = app.create_student("mallory").await;
        let ms = app.create_ready_match_setting(&teacher, "Sum").await;
        let id = app.create_challenge(&teacher, "Week 1", 30, &[ms]).await;
        app.post_with_token(&routes::challenge_action(id, "join"), &json!({}), &alice)
            .await;
        app.phase(id, "assign", &teacher).await;
        app.phase(id, "start", &teacher).await;
        let match_id = app.my_match_id(id, &alice).await;

        let res = app.submit(match_id, "print(sum)", &mallory).await;

        assert_eq!(res.status, 403);
    }
}
