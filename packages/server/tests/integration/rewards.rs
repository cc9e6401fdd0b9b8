use serde_json::json;

use crate::common::{TestApp, routes};
use crate::peer_review::run_to_peer_review;

#[tokio::test]
async fn rules_are_public() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::RULES).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let badges = &res.body["data"]["badges"];
    assert_eq!(badges["challenge_milestone"].as_array().unwrap().len(), 5);
    assert!(badges["review_milestone"].is_array());
    assert!(badges["review_quality"].is_array());

    let ranks: Vec<i64> = res.body["data"]["titles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["rank"].as_i64().unwrap())
        .collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn fresh_student_profile_is_empty() {
    let app = TestApp::spawn().await;
    let alice = app.create_student("alice").await;

    let res = app.get_with_token(routes::MY_PROFILE, &alice).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["stats"]["totalChallenges"], 0);
    assert_eq!(res.body["data"]["badges"].as_array().unwrap().len(), 0);
    assert_eq!(res.body["data"]["nextTitle"]["rank"], 1);
}

#[tokio::test]
async fn teachers_have_no_profile() {
    let app = TestApp::spawn().await;
    let teacher = app.create_teacher("tina").await;

    let res = app.get_with_token(routes::MY_PROFILE, &teacher).await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn finalization_shows_up_in_the_profile() {
    let f = run_to_peer_review().await;
    let done = f
        .app
        .post_with_token(
            routes::FINALIZE,
            &json!({"challengeId": f.challenge_id, "allowEarly": true}),
            &f.teacher,
        )
        .await;
    assert_eq!(done.status, 200, "{}", done.text);

    let res = f.app.get_with_token(routes::MY_PROFILE, &f.alice).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["stats"]["totalChallenges"], 1);
    assert_eq!(res.body["data"]["currentTitle"]["rank"], 1);
    let keys: Vec<&str> = res.body["data"]["badges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["badge"]["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"challenge_1"));
}
