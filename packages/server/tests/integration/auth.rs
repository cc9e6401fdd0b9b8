use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_registers_as_student() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "email": "Alice@Example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["data"]["username"], "alice");
        assert_eq!(res.body["data"]["email"], "alice@example.com");
        assert_eq!(res.body["data"]["role"], "student");
    }

    #[tokio::test]
    async fn taken_username_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_student("alice").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "email": "other@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
        assert_eq!(res.body["success"], false);
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "email": "a@example.com", "password": "short"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_INPUT");
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_student("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn bearer_token_identifies_the_caller() {
        let app = TestApp::spawn().await;
        let token = app.create_student("alice").await;

        let res = app.get_with_token(routes::USERINFO, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"]["username"], "alice");
    }

    #[tokio::test]
    async fn login_cookie_authenticates_until_logout() {
        let app = TestApp::spawn().await;
        app.create_student("alice").await;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let login = client
            .post(app.url(routes::LOGIN))
            .json(&json!({"username": "alice", "password": "securepass"}))
            .send()
            .await
            .unwrap();
        assert_eq!(login.status(), 200);
        assert!(login.headers().contains_key("set-cookie"));

        let me = client.get(app.url(routes::USERINFO)).send().await.unwrap();
        assert_eq!(me.status(), 200);

        let logout = client.post(app.url(routes::LOGOUT)).send().await.unwrap();
        assert_eq!(logout.status(), 200);

        let after = client.get(app.url(routes::USERINFO)).send().await.unwrap();
        assert_eq!(after.status(), 401);
    }

    #[tokio::test]
    async fn missing_and_garbage_tokens_are_distinguished() {
        let app = TestApp::spawn().await;

        let missing = app.get_without_token(routes::USERINFO).await;
        assert_eq!(missing.status, 401);
        assert_eq!(missing.body["code"], "TOKEN_MISSING");

        let garbage = app.get_with_token(routes::USERINFO, "not.a.jwt").await;
        assert_eq!(garbage.status, 401);
        assert_eq!(garbage.body["code"], "TOKEN_INVALID");
    }
}
