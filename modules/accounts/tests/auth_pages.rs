//! Sign-up, login and logout pages through the real router.

mod common;

use axum::http::{header, StatusCode};
use common::{body_text, cookie_value, rendered};

const STRONG: &str = "c0rrect-h0rse";

#[tokio::test]
async fn signup_page_renders_form_and_view() {
    let app = common::app().await;
    let resp = app.get("/signup/").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let page = rendered(&resp);
    assert_eq!(page.name, "registration/signup.html");
    assert_eq!(page.context["form"]["name"], "SignupForm");
    assert_eq!(page.context["form"]["is_bound"], false);
    assert_eq!(page.context["view"]["name"], "signup");

    let token = cookie_value(&resp, "csrftoken").unwrap();
    assert_eq!(page.context["csrf_token"], token.as_str());

    let body = body_text(resp).await;
    assert!(body.contains("Sign up"));
    assert!(body.contains(&format!("value=\"{token}\"")));
    assert!(!body.contains("Hi there! I should not be on the page."));
}

#[tokio::test]
async fn signup_creates_regular_user_and_redirects_to_login() {
    let app = common::app().await;
    let token = app.csrf_token().await;

    let resp = app
        .post_form(
            "/signup/",
            Some(&token),
            &[
                ("username", "newreader"),
                ("email", "newreader@Example.com"),
                ("password1", STRONG),
                ("password2", STRONG),
            ],
            None,
        )
        .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/accounts/login/");

    let user = app.api.find_by_username("newreader").await.unwrap().unwrap();
    assert_eq!(user.email, "newreader@example.com");
    assert!(user.is_active && !user.is_staff && !user.is_superuser);
    assert!(app.api.check_password(&user, STRONG));
}

#[tokio::test]
async fn invalid_signup_rerenders_with_errors_and_without_passwords() {
    let app = common::app().await;
    let token = app.csrf_token().await;

    let resp = app
        .post_form(
            "/signup/",
            Some(&token),
            &[
                ("username", "newreader"),
                ("email", ""),
                ("password1", STRONG),
                ("password2", "something-else"),
            ],
            None,
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let page = rendered(&resp);
    assert_eq!(page.name, "registration/signup.html");
    assert_eq!(page.context["form"]["is_bound"], true);
    assert_eq!(
        page.context["form"]["fields"][3]["errors"][0],
        "The two password fields didn't match."
    );

    let body = body_text(resp).await;
    assert!(body.contains("value=\"newreader\""));
    assert!(!body.contains(STRONG));
    assert!(app.api.find_by_username("newreader").await.unwrap().is_none());
}

#[tokio::test]
async fn taken_username_is_a_field_error() {
    let app = common::app().await;
    app.api
        .create_user(accounts::NewUser::new("reader", "", STRONG))
        .await
        .unwrap();
    let token = app.csrf_token().await;

    let resp = app
        .post_form(
            "/signup/",
            Some(&token),
            &[
                ("username", "reader"),
                ("password1", STRONG),
                ("password2", STRONG),
            ],
            None,
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let page = rendered(&resp);
    assert_eq!(
        page.context["form"]["fields"][0]["errors"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn simultaneous_signups_never_become_server_errors() {
    let app = common::app().await;
    let token = app.csrf_token().await;
    let fields = [
        ("username", "reader"),
        ("password1", STRONG),
        ("password2", STRONG),
    ];

    let (a, b) = tokio::join!(
        app.post_form("/signup/", Some(&token), &fields, None),
        app.post_form("/signup/", Some(&token), &fields, None),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::SEE_OTHER]);

    let rejected = if a.status() == StatusCode::OK { &a } else { &b };
    assert_eq!(
        rendered(rejected).context["form"]["fields"][0]["errors"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn signup_without_csrf_token_is_forbidden() {
    let app = common::app().await;

    let resp = app
        .post_form(
            "/signup/",
            None,
            &[
                ("username", "newreader"),
                ("password1", STRONG),
                ("password2", STRONG),
            ],
            None,
        )
        .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(rendered(&resp).name, "403.html");
    assert!(app.api.find_by_username("newreader").await.unwrap().is_none());
}

#[tokio::test]
async fn login_page_renders_form() {
    let app = common::app().await;
    let resp = app.get("/accounts/login/").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let page = rendered(&resp);
    assert_eq!(page.name, "registration/login.html");
    assert_eq!(page.context["form"]["name"], "LoginForm");
    assert_eq!(page.context["view"]["name"], "login");
}

#[tokio::test]
async fn login_sets_session_and_logout_clears_it() {
    let app = common::app().await;
    let user = app
        .api
        .create_user(accounts::NewUser::new("reader", "", STRONG))
        .await
        .unwrap();
    let token = app.csrf_token().await;

    let resp = app
        .post_form(
            "/accounts/login/",
            Some(&token),
            &[("username", "reader"), ("password", STRONG)],
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/");

    let key = cookie_value(&resp, "sessionid").expect("session cookie");
    let current = app.api.user_for_session(&key).await.unwrap().unwrap();
    assert_eq!(current.id, user.id);
    assert!(current.last_login.is_some());

    let resp = app
        .post_form("/accounts/logout/", Some(&token), &[], Some(&key))
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(cookie_value(&resp, "sessionid").as_deref(), Some(""));
    assert!(app.api.user_for_session(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn wrong_password_rerenders_login_with_error() {
    let app = common::app().await;
    app.api
        .create_user(accounts::NewUser::new("reader", "", STRONG))
        .await
        .unwrap();
    let token = app.csrf_token().await;

    let resp = app
        .post_form(
            "/accounts/login/",
            Some(&token),
            &[("username", "reader"), ("password", "wrong")],
            None,
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cookie_value(&resp, "sessionid").is_none());
    let body = body_text(resp).await;
    assert!(body.contains("Please enter a correct username and password."));
}

#[tokio::test]
async fn logout_requires_csrf_token() {
    let app = common::app().await;
    let resp = app.post_form("/accounts/logout/", None, &[], None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
