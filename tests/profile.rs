//! Profile Tests
//!
//! Covers the profile feed and editing one's own profile.

mod common;

use axum::http::StatusCode;
use common::{app, PostFixture};
use time::{Duration, OffsetDateTime};

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let app = app().await;

    let resp = app.get("/profile/nobody_here/", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_lists_every_post_by_the_author() {
    let app = app().await;
    let author = app.create_user("pf_all").await;
    let other = app.create_user("pf_all_other").await;
    let category = app.create_category("pf-all", true).await;

    app.create_post(author.id, category.id, "Profile public").await;
    let mut draft = PostFixture::visible("Profile draft", author.id, category.id);
    draft.is_published = false;
    app.create_post_with(draft).await;
    let mut scheduled = PostFixture::visible("Profile scheduled", author.id, category.id);
    scheduled.pub_date = OffsetDateTime::now_utc() + Duration::days(2);
    app.create_post_with(scheduled).await;
    app.create_post(other.id, category.id, "Profile someone else").await;

    let resp = app
        .get(&format!("/profile/{}/", author.username), None)
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Test User pf_all"));
    assert!(resp.body.contains("Profile public"));
    assert!(resp.body.contains("Profile draft"));
    assert!(resp.body.contains("Profile scheduled"));
    assert!(!resp.body.contains("Profile someone else"));
}

#[tokio::test]
async fn only_owner_sees_profile_edit_link() {
    let app = app().await;
    let owner = app.create_user("pf_owner").await;
    let visitor = app.create_user("pf_visitor").await;
    let path = format!("/profile/{}/", owner.username);

    let own = app.get(&path, Some(&owner.cookie)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert!(own.body.contains("href=\"/profile_edit/\""));

    let visit = app.get(&path, Some(&visitor.cookie)).await;
    assert_eq!(visit.status, StatusCode::OK);
    assert!(!visit.body.contains("href=\"/profile_edit/\""));
}

#[tokio::test]
async fn edit_profile_updates_own_record() {
    let app = app().await;
    let user = app.create_user("pf_edit").await;

    let page = app.get("/profile_edit/", Some(&user.cookie)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(&user.username));

    let resp = app
        .post_form(
            "/profile_edit/",
            &[
                ("username", "pf_edit_renamed"),
                ("first_name", "Anna"),
                ("last_name", "Karenina"),
                ("email", "anna@example.com"),
                ("is_superuser", "true"),
            ],
            Some(&user.cookie),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), "/profile/pf_edit_renamed/");

    let (username, first_name, email): (String, String, String) =
        sqlx::query_as("SELECT username, first_name, email FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert_eq!(username, "pf_edit_renamed");
    assert_eq!(first_name, "Anna");
    assert_eq!(email, "anna@example.com");

    // The session follows the user id, so it survives the rename.
    let profile = app.get("/profile/pf_edit_renamed/", Some(&user.cookie)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.body.contains("Anna Karenina"));
}

#[tokio::test]
async fn edit_profile_rejects_taken_username() {
    let app = app().await;
    let user = app.create_user("pf_taken").await;
    let other = app.create_user("pf_taken_other").await;

    let resp = app
        .post_form(
            "/profile_edit/",
            &[("username", other.username.as_str()), ("email", "")],
            Some(&user.cookie),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("A user with that username already exists."));

    let username: String = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(username, user.username);
}

#[tokio::test]
async fn edit_profile_validates_fields() {
    let app = app().await;
    let user = app.create_user("pf_invalid").await;

    let resp = app
        .post_form(
            "/profile_edit/",
            &[("username", ""), ("email", "not-an-email")],
            Some(&user.cookie),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("This field is required."));
    assert!(resp.body.contains("Enter a valid email address."));
}

#[tokio::test]
async fn profile_feed_is_paginated_newest_first() {
    let app = app().await;
    let author = app.create_user("pf_pages").await;
    let category = app.create_category("pf-pages", true).await;
    let now = OffsetDateTime::now_utc();
    for n in 0..12 {
        let mut post = PostFixture::visible(&format!("Profile paged {}", n), author.id, category.id);
        post.pub_date = now - Duration::hours(n + 1);
        post.is_published = n % 2 == 0;
        app.create_post_with(post).await;
    }
    let path = format!("/profile/{}/", author.username);

    let first = app.get(&path, None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body.matches("class=\"post-card\"").count(), 10);
    assert!(first.body.contains("Page 1 of 2"));
    let newest = first.body.find(">Profile paged 0<").unwrap();
    let next = first.body.find(">Profile paged 1<").unwrap();
    assert!(newest < next);

    let last = app.get(&format!("{}?page=last", path), None).await;
    assert_eq!(last.status, StatusCode::OK);
    assert_eq!(last.body.matches("class=\"post-card\"").count(), 2);
    assert!(last.body.contains(">Profile paged 11<"));

    for page in ["0", "3", "abc"] {
        let resp = app.get(&format!("{}?page={}", path, page), None).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND, "page={}", page);
    }
}
