//! Invite API integration tests
//!
//! Share-link lifecycle through the full router: creation by the owner,
//! validation and reads by anyone holding the token, deactivation, expiry,
//! and the owner-or-public rule on the normal read path.

#[macro_use]
mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{id_of, TestApp, TestUser};

struct Fixture {
    app: TestApp,
    owner: TestUser,
    guest: TestUser,
    /// Owner's private note
    note: i64,
}

async fn setup() -> Fixture {
    let app = TestApp::new();
    let owner = app.signup("ayse").await;
    let guest = app.signup("burak").await;
    let note = id_of(&app.create_note(&owner, "Linear Algebra week 3", false).await);
    Fixture {
        app,
        owner,
        guest,
        note,
    }
}

async fn create_note_invite(f: &Fixture) -> Value {
    assert_status!(
        f.app
            .request(
                Method::POST,
                &format!("/api/v1/notes/{}/invites", f.note),
                Some(&f.owner.token),
                None,
            )
            .await,
        StatusCode::CREATED
    )
}

fn token_of(invite: &Value) -> String {
    invite["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn test_private_note_shared_through_invite() {
    let f = setup().await;
    let (app, owner, guest) = (&f.app, &f.owner, &f.guest);

    let invite = create_note_invite(&f).await;
    assert_eq!(invite["contentId"], f.note);
    assert_eq!(invite["type"], "note");
    assert_eq!(invite["isActive"], true);
    assert_eq!(invite["createdBy"], owner.id);
    assert_eq!(invite["expiresAt"], "2025-05-08T09:00:00Z");
    assert_eq!(token_of(&invite).len(), 43);

    let token = token_of(&invite);
    let body = assert_status!(
        app.get(&format!("/api/v1/invites/{}", token), Some(&guest.token)).await,
        StatusCode::OK
    );
    assert_eq!(
        body,
        json!({
            "valid": true,
            "contentId": f.note,
            "type": "note",
            "expiresAt": "2025-05-08T09:00:00Z",
        })
    );

    // The invite does not open the normal read path
    assert_api_error!(
        app.get(&format!("/api/v1/notes/{}", f.note), Some(&guest.token)).await,
        StatusCode::FORBIDDEN
    );
    assert_api_error!(
        app.get(&format!("/api/v1/notes/{}", f.note), None).await,
        StatusCode::FORBIDDEN
    );

    let note = assert_status!(
        app.get(&format!("/api/v1/notes/{}", f.note), Some(&owner.token)).await,
        StatusCode::OK
    );
    assert_eq!(note["title"], "Linear Algebra week 3");

    // Reading through the invite needs no account
    let note = assert_status!(
        app.get(&format!("/api/v1/notes/invite/{}", token), None).await,
        StatusCode::OK
    );
    assert_eq!(note["id"], f.note);
    assert_eq!(note["userId"], owner.id);
    assert_eq!(note["body"], "Gaussian elimination, pivots");
}

#[tokio::test]
async fn test_validation_does_not_leak_token_or_creator() {
    let f = setup().await;
    let token = token_of(&create_note_invite(&f).await);

    let body = assert_status!(
        f.app.get(&format!("/api/v1/invites/{}", token), None).await,
        StatusCode::OK
    );
    let rendered = body.to_string();
    assert!(!rendered.contains(&token));
    assert!(body.get("createdBy").is_none());
    assert!(body.get("invite").is_none());
    assert!(body.get("isActive").is_none());
}

#[tokio::test]
async fn test_token_from_header() {
    let f = setup().await;
    let token = token_of(&create_note_invite(&f).await);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/invites")
        .header("X-Invite-Token", token.as_str())
        .body(Body::empty())
        .unwrap();
    let body = assert_status!(f.app.send(request).await, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/notes/invite")
        .header("X-Invite-Token", token.as_str())
        .body(Body::empty())
        .unwrap();
    let note = assert_status!(f.app.send(request).await, StatusCode::OK);
    assert_eq!(note["id"], f.note);

    assert_api_error!(f.app.get("/api/v1/invites", None).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invite_read_with_wrong_content_type() {
    let f = setup().await;
    let token = token_of(&create_note_invite(&f).await);

    assert_api_error!(
        f.app.get(&format!("/api/v1/pdfs/invite/{}", token), None).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_pdf_invite() {
    let f = setup().await;
    let pdf = assert_status!(
        f.app
            .upload_pdf(
                Some(&f.owner.token),
                &[("title", "Lecture slides"), ("description", "week 3")],
                Some(&b"%PDF-1.4 slides"[..]),
            )
            .await,
        StatusCode::CREATED
    );

    let invite = assert_status!(
        f.app
            .request(
                Method::POST,
                &format!("/api/v1/pdfs/{}/invites", id_of(&pdf)),
                Some(&f.owner.token),
                None,
            )
            .await,
        StatusCode::CREATED
    );
    assert_eq!(invite["type"], "pdf");

    let pdf = assert_status!(
        f.app.get(&format!("/api/v1/pdfs/invite/{}", token_of(&invite)), None).await,
        StatusCode::OK
    );
    assert_eq!(pdf["title"], "Lecture slides");
    assert_eq!(pdf["type"], "pdf");
    assert_eq!(pdf["fileSize"], 15);
}

#[tokio::test]
async fn test_create_invite_rules() {
    let f = setup().await;
    let uri = format!("/api/v1/notes/{}/invites", f.note);

    assert_api_error!(
        f.app.request(Method::POST, &uri, None, None).await,
        StatusCode::UNAUTHORIZED
    );
    assert_api_error!(
        f.app.request(Method::POST, &uri, Some(&f.guest.token), None).await,
        StatusCode::FORBIDDEN
    );
    assert_api_error!(
        f.app
            .request(Method::POST, "/api/v1/notes/99/invites", Some(&f.owner.token), None)
            .await,
        StatusCode::NOT_FOUND
    );

    let invite = assert_status!(
        f.app
            .post(
                &uri,
                Some(&f.owner.token),
                json!({ "expiresAt": "2025-05-02T09:00:00Z" }),
            )
            .await,
        StatusCode::CREATED
    );
    assert_eq!(invite["expiresAt"], "2025-05-02T09:00:00Z");
}

#[tokio::test]
async fn test_list_invites_owner_only() {
    let f = setup().await;
    let first = create_note_invite(&f).await;
    f.app.clock.advance(chrono::Duration::minutes(1));
    let second = create_note_invite(&f).await;
    let uri = format!("/api/v1/notes/{}/invites", f.note);

    let listed = assert_status!(f.app.get(&uri, Some(&f.owner.token)).await, StatusCode::OK);
    let listed = listed.as_array().expect("array");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], second["id"]);
    assert_eq!(listed[1]["id"], first["id"]);

    assert_api_error!(
        f.app.get(&uri, Some(&f.guest.token)).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_deactivate_invite() {
    let f = setup().await;
    let invite = create_note_invite(&f).await;
    let uri = format!("/api/v1/invites/{}", invite["id"]);

    assert_api_error!(
        f.app.request(Method::DELETE, &uri, Some(&f.guest.token), None).await,
        StatusCode::FORBIDDEN
    );
    assert_api_error!(
        f.app.request(Method::DELETE, &uri, None, None).await,
        StatusCode::UNAUTHORIZED
    );

    let body = assert_status!(
        f.app.request(Method::DELETE, &uri, Some(&f.owner.token), None).await,
        StatusCode::OK
    );
    assert_eq!(body["isActive"], false);

    // Deactivating again is a no-op
    assert_status!(
        f.app.request(Method::DELETE, &uri, Some(&f.owner.token), None).await,
        StatusCode::OK
    );

    assert_api_error!(
        f.app.get(&format!("/api/v1/invites/{}", token_of(&invite)), None).await,
        StatusCode::FORBIDDEN
    );
    assert_api_error!(
        f.app
            .request(Method::DELETE, "/api/v1/invites/999", Some(&f.owner.token), None)
            .await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_expired_invite() {
    let f = setup().await;
    let invite = assert_status!(
        f.app
            .post(
                &format!("/api/v1/notes/{}/invites", f.note),
                Some(&f.owner.token),
                json!({ "expiresAt": "2025-05-01T10:00:00Z" }),
            )
            .await,
        StatusCode::CREATED
    );
    let uri = format!("/api/v1/invites/{}", token_of(&invite));

    f.app.clock.advance(chrono::Duration::minutes(59));
    assert_status!(f.app.get(&uri, None).await, StatusCode::OK);

    f.app.clock.advance(chrono::Duration::minutes(1));
    assert_api_error!(f.app.get(&uri, None).await, StatusCode::FORBIDDEN);
    assert_api_error!(
        f.app
            .get(&format!("/api/v1/notes/invite/{}", token_of(&invite)), None)
            .await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_unknown_token() {
    let f = setup().await;
    assert_api_error!(
        f.app.get("/api/v1/invites/no-such-token", None).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_deleting_note_ends_its_invites() {
    let f = setup().await;
    let token = token_of(&create_note_invite(&f).await);
    let note_uri = format!("/api/v1/notes/{}", f.note);

    assert_status!(
        f.app.get(&format!("/api/v1/notes/invite/{}", token), None).await,
        StatusCode::OK
    );

    // Only the owner may delete
    assert_api_error!(
        f.app.request(Method::DELETE, &note_uri, Some(&f.guest.token), None).await,
        StatusCode::FORBIDDEN
    );
    assert_api_error!(
        f.app.request(Method::DELETE, &note_uri, None, None).await,
        StatusCode::UNAUTHORIZED
    );

    let body = assert_status!(
        f.app.request(Method::DELETE, &note_uri, Some(&f.owner.token), None).await,
        StatusCode::OK
    );
    assert_eq!(body["message"], "note deleted");

    assert_api_error!(f.app.get(&note_uri, Some(&f.owner.token)).await, StatusCode::NOT_FOUND);
    assert_api_error!(
        f.app.get(&format!("/api/v1/notes/invite/{}", token), None).await,
        StatusCode::NOT_FOUND
    );
    assert_api_error!(
        f.app.get(&format!("/api/v1/invites/{}", token), None).await,
        StatusCode::NOT_FOUND
    );
    assert_api_error!(
        f.app.request(Method::DELETE, &note_uri, Some(&f.owner.token), None).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_deleting_pdf_removes_file_and_invites() {
    let f = setup().await;
    let pdf = assert_status!(
        f.app
            .upload_pdf(Some(&f.owner.token), &[("title", "Slides")], Some(&b"%PDF"[..]))
            .await,
        StatusCode::CREATED
    );
    assert_eq!(f.app.files.len(), 1);
    let pdf_uri = format!("/api/v1/pdfs/{}", id_of(&pdf));

    let invite = assert_status!(
        f.app
            .request(Method::POST, &format!("{}/invites", pdf_uri), Some(&f.owner.token), None)
            .await,
        StatusCode::CREATED
    );

    assert_status!(
        f.app.request(Method::DELETE, &pdf_uri, Some(&f.owner.token), None).await,
        StatusCode::OK
    );
    assert!(f.app.files.is_empty());
    assert_api_error!(
        f.app
            .get(&format!("/api/v1/pdfs/invite/{}", token_of(&invite)), None)
            .await,
        StatusCode::NOT_FOUND
    );

    // The note with the same id is untouched
    assert_status!(
        f.app.get(&format!("/api/v1/notes/{}", f.note), Some(&f.owner.token)).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_public_note_readable_by_anyone() {
    let f = setup().await;
    let public = id_of(&f.app.create_note(&f.owner, "Syllabus", true).await);

    let note = assert_status!(
        f.app.get(&format!("/api/v1/notes/{}", public), None).await,
        StatusCode::OK
    );
    assert_eq!(note["isPublic"], true);
    assert_api_error!(f.app.get("/api/v1/notes/12", None).await, StatusCode::NOT_FOUND);
}
