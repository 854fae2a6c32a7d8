use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::error::AppError;
use crate::models::{CreatePollRequest, PollResponse, SearchParams, VoteRequest};
use crate::polls::{check_ballot, validate_draft};
use crate::session::CurrentUser;
use crate::state::AppState;

pub async fn list_polls(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<PollResponse>> {
    let polls = match params.q.as_deref() {
        Some(q) => state.polls.search_polls(q).await,
        None => state.polls.fetch_polls().await,
    };
    Json(polls.into_iter().map(PollResponse::from).collect())
}

pub async fn my_polls(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<Vec<PollResponse>>, AppError> {
    let principal = principal.ok_or(AppError::AuthenticationRequired)?;
    let polls = state.polls.polls_created_by(&principal.id).await;
    Ok(Json(polls.into_iter().map(PollResponse::from).collect()))
}

pub async fn create_poll(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(req): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollResponse>), AppError> {
    let draft = validate_draft(req)?;
    let poll = state.polls.create_poll(principal.as_ref(), draft).await?;
    Ok((StatusCode::CREATED, Json(poll.into())))
}

pub async fn get_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PollResponse>, AppError> {
    let poll = state.polls.fetch_poll(&id).await.ok_or(AppError::NotFound)?;
    Ok(Json(poll.into()))
}

/// Settings are enforced here, before the vote reaches the store.
pub async fn submit_vote(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<PollResponse>, AppError> {
    let poll = state.polls.fetch_poll(&id).await.ok_or(AppError::NotFound)?;
    let selected = check_ballot(&poll, principal.as_ref(), Utc::now(), req.option_ids)?;

    state.polls.vote_poll(&poll.id, &selected).await?;

    let updated = state.polls.fetch_poll(&id).await.ok_or(AppError::NotFound)?;
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;

    use crate::store::PollStore;
    use crate::testing::*;

    fn app() -> TestApp {
        test_app(
            StaticAuth::default().with_token("tok-ada", "ada").with_token("tok-bob", "bob"),
            &["/polls", "/polls/create"],
        )
    }

    async fn create(app: &TestApp, token: &str, body: serde_json::Value) -> serde_json::Value {
        let resp = send(&app.router, json_request("POST", "/polls", Some(token), body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    #[tokio::test]
    async fn create_assigns_creator_from_session_not_body() {
        let app = app();
        let poll = create(
            &app,
            "tok-ada",
            json!({
                "question": "Best season?",
                "options": ["Spring", " ", "Autumn"],
                "createdBy": "mallory",
                "settings": { "allowMultiple": true }
            }),
        )
        .await;
        assert_eq!(poll["createdBy"], "ada");
        assert_eq!(poll["author"], "Anonymous");
        assert_eq!(poll["totalVotes"], 0);
        assert_eq!(poll["options"], json!([
            { "id": "1", "text": "Spring", "votes": 0 },
            { "id": "2", "text": "Autumn", "votes": 0 }
        ]));
    }

    #[tokio::test]
    async fn create_with_one_option_is_rejected_without_write() {
        let app = app();
        let resp = send(
            &app.router,
            json_request("POST", "/polls", Some("tok-ada"), json!({ "question": "Q?", "options": ["only", ""] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].as_str().unwrap().contains("at least 2"));
        assert!(app.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_without_session_is_refused_when_path_is_open() {
        let app = test_app(StaticAuth::default(), &[]);
        let resp = send(
            &app.router,
            json_request("POST", "/polls", None, json!({ "question": "Q?", "options": ["a", "b"] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(app.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vote_flow_counts_and_returns_fresh_poll() {
        let app = app();
        let poll = create(&app, "tok-ada", json!({ "question": "A or B?", "options": ["A", "B"] })).await;
        let id = poll["id"].as_str().unwrap();

        let resp = send(
            &app.router,
            json_request("POST", &format!("/polls/{}/vote", id), Some("tok-bob"), json!({ "optionIds": ["1"] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let poll = body_json(resp).await;
        assert_eq!(poll["options"][0]["votes"], 1);
        assert_eq!(poll["options"][1]["votes"], 0);
        assert_eq!(poll["totalVotes"], 1);
    }

    #[tokio::test]
    async fn single_choice_poll_counts_only_first_selection() {
        let app = app();
        let poll = create(&app, "tok-ada", json!({ "question": "Pick", "options": ["A", "B", "C"] })).await;
        let id = poll["id"].as_str().unwrap();
        let resp = send(
            &app.router,
            json_request("POST", &format!("/polls/{}/vote", id), Some("tok-bob"), json!({ "optionIds": ["3", "1"] })),
        )
        .await;
        let poll = body_json(resp).await;
        assert_eq!(poll["options"][2]["votes"], 1);
        assert_eq!(poll["totalVotes"], 1);
    }

    #[tokio::test]
    async fn vote_after_end_date_is_rejected_before_store() {
        let app = app();
        let ended = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let poll = create(
            &app,
            "tok-ada",
            json!({ "question": "Closed?", "options": ["A", "B"], "settings": { "endDate": ended } }),
        )
        .await;
        let id = poll["id"].as_str().unwrap().to_string();

        let resp = send(
            &app.router,
            json_request("POST", &format!("/polls/{}/vote", id), Some("tok-bob"), json!({ "optionIds": ["1"] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["error"], "this poll has ended");
        assert_eq!(app.store.get(&id).await.unwrap().total_votes(), 0);
    }

    #[tokio::test]
    async fn require_login_poll_rejects_anonymous_vote_on_open_path() {
        let app = test_app(StaticAuth::default().with_token("tok-ada", "ada"), &["/polls/mine"]);
        let poll = create(
            &app,
            "tok-ada",
            json!({ "question": "Members only", "options": ["A", "B"], "settings": { "requireLogin": true } }),
        )
        .await;
        let id = poll["id"].as_str().unwrap().to_string();
        let uri = format!("/polls/{}/vote", id);

        let resp = send(&app.router, json_request("POST", &uri, None, json!({ "optionIds": ["2"] }))).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.store.get(&id).await.unwrap().total_votes(), 0);

        let resp = send(&app.router, json_request("POST", &uri, Some("tok-ada"), json!({ "optionIds": ["2"] }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(app.store.get(&id).await.unwrap().total_votes(), 1);
    }

    #[tokio::test]
    async fn unknown_poll_is_not_found() {
        let app = app();
        let resp = send(&app.router, get_request("/polls/nope", Some("tok-ada"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = send(
            &app.router,
            json_request("POST", "/polls/nope/vote", Some("tok-ada"), json!({ "optionIds": ["1"] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_search_and_mine() {
        let app = app();
        create(&app, "tok-ada", json!({ "question": "Favourite pizza?", "options": ["a", "b"] })).await;
        create(&app, "tok-bob", json!({ "question": "Pizza night?", "options": ["yes", "no"] })).await;
        create(&app, "tok-bob", json!({ "question": "Standup?", "options": ["9", "10"] })).await;

        let all = body_json(send(&app.router, get_request("/polls", Some("tok-ada"))).await).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
        assert_eq!(all[0]["question"], "Standup?");

        let found = body_json(send(&app.router, get_request("/polls?q=PIZZA", Some("tok-ada"))).await).await;
        assert_eq!(found.as_array().unwrap().len(), 2);

        let mine = body_json(send(&app.router, get_request("/polls/mine", Some("tok-bob"))).await).await;
        let questions: Vec<&str> = mine.as_array().unwrap().iter().map(|p| p["question"].as_str().unwrap()).collect();
        assert_eq!(questions, vec!["Standup?", "Pizza night?"]);
    }
}
