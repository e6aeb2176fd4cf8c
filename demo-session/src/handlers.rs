use askama::Template;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use alo_session::{Session, SessionContext, StartOutcome, Token};

use crate::state::AppState;

const VISITS_KEY: &str = "visits";
const FORM_TOKEN: &str = "demo_form";

#[derive(Template)]
#[template(path = "index.j2")]
struct IndexTemplate<'a> {
    session_id: &'a str,
    visits: u64,
}

#[derive(Template)]
#[template(path = "form.j2")]
struct FormTemplate<'a> {
    token: &'a str,
    message: Option<&'a str>,
    accepted: bool,
}

#[derive(Deserialize)]
pub(crate) struct FormInput {
    csrf_token: String,
    message: String,
}

/// Load (or create) the caller's session and make it active.
async fn open_session(state: &AppState, headers: &HeaderMap) -> Result<SessionContext, Response> {
    let mut ctx = SessionContext::from_headers(headers);
    let session = Session::new(state.store.clone(), state.config.clone(), &mut ctx)
        .await
        .map_err(internal_error)?;

    match session.start(&mut ctx).await.map_err(internal_error)? {
        StartOutcome::IdentityCheckFailed => {
            tracing::warn!("Rejected session {} from a different client", session.id());
            let headers = ctx.finish().await;
            Err((
                StatusCode::FORBIDDEN,
                headers,
                "Session rejected. Reload the page to start a new one.",
            )
                .into_response())
        }
        StartOutcome::Started | StartOutcome::AlreadyActive => Ok(ctx),
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    tracing::error!("Session error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

fn render(template: &impl Template) -> Result<Html<String>, Response> {
    template.render().map(Html).map_err(internal_error)
}

pub(crate) async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let mut ctx = open_session(&state, &headers).await?;

    let visits = ctx.get::<u64>(VISITS_KEY).unwrap_or(0) + 1;
    ctx.set(VISITS_KEY, &visits);

    let session_id = ctx.session_id().unwrap_or_default().to_string();
    let page = render(&IndexTemplate {
        session_id: &session_id,
        visits,
    })?;

    Ok((ctx.finish().await, page).into_response())
}

pub(crate) async fn form(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let mut ctx = open_session(&state, &headers).await?;

    let token = Token::from_context(FORM_TOKEN, &ctx).map_err(internal_error)?;
    let value = token
        .create(&mut ctx)
        .ok_or_else(|| internal_error("Failed to create form token"))?;

    let page = render(&FormTemplate {
        token: &value,
        message: None,
        accepted: false,
    })?;

    Ok((ctx.finish().await, page).into_response())
}

pub(crate) async fn submit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<FormInput>,
) -> Result<Response, Response> {
    let mut ctx = open_session(&state, &headers).await?;

    let token = Token::from_context(FORM_TOKEN, &ctx).map_err(internal_error)?;
    if !token.verify(&mut ctx, &input.csrf_token) {
        tracing::warn!("Form submitted with an invalid token");
        let headers = ctx.finish().await;
        return Ok((StatusCode::FORBIDDEN, headers, "Invalid form token").into_response());
    }

    // The token is single use, hand out the next one
    let next = token
        .create(&mut ctx)
        .ok_or_else(|| internal_error("Failed to create form token"))?;
    let page = render(&FormTemplate {
        token: &next,
        message: Some(&input.message),
        accepted: true,
    })?;

    Ok((ctx.finish().await, page).into_response())
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let mut ctx = open_session(&state, &headers).await?;

    if ctx.destroy_safely().await {
        tracing::info!("Session destroyed");
    }

    Ok((ctx.finish().await, Redirect::to("/")).into_response())
}
