use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::{
    context::RequestContext,
    cookies::set_session_cookie,
    error::AppError,
    pages,
    service::TodoService,
};

#[derive(Deserialize)]
pub struct SignInForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct SignUpForm {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
pub struct NewTodoForm {
    title: String,
}

/// Browsers omit unchecked checkboxes, so absence means "not completed".
#[derive(Deserialize)]
pub struct UpdateTodoForm {
    title: String,
    #[serde(rename = "isCompleted", default)]
    is_completed: Option<String>,
}

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn index_handler(State(service): State<TodoService>, ctx: RequestContext) -> Redirect {
    match service.current_user(&ctx).await {
        Some(_) => Redirect::to("/todos"),
        None => Redirect::to("/sign-in"),
    }
}

pub async fn sign_in_page_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
) -> Response {
    if service.current_user(&ctx).await.is_some() {
        return Redirect::to("/todos").into_response();
    }
    Html(pages::sign_in_page(None)).into_response()
}

pub async fn sign_in_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    match service.sign_in(&form.email, &form.password).await {
        Ok(token) => {
            set_session_cookie(&ctx, service.config().environment, &token)?;
            Ok(Redirect::to("/todos").into_response())
        }
        Err(AppError::SignInFailed) => Ok((
            StatusCode::UNAUTHORIZED,
            Html(pages::sign_in_page(Some("Invalid email or password."))),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

pub async fn sign_up_page_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
) -> Response {
    if service.current_user(&ctx).await.is_some() {
        return Redirect::to("/todos").into_response();
    }
    Html(pages::sign_up_page(None)).into_response()
}

pub async fn sign_up_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    match service.sign_up(&form.email, &form.password, &form.name).await {
        Ok(token) => {
            set_session_cookie(&ctx, service.config().environment, &token)?;
            Ok(Redirect::to("/todos").into_response())
        }
        Err(AppError::SignUpFailed) => Ok((
            StatusCode::UNAUTHORIZED,
            Html(pages::sign_up_page(Some("Could not create the account."))),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

pub async fn sign_out_handler(State(service): State<TodoService>, ctx: RequestContext) -> Redirect {
    service.sign_out(&ctx).await;
    Redirect::to("/sign-in")
}

pub async fn list_todos_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
) -> Result<Html<String>, AppError> {
    let (user, todos) = service.list_todos_for_user(&ctx).await?;
    Ok(Html(pages::todos_page(&user, &todos)))
}

pub async fn create_todo_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Form(form): Form<NewTodoForm>,
) -> Result<Redirect, AppError> {
    service.create_todo(&ctx, form.title.trim()).await?;
    Ok(Redirect::to("/todos"))
}

pub async fn update_todo_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<UpdateTodoForm>,
) -> Result<Redirect, AppError> {
    service
        .update_todo(&ctx, &id, form.title.trim(), form.is_completed.is_some())
        .await?;
    Ok(Redirect::to("/todos"))
}

pub async fn delete_todo_handler(
    State(service): State<TodoService>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    service.delete_todo(&ctx, &id).await?;
    Ok(Redirect::to("/todos"))
}
