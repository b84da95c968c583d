// src/board_api.rs

use actix_web::{http::StatusCode, web, HttpResponse, Responder, ResponseError};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::board::{BoardSnapshot, Mutation};
use crate::error::BoardError;
use crate::models::{Task, TaskDraft, TaskId, TaskStatus};
use crate::views::{ViewFilter, ViewKind, ViewQuery};
use crate::web_socket_server::ws_index;

impl ResponseError for BoardError {
    fn status_code(&self) -> StatusCode {
        match self {
            BoardError::Validation { .. } => StatusCode::BAD_REQUEST,
            BoardError::NotFound { .. } => StatusCode::NOT_FOUND,
            BoardError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BoardError::Persistence(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetViewRequest {
    pub view: ViewKind,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DragStartRequest {
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct DragEndRequest {
    pub task_id: TaskId,
    pub drop_target: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTaskRequest {
    #[serde(default)]
    pub status: TaskStatus,
}

#[derive(Serialize)]
struct MutationResponse<'a> {
    applied: bool,
    task: Option<&'a Task>,
    board: BoardSnapshot<'a>,
}

#[derive(Serialize)]
struct GestureResponse<'a> {
    accepted: bool,
    board: BoardSnapshot<'a>,
}

async fn mutation_response(data: &AppState, mutation: Option<Mutation>) -> HttpResponse {
    let board = data.board.lock().await;
    HttpResponse::Ok().json(MutationResponse {
        applied: mutation.is_some(),
        task: mutation.as_ref().map(Mutation::task),
        board: board.render(&ViewFilter::default()),
    })
}

async fn gesture_response(data: &AppState, accepted: bool) -> HttpResponse {
    let board = data.board.lock().await;
    HttpResponse::Ok().json(GestureResponse {
        accepted,
        board: board.render(&ViewFilter::default()),
    })
}

/// GET /board?q=&priority=&sort=&direction=&month=
/// Render the active view.
pub async fn get_board(
    data: web::Data<AppState>,
    query: web::Query<ViewQuery>,
) -> Result<HttpResponse, BoardError> {
    let board = data.board.lock().await;
    let views = query.views(board.views())?;
    Ok(HttpResponse::Ok().json(board.render_with(&views, &query.filter())))
}

/// PUT /board/view
pub async fn set_view(data: web::Data<AppState>, payload: web::Json<SetViewRequest>) -> impl Responder {
    data.board.lock().await.set_view(payload.view);
    gesture_response(&data, true).await
}

/// GET /board/view/{view}?q=&priority=&sort=&direction=&month=
/// Render one view without making it the active one.
pub async fn get_view(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ViewQuery>,
) -> Result<HttpResponse, BoardError> {
    let kind: ViewKind = path.into_inner().parse()?;
    let board = data.board.lock().await;
    let views = query.views(board.views())?;
    Ok(HttpResponse::Ok().json(board.render_view_with(&views, kind, &query.filter())))
}

/// GET /board/tasks
pub async fn list_tasks(data: web::Data<AppState>) -> impl Responder {
    let board = data.board.lock().await;
    HttpResponse::Ok().json(board.list())
}

/// POST /board/tasks
pub async fn create_task(data: web::Data<AppState>, payload: web::Json<TaskDraft>) -> impl Responder {
    let draft = payload.into_inner();
    let mutation = data.board.apply(|b| b.create_task(&draft)).await;
    mutation_response(&data, mutation).await
}

/// PUT /board/tasks/{task_id}
pub async fn update_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<Task>,
) -> impl Responder {
    let mut task = payload.into_inner();
    task.task_id = TaskId::from(path.into_inner());
    let mutation = data.board.apply(|b| b.update_task(task)).await;
    mutation_response(&data, mutation).await
}

/// DELETE /board/tasks/{task_id}
pub async fn delete_task(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let task_id = TaskId::from(path.into_inner());
    let mutation = data.board.apply(|b| b.delete_task(&task_id)).await;
    mutation_response(&data, mutation).await
}

/// PUT /board/tasks/{task_id}/status
pub async fn change_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<StatusRequest>,
) -> impl Responder {
    let task_id = TaskId::from(path.into_inner());
    let mutation = data
        .board
        .apply(|b| b.change_status(&task_id, &payload.status))
        .await;
    mutation_response(&data, mutation).await
}

/// POST /board/drag/start
pub async fn drag_start(data: web::Data<AppState>, payload: web::Json<DragStartRequest>) -> impl Responder {
    let started = data
        .board
        .lock()
        .await
        .on_drag_start(payload.into_inner().task_id);
    gesture_response(&data, started).await
}

/// POST /board/drag/end
pub async fn drag_end(data: web::Data<AppState>, payload: web::Json<DragEndRequest>) -> impl Responder {
    let DragEndRequest {
        task_id,
        drop_target,
    } = payload.into_inner();
    debug!("drag end {} over {:?}", task_id, drop_target);
    let mutation = data
        .board
        .apply(|b| b.on_drag_end(&task_id, drop_target.as_deref()))
        .await;
    mutation_response(&data, mutation).await
}

/// POST /board/editor/new
pub async fn open_new_editor(data: web::Data<AppState>, payload: web::Json<NewTaskRequest>) -> impl Responder {
    data.board.lock().await.open_new_task(payload.status);
    gesture_response(&data, true).await
}

/// POST /board/editor/open/{task_id}
pub async fn open_editor(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let task_id = TaskId::from(path.into_inner());
    let opened = {
        let mut board = data.board.lock().await;
        let opened = board.open_existing(&task_id);
        (opened, board.take_stale())
    };
    if opened.1 {
        // refresh errors are already on the board as a notification
        let _ = data.board.refresh().await;
    }
    gesture_response(&data, opened.0).await
}

/// POST /board/editor/save
pub async fn save_editor(data: web::Data<AppState>, payload: web::Json<TaskDraft>) -> impl Responder {
    let draft = payload.into_inner();
    let mutation = data.board.apply(|b| b.save_editor(draft)).await;
    mutation_response(&data, mutation).await
}

/// POST /board/editor/close
pub async fn close_editor(data: web::Data<AppState>) -> impl Responder {
    data.board.lock().await.close_editor();
    gesture_response(&data, true).await
}

/// DELETE /board/notifications/{id}
pub async fn dismiss_notification(data: web::Data<AppState>, path: web::Path<u64>) -> impl Responder {
    let dismissed = data.board.lock().await.dismiss_notification(path.into_inner());
    gesture_response(&data, dismissed).await
}

/// POST /board/refresh
pub async fn refresh(data: web::Data<AppState>) -> Result<HttpResponse, BoardError> {
    let count = data.board.refresh().await?;
    info!("Manual refresh loaded {} tasks", count);
    Ok(gesture_response(&data, true).await)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/board")
            .route("", web::get().to(get_board))
            .route("/view", web::put().to(set_view))
            .route("/view/{view}", web::get().to(get_view))
            .route("/tasks", web::get().to(list_tasks))
            .route("/tasks", web::post().to(create_task))
            .route("/tasks/{task_id}", web::put().to(update_task))
            .route("/tasks/{task_id}", web::delete().to(delete_task))
            .route("/tasks/{task_id}/status", web::put().to(change_status))
            .route("/drag/start", web::post().to(drag_start))
            .route("/drag/end", web::post().to(drag_end))
            .route("/editor/new", web::post().to(open_new_editor))
            .route("/editor/open/{task_id}", web::post().to(open_editor))
            .route("/editor/save", web::post().to(save_editor))
            .route("/editor/close", web::post().to(close_editor))
            .route("/notifications/{id}", web::delete().to(dismiss_notification))
            .route("/refresh", web::post().to(refresh)),
    )
    .service(web::resource("/ws").route(web::get().to(ws_index)));
}
