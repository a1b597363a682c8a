use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const REPRESENTOR_JSON: &str = "application/vnd.representor+json";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub completed: Option<bool>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Todo>>>;

/// A hypermedia document served as `application/vnd.representor+json`.
pub struct Document(pub Value);

impl IntoResponse for Document {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, REPRESENTOR_JSON)], self.0.to_string()).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/", get(root))
        .route("/about", get(about))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Links are relative on purpose: clients must resolve them against the
/// URL each document was fetched from.
fn create_transition() -> Value {
    json!({
        "uri": "todos",
        "method": "POST",
        "suggestedContentTypes": [FORM, JSON],
        "attributes": {
            "title": {},
            "completed": {"defaultValue": false}
        }
    })
}

fn todo_document(todo: &Todo) -> Value {
    let uri = format!("/todos/{}", todo.id);
    json!({
        "attributes": {
            "id": todo.id,
            "title": todo.title,
            "completed": todo.completed
        },
        "transitions": {
            "self": {"uri": uri},
            "update": {
                "uri": uri,
                "method": "PATCH",
                "suggestedContentTypes": [JSON],
                "attributes": {"title": {}, "completed": {}}
            },
            "delete": {"uri": uri, "method": "DELETE"},
            "collection": {"uri": "../todos"}
        }
    })
}

async fn root() -> Document {
    Document(json!({
        "attributes": {"name": "todo service"},
        "transitions": {
            "todos": {
                "uri": "todos{?completed}",
                "parameters": {"completed": {}}
            },
            "create": create_transition(),
            "about": {"uri": "about"}
        }
    }))
}

async fn about() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "todo service")
}

async fn list_todos(State(db): State<Db>, Query(query): Query<ListQuery>) -> Document {
    let todos = db.read().await;
    let mut matching: Vec<&Todo> = todos
        .values()
        .filter(|todo| query.completed.is_none_or(|completed| todo.completed == completed))
        .collect();
    matching.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

    Document(json!({
        "attributes": {"count": matching.len()},
        "transitions": {
            "self": {"uri": "todos"},
            "create": create_transition()
        },
        "representors": {
            "todos": matching.into_iter().map(todo_document).collect::<Vec<_>>()
        }
    }))
}

/// Accepts both JSON and form-encoded bodies, as advertised by the
/// `create` transition.
fn parse_create(headers: &HeaderMap, body: &[u8]) -> Result<CreateTodo, StatusCode> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with(JSON) {
        serde_json::from_slice(body).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)
    } else if content_type.starts_with(FORM) {
        let fields: HashMap<String, String> = url::form_urlencoded::parse(body).into_owned().collect();
        let title = fields
            .get("title")
            .cloned()
            .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
        let completed = fields.get("completed").is_some_and(|value| value == "true");
        Ok(CreateTodo { title, completed })
    } else {
        Err(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Document), StatusCode> {
    let input = parse_create(&headers, &body)?;
    let todo = Todo {
        id: Uuid::new_v4(),
        title: input.title,
        completed: input.completed,
    };
    info!(id = %todo.id, "created todo");
    db.write().await.insert(todo.id, todo.clone());
    Ok((StatusCode::CREATED, Document(todo_document(&todo))))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Document, StatusCode> {
    let todos = db.read().await;
    todos
        .get(&id)
        .map(|todo| Document(todo_document(todo)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodo>,
) -> Result<Document, StatusCode> {
    let mut todos = db.write().await;
    let todo = todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Document(todo_document(todo)))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut todos = db.write().await;
    let removed = todos.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    info!(id = %removed.id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
