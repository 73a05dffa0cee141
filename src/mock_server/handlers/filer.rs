//! Volume filer endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::mock_server::state::{normalize, MockState, UploadRecord};

type SharedState = Arc<RwLock<MockState>>;

/// Query parameters for listing a directory.
#[derive(Debug, Default, Deserialize)]
pub struct ListDirQuery {
    pub path: Option<String>,
    pub limit: Option<usize>,
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"detail": "Not found."})),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"detail": "Invalid token."})),
    )
        .into_response()
}

fn bad_request(field: &str, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ field: [message] })),
    )
        .into_response()
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// GET /v2/apps/{app}/volumes/{volume}/client/?path=...&limit=...
pub async fn list_dir(
    State(state): State<SharedState>,
    Path((app, volume)): Path<(String, String)>,
    Query(query): Query<ListDirQuery>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;

    if !state.accepts(authorization(&headers)) {
        return unauthorized();
    }
    if !state.has_volume(&app, &volume) {
        return not_found();
    }

    let entries = state.list_dir(&app, &volume, query.path.as_deref().unwrap_or("/"));
    let count = entries.len();
    let results: Vec<_> = entries
        .into_iter()
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();

    Json(serde_json::json!({
        "count": count,
        "next": null,
        "previous": null,
        "results": results,
    }))
    .into_response()
}

/// POST /v2/apps/{app}/volumes/{volume}/client/
///
/// Expects a `path` field naming the target directory and a `file` part.
pub async fn upload_file(
    State(state): State<SharedState>,
    Path((app, volume)): Path<(String, String)>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !state.read().await.accepts(authorization(&headers)) {
        return unauthorized();
    }

    let mut record = UploadRecord::default();
    let mut dir = None;
    let mut file = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return bad_request("file", err.body_text()),
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => return bad_request(&name, err.body_text()),
        };

        match name.as_str() {
            "path" => dir = Some(String::from_utf8_lossy(&data).into_owned()),
            "file" => file = Some((file_name.unwrap_or_default(), data.to_vec())),
            _ => {}
        }
        record.fields.push(name);
    }

    let Some(dir) = dir else {
        return bad_request("path", "This field is required.".to_string());
    };
    let Some((file_name, content)) = file else {
        return bad_request("file", "No file was submitted.".to_string());
    };
    if file_name.is_empty() {
        return bad_request("file", "The submitted file has no name.".to_string());
    }

    let dir = normalize(&dir);
    let stored_at = if dir.is_empty() {
        file_name
    } else {
        format!("{dir}/{file_name}")
    };

    let mut state = state.write().await;
    state.put_file(&app, &volume, &stored_at, content);
    record.stored_at = stored_at;
    state.uploads.push(record);

    StatusCode::OK.into_response()
}

/// GET or DELETE /v2/apps/{app}/volumes/{volume}/client/{path}
///
/// Mounted as the router fallback since the file path may contain slashes.
pub async fn file_route(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let Some((app, volume, path)) = parse_file_path(uri.path()) else {
        return not_found();
    };

    if method == Method::GET {
        let state = state.read().await;
        if !state.accepts(authorization(&headers)) {
            return unauthorized();
        }
        match state.get_file(&app, &volume, &path) {
            Some(file) => (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                file.content.clone(),
            )
                .into_response(),
            None => not_found(),
        }
    } else if method == Method::DELETE {
        let mut state = state.write().await;
        if !state.accepts(authorization(&headers)) {
            return unauthorized();
        }
        if state.delete_file(&app, &volume, &path) {
            StatusCode::NO_CONTENT.into_response()
        } else {
            not_found()
        }
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

/// Split `/v2/apps/{app}/volumes/{volume}/client/{path}` into its parts.
fn parse_file_path(path: &str) -> Option<(String, String, String)> {
    let rest = path.strip_prefix("/v2/apps/")?;
    let parts: Vec<&str> = rest.splitn(5, '/').collect();
    match parts.as_slice() {
        [app, "volumes", volume, "client", file] if !file.is_empty() => {
            // URL-decode the file path
            let file = urlencoding::decode(file)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| file.to_string());
            Some((app.to_string(), volume.to_string(), file))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_path() {
        assert_eq!(
            parse_file_path("/v2/apps/example-go/volumes/myvolume/client/tmp/a%20b.txt"),
            Some((
                "example-go".to_string(),
                "myvolume".to_string(),
                "tmp/a b.txt".to_string()
            ))
        );
        assert_eq!(parse_file_path("/v2/apps/example-go/volumes/myvolume/client/"), None);
        assert_eq!(parse_file_path("/v2/apps/example-go/config/x"), None);
        assert_eq!(parse_file_path("/healthz"), None);
    }
}
