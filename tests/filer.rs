//! Volume filer tests, including the streaming multipart upload.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use drycc_client::{filer, ClientConfig, DryccClient, DryccError, API_VERSION, API_VERSION_HEADER};
use tokio::io::{AsyncRead, ReadBuf};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VOLUME_PATH: &str = "/v2/apps/example-go/volumes/myvolume/client/";
const FILE_CONTENT: &str = "hello world";

fn client(uri: &str) -> DryccClient {
    DryccClient::new(ClientConfig::new(uri).with_token("abc")).unwrap()
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).insert_header(API_VERSION_HEADER, API_VERSION)
}

/// Yields `data` once, then fails.
struct BrokenReader {
    data: Option<Vec<u8>>,
}

impl AsyncRead for BrokenReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.data.take() {
            Some(data) => {
                buf.put_slice(&data);
                Poll::Ready(Ok(()))
            }
            None => Poll::Ready(Err(io::Error::other("disk went away"))),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[tokio::test]
async fn test_list_dir() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(VOLUME_PATH))
        .and(query_param("path", "tmp/logs"))
        .and(query_param("limit", "3000"))
        .respond_with(ok().set_body_json(serde_json::json!({
            "count": 3,
            "next": null,
            "previous": null,
            "results": [
                {"name": "a.log", "path": "tmp/logs/a.log", "size": "12", "type": "file",
                 "timestamp": "2024-03-01T12:30:45Z"},
                {"name": "old", "path": "tmp/logs/old", "type": "dir"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let page = filer::list_dir(&client, "example-go", "myvolume", "tmp/logs", 3000)
        .await
        .unwrap()
        .strict()
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[0].name.as_deref(), Some("a.log"));
    assert!(page.items[1].is_dir());
    assert_eq!(
        page.items[0].modified().unwrap().unwrap().to_string(),
        "2024-03-01T12:30:45UTC"
    );
}

#[tokio::test]
async fn test_get_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{VOLUME_PATH}tmp/helloword.txt")))
        .respond_with(
            ok().insert_header("content-type", "application/octet-stream")
                .set_body_string(FILE_CONTENT),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let response = filer::get_file(&client, "example-go", "myvolume", "tmp/helloword.txt")
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.text().await.unwrap(), FILE_CONTENT);
}

#[tokio::test]
async fn test_delete_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{VOLUME_PATH}tmp/helloword.txt")))
        .respond_with(ResponseTemplate::new(204).insert_header(API_VERSION_HEADER, API_VERSION))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let response = filer::delete_file(&client, "example-go", "myvolume", "tmp/helloword.txt")
        .await
        .unwrap()
        .strict()
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_upload_streams_path_then_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VOLUME_PATH))
        .and(header_exists("authorization"))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    // Larger than one read chunk so the body spans several pipe writes.
    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    let client = client(&mock_server.uri());
    filer::upload_file(
        &client,
        "example-go",
        "myvolume",
        "tmp/",
        "helloword.bin",
        io::Cursor::new(content.clone()),
    )
    .await
    .unwrap()
    .strict()
    .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let request = &requests[0];

    let content_type = request
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .expect("multipart content type");

    let body = &request.body;
    let path_field = find(body, b"name=\"path\"").expect("path field");
    let file_part = find(body, b"name=\"file\"; filename=\"helloword.bin\"").expect("file part");
    assert!(path_field < file_part);
    assert!(find(body, b"name=\"path\"\r\n\r\ntmp/\r\n").is_some());

    let marker = b"Content-Type: application/octet-stream\r\n\r\n";
    let start = find(body, marker).unwrap() + marker.len();
    let trailer = format!("\r\n--{boundary}--\r\n");
    assert!(body.ends_with(trailer.as_bytes()));
    let end = body.len() - trailer.len();
    assert_eq!(&body[start..end], &content[..]);
}

#[tokio::test]
async fn test_upload_fails_when_reader_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VOLUME_PATH))
        .respond_with(ok())
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let reader = BrokenReader {
        data: Some(FILE_CONTENT.as_bytes().to_vec()),
    };
    let err = filer::upload_file(&client, "example-go", "myvolume", "tmp/", "broken.txt", reader)
        .await
        .unwrap_err();

    assert!(matches!(err, DryccError::HttpError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_upload_failure_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VOLUME_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let err = filer::upload_file(
        &client,
        "example-go",
        "myvolume",
        "tmp/",
        "hello.txt",
        io::Cursor::new(FILE_CONTENT.as_bytes().to_vec()),
    )
    .await
    .unwrap_err();

    assert_eq!(err.api_kind(), Some(drycc_client::ApiErrorKind::Forbidden));
}
