use axum::body::Body as AxumBody;
use dirserve::config::{ConfigValidator, build_file_server, load_config};
use http::header::CONTENT_TYPE;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn get(server: &dirserve::FileServer, uri: &str) -> (StatusCode, String, String) {
    let req = Request::builder().uri(uri).body(AxumBody::empty()).unwrap();
    let response = server.clone().oneshot(req).await.unwrap();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_yaml_config_drives_server() {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    std::fs::create_dir_all(public.join("empty")).unwrap();
    std::fs::write(public.join("home.htm"), "welcome").unwrap();
    std::fs::write(dir.path().join("404.html"), "<h1>lost</h1>").unwrap();

    let config_path = dir.path().join("dirserve.yaml");
    std::fs::write(
        &config_path,
        format!(
            r#"
listen_addr: "127.0.0.1:0"
root: "{root}"
index: ["home.htm"]
prefix: "/site"
error_pages:
  "404":
    file: "{page}"
  default:
    body: "something went wrong"
    content_type: "text/plain; charset=utf-8"
"#,
            root = public.display(),
            page = dir.path().join("404.html").display(),
        ),
    )
    .unwrap();

    let config = load_config(&config_path).await.unwrap();
    ConfigValidator::validate(&config).unwrap();
    let server = build_file_server(&config).await.unwrap();

    let (status, _, body) = get(&server, "/site/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "welcome");

    let (status, content_type, body) = get(&server, "/site/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type, "text/html; charset=utf-8");
    assert_eq!(body, "<h1>lost</h1>");

    let (status, _, body) = get(&server, "/elsewhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "<h1>lost</h1>");

    let (status, content_type, body) = get(&server, "/site/empty/").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(content_type, "text/plain; charset=utf-8");
    assert_eq!(body, "something went wrong");
}

#[tokio::test]
async fn test_validation_reports_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("dirserve.yaml");
    std::fs::write(
        &config_path,
        r#"
listen_addr: "not an address"
root: "/definitely/not/a/dir"
prefix: "static"
error_pages:
  teapot:
    body: "x"
"#,
    )
    .unwrap();

    let config = load_config(&config_path).await.unwrap();
    let err = ConfigValidator::validate(&config).unwrap_err().to_string();
    assert!(err.contains("Found 4 configuration errors"), "{err}");
    assert!(err.contains("Invalid listen address"));
    assert!(err.contains("Prefix must start with '/'"));
    assert!(err.contains("error_pages.teapot"));
}
