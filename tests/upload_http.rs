use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use plant_disease_uploader::error::UploadError;
use plant_disease_uploader::settings::Settings;
use plant_disease_uploader::ui::components::upload_panel::Status;
use plant_disease_uploader::ui::navigator::Recorder;
use plant_disease_uploader::ui::{AppShell, RootMessage, Runtime};
use plant_disease_uploader::upload::{HttpClient, UploadClient};
use plant_disease_uploader::SelectedFile;

#[derive(Debug, Clone)]
struct Request {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

type Responder = dyn Fn(&Request) -> (u16, &'static str, Vec<u8>) + Send + Sync;

/// Minimal one-request-per-connection HTTP server running on a background thread.
struct TestServer {
    base: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl TestServer {
    fn start(respond: impl Fn(&Request) -> (u16, &'static str, Vec<u8>) + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let seen = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some(request) = read_request(&mut BufReader::new(&stream)) else {
                    continue;
                };
                let (code, reason, body) = respond(&request);
                seen.lock().unwrap().push(request);

                let head = format!(
                    "HTTP/1.1 {code} {reason}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
                let _ = stream.flush();
            }
        });

        Self { base, requests }
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn client(&self) -> HttpClient {
        HttpClient::new(&self.base, Duration::from_secs(5)).unwrap()
    }
}

fn read_request(reader: &mut impl BufRead) -> Option<Request> {
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0;
    let mut content_type = None;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().ok()?,
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(Request {
        method,
        path,
        content_type,
        body,
    })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn accepting_server() -> TestServer {
    TestServer::start(|request| match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/submit") => (200, "OK", b"/result/pred_outcome_leaf::Success".to_vec()),
        ("GET", "/static/PRED_FOLDER/pred_outcome_leaf.png") => (200, "OK", b"annotated".to_vec()),
        ("GET", "/leaf.jpg") => (200, "OK", b"jpeg bytes".to_vec()),
        ("GET", "/big.png") => (200, "OK", vec![7; 1000]),
        _ => (404, "Not Found", Vec::new()),
    })
}

#[test]
fn submit_posts_one_multipart_image_part() {
    let server = accepting_server();
    let file = SelectedFile::new("leaf.png", b"\x89PNG leaf".to_vec());

    let target = server.client().submit(&file).unwrap();

    assert_eq!(target.as_str(), format!("{}result/pred_outcome_leaf", server.base));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/submit");
    assert!(request.content_type.as_deref().unwrap().starts_with("multipart/form-data; boundary="));
    assert!(contains(&request.body, b"name=\"image\"; filename=\"leaf.png\""));
    assert!(contains(&request.body, b"Content-Type: image/png"));
    assert!(contains(&request.body, b"\x89PNG leaf"));
}

#[test]
fn non_200_answers_are_errors() {
    let server = TestServer::start(|_| (500, "Internal Server Error", b"boom".to_vec()));
    let file = SelectedFile::new("leaf.png", b"leaf".to_vec());

    match server.client().submit(&file) {
        Err(UploadError::Status { code, .. }) => assert_eq!(code, 500),
        other => panic!("expected a status error, got {other:?}"),
    }
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn empty_answer_has_no_redirect() {
    let server = TestServer::start(|_| (200, "OK", b"::Success".to_vec()));
    let file = SelectedFile::new("leaf.png", b"leaf".to_vec());

    assert!(matches!(server.client().submit(&file), Err(UploadError::EmptyRedirect)));
}

#[test]
fn fetch_downloads_into_memory() {
    let server = accepting_server();

    let file = server.client().fetch(&format!("{}leaf.jpg", server.base)).unwrap();

    assert_eq!(file.name, "leaf.jpg");
    assert_eq!(file.bytes(), b"jpeg bytes");
}

#[test]
fn oversized_downloads_are_refused_not_truncated() {
    let server = accepting_server();
    let url = format!("{}big.png", server.base);

    match server.client().with_download_limit(999).fetch(&url) {
        Err(UploadError::TooLarge { limit, .. }) => assert_eq!(limit, 999),
        other => panic!("expected a size error, got {other:?}"),
    }

    let file = server.client().with_download_limit(1000).fetch(&url).unwrap();
    assert_eq!(file.size(), 1000);
}

#[tokio::test]
async fn shell_uploads_and_navigates_to_the_result_page() {
    let server = accepting_server();
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("leaf.png");
    std::fs::write(&image, b"leaf pixels").unwrap();
    let saved = dir.path().join("prediction.png");

    let recorder = Recorder::default();
    let settings = Settings {
        server_url: server.base.clone(),
        ..Settings::default()
    };
    let shell = AppShell::from_settings(settings, Arc::new(recorder.clone())).unwrap();
    let mut runtime = Runtime::new(shell);

    runtime.dispatch(RootMessage::select_path(&image));
    runtime.settle().await;
    assert!(runtime.app().panel().preview().unwrap().starts_with("data:image/png;base64,"));

    runtime.dispatch(RootMessage::upload());
    runtime.settle().await;

    let target = format!("{}result/pred_outcome_leaf", server.base);
    assert_eq!(
        recorder.visited().iter().map(|u| u.to_string()).collect::<Vec<_>>(),
        vec![target]
    );
    assert!(runtime.app().panel().file().is_none());

    runtime.dispatch(RootMessage::save_prediction(Some(saved.clone())));
    runtime.settle().await;

    assert!(matches!(
        runtime.app().panel().status(),
        Status::Redirected { saved: Some(path), .. } if *path == saved
    ));
    assert_eq!(std::fs::read(&saved).unwrap(), b"annotated");
}
