use formdrop::form::{
    FormController, FormView, HttpTransport, MessageKind, SelectedFile, SubmitOutcome,
};
use std::io::Read;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server};

#[derive(Clone, Default)]
struct Messages(Arc<Mutex<Vec<(String, MessageKind)>>>);

impl Messages {
    fn last(&self) -> Option<(String, MessageKind)> {
        self.0.lock().unwrap().last().cloned()
    }
}

impl FormView for Messages {
    fn show_message(&self, text: &str, kind: MessageKind) {
        self.0.lock().unwrap().push((text.to_string(), kind));
    }
    fn clear_message(&self) {}
    fn set_busy(&self, _busy: bool) {}
    fn clear_file_input(&self) {}
    fn reset_form(&self) {}
}

struct Captured {
    method: String,
    url: String,
    content_type: String,
    body: String,
}

/// Answers one request with `status`/`body` and hands back what it received.
fn start_stub(status: u16, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = Server::http("127.0.0.1:0").expect("bind stub");
    let port = server.server_addr().to_ip().expect("ip listener").port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.to_string())
                .unwrap_or_default();
            let mut raw = Vec::new();
            let _ = request.as_reader().read_to_end(&mut raw);
            let captured = Captured {
                method: request.method().to_string(),
                url: request.url().to_string(),
                content_type,
                body: String::from_utf8_lossy(&raw).into_owned(),
            };
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            let _ = request.respond(response);
            let _ = tx.send(captured);
        }
    });

    (format!("http://127.0.0.1:{}", port), rx)
}

fn report(dir: &TempDir) -> SelectedFile {
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, b"%PDF-1.7 quarterly numbers").unwrap();
    SelectedFile::from_path(&path).unwrap()
}

#[test]
fn submits_multipart_form_and_reports_success() {
    let (server, received) = start_stub(
        200,
        r#"{"success":true,"message":"File uploaded successfully","fileUrl":"https://drive.google.com/file/d/abc/view"}"#,
    );
    let dir = TempDir::new().unwrap();
    let messages = Messages::default();
    let controller = FormController::new(
        messages.clone(),
        HttpTransport::new(&server, "/api/upload").unwrap(),
    );

    controller.set_name("Jane Doe");
    controller.set_email("jane@example.com");
    let file = report(&dir);
    assert_eq!(file.mime_type, "application/pdf");
    assert!(controller.select_file(file));

    let outcome = controller.submit();
    assert_eq!(
        outcome,
        SubmitOutcome::Uploaded {
            file_url: Some("https://drive.google.com/file/d/abc/view".into())
        }
    );
    assert_eq!(
        messages.last(),
        Some(("File uploaded successfully!".into(), MessageKind::Success))
    );

    let captured = received.recv().unwrap();
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.url, "/api/upload");
    assert!(captured.content_type.starts_with("multipart/form-data; boundary="));
    assert!(captured.body.contains("name=\"name\"\r\n\r\nJane Doe\r\n"));
    assert!(captured.body.contains("name=\"email\"\r\n\r\njane@example.com\r\n"));
    assert!(captured.body.contains("name=\"file\"; filename=\"report.pdf\""));
    assert!(captured.body.contains("Content-Type: application/pdf"));
    assert!(captured.body.contains("%PDF-1.7 quarterly numbers"));
}

#[test]
fn server_rejection_is_rendered_as_error() {
    let (server, _received) = start_stub(
        500,
        r#"{"success":false,"error":"Upload failed","details":"quota"}"#,
    );
    let dir = TempDir::new().unwrap();
    let messages = Messages::default();
    let controller = FormController::new(
        messages.clone(),
        HttpTransport::new(&server, "api/upload").unwrap(),
    );
    controller.set_name("Jane Doe");
    controller.set_email("jane@example.com");
    controller.select_file(report(&dir));

    assert_eq!(controller.submit(), SubmitOutcome::Failed("Upload failed".into()));
    assert_eq!(
        messages.last(),
        Some(("Error: Upload failed".into(), MessageKind::Error))
    );
    assert_eq!(controller.fields().name, "Jane Doe", "form kept for resubmission");
}

#[test]
fn unreachable_server_is_a_failure_not_a_panic() {
    // Grab a free port, then close it so nothing is listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dir = TempDir::new().unwrap();
    let messages = Messages::default();
    let controller = FormController::new(
        messages.clone(),
        HttpTransport::new(&format!("http://127.0.0.1:{}", port), "/api/upload").unwrap(),
    );
    controller.set_name("Jane Doe");
    controller.set_email("jane@example.com");
    controller.select_file(report(&dir));

    let outcome = controller.submit();
    assert!(matches!(outcome, SubmitOutcome::Failed(ref reason) if reason.contains("Failed to send upload request")));
    let (text, kind) = messages.last().unwrap();
    assert!(text.starts_with("Error: "));
    assert_eq!(kind, MessageKind::Error);
    assert!(!controller.is_busy());
}
