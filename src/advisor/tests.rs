use super::{AdvisorError, AdvisorQuery, HttpAdvisor, MissionAdvisor};
use crate::config::AdvisorConfig;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::oneshot,
};

/// Reads one HTTP request (headers plus `Content-Length` body).
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = text[..end]
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serves a single canned response and hands the raw request back.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let reply = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(reply.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        let _ = tx.send(request);
    });
    (format!("http://{addr}/api/query"), rx)
}

fn local_advisor(url: String) -> HttpAdvisor {
    let client = reqwest::Client::builder().no_proxy().timeout(HttpAdvisor::TIMEOUT).build().unwrap();
    HttpAdvisor::with_client(client, Some(url))
}

#[test]
fn test_query_validation() {
    assert_eq!(AdvisorQuery::new("  Battery status?  ").unwrap().text(), "Battery status?");
    assert!(matches!(AdvisorQuery::new(""), Err(AdvisorError::Validation(_))));
    assert!(matches!(AdvisorQuery::new(" \n\t "), Err(AdvisorError::Validation(_))));

    let limit = "a".repeat(AdvisorQuery::MAX_CHARS);
    assert!(AdvisorQuery::new(&limit).is_ok());
    let over = "a".repeat(AdvisorQuery::MAX_CHARS + 1);
    assert!(matches!(AdvisorQuery::new(&over), Err(AdvisorError::Validation(_))));
    // counted in characters, not bytes
    assert!(AdvisorQuery::new(&"é".repeat(AdvisorQuery::MAX_CHARS)).is_ok());
}

#[tokio::test]
async fn test_missing_endpoint() {
    let advisor = HttpAdvisor::new(&AdvisorConfig::default()).unwrap();
    let query = AdvisorQuery::new("Status of Titan flyby?").unwrap();
    assert_eq!(advisor.ask(&query).await, Err(AdvisorError::MissingConfiguration));
}

#[tokio::test]
async fn test_successful_reply() {
    let (url, request) = serve_once("200 OK", r#"{"response":"All systems nominal."}"#).await;
    let advisor = local_advisor(url);

    let answer = advisor.ask(&AdvisorQuery::new("What is the battery level?").unwrap()).await;

    assert_eq!(answer.unwrap(), "All systems nominal.");
    let request = request.await.unwrap();
    assert!(request.starts_with("POST /api/query"));
    assert!(request.contains(r#"{"query":"What is the battery level?"}"#));
}

#[tokio::test]
async fn test_error_reply_is_upstream() {
    let (url, _request) =
        serve_once("400 Bad Request", r#"{"error":"Invalid input","details":"query too long"}"#).await;
    let advisor = local_advisor(url);

    let err = advisor.ask(&AdvisorQuery::new("ping").unwrap()).await.unwrap_err();

    assert_eq!(err, AdvisorError::Upstream {
        error: String::from("Invalid input"),
        details: Some(String::from("query too long")),
    });
}

#[tokio::test]
async fn test_unreadable_error_reply() {
    let (url, _request) = serve_once("500 Internal Server Error", "oops").await;
    let advisor = local_advisor(url);

    let err = advisor.ask(&AdvisorQuery::new("ping").unwrap()).await.unwrap_err();

    let AdvisorError::Upstream { error, details } = err else {
        panic!("unexpected error {err:?}");
    };
    assert!(error.contains("500"));
    assert!(details.is_none());
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (url, _request) = serve_once("200 OK", r#"{"answer":"wrong field"}"#).await;
    let advisor = local_advisor(url);

    let err = advisor.ask(&AdvisorQuery::new("ping").unwrap()).await.unwrap_err();

    assert!(matches!(err, AdvisorError::Upstream { .. }));
}
