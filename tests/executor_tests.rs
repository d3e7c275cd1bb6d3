mod common;

use common::{CannedResponse, MockServer};
use relayx::core::kernel::{
    execute_with_retry, HttpExecutor, HttpExecutorBuilder, RetryPolicy, SignedRequest,
};
use relayx::{ErrorKind, HttpPolicy};
use std::time::{Duration, Instant};

const LIMIT: usize = 1024;

fn executor(policy: HttpPolicy) -> impl HttpExecutor {
    HttpExecutorBuilder::new(policy).build().unwrap()
}

fn small_policy() -> HttpPolicy {
    HttpPolicy::default()
        .with_max_body_bytes(LIMIT)
        .with_connect_timeout(Duration::from_secs(2))
        .with_read_timeout(Duration::from_secs(2))
}

fn post(server: &MockServer) -> SignedRequest {
    SignedRequest::post(server.url())
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_body(br#"{"ping":true}"#.to_vec())
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_body_at_limit_is_returned() {
        let server = MockServer::start(vec![CannedResponse::bytes(200, vec![b'a'; LIMIT])]).await;
        let response = executor(small_policy()).execute(post(&server)).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), LIMIT);
    }

    #[tokio::test]
    async fn test_body_over_limit_with_content_length() {
        let server =
            MockServer::start(vec![CannedResponse::bytes(200, vec![b'a'; LIMIT + 1])]).await;
        let err = executor(small_policy())
            .execute(post(&server))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BODY_TOO_LARGE");
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_body_over_limit_without_content_length() {
        let server = MockServer::start(vec![
            CannedResponse::bytes(200, vec![b'a'; LIMIT + 1]).close_delimited()
        ])
        .await;
        let err = executor(small_policy())
            .execute(post(&server))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BODY_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_non_2xx_carries_status_and_snippet() {
        let body = format!(r#"{{"error":"{}"}}"#, "x".repeat(1000));
        let server = MockServer::start(vec![CannedResponse::json(502, &body)]).await;
        let err = executor(small_policy())
            .execute(post(&server))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "HTTP_502");
        assert_eq!(err.http_status(), Some(502));
        assert!(err.is_http_error());
        let summary = err.summary();
        assert!(summary.message.contains(r#"{"error":"xxx"#));
        assert!(summary.message.len() < body.len());
    }

    #[tokio::test]
    async fn test_empty_2xx_body_is_an_error() {
        let server = MockServer::start(vec![CannedResponse::json(200, "")]).await;
        let err = executor(small_policy())
            .execute(post(&server))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "EMPTY_BODY");
        assert_eq!(err.http_status(), Some(200));
    }

    #[tokio::test]
    async fn test_request_reaches_server_intact() {
        let server = MockServer::start(vec![CannedResponse::json(200, r#"{"ok":true}"#)]).await;
        let policy = small_policy()
            .with_default_header("X-Relay-Client", "tests")
            .with_user_agent("relayx-tests/0.1");

        executor(policy).execute(post(&server)).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.body, br#"{"ping":true}"#);
        assert_eq!(request.header("x-relay-client"), Some("tests"));
        assert_eq!(request.header("user-agent"), Some("relayx-tests/0.1"));
        assert_eq!(
            request.header("content-type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_call_timeout_is_a_retryable_timeout() {
        let server = MockServer::start(vec![
            CannedResponse::json(200, "{}").delayed(Duration::from_secs(3))
        ])
        .await;
        let policy = small_policy().with_call_timeout(Duration::from_millis(200));

        let start = Instant::now();
        let err = executor(policy).execute(post(&server)).await.unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert_eq!(err.code(), "TIMEOUT_ERROR");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let request = SignedRequest::post(format!("http://{}/", addr)).with_body(b"{}".to_vec());

        let err = executor(small_policy()).execute(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_retry_calls_server_max_attempts_times() {
        let server = MockServer::start(vec![CannedResponse::json(503, "busy")]).await;
        let executor = executor(small_policy());
        let request = post(&server);

        let err = execute_with_retry(
            |_| executor.execute(request.clone()),
            RetryPolicy::new(3, Duration::from_millis(10)),
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), "HTTP_503");
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failure() {
        let server = MockServer::start(vec![
            CannedResponse::json(503, "busy"),
            CannedResponse::json(200, r#"{"ok":true}"#),
        ])
        .await;
        let executor = executor(small_policy());
        let request = post(&server);

        let response = execute_with_retry(
            |_| executor.execute(request.clone()),
            RetryPolicy::new(3, Duration::from_millis(10)),
            None,
        )
        .await
        .unwrap();

        assert_eq!(response.body, br#"{"ok":true}"#);
        assert_eq!(server.hits(), 2);
    }
}
