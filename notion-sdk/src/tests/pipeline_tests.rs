//! Tests for the request/response pipeline
//!
//! The transport is replaced with mockall stubs so every status, body and
//! failure path is deterministic.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use serde::{Deserialize, Serialize, Serializer};
    use tokio_test::{assert_err, assert_ok};

    use crate::core::{
        CancelHandle, HttpRequest, MockTransport, Pipeline, RawResponse, RequestContext, Transport,
    };
    use crate::error::{BoxError, ClientError, ErrorKind, TransportFailure};

    const ROOT: &str = "https://api.example.com:9876";

    #[derive(Debug, Default, Clone, PartialEq, Deserialize)]
    struct Widget {
        id: String,
    }

    #[derive(Debug, Default, Clone, PartialEq, Deserialize)]
    #[serde(default)]
    struct ApiError {
        code: String,
        message: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        body: String,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    /// Transport that never answers
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<RawResponse, BoxError> {
            future::pending().await
        }
    }

    /// Sets the flag when dropped
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Keeps every log line so tests can assert on what was reported
    struct CapturingLogger {
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl Log for CapturingLogger {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger {
        lines: Mutex::new(Vec::new()),
    };

    fn captured_logs() -> &'static CapturingLogger {
        // Another test may have installed it already
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Debug);
        &LOGGER
    }

    fn assert_send<T: Send>(_: &T) {}

    fn stub(status: u16, body: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(move |_| Ok(RawResponse::from_bytes(status, body)));
        transport
    }

    fn pipeline(transport: impl Transport + 'static) -> Pipeline {
        Pipeline::new(Arc::new(transport), ROOT)
    }

    async fn get_widget(pipeline: &Pipeline) -> Result<Widget, ClientError<ApiError>> {
        pipeline
            .execute(&RequestContext::background(), "GET", "/widgets/42", None, None::<&()>)
            .await
    }

    #[tokio::test]
    async fn test_success_decodes_into_success_type() {
        let pipeline = pipeline(stub(200, r#"{"id":"42"}"#));

        let widget = assert_ok!(get_widget(&pipeline).await);
        assert_eq!(widget, Widget { id: "42".to_string() });
    }

    #[tokio::test]
    async fn test_failure_status_decodes_failure_payload() {
        let pipeline = pipeline(stub(400, r#"{"code":"bad_request","message":"no such widget"}"#));

        match get_widget(&pipeline).await {
            Err(ClientError::Application { status, failure }) => {
                assert_eq!(status, 400);
                assert_eq!(
                    failure,
                    ApiError {
                        code: "bad_request".to_string(),
                        message: "no such widget".to_string(),
                    }
                );
            }
            other => panic!("expected application error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_failure_body_stays_application_error() {
        let pipeline = pipeline(stub(503, "#not-json"));

        let err = assert_err!(get_widget(&pipeline).await);
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.failure(), Some(&ApiError::default()));
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_local_error() {
        let pipeline = pipeline(stub(200, "#yolo"));

        match get_widget(&pipeline).await {
            Err(ClientError::Local { reason, source }) => {
                assert_eq!(reason, "can't decode successful response");
                assert!(source.unwrap().downcast_ref::<serde_json::Error>().is_some());
            }
            other => panic!("expected local error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_300_is_success_and_301_is_failure() {
        let ok = pipeline(stub(300, r#"{"id":"multiple"}"#));
        assert_eq!(
            get_widget(&ok).await.unwrap(),
            Widget { id: "multiple".to_string() }
        );

        let moved = pipeline(stub(301, r#"{"code":"moved"}"#));
        let err = get_widget(&moved).await.unwrap_err();
        assert_eq!(err.status(), Some(301));
        assert_eq!(err.failure().map(|f| f.code.as_str()), Some("moved"));
    }

    #[tokio::test]
    async fn test_transport_failure_names_url_and_keeps_cause() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Err(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )) as BoxError)
        });
        let pipeline = pipeline(transport);

        match get_widget(&pipeline).await {
            Err(ClientError::Transport { url, source }) => {
                assert_eq!(url, format!("{}/widgets/42", ROOT));
                let cause = source.downcast_ref::<io::Error>().unwrap();
                assert_eq!(cause.kind(), io::ErrorKind::ConnectionRefused);
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_method_never_reaches_transport() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let pipeline = pipeline(transport);

        let result: Result<Widget, ClientError<ApiError>> = pipeline
            .execute(&RequestContext::background(), "🦄", "/widgets", None, None::<&()>)
            .await;

        match result {
            Err(ClientError::Local { reason, source }) => {
                assert_eq!(reason, "failed to create the request");
                assert!(source.is_some());
            }
            other => panic!("expected local error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unserializable_body_never_reaches_transport() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let pipeline = pipeline(transport);

        let result: Result<Widget, ClientError<ApiError>> = pipeline
            .execute(
                &RequestContext::background(),
                "POST",
                "/widgets",
                None,
                Some(&Unserializable),
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.is_local());
        assert_eq!(err.to_string(), "local error: failed to encode the body");
    }

    #[tokio::test]
    async fn test_all_arguments_are_used_to_build_the_request() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req: &HttpRequest| {
                let body: Payload = serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                req.method == reqwest::Method::DELETE
                    && req.url.as_str() == "https://api.example.com:9876/foo?userId=horse"
                    && req.headers["content-type"] == "application/json"
                    && body == Payload { body: "body".to_string() }
            })
            .times(1)
            .returning(|_| Ok(RawResponse::from_bytes(200, r#"{"id":"yes"}"#)));
        let pipeline = pipeline(transport);

        let query = HashMap::from([("userId".to_string(), "horse".to_string())]);
        let payload = Payload { body: "body".to_string() };
        let widget: Widget = pipeline
            .execute::<_, _, ApiError>(
                &RequestContext::background(),
                "DELETE",
                "/foo",
                Some(&query),
                Some(&payload),
            )
            .await
            .unwrap();

        assert_eq!(widget.id, "yes");
    }

    #[test]
    fn test_query_is_encoded_in_key_order() {
        let pipeline = Pipeline::new(Arc::new(MockTransport::new()), ROOT);
        let query = HashMap::from([
            ("page_size".to_string(), "10".to_string()),
            ("filter".to_string(), "a b&c".to_string()),
            ("cursor".to_string(), "x/y".to_string()),
        ]);

        let request = pipeline
            .build_request::<(), ()>("GET", "/search", Some(&query), None)
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://api.example.com:9876/search?cursor=x%2Fy&filter=a+b%26c&page_size=10"
        );
    }

    #[test]
    fn test_request_without_body_has_no_content_type() {
        let pipeline = Pipeline::new(Arc::new(MockTransport::new()), ROOT);

        let request = pipeline
            .build_request::<(), ()>("GET", "/widgets", Some(&HashMap::new()), None)
            .unwrap();

        assert!(request.body.is_none());
        assert!(request.headers.get("content-type").is_none());
        assert_eq!(request.url.as_str(), "https://api.example.com:9876/widgets");
    }

    #[test]
    fn test_unparseable_root_url_is_local_error() {
        let pipeline = Pipeline::new(Arc::new(MockTransport::new()), "not a url");

        let err = pipeline
            .build_request::<(), ()>("GET", "/widgets", None, None)
            .unwrap_err();

        assert!(err.is_local());
    }

    #[tokio::test]
    async fn test_identical_calls_yield_identical_results() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(RawResponse::from_bytes(404, r#"{"code":"missing"}"#)));
        let pipeline = pipeline(transport);

        let first = get_widget(&pipeline).await.unwrap_err();
        let second = get_widget(&pipeline).await.unwrap_err();

        assert_eq!(first.kind(), second.kind());
        assert_eq!(first.status(), second.status());
        assert_eq!(first.failure(), second.failure());
    }

    #[tokio::test]
    async fn test_execute_into_fills_only_success_slot() {
        let pipeline = pipeline(stub(200, r#"{"id":"42"}"#));
        let mut success = Widget::default();
        let mut failure = ApiError::default();

        pipeline
            .execute_into(
                &RequestContext::background(),
                "GET",
                "/widgets/42",
                None,
                None::<&()>,
                &mut success,
                &mut failure,
            )
            .await
            .unwrap();

        assert_eq!(success.id, "42");
        assert_eq!(failure, ApiError::default());
    }

    #[tokio::test]
    async fn test_execute_into_fills_only_failure_slot() {
        let pipeline = pipeline(stub(400, r#"{"code":"bad_request","message":"no such widget"}"#));
        let mut success = Widget::default();
        let mut failure = ApiError::default();

        let err = pipeline
            .execute_into(
                &RequestContext::background(),
                "GET",
                "/widgets/42",
                None,
                None::<&()>,
                &mut success,
                &mut failure,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(success, Widget::default());
        assert_eq!(failure.code, "bad_request");
        assert_eq!(failure.message, "no such widget");
    }

    #[tokio::test]
    async fn test_execute_into_leaves_slots_on_transport_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Err("connection reset".into()));
        let pipeline = pipeline(transport);
        let mut success = Widget { id: "untouched".to_string() };
        let mut failure = ApiError { code: "untouched".to_string(), ..ApiError::default() };

        let err = pipeline
            .execute_into(
                &RequestContext::background(),
                "GET",
                "/widgets/42",
                None,
                None::<&()>,
                &mut success,
                &mut failure,
            )
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(success.id, "untouched");
        assert_eq!(failure.code, "untouched");
    }

    #[tokio::test]
    async fn test_cancelled_context_never_reaches_transport() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let pipeline = pipeline(transport);

        let handle = CancelHandle::new();
        handle.cancel();

        let result: Result<Widget, ClientError<ApiError>> = pipeline
            .execute(&handle.context(), "GET", "/widgets/42", None, None::<&()>)
            .await;

        match result {
            Err(ClientError::Transport { url, source }) => {
                assert_eq!(url, format!("{}/widgets/42", ROOT));
                assert_eq!(
                    source.downcast_ref::<TransportFailure>(),
                    Some(&TransportFailure::Cancelled)
                );
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_hanging_exchange() {
        let pipeline = pipeline(HangingTransport);
        let ctx = RequestContext::background().with_timeout(Duration::from_secs(5));

        let err: ClientError<ApiError> = pipeline
            .execute::<(), Widget, ApiError>(&ctx, "GET", "/widgets/42", None, None)
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(err.is_retryable());
        assert!(err.to_string().ends_with("deadline exceeded"));
    }

    #[tokio::test]
    async fn test_cancel_aborts_hanging_exchange() {
        let pipeline = pipeline(HangingTransport);
        let handle = CancelHandle::new();
        let ctx = handle.context();

        let (result, _) = tokio::join!(
            pipeline.execute::<(), Widget, ApiError>(&ctx, "GET", "/widgets/42", None, None),
            async {
                tokio::task::yield_now().await;
                handle.cancel();
            }
        );

        let err = result.unwrap_err();
        assert_eq!(err.url(), Some("https://api.example.com:9876/widgets/42"));
        assert!(err.to_string().ends_with("request cancelled"));
    }

    #[tokio::test]
    async fn test_unreadable_failure_body_falls_back_to_default() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            let body = stream::iter(vec![
                Ok(Bytes::from_static(b"{\"code\":")),
                Err(Box::new(io::Error::new(io::ErrorKind::UnexpectedEof, "reset")) as BoxError),
            ])
            .boxed();
            Ok(RawResponse::new(502, body))
        });
        let pipeline = pipeline(transport);

        let err = get_widget(&pipeline).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.into_failure(), Some(ApiError::default()));
    }

    #[tokio::test]
    async fn test_unreadable_success_body_is_local_error() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            let body = stream::iter(vec![Err::<Bytes, BoxError>("stream reset".into())]).boxed();
            Ok(RawResponse::new(200, body))
        });
        let pipeline = pipeline(transport);

        let err = get_widget(&pipeline).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Local { ref reason, .. } if reason == "can't read successful response"
        ));
    }

    #[tokio::test]
    async fn test_body_is_released_after_decode_failure() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);

        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(move |_| {
            let guard = DropFlag(Arc::clone(&flag));
            let body = stream::iter(vec![Ok::<_, BoxError>(Bytes::from_static(b"#yolo"))])
                .map(move |chunk| {
                    let _keep = &guard;
                    chunk
                })
                .boxed();
            Ok(RawResponse::new(200, body))
        });
        let pipeline = pipeline(transport);

        assert!(get_widget(&pipeline).await.is_err());
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_on_shared_pipeline_stay_separate() {
        const CALLS: usize = 16;

        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(CALLS)
            .returning(|req: HttpRequest| {
                let id = req.url.path().trim_start_matches("/widgets/").to_string();
                Ok(RawResponse::from_bytes(200, format!(r#"{{"id":"{}"}}"#, id)))
            });
        let pipeline = pipeline(transport);

        let handles: Vec<_> = (0..CALLS)
            .map(|i| {
                let pipeline = pipeline.clone();
                let call = async move {
                    let ctx = RequestContext::background();
                    let path = format!("/widgets/{}", i);
                    pipeline
                        .execute::<(), Widget, ApiError>(&ctx, "GET", &path, None, None)
                        .await
                };
                assert_send(&call);
                tokio::spawn(call)
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let widget = handle.await.unwrap().unwrap();
            assert_eq!(widget.id, i.to_string());
        }
    }

    #[tokio::test]
    async fn test_undecodable_failure_body_is_logged_as_warning() {
        let logs = captured_logs();
        let pipeline = pipeline(stub(503, "#maintenance-window-7f3a"));

        assert_eq!(get_widget(&pipeline).await.unwrap_err().status(), Some(503));

        let lines = logs.lines.lock().unwrap();
        assert!(lines.iter().any(|(level, line)| {
            *level == Level::Warn
                && line.starts_with("Can't decode failure response (status 503)")
                && line.contains("#maintenance-window-7f3a")
        }));
    }
}
