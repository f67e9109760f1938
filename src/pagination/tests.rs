//! Tests for pagination module

use super::*;
use futures::stream::FusedStream;
use futures::{StreamExt, TryStreamExt};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use test_case::test_case;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct ListRequest {
    prefix: String,
    max_results: u32,
    token: Option<String>,
}

impl ListRequest {
    fn new() -> Self {
        Self {
            prefix: "logs/".to_string(),
            max_results: 2,
            token: None,
        }
    }
}

impl CursorRequest for ListRequest {
    type Cursor = String;

    fn cursor(&self) -> Option<&String> {
        self.token.as_ref()
    }

    fn with_cursor(&self, cursor: Option<String>) -> Self {
        Self {
            token: cursor,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ListResponse {
    items: Option<Vec<u32>>,
    next_token: Option<String>,
    is_truncated: Option<bool>,
}

impl ListResponse {
    fn page(items: &[u32], next_token: Option<&str>) -> Self {
        Self {
            items: Some(items.to_vec()),
            next_token: next_token.map(String::from),
            is_truncated: None,
        }
    }

    fn truncated(mut self, flag: Option<bool>) -> Self {
        self.is_truncated = flag;
        self
    }
}

impl CursorResponse for ListResponse {
    type Cursor = String;

    fn next_cursor(&self) -> Option<String> {
        self.next_token.clone()
    }

    fn member_flag(&self, member: &str) -> Option<bool> {
        match member {
            "IsTruncated" => self.is_truncated,
            _ => None,
        }
    }
}

/// Scripted service: hands out responses in order and records every request
#[derive(Clone, Default)]
struct Script {
    responses: Arc<Mutex<VecDeque<Result<ListResponse, String>>>>,
    requests: Arc<Mutex<Vec<ListRequest>>>,
}

impl Script {
    fn new(responses: Vec<Result<ListResponse, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    fn call(&self, request: ListRequest) -> Result<ListResponse, String> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no more scripted responses".to_string()))
    }

    fn fetcher(
        &self,
    ) -> impl FnMut(ListRequest) -> futures::future::Ready<Result<ListResponse, String>> {
        let script = self.clone();
        move |request| futures::future::ready(script.call(request))
    }

    fn tokens_sent(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.token.clone())
            .collect()
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

// ============================================================================
// EndBehavior Tests
// ============================================================================

#[test_case(EndBehavior::OutputTokenEmpty, None, Some("b"), StopResult::Continue; "token empty: fresh token")]
#[test_case(EndBehavior::OutputTokenEmpty, Some("a"), Some("a"), StopResult::Continue; "token empty: repeated token continues")]
#[test_case(EndBehavior::OutputTokenEmpty, Some("a"), Some(""), StopResult::Stop; "token empty: blank token")]
#[test_case(EndBehavior::OutputTokenEmpty, Some("a"), None, StopResult::Stop; "token empty: missing token")]
#[test_case(EndBehavior::IdenticalToken, Some("a"), Some("b"), StopResult::Continue; "identical: new token")]
#[test_case(EndBehavior::IdenticalToken, None, Some("a"), StopResult::Continue; "identical: first page")]
#[test_case(EndBehavior::IdenticalToken, Some("a"), Some("a"), StopResult::Stop; "identical: echoed token")]
#[test_case(EndBehavior::IdenticalToken, Some("a"), None, StopResult::Stop; "identical: missing token")]
fn test_decide_token_behaviors(
    behavior: EndBehavior,
    used: Option<&str>,
    next: Option<&str>,
    expected: StopResult,
) {
    let used = used.map(String::from);
    let next = next.map(String::from);
    let result = behavior.decide(used.as_ref(), next.as_ref(), |_| None);
    assert_eq!(result, expected);
}

#[test_case(Some(true), StopResult::Continue; "flag true")]
#[test_case(Some(false), StopResult::Stop; "flag false")]
#[test_case(None, StopResult::Stop; "flag absent")]
fn test_decide_truncation_member(flag: Option<bool>, expected: StopResult) {
    let behavior = EndBehavior::truncation_member("IsTruncated");
    let next = Some("token".to_string());

    let mut asked = None;
    let result = behavior.decide(None, next.as_ref(), |member| {
        asked = Some(member.to_string());
        flag
    });

    assert_eq!(result, expected);
    assert_eq!(asked.as_deref(), Some("IsTruncated"));
}

#[test]
fn test_truncation_ignores_missing_token() {
    let behavior = EndBehavior::truncation_member("IsTruncated");
    let result = behavior.decide::<String, _>(None, None, |_| Some(true));
    assert!(result.should_continue());
}

#[test]
fn test_end_behavior_serde() {
    let behavior: EndBehavior =
        serde_json::from_str(r#"{"type": "truncation_member", "member": "IsTruncated"}"#).unwrap();
    assert_eq!(behavior, EndBehavior::truncation_member("IsTruncated"));

    let behavior: EndBehavior = serde_json::from_str(r#"{"type": "identical_token"}"#).unwrap();
    assert_eq!(behavior, EndBehavior::IdenticalToken);

    assert_eq!(EndBehavior::default(), EndBehavior::OutputTokenEmpty);
}

#[test]
fn test_json_cursor_blankness() {
    use serde_json::json;

    assert!(json!(null).is_blank());
    assert!(json!("").is_blank());
    assert!(json!([]).is_blank());
    assert!(json!({}).is_blank());
    assert!(!json!("abc").is_blank());
    assert!(!json!({"pk": "a"}).is_blank());
    assert!(!json!(0).is_blank());
}

// ============================================================================
// CursorState Tests
// ============================================================================

#[test]
fn test_cursor_state_new() {
    let state = CursorState::new(Some("resume".to_string()));
    assert_eq!(state.cursor.as_deref(), Some("resume"));
    assert!(state.has_next);
    assert_eq!(state.pages, 0);
}

#[test]
fn test_cursor_state_advance_threads_token() {
    let mut state = CursorState::new(None);
    let request = state.request(&ListRequest::new());
    assert_eq!(request.token, None);

    let result = state.advance(
        &EndBehavior::OutputTokenEmpty,
        &ListResponse::page(&[1], Some("X")),
    );
    assert!(result.should_continue());
    assert_eq!(state.cursor.as_deref(), Some("X"));
    assert_eq!(state.pages, 1);

    let request = state.request(&ListRequest::new());
    assert_eq!(request.token.as_deref(), Some("X"));
    assert_eq!(request.prefix, "logs/");
}

#[test]
fn test_cursor_state_truncation_still_threads_token() {
    let mut state = CursorState::new(None);
    let page = ListResponse::page(&[1], Some("next")).truncated(Some(false));

    let result = state.advance(&EndBehavior::truncation_member("IsTruncated"), &page);
    assert!(result.should_stop());
    assert!(!state.has_next);
    assert_eq!(state.cursor.as_deref(), Some("next"));
}

// ============================================================================
// Page Stream Tests
// ============================================================================

#[tokio::test]
async fn test_two_page_scenario() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1, 2], Some("X"))),
        Ok(ListResponse::page(&[3], None)),
    ]);

    let pages: Vec<ListResponse> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .try_collect()
    .await
    .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(script.tokens_sent(), vec![None, Some("X".to_string())]);

    let items: Vec<u32> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        Script::new(vec![
            Ok(ListResponse::page(&[1, 2], Some("X"))),
            Ok(ListResponse::page(&[3], None)),
        ])
        .fetcher(),
    )
    .items(|page: ListResponse| page.items)
    .try_collect()
    .await
    .unwrap();

    assert_eq!(items, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_pages_yielded_in_order_until_empty_token() {
    let responses = vec![
        ListResponse::page(&[1], Some("a")),
        ListResponse::page(&[2], Some("b")),
        ListResponse::page(&[3], Some("")),
    ];
    let script = Script::new(responses.iter().cloned().map(Ok).collect());

    let pages: Vec<ListResponse> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .try_collect()
    .await
    .unwrap();

    assert_eq!(pages, responses);
    assert_eq!(script.calls(), 3);
}

#[tokio::test]
async fn test_derived_requests_preserve_other_fields() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], None)),
    ]);
    let initial = ListRequest {
        prefix: "audit/".to_string(),
        max_results: 50,
        token: None,
    };

    let _: Vec<ListResponse> = paginate(
        initial.clone(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .try_collect()
    .await
    .unwrap();

    let requests = script.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.prefix, "audit/");
        assert_eq!(request.max_results, 50);
    }
    assert_eq!(initial.token, None);
}

#[tokio::test]
async fn test_resume_from_initial_cursor() {
    let script = Script::new(vec![Ok(ListResponse::page(&[9], None))]);
    let initial = ListRequest {
        token: Some("resume-here".to_string()),
        ..ListRequest::new()
    };

    let pages: Vec<ListResponse> = paginate(initial, EndBehavior::OutputTokenEmpty, script.fetcher())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(script.tokens_sent(), vec![Some("resume-here".to_string())]);
}

#[tokio::test]
async fn test_identical_token_stops_after_echo() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], Some("b"))),
        Ok(ListResponse::page(&[3], Some("b"))),
        Ok(ListResponse::page(&[4], Some("c"))),
    ]);

    let pages: Vec<ListResponse> =
        paginate(ListRequest::new(), EndBehavior::IdenticalToken, script.fetcher())
            .try_collect()
            .await
            .unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(
        script.tokens_sent(),
        vec![None, Some("a".to_string()), Some("b".to_string())]
    );
}

#[tokio::test]
async fn test_identical_token_stops_on_null_token() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], None)),
    ]);

    let pages: Vec<ListResponse> =
        paginate(ListRequest::new(), EndBehavior::IdenticalToken, script.fetcher())
            .try_collect()
            .await
            .unwrap();

    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_truncation_member_drives_termination() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a")).truncated(Some(true))),
        Ok(ListResponse::page(&[2], None).truncated(Some(true))),
        Ok(ListResponse::page(&[3], Some("c")).truncated(Some(false))),
        Ok(ListResponse::page(&[4], Some("d")).truncated(Some(true))),
    ]);

    let pages: Vec<ListResponse> = paginate(
        ListRequest::new(),
        EndBehavior::truncation_member("IsTruncated"),
        script.fetcher(),
    )
    .try_collect()
    .await
    .unwrap();

    assert_eq!(pages.len(), 3);
    // Token from page two was absent, so page three is requested without one
    assert_eq!(
        script.tokens_sent(),
        vec![None, Some("a".to_string()), None]
    );
}

#[tokio::test]
async fn test_truncation_member_absent_stops() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], Some("b"))),
    ]);

    let pages: Vec<ListResponse> = paginate(
        ListRequest::new(),
        EndBehavior::truncation_member("IsTruncated"),
        script.fetcher(),
    )
    .try_collect()
    .await
    .unwrap();

    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn test_no_fetch_before_first_poll() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], None)),
    ]);

    let mut pages = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    );
    assert_eq!(script.calls(), 0);
    assert_eq!(pages.pages_fetched(), 0);

    let first = pages.next().await.unwrap().unwrap();
    assert_eq!(first.items, Some(vec![1]));
    assert_eq!(script.calls(), 1);

    let second = pages.next().await.unwrap().unwrap();
    assert_eq!(second.items, Some(vec![2]));
    assert_eq!(script.calls(), 2);

    assert!(pages.next().await.is_none());
    assert!(pages.next().await.is_none());
    assert_eq!(script.calls(), 2);
    assert_eq!(pages.pages_fetched(), 2);
}

#[tokio::test]
async fn test_dropping_stream_stops_fetching() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], Some("b"))),
        Ok(ListResponse::page(&[3], None)),
    ]);

    let first: Vec<ListResponse> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .take(1)
    .try_collect()
    .await
    .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(script.calls(), 1);
}

#[tokio::test]
async fn test_fetch_error_propagates_after_earlier_pages() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Err("throttled".to_string()),
    ]);

    let mut pages = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    );

    assert!(pages.next().await.unwrap().is_ok());
    assert_eq!(pages.next().await.unwrap(), Err("throttled".to_string()));
    assert_eq!(pages.pages_fetched(), 1);
}

#[tokio::test]
async fn test_fetch_error_ends_stream() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Err("timeout".to_string()),
        Ok(ListResponse::page(&[2], None)),
    ]);

    let mut pages = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    );

    assert!(pages.next().await.unwrap().is_ok());
    assert!(pages.next().await.unwrap().is_err());
    assert!(pages.next().await.is_none());
    assert!(pages.next().await.is_none());

    assert!(pages.failed());
    assert!(pages.is_terminated());
    assert_eq!(pages.cursor(), Some(&"a".to_string()));
    assert_eq!(script.tokens_sent(), vec![None, Some("a".to_string())]);
}

#[tokio::test]
async fn test_failing_service_does_not_loop() {
    let script = Script::new(vec![]);

    let results: Vec<Result<ListResponse, String>> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .collect()
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(script.calls(), 1);
}

#[tokio::test]
async fn test_resume_after_error_from_last_cursor() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Err("timeout".to_string()),
        Ok(ListResponse::page(&[2], None)),
    ]);

    let mut pages = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    );
    while pages.next().await.is_some() {}

    let resumed = ListRequest::new().with_cursor(pages.cursor().cloned());
    let items: Vec<u32> = paginate(resumed, EndBehavior::OutputTokenEmpty, script.fetcher())
        .items(|page: ListResponse| page.items)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items, vec![2]);
    assert_eq!(
        script.tokens_sent(),
        vec![None, Some("a".to_string()), Some("a".to_string())]
    );
}

#[tokio::test]
async fn test_async_fetch_one_page_in_flight() {
    let in_flight = Arc::new(Mutex::new(0usize));
    let max_seen = Arc::new(Mutex::new(0usize));
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("a"))),
        Ok(ListResponse::page(&[2], Some("b"))),
        Ok(ListResponse::page(&[3], None)),
    ]);

    let fetch = {
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        move |request: ListRequest| {
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            let script = script.clone();
            async move {
                {
                    let mut count = in_flight.lock().unwrap();
                    *count += 1;
                    let mut max = max_seen.lock().unwrap();
                    *max = (*max).max(*count);
                }
                tokio::task::yield_now().await;
                *in_flight.lock().unwrap() -= 1;
                script.call(request)
            }
        }
    };

    let pages: Vec<ListResponse> = paginate(ListRequest::new(), EndBehavior::OutputTokenEmpty, fetch)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(*max_seen.lock().unwrap(), 1);
}

#[test]
fn test_pending_fetch_suspends_consumer() {
    let (tx, rx) = tokio::sync::oneshot::channel::<ListResponse>();
    let mut rx = Some(rx);
    let fetch = move |_request: ListRequest| {
        let rx = rx.take();
        async move {
            match rx {
                Some(rx) => rx.await.map_err(|e| e.to_string()),
                None => Err("only one page is scripted".to_string()),
            }
        }
    };

    let mut pages = tokio_test::task::spawn(paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        fetch,
    ));

    tokio_test::assert_pending!(pages.poll_next());
    tokio_test::assert_pending!(pages.poll_next());

    tx.send(ListResponse::page(&[1], None)).unwrap();
    assert!(pages.is_woken());

    let page = tokio_test::assert_ready!(pages.poll_next());
    assert_eq!(page, Some(Ok(ListResponse::page(&[1], None))));
    assert_eq!(tokio_test::assert_ready!(pages.poll_next()), None);
}

// ============================================================================
// Item Projection Tests
// ============================================================================

#[tokio::test]
async fn test_items_skip_empty_and_absent_pages() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1, 2], Some("a"))),
        Ok(ListResponse::page(&[], Some("b"))),
        Ok(ListResponse {
            items: None,
            next_token: Some("c".to_string()),
            is_truncated: None,
        }),
        Ok(ListResponse::page(&[3], None)),
    ]);

    let items: Vec<u32> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .items(|page: ListResponse| page.items)
    .try_collect()
    .await
    .unwrap();

    assert_eq!(items, vec![1, 2, 3]);
    assert_eq!(script.calls(), 4);
}

#[tokio::test]
async fn test_items_surface_fetch_error_in_position() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1, 2], Some("a"))),
        Err("boom".to_string()),
    ]);

    let results: Vec<Result<u32, String>> = paginate(
        ListRequest::new(),
        EndBehavior::OutputTokenEmpty,
        script.fetcher(),
    )
    .items(|page: ListResponse| page.items)
    .collect()
    .await;

    assert_eq!(results, vec![Ok(1), Ok(2), Err("boom".to_string())]);
}

// ============================================================================
// Blocking Iterator Tests
// ============================================================================

#[test]
fn test_blocking_two_page_scenario() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1, 2], Some("X"))),
        Ok(ListResponse::page(&[3], None)),
    ]);
    let fetch = {
        let script = script.clone();
        move |request| script.call(request)
    };

    let items: Result<Vec<u32>, String> =
        paginate_blocking(ListRequest::new(), EndBehavior::OutputTokenEmpty, fetch)
            .items(|page: ListResponse| page.items)
            .collect();

    assert_eq!(items, Ok(vec![1, 2, 3]));
    assert_eq!(script.tokens_sent(), vec![None, Some("X".to_string())]);
}

#[test]
fn test_blocking_is_lazy_and_fused() {
    let script = Script::new(vec![Ok(ListResponse::page(&[1], None))]);
    let fetch = {
        let script = script.clone();
        move |request| script.call(request)
    };

    let mut pages = paginate_blocking(ListRequest::new(), EndBehavior::IdenticalToken, fetch);
    assert_eq!(script.calls(), 0);

    assert!(pages.next().is_some());
    assert!(pages.next().is_none());
    assert!(pages.next().is_none());
    assert_eq!(script.calls(), 1);
    assert_eq!(pages.pages_fetched(), 1);
}

#[test]
fn test_blocking_fetch_error_ends_iterator() {
    let script = Script::new(vec![Ok(ListResponse::page(&[1], Some("a")))]);
    let fetch = {
        let script = script.clone();
        move |request| script.call(request)
    };

    let mut pages = paginate_blocking(ListRequest::new(), EndBehavior::OutputTokenEmpty, fetch);
    assert!(pages.next().unwrap().is_ok());
    assert!(pages.next().unwrap().is_err());
    assert!(pages.next().is_none());
    assert!(pages.next().is_none());

    assert!(pages.failed());
    assert_eq!(pages.cursor(), Some(&"a".to_string()));
    assert_eq!(script.calls(), 2);
}

#[test]
fn test_blocking_identical_token() {
    let script = Script::new(vec![
        Ok(ListResponse::page(&[1], Some("same"))),
        Ok(ListResponse::page(&[2], Some("same"))),
        Ok(ListResponse::page(&[3], Some("same"))),
    ]);
    let fetch = {
        let script = script.clone();
        move |request| script.call(request)
    };

    let count = paginate_blocking(ListRequest::new(), EndBehavior::IdenticalToken, fetch).count();
    assert_eq!(count, 2);
}
