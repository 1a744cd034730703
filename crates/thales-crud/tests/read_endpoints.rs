//! Get and list endpoints end to end.

mod common;

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use futures_util::stream;
use http::StatusCode;
use serde_json::json;
use thales_core::{DataError, EMPTY_CONTENT_HASH};
use thales_crud::{fetch_fn, get, list, list_fn, EndpointOptions, Endpoint, Fetched, Listed};
use thales_extract::uuid_from_last_segment;
use thales_middleware::{count_fn, entity_id_fn, hash_fn, last_modified_fn};
use thales_test::TestRequest;
use uuid::Uuid;

use common::{send, Caller, Calls, Thing};

fn modified_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap() + chrono::Duration::milliseconds(250)
}

fn thing_endpoint(options: &EndpointOptions, known: Uuid, fetches: Calls) -> Endpoint {
    get(
        "things.get",
        options,
        entity_id_fn(uuid_from_last_segment),
        last_modified_fn(move |_ctx, id| async move {
            if id == known {
                Ok(modified_at())
            } else {
                Err(DataError::NoRows)
            }
        }),
        fetch_fn(move |_ctx, id| {
            fetches.hit();
            async move {
                if id == known {
                    Ok(Fetched::Value(Thing { id, name: "gear".into() }))
                } else {
                    Err(DataError::DoesNotExist)
                }
            }
        }),
    )
}

#[tokio::test]
async fn test_get_renders_value_with_last_modified() {
    let caller = Caller::new();
    let id = Uuid::new_v4();
    let endpoint = thing_endpoint(&caller.options(), id, Calls::default());

    let request = TestRequest::get(format!("/things/{id}"))
        .bearer_token(caller.token())
        .build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::OK)
        .assert_header("last-modified", "Mon, 06 May 2024 07:08:09 GMT")
        .assert_header("cache-control", "must-revalidate, max-age=0")
        .assert_json_eq(&json!({"id": id, "name": "gear"}));
}

#[tokio::test]
async fn test_get_not_modified_within_same_second() {
    let caller = Caller::new();
    let id = Uuid::new_v4();
    let fetches = Calls::default();
    let endpoint = thing_endpoint(&caller.options(), id, fetches.clone());

    let request = TestRequest::get(format!("/things/{id}"))
        .bearer_token(caller.token())
        .header("If-Modified-Since", "Mon, 06 May 2024 07:08:09 GMT")
        .build();
    send(&endpoint, request).await.assert_not_modified();
    assert_eq!(fetches.count(), 0);
}

#[tokio::test]
async fn test_get_malformed_if_modified_since_ignored() {
    let caller = Caller::new();
    let id = Uuid::new_v4();
    let endpoint = thing_endpoint(&caller.options(), id, Calls::default());

    let request = TestRequest::get(format!("/things/{id}"))
        .bearer_token(caller.token())
        .header("If-Modified-Since", "yesterday-ish")
        .build();
    send(&endpoint, request).await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_get_unknown_entity_is_404_from_fetch() {
    let caller = Caller::new();
    let fetches = Calls::default();
    let endpoint = thing_endpoint(&caller.options(), Uuid::new_v4(), fetches.clone());

    let request = TestRequest::get(format!("/things/{}", Uuid::new_v4()))
        .bearer_token(caller.token())
        .build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_no_header("last-modified")
        .assert_errors(&["resource not found"]);
    assert_eq!(fetches.count(), 1);
}

#[tokio::test]
async fn test_get_fetch_failure_is_generic() {
    let caller = Caller::new();
    let endpoint = get(
        "things.get",
        &caller.options(),
        entity_id_fn(uuid_from_last_segment),
        last_modified_fn(|_ctx, _id| async { Err(DataError::NoRows) }),
        fetch_fn(|_ctx, _id| async {
            Err::<Fetched<Thing>, _>(DataError::from(anyhow::anyhow!(
                "relation \"things\" does not exist"
            )))
        }),
    );

    let request = TestRequest::get(format!("/things/{}", Uuid::new_v4()))
        .bearer_token(caller.token())
        .build();
    let response = send(&endpoint, request).await;
    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_errors(&["error receiving results"]);
    assert!(!response.text().unwrap().contains("relation"));
}

#[tokio::test]
async fn test_get_last_modified_failure_is_metadata_error() {
    let caller = Caller::new();
    let fetches = Calls::default();
    let counted = fetches.clone();
    let endpoint = get(
        "things.get",
        &caller.options(),
        entity_id_fn(uuid_from_last_segment),
        last_modified_fn(|_ctx, _id| async { Err(DataError::from(anyhow::anyhow!("timeout"))) }),
        fetch_fn(move |_ctx, id| {
            counted.hit();
            async move { Ok(Fetched::Value(Thing { id, name: "x".into() })) }
        }),
    );

    let request = TestRequest::get(format!("/things/{}", Uuid::new_v4()))
        .bearer_token(caller.token())
        .build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_errors(&["failed to receive metadata"]);
    assert_eq!(fetches.count(), 0);
}

#[tokio::test]
async fn test_get_streams_sniffed_content() {
    let caller = Caller::new();
    let png: &'static [u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    let endpoint = get(
        "avatars.get",
        &caller.options(),
        entity_id_fn(uuid_from_last_segment),
        last_modified_fn(|_ctx, _id| async { Err(DataError::NoRows) }),
        fetch_fn(move |_ctx, _id| async move {
            let chunks = vec![
                Ok(Bytes::from_static(&png[..4])),
                Ok(Bytes::from_static(&png[4..])),
            ];
            Ok(Fetched::<()>::stream(stream::iter(chunks)))
        }),
    );

    let request = TestRequest::get(format!("/avatars/{}", Uuid::new_v4()))
        .bearer_token(caller.token())
        .build();
    let response = send(&endpoint, request).await;
    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "image/png");
    assert_eq!(&response.body()[..], png);
}

#[tokio::test]
async fn test_head_skips_fetch_but_sets_headers() {
    let caller = Caller::new();
    let id = Uuid::new_v4();
    let fetches = Calls::default();
    let endpoint = thing_endpoint(&caller.options(), id, fetches.clone());

    let request = TestRequest::head(format!("/things/{id}"))
        .bearer_token(caller.token())
        .build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::OK)
        .assert_header("last-modified", "Mon, 06 May 2024 07:08:09 GMT")
        .assert_empty_body();
    assert_eq!(fetches.count(), 0);
}

#[tokio::test]
async fn test_get_without_credentials() {
    let caller = Caller::new();
    let endpoint = thing_endpoint(&caller.options(), Uuid::new_v4(), Calls::default());

    let request = TestRequest::get(format!("/things/{}", Uuid::new_v4())).build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_header("www-authenticate", "Bearer realm=\"thales\"");
}

#[tokio::test]
async fn test_get_invalid_entity_id() {
    let caller = Caller::new();
    let endpoint = thing_endpoint(&caller.options(), Uuid::new_v4(), Calls::default());

    let request = TestRequest::get("/things/not-a-uuid")
        .bearer_token(caller.token())
        .build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_hits_timeout() {
    let caller = Caller::new();
    let options = EndpointOptions::builder(caller.keys.verifier())
        .timeout(Duration::from_millis(50))
        .build();
    let endpoint = get(
        "things.get",
        &options,
        entity_id_fn(uuid_from_last_segment),
        last_modified_fn(|_ctx, _id| async { Err(DataError::NoRows) }),
        fetch_fn(|_ctx, id| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Fetched::Value(Thing { id, name: "late".into() }))
        }),
    );

    let request = TestRequest::get(format!("/things/{}", Uuid::new_v4()))
        .bearer_token(caller.token())
        .build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_errors(&["request was cancelled"]);
}

fn things_list(options: &EndpointOptions, fetches: Calls, items: Option<Vec<Thing>>) -> Endpoint {
    list(
        "things.list",
        options,
        hash_fn(|_ctx, paging| async move { Ok(format!("page-{}-{}", paging.offset, paging.limit)) }),
        count_fn(|_ctx| async { Ok(42) }),
        list_fn(move |_ctx, _paging| {
            fetches.hit();
            let items = items.clone();
            async move { Ok(Listed::Items(items)) }
        }),
    )
}

#[tokio::test]
async fn test_list_nil_renders_empty_array() {
    let caller = Caller::new();
    let endpoint = things_list(&caller.options(), Calls::default(), None);

    let request = TestRequest::get("/things").bearer_token(caller.token()).build();
    let response = send(&endpoint, request).await;
    response
        .assert_status(StatusCode::OK)
        .assert_header("x-total-count", "42")
        .assert_header("cache-control", "must-revalidate, max-age=0");
    assert_eq!(response.text().unwrap(), "[]");
    assert_eq!(response.etag(), Some("page-0-100"));
}

#[tokio::test]
async fn test_list_if_none_match_short_circuits() {
    let caller = Caller::new();
    let fetches = Calls::default();
    let endpoint = things_list(&caller.options(), fetches.clone(), Some(Vec::new()));

    let request = TestRequest::get("/things?offset=10&limit=5")
        .bearer_token(caller.token())
        .if_none_match("page-10-5")
        .build();
    let response = send(&endpoint, request).await;
    response.assert_not_modified();
    assert_eq!(response.etag(), Some("page-10-5"));
    assert_eq!(fetches.count(), 0);
}

#[tokio::test]
async fn test_list_echoed_etag_short_circuits() {
    let caller = Caller::new();
    let fetches = Calls::default();
    let endpoint = things_list(&caller.options(), fetches.clone(), Some(Vec::new()));

    let first = TestRequest::get("/things")
        .bearer_token(caller.token())
        .build();
    let first = send(&endpoint, first).await;
    first.assert_status(StatusCode::OK);
    let etag = first.etag().unwrap().to_string();

    let second = TestRequest::get("/things")
        .bearer_token(caller.token())
        .if_none_match(&etag)
        .build();
    send(&endpoint, second).await.assert_not_modified();
    assert_eq!(fetches.count(), 1);

    let quoted = TestRequest::get("/things")
        .bearer_token(caller.token())
        .if_none_match(format!("\"{etag}\""))
        .build();
    send(&endpoint, quoted).await.assert_status(StatusCode::OK);
    assert_eq!(fetches.count(), 2);
}

#[tokio::test]
async fn test_list_limit_clamped() {
    let caller = Caller::new();
    let endpoint = things_list(&caller.options(), Calls::default(), None);

    let request = TestRequest::get("/things?limit=9000")
        .bearer_token(caller.token())
        .build();
    let response = send(&endpoint, request).await;
    assert_eq!(response.etag(), Some("page-0-500"));
}

#[tokio::test]
async fn test_list_invalid_offset() {
    let caller = Caller::new();
    let fetches = Calls::default();
    let endpoint = things_list(&caller.options(), fetches.clone(), None);

    let request = TestRequest::get("/things?offset=-1")
        .bearer_token(caller.token())
        .build();
    let response = send(&endpoint, request).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.error_envelope().unwrap().errors[0].starts_with("invalid offset"));
    assert_eq!(fetches.count(), 0);
}

#[tokio::test]
async fn test_list_absent_data_everywhere() {
    let caller = Caller::new();
    let endpoint = list(
        "things.list",
        &caller.options(),
        hash_fn(|_ctx, _paging| async { Err(DataError::NoRows) }),
        count_fn(|_ctx| async { Err(DataError::DoesNotExist) }),
        list_fn(|_ctx, _paging| async { Err::<Listed<Thing>, _>(DataError::NoRows) }),
    );

    let request = TestRequest::get("/things").bearer_token(caller.token()).build();
    let response = send(&endpoint, request).await;
    response
        .assert_status(StatusCode::OK)
        .assert_header("x-total-count", "0");
    assert_eq!(response.etag(), Some(EMPTY_CONTENT_HASH));
    assert_eq!(response.text().unwrap(), "[]");
}

#[tokio::test]
async fn test_list_rows_transformed() {
    let caller = Caller::new();
    let endpoint = list(
        "names.list",
        &caller.options(),
        hash_fn(|_ctx, _paging| async { Ok("v1".to_string()) }),
        count_fn(|_ctx| async { Ok(2) }),
        list_fn(|_ctx, _paging| async {
            let rows = stream::iter(vec![Ok(("a", 1)), Ok(("b", 2))]);
            Ok(Listed::rows(rows, |(name, rank)| Ok(json!({"name": name, "rank": rank}))))
        }),
    );

    let request = TestRequest::get("/names").bearer_token(caller.token()).build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!([{"name": "a", "rank": 1}, {"name": "b", "rank": 2}]));
}

#[tokio::test]
async fn test_list_late_row_error_sends_no_partial_page() {
    let caller = Caller::new();
    let endpoint = list(
        "names.list",
        &caller.options(),
        hash_fn(|_ctx, _paging| async { Ok("v1".to_string()) }),
        count_fn(|_ctx| async { Ok(3) }),
        list_fn(|_ctx, _paging| async {
            let rows = vec![
                Ok("a".to_string()),
                Ok("b".to_string()),
                Err(DataError::from(anyhow::anyhow!("connection reset"))),
            ];
            Ok(Listed::from_rows(rows, Ok))
        }),
    );

    let request = TestRequest::get("/names").bearer_token(caller.token()).build();
    let response = send(&endpoint, request).await;
    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_errors(&["error receiving results"]);
}

#[tokio::test]
async fn test_scoped_list_passes_tenant() {
    let caller = Caller::new();
    let tenant = caller.tenant;
    let endpoint = list(
        "things.list",
        &caller.scoped_options(),
        hash_fn(move |ctx, _paging| async move {
            assert_eq!(ctx.tenant_id().unwrap(), tenant);
            Ok("scoped".to_string())
        }),
        count_fn(|_ctx| async { Ok(1) }),
        list_fn(|ctx, _paging| async move {
            let tenant = ctx.tenant_id().map_err(DataError::other)?;
            Ok(Listed::from(vec![json!({"tenant": tenant})]))
        }),
    );

    let request = TestRequest::get("/things").bearer_token(caller.token()).build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("0.tenant", &json!(tenant));
}

#[tokio::test]
async fn test_scoped_list_requires_tenant_claim() {
    let caller = Caller::new();
    let endpoint = things_list(&caller.scoped_options(), Calls::default(), None);

    let token = caller.keys.token(&json!({"user_uuid": caller.user}));
    let request = TestRequest::get("/things").bearer_token(token).build();
    send(&endpoint, request)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_errors(&["tenant uuid is missing"]);
}
