use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::BodyExt;
use reel_axum::{reel, GatewayState, MediaCatalog, MediaMetadata, MediaRecord, MemoryCatalog};
use reel_blob::{
    BlobAdapter, BlobConfig, BlobError, BlobId, BlobPut, BlobResult, BlobSink, BlobStore,
    ByteRange, ByteStream, MemoryChunkStore, StoredObject,
};
use serde_json::Value;
use tower::ServiceExt;

fn record(id: &str, file_id: BlobId) -> MediaRecord {
    MediaRecord {
        id: id.to_string(),
        title: "Clip".to_string(),
        description: String::new(),
        category: "tests".to_string(),
        duration: 0,
        file_id,
        thumbnail_id: None,
        upload_date: Utc::now(),
        views: 0,
        tags: vec![],
        metadata: MediaMetadata::for_upload(0, None),
        is_active: true,
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

struct Fixture {
    router: Router,
    chunks: MemoryChunkStore,
    blob: BlobId,
    data: Vec<u8>,
}

/// One record `clip` backed by `len` patterned bytes in 100-byte chunks.
async fn fixture(len: usize) -> Fixture {
    let chunks = MemoryChunkStore::new();
    let store = BlobAdapter::new(chunks.clone(), BlobConfig::default().with_chunk_size(100)).unwrap();

    let data = pattern(len);
    let mut sink = store
        .open_write(BlobPut::new().with_content_type("video/mp4"))
        .await
        .unwrap();
    sink.write(Bytes::from(data.clone())).await.unwrap();
    let object = sink.finish().await.unwrap();

    let catalog = MemoryCatalog::new();
    catalog.insert(record("clip", object.id.clone())).await.unwrap();

    let state = GatewayState::new(Arc::new(store), Arc::new(catalog));
    Fixture {
        router: reel(state).into_router(),
        chunks,
        blob: object.id,
        data,
    }
}

async fn send(router: &Router, method: &str, uri: &str, range: Option<&str>) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(range) = range {
        req = req.header(header::RANGE, range);
    }
    router
        .clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get(router: &Router, range: Option<&str>) -> Response {
    send(router, "GET", "/media/clip", range).await
}

fn header_str<'a>(res: &'a Response, name: header::HeaderName) -> Option<&'a str> {
    res.headers().get(name).map(|v| v.to_str().unwrap())
}

async fn body_bytes(res: Response) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

async fn json_body(res: Response) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

#[tokio::test]
async fn bounded_ranges_return_exact_windows() {
    let fx = fixture(1_000).await;

    for (start, end) in [(0usize, 0usize), (0, 99), (99, 100), (150, 420), (250, 999), (999, 999)] {
        let res = get(&fx.router, Some(&format!("bytes={start}-{end}"))).await;

        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT, "{start}-{end}");
        let expected_range = format!("bytes {start}-{end}/1000");
        let expected_length = (end - start + 1).to_string();
        assert_eq!(header_str(&res, header::CONTENT_RANGE), Some(expected_range.as_str()));
        assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some(expected_length.as_str()));
        assert_eq!(header_str(&res, header::ACCEPT_RANGES), Some("bytes"));
        assert_eq!(header_str(&res, header::CONTENT_TYPE), Some("video/mp4"));

        let body = body_bytes(res).await;
        assert_eq!(&body[..], &fx.data[start..=end]);
    }
}

#[tokio::test]
async fn no_range_serves_whole_object_with_length() {
    let fx = fixture(2_345).await;

    let res = get(&fx.router, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("2345"));
    assert_eq!(header_str(&res, header::ACCEPT_RANGES), Some("bytes"));
    assert!(res.headers().get(header::CONTENT_RANGE).is_none());
    assert_eq!(&body_bytes(res).await[..], &fx.data[..]);
}

#[tokio::test]
async fn open_ended_range_from_zero_is_partial() {
    let fx = fixture(500).await;

    let res = get(&fx.router, Some("bytes=0-")).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&res, header::CONTENT_RANGE), Some("bytes 0-499/500"));
    assert_eq!(&body_bytes(res).await[..], &fx.data[..]);
}

#[tokio::test]
async fn end_past_object_is_clamped() {
    let fx = fixture(500).await;

    let res = get(&fx.router, Some("bytes=400-9999")).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&res, header::CONTENT_RANGE), Some("bytes 400-499/500"));
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("100"));
    assert_eq!(&body_bytes(res).await[..], &fx.data[400..]);
}

#[tokio::test]
async fn mid_object_window_of_ten_thousand_bytes() {
    let fx = fixture(10_000).await;

    let res = get(&fx.router, Some("bytes=5000-5999")).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&res, header::CONTENT_RANGE), Some("bytes 5000-5999/10000"));
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("1000"));
    assert_eq!(&body_bytes(res).await[..], &fx.data[5000..6000]);
}

#[tokio::test]
async fn start_at_or_past_end_is_unsatisfiable() {
    let fx = fixture(300).await;

    for range in ["bytes=300-", "bytes=300-400", "bytes=1000-2000"] {
        let res = get(&fx.router, Some(range)).await;
        assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE, "{range}");
        assert_eq!(header_str(&res, header::CONTENT_RANGE), Some("bytes */300"));
        assert_eq!(header_str(&res, header::ACCEPT_RANGES), Some("bytes"));
        assert!(body_bytes(res).await.is_empty());
    }
}

#[tokio::test]
async fn empty_object_only_serves_whole() {
    let fx = fixture(0).await;

    let res = get(&fx.router, Some("bytes=0-0")).await;
    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&res, header::CONTENT_RANGE), Some("bytes */0"));
    assert!(body_bytes(res).await.is_empty());

    let res = get(&fx.router, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("0"));
    assert!(body_bytes(res).await.is_empty());
}

#[tokio::test]
async fn contiguous_ranges_reassemble_object() {
    let fx = fixture(2_500).await;

    let head = body_bytes(get(&fx.router, Some("bytes=0-999")).await).await;
    let tail = body_bytes(get(&fx.router, Some("bytes=1000-")).await).await;

    assert_eq!(head.len(), 1000);
    assert_eq!(tail.len(), 1500);
    let mut joined = head.to_vec();
    joined.extend_from_slice(&tail);
    assert_eq!(joined, fx.data);
}

#[tokio::test]
async fn unsupported_range_forms_fall_back_to_whole_object() {
    let fx = fixture(700).await;

    for range in ["bytes=-200", "bytes=0-10,20-30", "items=0-5", "bytes=50-10", "bytes=abc"] {
        let res = get(&fx.router, Some(range)).await;
        assert_eq!(res.status(), StatusCode::OK, "{range}");
        assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("700"));
        assert!(res.headers().get(header::CONTENT_RANGE).is_none());
        assert_eq!(body_bytes(res).await.len(), 700);
    }
}

#[tokio::test]
async fn repeated_range_headers_are_treated_as_multi_range() {
    let fx = fixture(400).await;

    let req = Request::builder()
        .uri("/media/clip")
        .header(header::RANGE, "bytes=0-9")
        .header(header::RANGE, "bytes=20-29")
        .body(Body::empty())
        .unwrap();
    let res = fx.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_bytes(res).await.len(), 400);
}

#[tokio::test]
async fn unknown_record_and_missing_blob_are_distinct_404s() {
    let fx = fixture(300).await;

    let res = send(&fx.router, "GET", "/media/nope", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["className"], "not-found");
    assert!(body["message"].as_str().unwrap().contains("nope"));

    // blob gone entirely
    let chunks = fx.chunks.clone();
    let store = BlobAdapter::new(chunks, BlobConfig::default().with_chunk_size(100)).unwrap();
    store.delete(&fx.blob).await.unwrap();

    let res = get(&fx.router, Some("bytes=0-10")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Video file not found");
}

#[tokio::test]
async fn missing_first_chunk_is_404_before_headers() {
    let fx = fixture(300).await;
    fx.chunks.remove_chunk(&fx.blob, 1).unwrap();

    let res = get(&fx.router, Some("bytes=150-250")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "Video file not found");

    // a window that starts in a chunk still present is served up to the hole
    let res = get(&fx.router, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.into_body().collect().await.is_err());
}

#[tokio::test]
async fn head_returns_headers_without_body() {
    let fx = fixture(1_000).await;

    let res = send(&fx.router, "HEAD", "/media/clip", Some("bytes=10-19")).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&res, header::CONTENT_RANGE), Some("bytes 10-19/1000"));
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("10"));
    assert!(body_bytes(res).await.is_empty());

    let res = send(&fx.router, "HEAD", "/media/clip", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("1000"));
}

#[tokio::test]
async fn responses_carry_request_ids() {
    let fx = fixture(10).await;

    let res = get(&fx.router, None).await;
    assert!(res.headers().get("x-request-id").is_some());

    let provided = HeaderValue::from_static("req-test-123");
    let req = Request::builder()
        .uri("/media/nope")
        .header("x-request-id", provided.clone())
        .body(Body::empty())
        .unwrap();
    let res = fx.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn concurrent_streams_progress_independently() {
    let fx = fixture(1_000).await;

    let mut a = get(&fx.router, None).await.into_body();
    let mut b = get(&fx.router, Some("bytes=500-")).await.into_body();

    let mut got_a = Vec::new();
    let mut got_b = Vec::new();
    loop {
        let fa = a.frame().await.transpose().unwrap();
        let fb = b.frame().await.transpose().unwrap();
        if let Some(frame) = &fa {
            got_a.extend_from_slice(frame.data_ref().unwrap());
        }
        if let Some(frame) = &fb {
            got_b.extend_from_slice(frame.data_ref().unwrap());
        }
        if fa.is_none() && fb.is_none() {
            break;
        }
    }

    assert_eq!(got_a, fx.data);
    assert_eq!(&got_b[..], &fx.data[500..]);
}

// ---- stub store observing handle release and injecting faults ----

struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy)]
enum Behaviour {
    /// Produce 1 KiB frames for as long as polled.
    Endless,
    /// One good frame, then an I/O error.
    FailAfterFirst,
    /// Stop after one frame regardless of the advertised length.
    EndEarly,
}

struct StubStore {
    length: u64,
    behaviour: Behaviour,
    released: Arc<AtomicBool>,
}

impl StubStore {
    fn new(length: u64, behaviour: Behaviour) -> Self {
        Self {
            length,
            behaviour,
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for StubStore {
    async fn stat(&self, id: &BlobId) -> BlobResult<StoredObject> {
        Ok(StoredObject {
            id: id.clone(),
            length: self.length,
            content_type: None,
            filename: None,
            created_at: 0,
            chunk_size: 1024,
        })
    }

    async fn open_read(&self, _id: &BlobId, _range: Option<ByteRange>) -> BlobResult<ByteStream> {
        let guard = ReleaseFlag(Arc::clone(&self.released));
        let behaviour = self.behaviour;
        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            let mut frames = 0u32;
            loop {
                match behaviour {
                    Behaviour::FailAfterFirst if frames == 1 => {
                        yield Err(io::Error::other("disk went away"));
                        return;
                    }
                    Behaviour::EndEarly if frames == 1 => return,
                    _ => {}
                }
                frames += 1;
                yield Ok(Bytes::from(vec![7u8; 1024]));
            }
        }))
    }

    async fn open_write(&self, _put: BlobPut) -> BlobResult<Box<dyn BlobSink>> {
        Err(BlobError::invalid("read-only stub"))
    }

    async fn delete(&self, _id: &BlobId) -> BlobResult<()> {
        Ok(())
    }
}

async fn stub_router(store: StubStore) -> (Router, Arc<AtomicBool>) {
    let released = Arc::clone(&store.released);
    let catalog = MemoryCatalog::new();
    catalog.insert(record("clip", BlobId::from("stub"))).await.unwrap();
    let state = GatewayState::new(Arc::new(store), Arc::new(catalog));
    (reel(state).into_router(), released)
}

#[tokio::test]
async fn client_disconnect_releases_store_read() {
    let (router, released) = stub_router(StubStore::new(10 * 1024 * 1024 * 1024, Behaviour::Endless)).await;

    let res = get(&router, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header_str(&res, header::CONTENT_TYPE), Some("video/mp4"));

    let mut body = res.into_body();
    let first = body.frame().await.unwrap().unwrap();
    assert_eq!(first.data_ref().unwrap().len(), 1024);
    assert!(!released.load(Ordering::SeqCst));

    drop(body);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !released.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("store read released after disconnect");
}

#[tokio::test]
async fn mid_stream_fault_aborts_the_body() {
    let (router, released) = stub_router(StubStore::new(4096, Behaviour::FailAfterFirst)).await;

    let res = get(&router, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header_str(&res, header::CONTENT_LENGTH), Some("4096"));

    let mut body = res.into_body();
    let first = body.frame().await.unwrap().unwrap();
    assert_eq!(first.data_ref().unwrap().len(), 1024);
    assert!(body.frame().await.unwrap().is_err());
    drop(body);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn short_store_stream_is_an_error_not_a_truncated_success() {
    let (router, _) = stub_router(StubStore::new(4096, Behaviour::EndEarly)).await;

    let res = get(&router, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.into_body().collect().await.is_err());
}

#[tokio::test]
async fn overlong_store_stream_is_cut_at_content_length() {
    let (router, released) = stub_router(StubStore::new(1500, Behaviour::Endless)).await;

    let res = get(&router, None).await;
    let body = body_bytes(res).await;
    assert_eq!(body.len(), 1500);
    assert!(released.load(Ordering::SeqCst));
}
