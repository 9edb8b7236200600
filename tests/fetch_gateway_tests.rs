use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use futures::channel::oneshot;
use futures::executor::block_on;
use moment_timeline::api::{
    BucketSource, DataFetchGateway, FetchConfig, FetchOutcome, InMemoryMomentStore,
    StoreFailure, StoredMoment, TimelineQuery, TimelineQueryRequest, TimelineQueryResponse,
    Visibility,
};
use moment_timeline::core::{
    RawMomentPoint, TimeBucket, TimeScale, TimeWindow, compute_window_at, fallback_buckets,
    fallback_seed,
};
use moment_timeline::error::{TimelineError, TimelineResult};

type Reply = TimelineResult<TimelineQueryResponse>;

/// Query double whose responses are released by the test through oneshot channels.
#[derive(Default)]
struct ScriptedQuery {
    replies: RefCell<VecDeque<oneshot::Receiver<Reply>>>,
    requests: RefCell<Vec<TimelineQueryRequest>>,
}

impl ScriptedQuery {
    fn expect_reply(&self) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.replies.borrow_mut().push_back(receiver);
        sender
    }
}

impl TimelineQuery for ScriptedQuery {
    fn query(&self, request: TimelineQueryRequest) -> impl Future<Output = Reply> {
        self.requests.borrow_mut().push(request);
        let reply = self.replies.borrow_mut().pop_front();
        async move {
            match reply {
                Some(reply) => reply
                    .await
                    .unwrap_or_else(|_| Err(TimelineError::Transport("reply dropped".to_owned()))),
                None => Err(TimelineError::Transport("no scripted reply".to_owned())),
            }
        }
    }
}

fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn month_window(center: DateTime<Utc>) -> TimeWindow {
    compute_window_at(TimeScale::Month, center, utc(2025, 1, 1))
}

fn public_store(times: &[DateTime<Utc>]) -> InMemoryMomentStore {
    InMemoryMomentStore::with_moments(times.iter().enumerate().map(|(i, time)| {
        StoredMoment::public(RawMomentPoint::new(*time, format!("m-{i}")))
    }))
}

#[test]
fn superseded_fetch_is_discarded_when_it_resolves_late() {
    let gateway =
        DataFetchGateway::new(ScriptedQuery::default(), FetchConfig::default()).expect("gateway");
    let w1 = month_window(utc(2024, 6, 15));
    let w2 = month_window(utc(2020, 6, 15));

    let reply_a = gateway.query().expect_reply();
    let reply_b = gateway.query().expect_reply();
    let fetch_a = gateway.fetch(w1, TimeScale::Month);
    let fetch_b = gateway.fetch(w2, TimeScale::Month);
    assert_eq!(gateway.query().requests.borrow().len(), 2);

    reply_b
        .send(Ok(TimelineQueryResponse::with_points(vec![
            RawMomentPoint::new(utc(2020, 3, 3), "b-1"),
            RawMomentPoint::new(utc(2020, 4, 4), "b-2"),
        ])))
        .expect("send b");
    let outcome_b = block_on(fetch_b);

    reply_a
        .send(Ok(TimelineQueryResponse::with_points(vec![RawMomentPoint::new(
            utc(2024, 5, 5),
            "a-1",
        )])))
        .expect("send a");
    let outcome_a = block_on(fetch_a);

    assert_eq!(
        outcome_a,
        FetchOutcome::Superseded {
            generation: 1,
            latest: 2
        }
    );
    let applied = outcome_b.into_applied().expect("b is current");
    assert_eq!(applied.generation, 2);
    assert_eq!(applied.window, w2);
    assert_eq!(applied.source, BucketSource::Network);
    let keys: Vec<&str> = applied.buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["2020-03", "2020-04"]);
}

#[test]
fn late_failure_of_superseded_fetch_is_not_reported() {
    let gateway =
        DataFetchGateway::new(ScriptedQuery::default(), FetchConfig::default()).expect("gateway");
    let reply_a = gateway.query().expect_reply();
    let reply_b = gateway.query().expect_reply();
    let fetch_a = gateway.fetch(month_window(utc(2024, 6, 15)), TimeScale::Month);
    let fetch_b = gateway.fetch(month_window(utc(2020, 6, 15)), TimeScale::Month);

    reply_b
        .send(Ok(TimelineQueryResponse::with_points(Vec::new())))
        .expect("send b");
    assert!(!block_on(fetch_b).is_superseded());

    reply_a
        .send(Err(TimelineError::Transport("timed out".to_owned())))
        .expect("send a");
    assert!(block_on(fetch_a).is_superseded());
    assert_eq!(gateway.last_failure(), None);
}

#[test]
fn request_carries_window_limit_and_visibility() {
    let gateway = DataFetchGateway::new(ScriptedQuery::default(), FetchConfig::default())
        .expect("gateway")
        .with_visibility(Visibility::OwnerOnly {
            owner_id: "alice".to_owned(),
        });
    let window = month_window(utc(2024, 6, 15));

    drop(gateway.fetch(window, TimeScale::Month));

    let requests = gateway.query().requests.borrow();
    let request = &requests[0];
    assert_eq!(request.scale, TimeScale::Month);
    assert_eq!(request.start_date, "2023-06-15T00:00:00.000Z");
    assert_eq!(request.end_date, "2025-06-15T00:00:00.000Z");
    assert_eq!(request.limit, 2_000);
    assert_eq!(request.window(), Some(window));
}

#[test]
fn transport_failure_resolves_with_deterministic_fallback() {
    let store = public_store(&[utc(2024, 6, 1)]);
    store.set_failure(Some(StoreFailure::Transport("connection reset".to_owned())));
    let config = FetchConfig::default();
    let gateway = DataFetchGateway::new(store, config).expect("gateway");
    let window = month_window(utc(2024, 6, 15));

    let first = block_on(gateway.fetch(window, TimeScale::Month))
        .into_applied()
        .expect("current");
    let second = block_on(gateway.fetch(window, TimeScale::Month))
        .into_applied()
        .expect("current");

    assert!(first.source.is_fallback());
    assert!(!first.buckets.is_empty());
    assert_eq!(first.buckets, second.buckets);
    assert_eq!(
        first.buckets,
        fallback_buckets(
            window,
            TimeScale::Month,
            fallback_seed(config.fallback_seed, window, TimeScale::Month)
        )
    );

    let failure = gateway.last_failure().expect("failure recorded");
    assert_eq!(failure.generation, 2);
    assert!(failure.reason.contains("connection reset"));
    assert_eq!(gateway.cache_stats().size, 0);
}

#[test]
fn server_failure_response_uses_its_error_message() {
    let store = public_store(&[]);
    store.set_failure(Some(StoreFailure::Server("database unavailable".to_owned())));
    let gateway = DataFetchGateway::new(store, FetchConfig::default()).expect("gateway");

    let applied = block_on(gateway.fetch(month_window(utc(2024, 6, 15)), TimeScale::Month))
        .into_applied()
        .expect("current");
    assert_eq!(
        applied.source,
        BucketSource::Fallback {
            reason: "database unavailable".to_owned()
        }
    );
}

#[test]
fn repeated_window_is_served_from_cache() {
    let store = public_store(&[utc(2024, 1, 5), utc(2024, 1, 20), utc(2024, 2, 1)]);
    let gateway = DataFetchGateway::new(store, FetchConfig::default()).expect("gateway");
    let window = month_window(utc(2024, 6, 15));

    let first = block_on(gateway.fetch(window, TimeScale::Month))
        .into_applied()
        .expect("current");
    let second = block_on(gateway.fetch(window, TimeScale::Month))
        .into_applied()
        .expect("current");

    assert_eq!(first.source, BucketSource::Network);
    assert_eq!(second.source, BucketSource::Cache);
    assert_eq!(first.buckets, second.buckets);
    assert_eq!(gateway.query().query_count(), 1);

    let stats = gateway.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
}

#[test]
fn zero_ttl_always_queries() {
    let store = public_store(&[utc(2024, 1, 5)]);
    let config = FetchConfig {
        cache_ttl_ms: 0,
        ..FetchConfig::default()
    };
    let gateway = DataFetchGateway::new(store, config).expect("gateway");
    let window = month_window(utc(2024, 6, 15));

    block_on(gateway.fetch(window, TimeScale::Month));
    block_on(gateway.fetch(window, TimeScale::Month));
    assert_eq!(gateway.query().query_count(), 2);
}

#[test]
fn scale_is_part_of_the_cache_key() {
    let store = public_store(&[utc(2024, 1, 5)]);
    let gateway = DataFetchGateway::new(store, FetchConfig::default()).expect("gateway");
    let window = month_window(utc(2024, 6, 15));

    block_on(gateway.fetch(window, TimeScale::Month));
    let by_day = block_on(gateway.fetch(window, TimeScale::Day))
        .into_applied()
        .expect("current");
    assert_eq!(by_day.source, BucketSource::Network);
    assert_eq!(by_day.buckets[0].key, "2024-01-05");
}

#[test]
fn pre_aggregated_payload_is_normalized() {
    let gateway =
        DataFetchGateway::new(ScriptedQuery::default(), FetchConfig::default()).expect("gateway");
    let reply = gateway.query().expect_reply();
    let fetch = gateway.fetch(month_window(utc(2024, 6, 15)), TimeScale::Month);

    let bucket = |key: &str, start: DateTime<Utc>, count: u64| TimeBucket {
        key: key.to_owned(),
        bucket_start: start,
        count,
        star_count: count + 1,
        total_weight: count,
        representative_item: None,
    };
    reply
        .send(Ok(TimelineQueryResponse::with_buckets(vec![
            bucket("2024-03", utc(2024, 3, 1), 3),
            bucket("2024-01", utc(2024, 1, 1), 0),
            bucket("2023-11", utc(2023, 11, 1), 2),
        ])))
        .expect("send");

    let applied = block_on(fetch).into_applied().expect("current");
    let keys: Vec<&str> = applied.buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["2023-11", "2024-03"]);
    assert!(applied.buckets.iter().all(|b| b.star_count <= b.count));
}

#[test]
fn visibility_filters_stored_moments() {
    let time = utc(2024, 3, 3);
    let store = InMemoryMomentStore::with_moments([
        StoredMoment::public(RawMomentPoint::new(time, "public")),
        StoredMoment::owned(RawMomentPoint::new(time, "alice-private"), "alice", false),
        StoredMoment::owned(RawMomentPoint::new(time, "bob-private"), "bob", false),
    ]);
    let window = month_window(utc(2024, 6, 15));

    let count_for = |visibility: Visibility| {
        let request = TimelineQueryRequest::for_window(window, TimeScale::Month, 100, visibility);
        match block_on(store.query(request)).expect("query").payload {
            moment_timeline::api::QueryPayload::Points(points) => points.len(),
            moment_timeline::api::QueryPayload::Buckets(_) => unreachable!(),
        }
    };

    assert_eq!(count_for(Visibility::PublicOnly), 1);
    assert_eq!(
        count_for(Visibility::OwnerOrPublic {
            owner_id: "alice".to_owned()
        }),
        2
    );
    assert_eq!(
        count_for(Visibility::OwnerOnly {
            owner_id: "bob".to_owned()
        }),
        1
    );
}

#[test]
fn store_sorts_filters_and_caps_rows() {
    let base = utc(2024, 1, 1);
    let mut times: Vec<DateTime<Utc>> = (0..2_500i64)
        .rev()
        .map(|i| base + TimeDelta::minutes(i))
        .collect();
    times.push(utc(1990, 1, 1));
    let store = public_store(&times);
    let window = month_window(utc(2024, 6, 15));

    let points = |limit: u32| {
        let request = TimelineQueryRequest::for_window(
            window,
            TimeScale::Month,
            limit,
            Visibility::PublicOnly,
        );
        match block_on(store.query(request)).expect("query").payload {
            moment_timeline::api::QueryPayload::Points(points) => points,
            moment_timeline::api::QueryPayload::Buckets(_) => unreachable!(),
        }
    };

    let capped = points(10_000);
    assert_eq!(capped.len(), moment_timeline::api::STORE_ROW_CAP);
    assert_eq!(capped[0].parsed_timestamp(), Some(base));
    assert!(
        capped
            .windows(2)
            .all(|pair| pair[0].parsed_timestamp() <= pair[1].parsed_timestamp())
    );
    assert_eq!(points(10).len(), 10);
}
