//! Integration tests for the lazy stream combinators

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use lazyweld::prelude::*;

fn even(x: &i64, _: usize, _: &StreamHandle) -> bool {
    x % 2 == 0
}

#[tokio::test]
async fn test_map_matches_iterator_map() {
    let input = vec![1i64, 2, 3, 4, 5];
    let mapped = from_vec(input.clone()).map(|x, _, _| x * 3 - 1).list().await;
    let expected: Vec<i64> = input.iter().map(|x| x * 3 - 1).collect();
    assert_eq!(mapped, expected);
}

#[tokio::test]
async fn test_map_receives_index() {
    let tagged = stream!["a", "b", "c"]
        .map(|s, i, _| format!("{}{}", s, i))
        .list()
        .await;
    assert_eq!(tagged, vec!["a0", "b1", "c2"]);
}

#[tokio::test]
async fn test_filter_is_idempotent() {
    let input: Vec<i64> = (0..30).collect();
    let once = from_vec(input.clone()).filter(even).list().await;
    let twice = from_vec(input).filter(even).filter(even).list().await;
    assert_eq!(once, twice);
    assert_eq!(once.len(), 15);
}

#[tokio::test]
async fn test_take_while_and_drop_while_partition() {
    let input = vec![2i64, 4, 6, 7, 8, 10];
    let head = from_vec(input.clone()).take_while(even).list().await;
    let tail = from_vec(input.clone()).drop_while(even).list().await;

    assert_eq!(head, vec![2, 4, 6]);
    assert_eq!(tail, vec![7, 8, 10]);
    assert_eq!([head, tail].concat(), input);
}

#[tokio::test]
async fn test_zip_and_zip_longest_lengths() {
    let short = || from_vec(vec![1, 2, 3]);
    let long = || from_vec(vec![1, 2, 3, 4, 5]);

    let zipped = zip([short(), long()]).list().await;
    assert_eq!(zipped.len(), 3);

    let longest = zip_longest([short(), long()]).list().await;
    assert_eq!(longest.len(), 5);
    assert_eq!(longest[3], vec![None, Some(4)]);
    assert_eq!(longest[4], vec![None, Some(5)]);
}

#[tokio::test]
async fn test_tee_outputs_drained_in_turn() {
    let outputs = stream![3, 4, 5].tee(3);
    for output in outputs {
        assert_eq!(output.list().await, vec![3, 4, 5]);
    }
}

#[tokio::test]
async fn test_tee_feeds_independent_pipelines() {
    let (left, right) = count(0).slice((0, 10)).tee2();
    let evens = left.filter(|x, _, _| x % 2 == 0);
    let odds = right.filter(|x, _, _| x % 2 == 1);

    let (evens, odds) = tokio::join!(evens.list(), odds.list());
    assert_eq!(evens, vec![0, 2, 4, 6, 8]);
    assert_eq!(odds, vec![1, 3, 5, 7, 9]);
}

#[tokio::test]
async fn test_reduce_floats() {
    let sum = from_vec(vec![0.1f64, 0.2, 0.3, 0.22])
        .reduce(|memo, x| memo + x, 0.0)
        .await;
    assert!((sum - 0.82).abs() < 1e-6);
}

#[tokio::test]
async fn test_slice_of_count() {
    assert_eq!(count(0).slice((3, 11, 3)).list().await, vec![3, 6, 9]);
    assert_eq!(count(0).slice(2..5).list().await, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_chain_concatenates() {
    let chained = chain([stream![1, 2, 3], stream![4, 5]]).list().await;
    assert_eq!(chained, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_cycle_replays() {
    let cycled = stream![1, 2, 3].cycle().slice((0, 7)).list().await;
    assert_eq!(cycled, vec![1, 2, 3, 1, 2, 3, 1]);
}

#[tokio::test]
async fn test_starmap_over_values() {
    let rows = values([
        Value::from(vec![Value::Int(2), Value::Int(3)]),
        Value::from(vec![Value::Int(4), Value::Int(5)]),
    ]);
    let products = rows
        .starmap(|args| {
            args.iter()
                .map(|v| v.as_int().expect("int arguments"))
                .product::<i64>()
        })
        .list()
        .await;
    assert_eq!(products, vec![6, 20]);
}

#[tokio::test]
async fn test_value_accessor_rejects_wrong_type() {
    let mut stream = values(["text"]);
    let value = stream.next().await.expect("one element");
    assert_eq!(
        value.as_int(),
        Err(Error::TypeMismatch {
            expected: "int",
            found: "string"
        })
    );
}

#[tokio::test]
async fn test_every_and_some() -> Result<()> {
    assert!(stream![2i64, 4, 6].every(even).await?);
    assert!(!stream![2i64, 3, 6].every(even).await?);
    assert!(stream![1i64, 3, 4].some(even).await?);
    assert!(!stream![1i64, 3, 5].some(even).await?);
    Ok(())
}

#[tokio::test]
async fn test_scope_cancel_closes_derived_streams() {
    let scope = Scope::new();
    let mut doubled = scope.count(0).map(|x, _, _| x * 2);
    let mut tripled = scope.repeat(1i64, None).map(|x, _, _| x * 3);

    assert_eq!(doubled.next().await, Some(0));
    assert_eq!(tripled.next().await, Some(3));
    scope.cancel();

    let drain = async {
        while doubled.next().await.is_some() {}
        while tripled.next().await.is_some() {}
    };
    tokio::time::timeout(Duration::from_secs(1), drain)
        .await
        .expect("streams close after the scope is cancelled");
}

#[tokio::test]
async fn test_callback_can_cancel_its_stream() {
    let stopped = count(0)
        .map(|x, _, handle| {
            if x == 5 {
                handle.cancel();
            }
            x
        })
        .list()
        .await;
    assert!(stopped.len() <= 6);
    assert_eq!(stopped[..5], [0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_dropped_consumer_stops_count() {
    let last_seen = Arc::new(AtomicI64::new(-1));
    let seen = last_seen.clone();

    let mut mapped = count(0).map(move |x, _, _| {
        seen.store(x, Ordering::SeqCst);
        x
    });
    assert_eq!(mapped.next().await, Some(0));
    drop(mapped);

    // Let the shutdown reach the source
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = last_seen.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(last_seen.load(Ordering::SeqCst), settled);
    assert!(settled < 10);
}

#[tokio::test]
async fn test_bounded_tee_holds_back_fast_output() {
    let scope = Scope::with_config(StreamConfig::new().max_tee_lag(Some(3)));
    let (mut fast, slow) = scope.count(0).tee2();

    let mut read = 0;
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(50), fast.next()).await {
        read += 1;
    }
    // Lag bound plus what the stalled slow output holds
    assert!(read <= 5, "fast output read {} elements", read);
    drop(slow);

    // With the slow output gone the fast one runs freely again
    assert!(fast.next().await.is_some());
}

#[tokio::test]
async fn test_futures_stream_interop() {
    let collected: Vec<i64> = count(10).slice((0, 3)).collect().await;
    assert_eq!(collected, vec![10, 11, 12]);

    let sum = stream![1, 2, 3]
        .fold(0, |acc, x| async move { acc + x })
        .await;
    assert_eq!(sum, 6);
}

#[tokio::test]
async fn test_custom_sink() {
    struct Flagged(Arc<AtomicBool>);

    #[async_trait::async_trait]
    impl Sink for Flagged {
        type Item = &'static str;
        type Output = ();

        async fn write(&mut self, item: &'static str) -> Control {
            if item == "stop" {
                self.0.store(true, Ordering::SeqCst);
                return Control::Stop;
            }
            Control::Continue
        }

        async fn finish(self) {}
    }

    let flag = Arc::new(AtomicBool::new(false));
    stream!["go", "stop", "never"]
        .drain(Flagged(flag.clone()))
        .await;
    assert!(flag.load(Ordering::SeqCst));
}
