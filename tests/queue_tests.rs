//! SyncQueue and ErrorCollector under contention.

use partcat::pipeline::{ErrorCollector, SyncQueue};
use partcat::{ErrorKind, LoadError};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_pop_returns_none_once_closed_and_drained() {
    let q: SyncQueue<u32> = [1, 2].into_iter().collect();
    assert!(q.is_closed());
    assert_eq!(q.len(), 2);
    assert_eq!(q.pop(), Some(1));
    assert_eq!(q.pop(), Some(2));
    assert_eq!(q.pop(), None);
}

#[test]
fn test_push_after_close_is_rejected() {
    let q = SyncQueue::new();
    q.push("a").unwrap();
    q.close();
    assert_eq!(q.push("b"), Err("b"));
    assert_eq!(q.pop(), Some("a"));
    assert_eq!(q.pop(), None);
}

#[test]
fn test_blocked_consumer_wakes_on_push_and_close() {
    let q = Arc::new(SyncQueue::new());
    let q_c = Arc::clone(&q);
    let consumer = thread::spawn(move || {
        let mut got = Vec::new();
        while let Some(v) = q_c.pop() {
            got.push(v);
        }
        got
    });
    thread::sleep(Duration::from_millis(20));
    q.push(10).unwrap();
    q.push(11).unwrap();
    thread::sleep(Duration::from_millis(20));
    q.close();
    assert_eq!(consumer.join().unwrap(), vec![10, 11]);
}

#[test]
fn test_each_item_delivered_to_exactly_one_consumer() {
    const ITEMS: usize = 2_000;
    let q = Arc::new(SyncQueue::new());
    let consumers: Vec<_> = (0..6)
        .map(|_| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                let mut got = Vec::new();
                while let Some(v) = q.pop() {
                    got.push(v);
                }
                got
            })
        })
        .collect();
    let producers: Vec<_> = (0..3)
        .map(|p| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in (p..ITEMS).step_by(3) {
                    q.push(i).unwrap();
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    q.close();

    let mut seen = HashSet::new();
    let mut total = 0;
    for c in consumers {
        for v in c.join().unwrap() {
            assert!(seen.insert(v), "item {} delivered twice", v);
            total += 1;
        }
    }
    assert_eq!(total, ITEMS);
}

#[test]
fn test_clear_discards_pending() {
    let mut q = SyncQueue::new();
    for i in 0..5 {
        q.push(i).unwrap();
    }
    q.clear();
    assert!(q.is_empty());
    assert_eq!(q.try_pop(), None);
    q.push(9).unwrap();
    assert_eq!(q.drain(), vec![9]);
}

#[test]
fn test_error_collector_from_many_threads() {
    let errors = Arc::new(ErrorCollector::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let errors = Arc::clone(&errors);
            thread::spawn(move || {
                for j in 0..25 {
                    errors.push_load_error(&format!("Lib{}", i), LoadError::format("x", j));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(errors.len(), 200);
    assert!(errors.snapshot().iter().all(|e| e.kind == ErrorKind::Format));

    let mut errors = Arc::try_unwrap(errors).ok().unwrap();
    assert!(errors.pop().is_some());
    errors.clear();
    assert!(errors.is_empty());
}
