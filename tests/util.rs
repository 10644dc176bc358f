use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vesseltrace::Error;
use vesseltrace::types::GridNode;
use vesseltrace::util::binary::*;
use vesseltrace::util::linspace::linear_samples;
use vesseltrace::util::radix_heap::{distance_key, HasKey, RadixHeapQueue};

// ---- linear_samples tests ----

#[test]
fn linear_samples_three_scales() {
    let s = linear_samples("scale", 0.1, 3.0, 3).unwrap();
    assert_eq!(s.len(), 3);
    assert_eq!(s[0], 0.1);
    assert!((s[1] - 1.55).abs() < 1e-12);
    assert_eq!(s[2], 3.0);
}

#[test]
fn linear_samples_strictly_increasing_with_exact_endpoints() {
    for count in 2..40 {
        let s = linear_samples("radius", 0.37, 4.91, count).unwrap();
        assert_eq!(s.len(), count);
        assert_eq!(s[0], 0.37);
        assert_eq!(s[count - 1], 4.91);
        assert!(s.windows(2).all(|w| w[0] < w[1]), "not increasing for {count}");
    }
}

#[test]
fn linear_samples_reject_bad_ranges() {
    assert!(matches!(
        linear_samples("scale", 3.0, 0.1, 3),
        Err(Error::InvalidRange { name: "scale", .. })
    ));
    assert!(matches!(
        linear_samples("scale", 1.0, 1.0, 3),
        Err(Error::InvalidRange { .. })
    ));
    assert!(matches!(
        linear_samples("radius", 0.5, 2.0, 1),
        Err(Error::InvalidSampleCount { count: 1, .. })
    ));
}

// ---- RadixHeapQueue tests ----

/// Minimal entry type for testing.
#[derive(Debug, Clone)]
struct TestEntry {
    distance: f64,
    payload: u32,
}

impl HasKey for TestEntry {
    fn key(&self) -> u64 {
        distance_key(self.distance)
    }
}

#[test]
fn distance_key_preserves_order() {
    let values = [0.0, 1e-300, 0.001, 0.5, 1.0, 1.0000001, 3.0, 1e9, f64::INFINITY];
    for w in values.windows(2) {
        assert!(distance_key(w[0]) < distance_key(w[1]), "{} vs {}", w[0], w[1]);
    }
    assert_eq!(distance_key(-0.0), distance_key(0.0));
}

#[test]
fn radix_heap_empty() {
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    assert!(q.is_empty());
    assert!(q.dequeue().is_none());
}

#[test]
fn radix_heap_single() {
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    q.enqueue(TestEntry {
        distance: 5.5,
        payload: 42,
    });
    assert_eq!(q.len(), 1);

    let e = q.dequeue().unwrap();
    assert_eq!(e.payload, 42);
    assert_eq!(e.distance, 5.5);
    assert!(q.is_empty());
}

#[test]
fn radix_heap_ordering() {
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    // Insert out of order.
    for &(d, p) in &[(10.0, 1u32), (3.25, 2), (7.0, 3), (0.75, 4), (20.5, 5)] {
        q.enqueue(TestEntry {
            distance: d,
            payload: p,
        });
    }
    assert_eq!(q.len(), 5);

    let order: Vec<u32> = std::iter::from_fn(|| q.dequeue()).map(|e| e.payload).collect();
    assert_eq!(order, vec![4, 2, 3, 1, 5]);
    assert!(q.is_empty());
}

#[test]
fn radix_heap_monotonic_interleaved() {
    // Dijkstra-like usage: every new key is the popped key plus a positive step.
    let mut rng = StdRng::seed_from_u64(7);
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    q.enqueue(TestEntry {
        distance: 0.0,
        payload: 0,
    });
    let mut prev = 0.0f64;
    let mut popped = 0;
    while let Some(e) = q.dequeue() {
        assert!(e.distance >= prev, "{} < {}", e.distance, prev);
        prev = e.distance;
        popped += 1;
        if popped < 500 {
            for _ in 0..rng.gen_range(0..4) {
                q.enqueue(TestEntry {
                    distance: e.distance + rng.gen_range(0.01..10.0),
                    payload: popped,
                });
            }
        }
    }
    assert!(popped > 1);
}

#[test]
fn radix_heap_same_key() {
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    for i in 0..5 {
        q.enqueue(TestEntry {
            distance: 2.0,
            payload: i,
        });
    }
    let mut payloads = Vec::new();
    while let Some(e) = q.dequeue() {
        payloads.push(e.payload);
    }
    payloads.sort();
    assert_eq!(payloads, vec![0, 1, 2, 3, 4]);
}

#[test]
fn radix_heap_iter_does_not_drain() {
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    for i in 0..10 {
        q.enqueue(TestEntry {
            distance: i as f64 * 0.3,
            payload: i,
        });
    }
    q.dequeue();
    let mut seen: Vec<u32> = q.iter().map(|e| e.payload).collect();
    seen.sort();
    assert_eq!(seen, (1..10).collect::<Vec<_>>());
    assert_eq!(q.len(), 9);
}

#[test]
fn radix_heap_reset() {
    let mut q: RadixHeapQueue<TestEntry> = RadixHeapQueue::new();
    q.enqueue(TestEntry {
        distance: 5.0,
        payload: 1,
    });
    q.enqueue(TestEntry {
        distance: 6.0,
        payload: 2,
    });
    q.dequeue();
    assert_ne!(q.cur_key(), 0);
    q.reset();
    assert!(q.is_empty());
    assert_eq!(q.cur_key(), 0);
}

// ---- binary codec tests ----

#[test]
fn binary_node_layout_is_three_native_u32() {
    let mut buf = Vec::new();
    GridNode::new(1, 2, 3).write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), 12);
    assert_eq!(&buf[4..8], &2u32.to_ne_bytes());
    let back = GridNode::read_from(&mut buf.as_slice()).unwrap();
    assert_eq!(back, GridNode::new(1, 2, 3));
}

#[test]
fn binary_truncated_stream_is_corrupt() {
    let mut buf = Vec::new();
    write_count(&mut buf, 3).unwrap();
    write_f64(&mut buf, 1.5).unwrap();
    let mut r = &buf[..10];
    assert_eq!(read_count(&mut r).unwrap(), 3);
    assert!(matches!(read_f64(&mut r), Err(Error::CorruptStream(_))));
}
