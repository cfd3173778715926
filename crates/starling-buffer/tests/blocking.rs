//! Bounded-buffer backpressure: fail-fast versus blocking adds, and
//! how blocked producers get released.

use starling_buffer::SeqnoBuffer;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn fail_fast_add_rejects_when_window_is_full() {
    let buf: SeqnoBuffer<u64> = SeqnoBuffer::bounded(10, 5).unwrap();
    for s in 6u64..=15 {
        assert!(buf.add(s, s));
    }
    assert_eq!(buf.size(), 10);
    assert!(!buf.add(16, 16));
    assert_eq!(buf.stats().num_dropped, 1);
    assert_eq!(buf.size(), 10);
}

#[test]
fn blocked_add_completes_after_remove_frees_a_slot() {
    let buf: Arc<SeqnoBuffer<u64>> = Arc::new(SeqnoBuffer::bounded(10, 0).unwrap());
    for s in 1u64..=10 {
        assert!(buf.add(s, s));
    }

    let producer = {
        let buf = Arc::clone(&buf);
        let (started_tx, started_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            started_tx.send(()).unwrap();
            buf.add_blocking(11, 11)
        });
        started_rx.recv().unwrap();
        handle
    };

    // give the producer time to park on the gate
    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());
    assert_eq!(buf.stats().num_blockings, 1);

    assert_eq!(buf.remove(), Some(1));
    assert!(producer.join().unwrap());
    assert_eq!(buf.get(11), Some(11));
    assert_eq!(buf.size(), 10);
}

#[test]
fn blocked_add_completes_after_purge_frees_slots() {
    let buf: Arc<SeqnoBuffer<u64>> = Arc::new(SeqnoBuffer::bounded(5, 0).unwrap());
    for s in 1u64..=5 {
        assert!(buf.add(s, s));
    }
    buf.remove_many_with(false, 3, None).unwrap(); // hd = 3, low still 0

    let handle = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || buf.add_blocking(8, 8))
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!handle.is_finished()); // 8 - low(0) > 5

    buf.purge(3); // low = 3, window now reaches 8
    assert!(handle.join().unwrap());
    assert_eq!(buf.get(8), Some(8));
}

#[test]
fn close_releases_blocked_producers_with_failure() {
    let buf: Arc<SeqnoBuffer<u64>> = Arc::new(SeqnoBuffer::bounded(4, 0).unwrap());
    for s in 1u64..=4 {
        assert!(buf.add(s, s));
    }

    let handles: Vec<_> = (5u64..=7)
        .map(|s| {
            let buf = Arc::clone(&buf);
            thread::spawn(move || buf.add_blocking(s, s))
        })
        .collect();
    thread::sleep(Duration::from_millis(50));
    for h in &handles {
        assert!(!h.is_finished());
    }

    buf.close();
    for h in handles {
        assert!(!h.join().unwrap());
    }
    // existing content still drains after close
    assert_eq!(buf.remove_many(0), Some(vec![1, 2, 3, 4]));
}

#[test]
fn seqno_purged_while_blocked_is_rejected() {
    let buf: Arc<SeqnoBuffer<u64>> = Arc::new(SeqnoBuffer::bounded(3, 0).unwrap());
    for s in 1u64..=3 {
        assert!(buf.add(s, s));
    }
    let handle = {
        let buf = Arc::clone(&buf);
        thread::spawn(move || buf.add_blocking(4, 4))
    };
    thread::sleep(Duration::from_millis(50));

    // jump the window far past the waiter in one purge; the waiter
    // must notice its seqno is now below the delivered watermark
    buf.set_highest_delivered(10);
    buf.purge(10);

    assert!(!handle.join().unwrap());
    assert_eq!(buf.get(4), None);
}
