//! Cached reads against a simulated producer.

mod common;

use argus_daq::mock::MemoryRegion;
use argus_daq::ArgusClient;
use common::desktop_sample;
use std::sync::Arc;

#[test]
fn test_unchanged_counter_returns_same_sample() {
    let (region, producer) = MemoryRegion::new();
    producer.publish(&desktop_sample(100));

    let client = ArgusClient::new(region);
    let mut cached = client.cached();

    let first = cached.read().unwrap();
    for _ in 0..10 {
        assert!(Arc::ptr_eq(&first, &cached.read().unwrap()));
    }
    assert_eq!(producer.lock_count(), 1);
}

#[test]
fn test_changed_counter_decodes_once() {
    let (region, producer) = MemoryRegion::new();
    producer.publish(&desktop_sample(100));

    let client = ArgusClient::new(region);
    let mut cached = client.cached();
    let first = cached.read().unwrap();

    producer.publish(&desktop_sample(101));
    let second = cached.read().unwrap();
    let third = cached.read().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&second, &third));
    assert_eq!(second.cycle_counter, 101);
    assert_eq!(producer.lock_count(), 2);
}

#[test]
fn test_concurrent_reads_are_serialized() {
    let (region, producer) = MemoryRegion::new();
    producer.publish(&desktop_sample(5));
    let client = Arc::new(ArgusClient::new(region));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    assert_eq!(client.read().unwrap().data.len(), common::DESKTOP_MEASUREMENTS);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(producer.lock_count(), 100);
}
