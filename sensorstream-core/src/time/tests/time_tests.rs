use super::*;

#[test]
fn test_no_watermark_before_first_event() {
    let tracker = WatermarkTracker::new(Duration::from_secs(5));
    assert_eq!(tracker.current(), Watermark::min());
    assert_eq!(tracker.max_event_time(), None);
    assert!(!tracker.is_late(EVENT_TIME_MIN));
}

#[test]
fn test_watermark_advances_with_max_seen() {
    let mut tracker = WatermarkTracker::new(Duration::from_secs(5));

    let adv = tracker.observe(10_000); // 10s
    assert_eq!(adv.before, Watermark::min());
    assert_eq!(adv.after, Watermark::new(5_000)); // 10s - 5s
    assert!(adv.advanced());

    let adv = tracker.observe(20_000); // 20s
    assert_eq!(adv.before, Watermark::new(5_000));
    assert_eq!(adv.after, Watermark::new(15_000)); // 20s - 5s
    assert_eq!(tracker.max_event_time(), Some(20_000));
}

#[test]
fn test_out_of_order_event_does_not_regress_watermark() {
    let mut tracker = WatermarkTracker::new(Duration::from_secs(5));

    tracker.observe(20_000);
    let adv = tracker.observe(5_000); // older than max_seen
    assert!(!adv.advanced());
    assert_eq!(tracker.current(), Watermark::new(15_000));
}

#[test]
fn test_zero_lateness_watermark() {
    let mut tracker = WatermarkTracker::new(Duration::ZERO);
    tracker.observe(1_000);
    assert_eq!(tracker.current(), Watermark::new(1_000));
}

#[test]
fn test_is_late_boundary() {
    let mut tracker = WatermarkTracker::new(Duration::from_secs(5));
    tracker.observe(20_000);
    // Exactly at the watermark is still on time.
    assert!(!tracker.is_late(15_000));
    assert!(tracker.is_late(14_999));
}

#[test]
fn test_six_seconds_behind_is_late_with_five_second_bound() {
    let mut tracker = WatermarkTracker::new(Duration::from_secs(5));
    tracker.observe(30_000);
    let watermark = tracker.current().timestamp;
    assert!(tracker.is_late(watermark - 6_000));
}

#[test]
fn test_watermark_never_rewinds_over_random_sequence() {
    let mut tracker = WatermarkTracker::new(Duration::from_millis(1_500));
    let mut state: u64 = 42;
    let mut last = tracker.current();
    for _ in 0..1_000 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let ts = (state >> 33) as i64 % 100_000;
        let adv = tracker.observe(ts);
        assert!(adv.after >= adv.before);
        assert!(adv.after >= last);
        last = adv.after;
    }
}

#[test]
fn test_negative_timestamps_do_not_underflow() {
    let mut tracker = WatermarkTracker::new(Duration::from_secs(5));
    let adv = tracker.observe(EVENT_TIME_MIN + 1);
    assert_eq!(adv.after, Watermark::new(EVENT_TIME_MIN));
}
