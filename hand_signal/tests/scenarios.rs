//! Frame sequences fed through the interpreter, including the JSON path.

use hand_signal::wire::parse_detection;
use hand_signal::{GestureInterpreter, HandObservation, Handedness, Landmark};

const EPS: f32 = 1e-6;

fn left_at(d: f32) -> HandObservation {
    HandObservation::pinch(Handedness::Left, Landmark::new(0.3, 0.6), Landmark::new(0.3, 0.6 - d))
}

#[test]
fn left_pinch_then_two_empty_frames() {
    let mut gi = GestureInterpreter::new();
    assert_eq!((gi.current().chaos(), gi.current().scale()), (0.1, 0.5));

    let s = gi.interpret(&[left_at(0.1)]);
    assert!(s.is_active());
    assert!((s.chaos() - 0.5).abs() < EPS);
    assert_eq!(s.scale(), 0.5);
    let after_hand = s;

    for _ in 0..2 {
        let s = gi.interpret(&[]);
        assert!(!s.is_active());
        assert_eq!(s.chaos(), after_hand.chaos());
        assert_eq!(s.scale(), 0.5);
    }
}

#[test]
fn hand_swap_between_frames_keeps_other_parameter() {
    let mut gi = GestureInterpreter::new();
    gi.interpret(&[left_at(0.16)]);
    let right = HandObservation::pinch(
        Handedness::Right, Landmark::new(0.7, 0.6), Landmark::new(0.7, 0.58),
    );
    let s = gi.interpret(&[right]);
    assert!((s.chaos() - 0.8).abs() < 1e-5);
    assert!((s.scale() - 0.1).abs() < 1e-5);
}

#[test]
fn json_frames_drive_the_interpreter() {
    let frames = [
        r#"{"timestamp_ms":0,"hands":[]}"#,
        r#"{"timestamp_ms":33,"hands":[{"handedness":"Right","score":0.95,"landmarks":[
            {"x":0,"y":0},{"x":0,"y":0},{"x":0,"y":0},{"x":0,"y":0},{"x":0.5,"y":0.5},
            {"x":0,"y":0},{"x":0,"y":0},{"x":0,"y":0},{"x":0.5,"y":0.75}]}]}"#,
        r#"{"timestamp_ms":66,"hands":[],"error":null}"#,
    ];

    let mut gi = GestureInterpreter::new();
    let signals: Vec<_> = frames
        .iter()
        .map(|line| {
            let msg = parse_detection(line).unwrap();
            gi.interpret(&msg.observations(0.5))
        })
        .collect();

    assert!(!signals[0].is_active());
    assert!(signals[1].is_active());
    assert_eq!(signals[1].scale(), 1.0);
    assert_eq!(signals[1].chaos(), 0.1);
    assert!(!signals[2].is_active());
    assert_eq!(signals[2].scale(), 1.0);
}
