use dojo_core::input::events::InputEvent;
use dojo_core::input::InputQueue;
use dojo_schema::Mode;
use std::thread;

#[test]
fn test_input_queue_transmission() {
    let queue = InputQueue::new();
    let sender = queue.sender();

    let handle = thread::spawn(move || {
        sender.send(InputEvent::Tap { timestamp: 1.0 }).unwrap();
        sender.send(InputEvent::Stop).unwrap();
    });

    handle.join().unwrap();

    let received1 = queue.pop().expect("Should receive first event");
    assert_eq!(received1, InputEvent::Tap { timestamp: 1.0 });

    let received2 = queue.pop().expect("Should receive second event");
    assert_eq!(received2, InputEvent::Stop);

    assert!(queue.pop().is_none());
}

#[test]
fn test_events_from_another_thread_keep_arrival_order() {
    let queue = InputQueue::new();
    let sender = queue.sender();

    std::thread::spawn(move || {
        sender.send(InputEvent::SetMode(Mode::Calibration)).unwrap();
        sender.send(InputEvent::Start { timestamp: 10.0 }).unwrap();
        sender.send(InputEvent::Tap { timestamp: 11.0 }).unwrap();
    })
    .join()
    .unwrap();

    let mut events = Vec::new();
    while let Some(event) = queue.pop() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            InputEvent::SetMode(Mode::Calibration),
            InputEvent::Start { timestamp: 10.0 },
            InputEvent::Tap { timestamp: 11.0 },
        ]
    );
    assert!(queue.pop().is_none());
}
