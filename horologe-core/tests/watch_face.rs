//! End-to-end scenarios for the watch face driven through `WatchApp`

use horologe_core::app::{Control, Event, InboxPayload, WatchApp};
use horologe_core::config::WatchConfig;
use horologe_core::geometry::{Point, Rect};
use horologe_core::sync::{ChannelState, REQUEST_VALUE, WEATHER_TEMPERATURE_KEY};
use horologe_core::time::{TimeSample, Weekday};
use horologe_core::traits::{Canvas, Color, FixedClock, TextAlign, Transport};
use horologe_protocol::{AppMessageResult, Dictionary, DictionaryWriter};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Clear(Color),
    Polygon(Vec<Point>),
    Line(Point, Point),
    Text(String, TextAlign),
}

#[derive(Default)]
struct RecordingCanvas {
    ops: Vec<Op>,
}

impl RecordingCanvas {
    fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(text, _) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn polygons(&self) -> Vec<&[Point]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Polygon(points) => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    fn lines(&self) -> Vec<(Point, Point)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(from, to) => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    type Error = core::convert::Infallible;

    fn clear(&mut self, color: Color) -> Result<(), Self::Error> {
        self.ops.clear();
        self.ops.push(Op::Clear(color));
        Ok(())
    }

    fn fill_polygon(&mut self, points: &[Point], _color: Color) -> Result<(), Self::Error> {
        self.ops.push(Op::Polygon(points.to_vec()));
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, _color: Color) -> Result<(), Self::Error> {
        self.ops.push(Op::Line(from, to));
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        _frame: Rect,
        align: TextAlign,
        _color: Color,
    ) -> Result<(), Self::Error> {
        self.ops.push(Op::Text(text.into(), align));
        Ok(())
    }
}

/// Transport that records sent messages; `outbox_len` 0 means no buffer
struct MockTransport {
    outbox: Vec<u8>,
    sent: Vec<Vec<u8>>,
    opened: Option<(usize, usize)>,
    closed: bool,
}

impl MockTransport {
    fn new(outbox_len: usize) -> Self {
        Self {
            outbox: vec![0; outbox_len],
            sent: Vec::new(),
            opened: None,
            closed: false,
        }
    }
}

impl Transport for MockTransport {
    fn open(&mut self, inbox_size: usize, outbox_size: usize) -> Result<(), AppMessageResult> {
        self.opened = Some((inbox_size, outbox_size));
        Ok(())
    }

    fn outbox_begin(&mut self) -> Option<&mut [u8]> {
        if self.outbox.is_empty() {
            None
        } else {
            Some(&mut self.outbox)
        }
    }

    fn outbox_send(&mut self, len: usize) -> Result<(), AppMessageResult> {
        self.sent.push(self.outbox[..len].to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

fn sample(hour: u8, minute: u8, second: u8, weekday: Weekday, day: u8) -> TimeSample {
    TimeSample::new(hour, minute, second, weekday, day).unwrap()
}

fn start(outbox_len: usize) -> WatchApp<MockTransport, FixedClock> {
    WatchApp::on_create(
        WatchConfig::default(),
        MockTransport::new(outbox_len),
        FixedClock(TimeSample::midnight()),
    )
    .unwrap()
}

fn temperature_push(text: &str) -> InboxPayload {
    let mut buf = [0u8; 64];
    let mut writer = DictionaryWriter::new(&mut buf).unwrap();
    writer.write_cstring(WEATHER_TEMPERATURE_KEY, text).unwrap();
    let len = writer.end();
    InboxPayload::from_slice(&buf[..len]).unwrap()
}

#[test]
fn test_midnight_all_hands_up() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();
    app.dispatch(Event::Tick(TimeSample::midnight()), &mut canvas);

    let angles = app.last_angles().unwrap();
    assert_eq!(angles.second.raw(), 0);
    assert_eq!(angles.minute.raw(), 0);
    assert_eq!(angles.hour.raw(), 0);

    // Minute and hour tips straight above the center, then the second hand
    let polygons = canvas.polygons();
    let hands = &polygons[polygons.len() - 2..];
    assert_eq!(hands[0][2], Point::new(72, 4));
    assert_eq!(hands[1][2], Point::new(72, 24));
    assert_eq!(canvas.lines(), vec![(Point::new(72, 12), Point::new(72, 84))]);
}

#[test]
fn test_half_past_three() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();
    app.dispatch(Event::Tick(sample(3, 30, 0, Weekday::Monday, 1)), &mut canvas);

    let angles = app.last_angles().unwrap();
    assert_eq!(angles.minute.degrees(), 180);
    assert_eq!(angles.hour.degrees(), 105);
    assert_eq!(angles.second.degrees(), 0);
}

#[test]
fn test_temperature_push_updates_label() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();

    assert_eq!(app.transport().opened, Some((64, 64)));
    app.dispatch(Event::TransportOpened, &mut canvas);
    assert_eq!(app.channel_state(), ChannelState::RequestSent);

    // The startup request asks for the temperature key
    let request = &app.transport().sent[0];
    let request = Dictionary::parse(request).unwrap();
    let tuple = request.find(WEATHER_TEMPERATURE_KEY).unwrap();
    assert_eq!(tuple.as_i32(), Some(REQUEST_VALUE));

    app.dispatch(Event::OutboxSent, &mut canvas);
    app.dispatch(Event::InboxReceived(temperature_push("21°C")), &mut canvas);

    assert_eq!(app.temperature(), "21°C");
    assert_eq!(app.channel_state(), ChannelState::Idle);
    assert_eq!(app.diagnostics().sync_failures, 0);
    assert_eq!(canvas.texts().last(), Some(&"21°C"));
    assert_eq!(
        app.cache().get(WEATHER_TEMPERATURE_KEY).and_then(|t| t.as_cstr()),
        Some("21°C")
    );
}

#[test]
fn test_request_aborts_without_outbox() {
    let mut app = start(0);
    let mut canvas = RecordingCanvas::default();
    app.dispatch(Event::TransportOpened, &mut canvas);

    assert_eq!(app.channel_state(), ChannelState::Open);
    assert_eq!(app.diagnostics().aborted_requests, 1);
    assert!(app.transport().sent.is_empty());
    assert_eq!(app.temperature(), "1234°C");
}

#[test]
fn test_sunday_fifth_labels() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();
    app.dispatch(Event::Tick(sample(8, 0, 0, Weekday::Sunday, 5)), &mut canvas);

    assert_eq!(canvas.texts(), vec!["Sun", "05", "1234°C"]);
    assert_eq!(app.date().day.as_str(), "Sun");
    assert_eq!(app.date().num.as_str(), "05");
}

#[test]
fn test_delivery_failure_keeps_cache() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();
    app.dispatch(Event::TransportOpened, &mut canvas);
    app.dispatch(Event::OutboxFailed(AppMessageResult::SendTimeout), &mut canvas);

    assert_eq!(app.channel_state(), ChannelState::Idle);
    assert_eq!(app.diagnostics().sync_failures, 1);
    assert_eq!(app.temperature(), "1234°C");

    // Garbage inbound data is reported the same way
    let garbage = InboxPayload::from_slice(&[3, 1, 0]).unwrap();
    app.dispatch(Event::InboxReceived(garbage), &mut canvas);
    assert_eq!(app.diagnostics().sync_failures, 2);
    assert_eq!(app.temperature(), "1234°C");
}

#[test]
fn test_unknown_keys_ignored() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();

    let mut buf = [0u8; 64];
    let mut writer = DictionaryWriter::new(&mut buf).unwrap();
    writer.write_cstring(99, "ignored").unwrap();
    let len = writer.end();
    let payload = InboxPayload::from_slice(&buf[..len]).unwrap();

    app.dispatch(Event::InboxReceived(payload), &mut canvas);
    assert_eq!(app.temperature(), "1234°C");
    assert!(app.cache().get(99).is_none());
    assert_eq!(app.diagnostics().sync_failures, 0);
}

#[test]
fn test_shutdown_closes_transport() {
    let mut app = start(64);
    let mut canvas = RecordingCanvas::default();
    let events = vec![
        Event::Tick(sample(12, 0, 0, Weekday::Friday, 13)),
        Event::Shutdown,
    ];
    assert_eq!(app.run(events, &mut canvas), Control::Exit);

    let transport = app.on_destroy();
    assert!(transport.closed);
}
