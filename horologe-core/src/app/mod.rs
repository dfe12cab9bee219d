//! The watch face application context
//!
//! [`WatchApp`] owns everything the face needs: geometry, the sync cache
//! and channel, the redraw scheduler and the text shown under the dial.
//! All inputs arrive as [`Event`]s and are handled to completion one at a
//! time, so no two handlers ever overlap.

pub mod events;

use core::fmt::Write;

use heapless::String;

use horologe_protocol::{
    calc_buffer_size, AppMessageResult, Dictionary, DictionaryResult, Tuple, TupleValue, Tuplet,
};

use crate::config::{ConfigError, WatchConfig};
use crate::date::DateText;
use crate::geometry::{HandAngles, HandGeometry, Rect, TickMarks};
use crate::scheduler::RedrawScheduler;
use crate::sync::{
    ChannelState, SyncCache, SyncChannel, SyncFailure, SyncKey, TupleChange, SYNC_BUFFER_SIZE,
    WEATHER_TEMPERATURE_KEY,
};
use crate::time::TimeSample;
use crate::traits::{Canvas, ClockSource, Color, TextAlign, Transport};

pub use events::{Control, Event, InboxPayload};

/// Longest temperature text the sync cache can hold
pub const TEMPERATURE_TEXT_LEN: usize = SYNC_BUFFER_SIZE - calc_buffer_size(&[1]);

/// Counters for conditions that are reported but not fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Frames drawn
    pub frames: u32,
    /// Frames abandoned or drawn without a label because the canvas failed
    pub draw_errors: u32,
    /// Sync failures passed to the error path
    pub sync_failures: u32,
    /// Requests that could not be built or sent
    pub aborted_requests: u32,
    /// Inbound messages discarded
    pub dropped_messages: u32,
}

pub struct WatchApp<T: Transport, K: ClockSource> {
    config: WatchConfig,
    hands: HandGeometry,
    ticks: TickMarks,
    date: DateText,
    temperature: String<TEMPERATURE_TEXT_LEN>,
    cache: SyncCache<SYNC_BUFFER_SIZE>,
    channel: SyncChannel<T>,
    scheduler: RedrawScheduler,
    clock: K,
    last_angles: Option<HandAngles>,
    diagnostics: Diagnostics,
}

impl<T: Transport, K: ClockSource> WatchApp<T, K> {
    /// Build the face and start opening the transport
    ///
    /// The temperature starts at the configured placeholder. A transport
    /// that refuses to open is reported and the face runs without sync.
    pub fn on_create(config: WatchConfig, transport: T, mut clock: K) -> Result<Self, ConfigError> {
        config.validate()?;

        let cache = SyncCache::new(&[Tuplet::cstring(WEATHER_TEMPERATURE_KEY, &config.placeholder)])
            .map_err(|_| ConfigError::Placeholder)?;

        let mut temperature = String::new();
        temperature
            .push_str(&config.placeholder)
            .map_err(|_| ConfigError::Placeholder)?;

        let bounds = Rect::from_size(config.screen);
        let mut app = Self {
            hands: HandGeometry::new(bounds),
            ticks: TickMarks::new(bounds),
            date: DateText::format(&clock.now()),
            temperature,
            cache,
            channel: SyncChannel::new(transport),
            scheduler: RedrawScheduler::new(config.tick_unit),
            clock,
            last_angles: None,
            diagnostics: Diagnostics::default(),
            config,
        };

        let (inbox, outbox) = (app.config.inbox_size as usize, app.config.outbox_size as usize);
        if let Err(e) = app.channel.open(inbox, outbox) {
            warn!("watch: transport open failed: {}", e);
            app.diagnostics.sync_failures += 1;
        }

        info!("watch: created, tick unit {}", app.config.tick_unit);
        Ok(app)
    }

    /// Handle one event to completion
    pub fn dispatch<C: Canvas>(&mut self, event: Event, canvas: &mut C) -> Control {
        trace!("watch: event {}", event);

        match event {
            Event::Tick(sample) => {
                if self.scheduler.on_tick(&sample) {
                    self.render(&sample, canvas);
                }
            }
            Event::TransportOpened => {
                self.channel.on_opened();
                // One refresh at startup, never retried
                self.request_refresh();
            }
            Event::InboxReceived(payload) => self.on_inbox(&payload, canvas),
            Event::InboxDropped(reason) => {
                self.diagnostics.dropped_messages += 1;
                self.on_failure(SyncFailure::AppMessage(reason));
            }
            Event::OutboxSent => self.channel.on_sent(),
            Event::OutboxFailed(reason) => self.on_failure(SyncFailure::AppMessage(reason)),
            Event::Shutdown => return Control::Exit,
        }

        Control::Continue
    }

    /// Dispatch events in order until one asks to exit or they run out
    pub fn run<C, I>(&mut self, events: I, canvas: &mut C) -> Control
    where
        C: Canvas,
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            if self.dispatch(event, canvas) == Control::Exit {
                return Control::Exit;
            }
        }
        Control::Continue
    }

    /// Close the transport and hand it back
    pub fn on_destroy(self) -> T {
        info!("watch: destroyed after {} frames", self.diagnostics.frames);
        self.channel.into_transport()
    }

    fn request_refresh(&mut self) {
        match self.channel.request(SyncKey::Temperature) {
            Ok(()) => info!("watch: temperature requested"),
            Err(e) => {
                warn!("watch: temperature request aborted: {}", e);
                self.diagnostics.aborted_requests += 1;
            }
        }
    }

    fn on_inbox<C: Canvas>(&mut self, payload: &[u8], canvas: &mut C) {
        if payload.len() > self.config.inbox_size as usize {
            warn!("watch: {} byte message exceeds inbox", payload.len());
            self.diagnostics.dropped_messages += 1;
            self.on_failure(SyncFailure::AppMessage(AppMessageResult::BufferOverflow));
            return;
        }

        let dictionary = match Dictionary::parse(payload) {
            Ok(dictionary) => dictionary,
            Err(e) => {
                self.on_failure(SyncFailure::Dictionary(e));
                return;
            }
        };

        if let Some(tuple) = dictionary.find(WEATHER_TEMPERATURE_KEY) {
            if !displayable(&tuple) {
                warn!("watch: temperature value of type {} rejected", tuple.kind);
                self.on_failure(SyncFailure::Dictionary(DictionaryResult::InvalidArgs));
                return;
            }
        }

        let temperature = &mut self.temperature;
        let merged = self
            .cache
            .apply(&dictionary, |change| on_tuple_changed(change, temperature));

        match merged {
            Ok(changed) => {
                self.channel.on_reply();
                if changed > 0 {
                    self.scheduler.invalidate();
                }
            }
            Err(e) => {
                self.on_failure(SyncFailure::Dictionary(e));
                return;
            }
        }

        if self.scheduler.take_invalidation() {
            let now = self.clock.now();
            self.render(&now, canvas);
        }
    }

    /// Report a failure; the cache is left as it was
    fn on_failure(&mut self, failure: SyncFailure) {
        self.diagnostics.sync_failures += 1;
        self.channel.on_failure(failure);
        // No retry: the channel goes back to idle and waits for a new request
        self.channel.acknowledge_error();
    }

    fn render<C: Canvas>(&mut self, sample: &TimeSample, canvas: &mut C) {
        match self.draw(sample, canvas) {
            Ok((angles, labels_drawn)) => {
                if !labels_drawn {
                    warn!("watch: label not drawn");
                    self.diagnostics.draw_errors += 1;
                }
                self.last_angles = Some(angles);
                self.diagnostics.frames += 1;
            }
            Err(_) => {
                warn!("watch: frame abandoned, canvas error");
                self.diagnostics.draw_errors += 1;
            }
        }
    }

    /// Draw one frame; a failed label does not stop the hands
    ///
    /// Returns the hand angles and whether every label was drawn.
    fn draw<C: Canvas>(
        &mut self,
        sample: &TimeSample,
        canvas: &mut C,
    ) -> Result<(HandAngles, bool), C::Error> {
        canvas.clear(Color::Black)?;

        if self.config.tick_marks {
            self.ticks.draw(canvas, Color::White)?;
        }

        self.date.update(sample);
        let layout = &self.config.layout;
        let labels = [
            (self.date.day.as_str(), layout.day, TextAlign::Left),
            (self.date.num.as_str(), layout.num, TextAlign::Left),
            (self.temperature.as_str(), layout.temperature, layout.temperature_align),
        ];
        let mut labels_drawn = true;
        for (text, frame, align) in labels {
            labels_drawn &= canvas.draw_text(text, frame, align, Color::White).is_ok();
        }

        let second_hand = self.config.shows_second_hand();
        let angles = self.hands.draw(sample, canvas, second_hand)?;
        Ok((angles, labels_drawn))
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Temperature text currently shown
    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    /// Date labels from the last frame
    pub fn date(&self) -> &DateText {
        &self.date
    }

    /// Hand angles from the last frame
    pub fn last_angles(&self) -> Option<HandAngles> {
        self.last_angles
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn cache(&self) -> &SyncCache<SYNC_BUFFER_SIZE> {
        &self.cache
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.channel.transport_mut()
    }
}

/// Whether a temperature tuple can be shown as label text
fn displayable(tuple: &Tuple<'_>) -> bool {
    match tuple.value() {
        TupleValue::CString(text) => text.len() <= TEMPERATURE_TEXT_LEN,
        TupleValue::Int(_) | TupleValue::Uint(_) => true,
        TupleValue::Bytes(_) => false,
    }
}

/// Update the shown temperature from a changed tuple
///
/// The text is replaced only if the new value formats completely.
fn on_tuple_changed<const N: usize>(change: TupleChange<'_>, temperature: &mut String<N>) {
    if change.key != WEATHER_TEMPERATURE_KEY {
        return;
    }

    let mut text = String::<N>::new();
    let written = match change.new.value() {
        TupleValue::CString(value) => text.push_str(value).map_err(|_| core::fmt::Error),
        TupleValue::Int(value) => write!(text, "{}", value),
        TupleValue::Uint(value) => write!(text, "{}", value),
        TupleValue::Bytes(_) => Err(core::fmt::Error),
    };

    match written {
        Ok(()) => *temperature = text,
        Err(_) => warn!("watch: temperature value not displayable, keeping the last one"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::scheduler::TickUnit;
    use crate::time::Weekday;
    use crate::traits::FixedClock;
    use horologe_protocol::{DictionaryWriter, IntWidth};

    struct NullTransport {
        outbox: [u8; 64],
        sent: usize,
        closed: bool,
    }

    impl Default for NullTransport {
        fn default() -> Self {
            Self {
                outbox: [0; 64],
                sent: 0,
                closed: false,
            }
        }
    }

    impl Transport for NullTransport {
        fn open(&mut self, _inbox: usize, _outbox: usize) -> Result<(), AppMessageResult> {
            Ok(())
        }

        fn outbox_begin(&mut self) -> Option<&mut [u8]> {
            Some(&mut self.outbox)
        }

        fn outbox_send(&mut self, _len: usize) -> Result<(), AppMessageResult> {
            self.sent += 1;
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    #[derive(Default)]
    struct CountingCanvas {
        clears: usize,
        polygons: usize,
        lines: usize,
        texts: Vec<std::string::String>,
        unrenderable: Option<char>,
    }

    impl Canvas for CountingCanvas {
        type Error = ();

        fn clear(&mut self, _color: Color) -> Result<(), ()> {
            self.clears += 1;
            self.polygons = 0;
            self.lines = 0;
            self.texts.clear();
            Ok(())
        }

        fn fill_polygon(&mut self, _points: &[Point], _color: Color) -> Result<(), ()> {
            self.polygons += 1;
            Ok(())
        }

        fn draw_line(&mut self, _from: Point, _to: Point, _color: Color) -> Result<(), ()> {
            self.lines += 1;
            Ok(())
        }

        fn draw_text(&mut self, text: &str, _frame: Rect, _align: TextAlign, _color: Color) -> Result<(), ()> {
            if self.unrenderable.is_some_and(|c| text.contains(c)) {
                return Err(());
            }
            self.texts.push(text.into());
            Ok(())
        }
    }

    struct BrokenCanvas;

    impl Canvas for BrokenCanvas {
        type Error = ();

        fn clear(&mut self, _color: Color) -> Result<(), ()> {
            Err(())
        }

        fn fill_polygon(&mut self, _points: &[Point], _color: Color) -> Result<(), ()> {
            Err(())
        }

        fn draw_line(&mut self, _from: Point, _to: Point, _color: Color) -> Result<(), ()> {
            Err(())
        }

        fn draw_text(&mut self, _text: &str, _frame: Rect, _align: TextAlign, _color: Color) -> Result<(), ()> {
            Err(())
        }
    }

    fn at(hour: u8, minute: u8, second: u8) -> TimeSample {
        TimeSample::new(hour, minute, second, Weekday::Thursday, 9).unwrap()
    }

    fn app(config: WatchConfig) -> WatchApp<NullTransport, FixedClock> {
        WatchApp::on_create(config, NullTransport::default(), FixedClock(at(10, 10, 30))).unwrap()
    }

    fn int_payload(key: u32, value: i32) -> InboxPayload {
        let mut buf = [0u8; 16];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        writer.write_int(key, value, IntWidth::Four).unwrap();
        let len = writer.end();
        InboxPayload::from_slice(&buf[..len]).unwrap()
    }

    #[test]
    fn test_create_opens_transport() {
        let app = app(WatchConfig::default());
        assert_eq!(app.channel_state(), ChannelState::OpenPending);
        assert_eq!(app.temperature(), "1234°C");
        assert_eq!(app.date().day.as_str(), "Thu");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = WatchConfig::default();
        config.inbox_size = 0;
        let result = WatchApp::on_create(config, NullTransport::default(), FixedClock(at(0, 0, 0)));
        assert!(matches!(result, Err(ConfigError::InboxSize)));
    }

    #[test]
    fn test_frame_contents() {
        let mut app = app(WatchConfig::default());
        let mut canvas = CountingCanvas::default();
        app.dispatch(Event::Tick(at(10, 10, 30)), &mut canvas);

        assert_eq!(canvas.clears, 1);
        // 12 ticks plus two arrows
        assert_eq!(canvas.polygons, 14);
        assert_eq!(canvas.lines, 1);
        assert_eq!(canvas.texts, vec!["Thu", "09", "1234°C"]);
        assert_eq!(app.diagnostics().frames, 1);
    }

    #[test]
    fn test_minute_unit_skips_second_hand_and_ticks() {
        let mut config = WatchConfig::default();
        config.tick_unit = TickUnit::Minute;
        config.tick_marks = false;
        let mut app = app(config);
        let mut canvas = CountingCanvas::default();

        app.dispatch(Event::Tick(at(10, 10, 30)), &mut canvas);
        assert_eq!(canvas.polygons, 2);
        assert_eq!(canvas.lines, 0);

        app.dispatch(Event::Tick(at(10, 10, 31)), &mut canvas);
        assert_eq!(canvas.clears, 1);
        app.dispatch(Event::Tick(at(10, 11, 0)), &mut canvas);
        assert_eq!(canvas.clears, 2);
    }

    #[test]
    fn test_integer_temperature_is_formatted() {
        let mut app = app(WatchConfig::default());
        let mut canvas = CountingCanvas::default();
        app.dispatch(Event::TransportOpened, &mut canvas);
        app.dispatch(Event::InboxReceived(int_payload(WEATHER_TEMPERATURE_KEY, -3)), &mut canvas);
        assert_eq!(app.temperature(), "-3");
        assert_eq!(app.channel_state(), ChannelState::Idle);
        // Redrawn at the clock's time
        assert_eq!(canvas.clears, 1);
        assert_eq!(canvas.texts[2], "-3");
    }

    #[test]
    fn test_bytes_temperature_rejected() {
        let mut app = app(WatchConfig::default());
        let mut canvas = CountingCanvas::default();
        app.dispatch(Event::TransportOpened, &mut canvas);

        let mut buf = [0u8; 16];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        writer.write_data(WEATHER_TEMPERATURE_KEY, &[0xde, 0xad]).unwrap();
        let len = writer.end();
        let payload = InboxPayload::from_slice(&buf[..len]).unwrap();
        app.dispatch(Event::InboxReceived(payload), &mut canvas);

        assert_eq!(app.temperature(), "1234°C");
        assert_eq!(
            app.cache().get(WEATHER_TEMPERATURE_KEY).unwrap().as_cstr(),
            Some("1234°C")
        );
        assert_eq!(app.diagnostics().sync_failures, 1);
        assert_eq!(app.channel_state(), ChannelState::Idle);
    }

    #[test]
    fn test_failed_label_still_draws_hands() {
        let mut app = app(WatchConfig::default());
        let mut canvas = CountingCanvas {
            unrenderable: Some('°'),
            ..Default::default()
        };
        app.dispatch(Event::Tick(at(10, 10, 30)), &mut canvas);

        assert_eq!(canvas.texts, vec!["Thu", "09"]);
        assert_eq!(canvas.polygons, 14);
        assert_eq!(canvas.lines, 1);
        assert!(app.last_angles().is_some());
        assert_eq!(app.diagnostics().frames, 1);
        assert_eq!(app.diagnostics().draw_errors, 1);
    }

    #[test]
    fn test_failure_before_open_keeps_channel_pending() {
        let mut app = app(WatchConfig::default());
        let mut canvas = CountingCanvas::default();
        app.dispatch(Event::OutboxFailed(AppMessageResult::SendTimeout), &mut canvas);
        assert_eq!(app.channel_state(), ChannelState::OpenPending);
        assert_eq!(app.diagnostics().sync_failures, 1);

        app.dispatch(Event::TransportOpened, &mut canvas);
        assert_eq!(app.channel_state(), ChannelState::RequestSent);
        assert_eq!(app.transport().sent, 1);
    }

    #[test]
    fn test_oversized_inbox_dropped() {
        let mut config = WatchConfig::default();
        config.inbox_size = 8;
        let mut app = app(config);
        let mut canvas = CountingCanvas::default();
        app.dispatch(Event::TransportOpened, &mut canvas);
        app.dispatch(Event::InboxReceived(int_payload(WEATHER_TEMPERATURE_KEY, 5)), &mut canvas);

        assert_eq!(app.temperature(), "1234°C");
        assert_eq!(app.diagnostics().dropped_messages, 1);
        assert_eq!(app.diagnostics().sync_failures, 1);
        assert_eq!(app.channel_state(), ChannelState::Idle);
    }

    #[test]
    fn test_canvas_errors_are_counted() {
        let mut app = app(WatchConfig::default());
        assert_eq!(app.dispatch(Event::Tick(at(1, 2, 3)), &mut BrokenCanvas), Control::Continue);
        assert_eq!(app.diagnostics().draw_errors, 1);
        assert_eq!(app.diagnostics().frames, 0);
        assert!(app.last_angles().is_none());
    }

    #[test]
    fn test_run_stops_at_shutdown() {
        let mut app = app(WatchConfig::default());
        let mut canvas = CountingCanvas::default();
        let events = [
            Event::Tick(at(1, 2, 3)),
            Event::Shutdown,
            Event::Tick(at(1, 2, 4)),
        ];
        assert_eq!(app.run(events, &mut canvas), Control::Exit);
        assert_eq!(app.diagnostics().frames, 1);

        let transport = app.on_destroy();
        assert!(transport.closed);
        assert_eq!(transport.sent, 0);
    }

    #[test]
    fn test_temperature_capacity_matches_cache() {
        // Largest string tuple the 64-byte cache can hold, without its terminator
        assert_eq!(TEMPERATURE_TEXT_LEN, 55);
    }
}
