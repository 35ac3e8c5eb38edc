//! Host-side collaborators for unit tests
//!
//! Every mock is a cheap handle over shared state so a test can keep one
//! copy for assertions while the code under test owns another. Time is
//! simulated: only [`MockClock`] delays move it.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use tapface_display::{CharDisplay, DisplayError};

use crate::device::Board;
use crate::traits::{
    AudioEngine, AudioError, BatterySensor, Clock, InputSource, NvRegion, OutputEnable, PowerControl,
    RandomSource, SensorError, StoreError,
};

/// Shared simulated time in nanoseconds
#[derive(Debug, Clone, Default)]
pub struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Ordered record of side effects across mocks
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<&'static str>>>);

impl Journal {
    pub fn record(&self, entry: &'static str) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }

    /// Index of the first `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| *e == entry)
    }
}

/// Clock whose delays advance [`SimTime`]
#[derive(Debug, Clone)]
pub struct MockClock {
    time: SimTime,
}

impl MockClock {
    pub fn new() -> (Self, SimTime) {
        let time = SimTime::default();
        (Self { time: time.clone() }, time)
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.time.advance_ns(u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.time.advance_ns(u64::from(ms) * 1_000_000);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }
}

/// Fixed pad and button levels
#[derive(Debug, Clone)]
pub struct Levels {
    pads: Vec<bool>,
    button: bool,
}

impl Levels {
    pub fn new(pads: usize) -> Self {
        Self {
            pads: vec![false; pads],
            button: false,
        }
    }

    pub fn set(&mut self, pad: usize, high: bool) {
        self.pads[pad] = high;
    }
}

impl InputSource for Levels {
    fn pad_count(&self) -> usize {
        self.pads.len()
    }

    fn pad_high(&mut self, index: usize) -> bool {
        self.pads.get(index).copied().unwrap_or(false)
    }

    fn button_pressed(&mut self) -> bool {
        self.button
    }
}

#[derive(Debug, Default)]
struct Script {
    pads: Vec<Vec<(u64, u64)>>,
    button: Vec<(u64, u64)>,
}

/// Inputs driven by time windows `[start, end)` in simulated milliseconds
#[derive(Debug, Clone)]
pub struct MockInputs {
    time: SimTime,
    script: Rc<RefCell<Script>>,
}

impl MockInputs {
    pub fn new(time: SimTime, pads: usize) -> Self {
        let script = Script {
            pads: vec![Vec::new(); pads],
            button: Vec::new(),
        };
        Self {
            time,
            script: Rc::new(RefCell::new(script)),
        }
    }

    pub fn press_button(&self, start_ms: u64, end_ms: u64) {
        self.script.borrow_mut().button.push((start_ms, end_ms));
    }

    pub fn touch_pad(&self, pad: usize, start_ms: u64, end_ms: u64) {
        self.script.borrow_mut().pads[pad].push((start_ms, end_ms));
    }

    fn active(windows: &[(u64, u64)], now: u64) -> bool {
        windows.iter().any(|&(start, end)| now >= start && now < end)
    }
}

impl InputSource for MockInputs {
    fn pad_count(&self) -> usize {
        self.script.borrow().pads.len()
    }

    fn pad_high(&mut self, index: usize) -> bool {
        let now = self.time.now_ms();
        self.script
            .borrow()
            .pads
            .get(index)
            .is_some_and(|w| Self::active(w, now))
    }

    fn button_pressed(&mut self) -> bool {
        let now = self.time.now_ms();
        Self::active(&self.script.borrow().button, now)
    }
}

#[derive(Debug)]
struct PanelState {
    cols: u8,
    rows: u8,
    grid: Vec<Vec<u8>>,
    cursor: (usize, usize),
    log: String,
    clears: usize,
    inits: usize,
    backlight: Vec<bool>,
    glyphs: BTreeMap<u8, [u8; 8]>,
}

/// Character panel that keeps a grid plus a log of every write
#[derive(Debug, Clone)]
pub struct MockPanel(Rc<RefCell<PanelState>>);

impl MockPanel {
    pub fn new(cols: u8, rows: u8) -> Self {
        Self(Rc::new(RefCell::new(PanelState {
            cols,
            rows,
            grid: vec![vec![b' '; usize::from(cols)]; usize::from(rows)],
            cursor: (0, 0),
            log: String::new(),
            clears: 0,
            inits: 0,
            backlight: Vec::new(),
            glyphs: BTreeMap::new(),
        })))
    }

    /// Printable text currently on `row`
    pub fn row_text(&self, row: usize) -> String {
        self.0.borrow().grid[row].iter().map(|&b| b as char).collect()
    }

    /// Whether `text` was ever written in one run
    pub fn log_contains(&self, text: &str) -> bool {
        self.0.borrow().log.contains(text)
    }

    pub fn clears(&self) -> usize {
        self.0.borrow().clears
    }

    pub fn inits(&self) -> usize {
        self.0.borrow().inits
    }

    /// Every backlight change pushed to the panel
    pub fn backlight_history(&self) -> Vec<bool> {
        self.0.borrow().backlight.clone()
    }

    /// Bitmap currently programmed into `slot`
    pub fn glyph(&self, slot: u8) -> Option<[u8; 8]> {
        self.0.borrow().glyphs.get(&slot).copied()
    }
}

impl CharDisplay for MockPanel {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.0.borrow_mut().inits += 1;
        self.clear()
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut s = self.0.borrow_mut();
        let cols = usize::from(s.cols);
        for row in s.grid.iter_mut() {
            *row = vec![b' '; cols];
        }
        s.cursor = (0, 0);
        s.clears += 1;
        s.log.push('\n');
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), DisplayError> {
        let mut s = self.0.borrow_mut();
        if row >= s.rows || col >= s.cols {
            return Err(DisplayError::InvalidCoordinates);
        }
        s.cursor = (usize::from(row), usize::from(col));
        s.log.push('\n');
        Ok(())
    }

    fn write_char(&mut self, code: u8) -> Result<(), DisplayError> {
        let mut s = self.0.borrow_mut();
        let (row, col) = s.cursor;
        if col < usize::from(s.cols) {
            s.grid[row][col] = code;
            s.cursor.1 += 1;
        }
        s.log.push(code as char);
        Ok(())
    }

    fn program_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<(), DisplayError> {
        self.0.borrow_mut().glyphs.insert(slot, *bitmap);
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        self.0.borrow_mut().backlight.push(on);
        Ok(())
    }

    fn dimensions(&self) -> (u8, u8) {
        let s = self.0.borrow();
        (s.cols, s.rows)
    }
}

#[derive(Debug, Default)]
struct AudioState {
    clips: BTreeMap<String, u64>,
    opened: Option<(String, u64)>,
    playing_until: Option<u64>,
    played: Vec<String>,
    stops: usize,
}

/// Audio engine with named clips of fixed length
#[derive(Debug, Clone)]
pub struct MockAudio {
    time: SimTime,
    journal: Journal,
    state: Rc<RefCell<AudioState>>,
}

impl MockAudio {
    pub fn new(time: SimTime, journal: Journal) -> Self {
        Self {
            time,
            journal,
            state: Rc::new(RefCell::new(AudioState::default())),
        }
    }

    pub fn add_clip(&self, path: &str, duration_ms: u64) {
        self.state.borrow_mut().clips.insert(path.into(), duration_ms);
    }

    pub fn remove_clip(&self, path: &str) {
        self.state.borrow_mut().clips.remove(path);
    }

    /// Paths passed to `play`, in order
    pub fn played(&self) -> Vec<String> {
        self.state.borrow().played.clone()
    }

    pub fn is_playing_now(&self) -> bool {
        let now = self.time.now_ms();
        self.state.borrow().playing_until.is_some_and(|until| now < until)
    }
}

impl AudioEngine for MockAudio {
    fn exists(&mut self, path: &str) -> bool {
        self.state.borrow().clips.contains_key(path)
    }

    fn open(&mut self, path: &str) -> Result<(), AudioError> {
        let mut s = self.state.borrow_mut();
        let duration = *s.clips.get(path).ok_or(AudioError::NotFound)?;
        s.opened = Some((path.into(), duration));
        Ok(())
    }

    fn play(&mut self) {
        let now = self.time.now_ms();
        let mut s = self.state.borrow_mut();
        if let Some((path, duration)) = s.opened.take() {
            s.playing_until = Some(now + duration);
            s.played.push(path);
            self.journal.record("audio play");
        }
    }

    fn is_playing(&mut self) -> bool {
        self.is_playing_now()
    }

    fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.playing_until = None;
        s.stops += 1;
    }
}

/// Amplifier gate recording every change
#[derive(Debug, Clone)]
pub struct MockAmp {
    journal: Journal,
    history: Rc<RefCell<Vec<bool>>>,
}

impl MockAmp {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            history: Rc::default(),
        }
    }

    pub fn history(&self) -> Vec<bool> {
        self.history.borrow().clone()
    }
}

impl OutputEnable for MockAmp {
    fn set_enabled(&mut self, enabled: bool) {
        self.history.borrow_mut().push(enabled);
        self.journal.record(if enabled { "amp on" } else { "amp off" });
    }

    fn is_enabled(&self) -> bool {
        self.history.borrow().last().copied().unwrap_or(false)
    }
}

/// Battery sensor returning a settable raw level
#[derive(Debug, Clone)]
pub struct MockBattery {
    level: Rc<Cell<u16>>,
    failing: Rc<Cell<bool>>,
    reads: Rc<Cell<usize>>,
}

impl MockBattery {
    pub fn new(raw: u16) -> Self {
        Self {
            level: Rc::new(Cell::new(raw)),
            failing: Rc::default(),
            reads: Rc::default(),
        }
    }

    pub fn level(&self) -> Rc<Cell<u16>> {
        self.level.clone()
    }

    pub fn failing(&self) -> Rc<Cell<bool>> {
        self.failing.clone()
    }

    pub fn reads(&self) -> Rc<Cell<usize>> {
        self.reads.clone()
    }
}

impl BatterySensor for MockBattery {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        if self.failing.get() {
            return Err(SensorError::ConversionError);
        }
        self.reads.set(self.reads.get() + 1);
        Ok(self.level.get())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    bytes: Option<[u8; 4]>,
    writes: usize,
    fail_writes: bool,
}

/// Four-byte region in memory
#[derive(Debug, Clone)]
pub struct MockStore {
    journal: Journal,
    state: Rc<RefCell<StoreState>>,
}

impl MockStore {
    pub fn new(value: Option<u32>, journal: Journal) -> Self {
        let state = StoreState {
            bytes: value.map(u32::to_le_bytes),
            ..StoreState::default()
        };
        Self {
            journal,
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn value(&self) -> Option<u32> {
        self.state.borrow().bytes.map(u32::from_le_bytes)
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

impl NvRegion for MockStore {
    fn read(&mut self) -> Result<[u8; 4], StoreError> {
        self.state.borrow().bytes.ok_or(StoreError::Empty)
    }

    fn write(&mut self, bytes: [u8; 4]) -> Result<(), StoreError> {
        let mut s = self.state.borrow_mut();
        if s.fail_writes {
            return Err(StoreError::Io);
        }
        s.bytes = Some(bytes);
        s.writes += 1;
        self.journal.record("store write");
        Ok(())
    }
}

/// Power control that records the halt and returns
#[derive(Debug, Clone)]
pub struct MockPower {
    journal: Journal,
    calls: Rc<Cell<usize>>,
}

impl MockPower {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PowerControl for MockPower {
    fn deep_power_off(&mut self) {
        self.calls.set(self.calls.get() + 1);
        self.journal.record("power off");
    }
}

/// Always picks the first message
#[derive(Debug, Clone, Default)]
pub struct FirstPick;

impl RandomSource for FirstPick {
    fn next_u32(&mut self) -> u32 {
        0
    }
}

/// Board made of the mocks above
pub struct TestBoard;

impl Board for TestBoard {
    type Display = MockPanel;
    type Audio = MockAudio;
    type Amp = MockAmp;
    type Battery = MockBattery;
    type Store = MockStore;
    type Inputs = MockInputs;
    type Power = MockPower;
    type Clock = MockClock;
    type Rng = FirstPick;
}
