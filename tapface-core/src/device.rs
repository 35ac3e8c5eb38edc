//! The device loop
//!
//! [`Device`] owns every component and advances the whole appliance one
//! cooperative step per [`tick`](Device::tick). A tick never blocks for
//! longer than a bounded UI dwell or a clip; the waits that depend on the
//! user (button hold, pad release, cooldown) are [`Phase`]s that a tick
//! checks once and leaves.
//!
//! Per tick, in order:
//!
//! ```text
//!   phase wait? ──► battery ──► button ──► inactivity ──► sleeping pulse
//!                                                    └─► armed scan / disarmed idle
//! ```

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use heapless::{Deque, String};
use tapface_display::{text, CharDisplay, Expression, Eye, FaceView, Renderer, ScrollTiming};

use crate::battery::{BatteryLevel, BatteryMonitor};
use crate::chatter::Chatter;
use crate::config::{truncated, DeviceConfig, MAX_MESSAGE_LEN};
use crate::counter::InteractionCounter;
use crate::debounce::{Debouncer, FireEvent};
use crate::egg::EasterEgg;
use crate::playback::{PlayOutcome, PlayRequest, PlaybackCoordinator, PlaybackTiming};
use crate::state::{DeviceState, Event};
use crate::traits::{
    AudioEngine, BatterySensor, Clock, InputSource, NvRegion, OutputEnable, PowerControl, RandomSource,
    SensorError, StoreError,
};

/// Tick period while awake
const AWAKE_TICK_MS: u32 = 10;

/// Tick period while asleep
const SLEEP_TICK_MS: u32 = 50;

/// Gap between the arm button release and the confirmation clip
const ARM_GAP_MS: u32 = 50;

/// Gap between the last button release and the deep power-off
const POWER_OFF_GAP_MS: u32 = 100;

/// Button poll period while waiting for a release before power-off
const RELEASE_POLL_MS: u32 = 10;

/// Recovered errors kept until the caller drains them
const FAULT_QUEUE: usize = 4;

const ARMED_PROMPT: &str = "Touch a panel";
const DISARMED_PROMPT: &str = "Press I/O";

/// Concrete hardware for one device
pub trait Board {
    type Display: CharDisplay;
    type Audio: AudioEngine;
    type Amp: OutputEnable;
    type Battery: BatterySensor;
    type Store: NvRegion;
    type Inputs: InputSource;
    type Power: PowerControl;
    type Clock: Clock;
    type Rng: RandomSource;
}

/// Everything a [`Device`] takes ownership of
pub struct Peripherals<B: Board> {
    pub display: B::Display,
    pub audio: B::Audio,
    pub amp: B::Amp,
    pub battery: B::Battery,
    pub store: B::Store,
    pub inputs: B::Inputs,
    pub power: B::Power,
    pub clock: B::Clock,
    pub rng: B::Rng,
}

/// Timed wait inside a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Normal scanning
    Ready,
    /// I/O button went down at `since`; only the button is sampled
    AwaitingButtonRelease { since: u64 },
    /// Pad `channel` fired; waiting for it to read low
    AwaitingPadRelease { channel: u8, since: u64 },
    /// Post-press pause
    Cooldown { until: u64 },
}

/// An error the loop recovered from and kept running through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Persisting the interaction count failed
    CounterWrite(StoreError),
    /// A clip could not be opened; `pad` is `None` for the arm clip
    ClipMissing { pad: Option<u8> },
    /// The battery sensor stopped answering; the last reading is kept
    Battery(SensorError),
}

#[derive(Debug, Clone, Copy, Default)]
struct LowBatteryFlash {
    on: bool,
    toggled_at: Option<u64>,
}

/// The appliance
pub struct Device<B: Board> {
    config: DeviceConfig,
    state: DeviceState,
    phase: Phase,
    renderer: Renderer<B::Display>,
    playback: PlaybackCoordinator<B::Audio, B::Amp>,
    battery: BatteryMonitor<B::Battery>,
    counter: InteractionCounter<B::Store>,
    debouncer: Debouncer,
    chatter: Chatter,
    egg: EasterEgg,
    inputs: B::Inputs,
    power: B::Power,
    clock: B::Clock,
    rng: B::Rng,
    last_activity_ms: u64,
    sleep_start_ms: u64,
    low_flash: LowBatteryFlash,
    faults: Deque<Fault, FAULT_QUEUE>,
    battery_faulted: bool,
}

impl<B: Board> Device<B> {
    /// Assemble a device; nothing is drawn or played until [`boot`](Self::boot)
    pub fn new(config: DeviceConfig, peripherals: Peripherals<B>) -> Self {
        let Peripherals {
            display,
            audio,
            amp,
            battery,
            store,
            inputs,
            power,
            clock,
            rng,
        } = peripherals;
        let now = clock.now_ms();
        let pads = config.pads.len().min(inputs.pad_count());
        let timing = PlaybackTiming {
            settle_ms: config.timing.amp_settle_ms,
            missing_ms: config.timing.missing_file_ms,
        };

        Self {
            state: DeviceState::Disarmed,
            phase: Phase::Ready,
            renderer: Renderer::new(display, now),
            playback: PlaybackCoordinator::new(audio, amp, timing),
            battery: BatteryMonitor::new(battery, config.battery),
            counter: InteractionCounter::new(store, config.counter.clone()),
            debouncer: Debouncer::new(pads, config.timing.debounce_ms),
            chatter: Chatter::new(config.chatter.clone(), now),
            egg: EasterEgg::new(&config.egg.sequence),
            inputs,
            power,
            clock,
            rng,
            last_activity_ms: now,
            sleep_start_ms: now,
            low_flash: LowBatteryFlash::default(),
            faults: Deque::new(),
            battery_faulted: false,
            config,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn renderer(&self) -> &Renderer<B::Display> {
        &self.renderer
    }

    /// Interaction count including unsaved increments
    pub fn interaction_count(&self) -> u32 {
        self.counter.count()
    }

    /// Last battery reading, if any
    pub fn battery_percent(&self) -> Option<u8> {
        self.battery.cached_percent()
    }

    /// Oldest recovered error not yet collected
    ///
    /// When nobody drains the queue the oldest entries are dropped.
    pub fn take_fault(&mut self) -> Option<Fault> {
        self.faults.pop_front()
    }

    /// Delay the caller should leave between ticks
    pub fn tick_interval_ms(&self) -> u32 {
        match self.state {
            DeviceState::Sleeping => SLEEP_TICK_MS,
            _ => AWAKE_TICK_MS,
        }
    }

    /// Cold-boot sequence
    ///
    /// Panel reset, boot screen, stored count, boot clip (skipped silently
    /// when absent), then the disarmed idle screen. Returns the stored count.
    pub fn boot(&mut self) -> u32 {
        self.last_activity_ms = self.clock.now_ms();
        let _ = self.renderer.reset();
        let _ = self.renderer.set_backlight(true);
        let count = self.counter.load();

        self.show_boot_screen();
        if count > 0 {
            let mut line: String<MAX_MESSAGE_LEN> = String::new();
            let _ = write!(line, "Poked {} times!", count);
            let timing = ScrollTiming {
                hold_ms: self.config.timing.message_ms,
                ..ScrollTiming::default()
            };
            let _ = self
                .renderer
                .show_message(&line, "", true, timing, &mut self.clock);
        }

        let boot = self.config.boot_path();
        self.playback.play_if_present(&boot, &mut self.clock);

        let now = self.clock.now_ms();
        self.renderer.reset_animation(now);
        self.chatter.reset(now);
        self.state = DeviceState::Disarmed;
        self.show_idle(now);
        count
    }

    /// Run one tick, then wait out the tick interval
    pub fn run_once(&mut self) -> Option<Event> {
        let event = self.tick();
        let interval = self.tick_interval_ms();
        self.clock.delay_ms(interval);
        event
    }

    /// One cooperative step of the loop
    ///
    /// Returns the event that drove a state change, if any. After
    /// `PoweringOff` the board is expected to be halted; further ticks do
    /// nothing.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state == DeviceState::PoweringOff {
            return None;
        }
        let now = self.clock.now_ms();

        match self.phase {
            Phase::Ready => {}
            Phase::AwaitingButtonRelease { since } => return self.tick_button(since, now),
            Phase::AwaitingPadRelease { channel, since } => {
                let timed_out = now.saturating_sub(since) > u64::from(self.config.timing.release_timeout_ms);
                if timed_out || !self.inputs.pad_high(usize::from(channel)) {
                    self.phase = Phase::Cooldown {
                        until: now + u64::from(self.config.timing.cooldown_ms),
                    };
                }
                return None;
            }
            Phase::Cooldown { until } => {
                if now >= until {
                    self.phase = Phase::Ready;
                }
                return None;
            }
        }

        let level = self.battery.check_threshold(&mut self.clock);
        self.note_battery_fault();
        match level {
            BatteryLevel::Critical => {
                self.power_off(Event::BatteryCritical);
                return Some(Event::BatteryCritical);
            }
            BatteryLevel::Low if self.state != DeviceState::Sleeping => self.flash_low_battery(now),
            _ => {}
        }

        if self.inputs.button_pressed() {
            self.phase = Phase::AwaitingButtonRelease { since: now };
            return None;
        }

        if self.state.is_awake() && self.remaining_ms(now) == 0 {
            self.go_to_sleep();
            return Some(Event::InactivityTimeout);
        }

        match self.state {
            DeviceState::Sleeping => {
                self.pulse_backlight(now);
                None
            }
            DeviceState::Armed => self.scan_pads(now),
            _ => {
                self.debouncer.release_all_low(&mut self.inputs);
                self.show_idle(now);
                None
            }
        }
    }

    fn tick_button(&mut self, since: u64, now: u64) -> Option<Event> {
        if self.inputs.button_pressed() {
            let held = now.saturating_sub(since);
            if held >= u64::from(self.config.timing.power_off_hold_ms) {
                self.power_off(Event::PowerOffHold);
                return Some(Event::PowerOffHold);
            }
            return None;
        }

        self.phase = Phase::Ready;
        self.last_activity_ms = now;
        self.chatter.reset(now);
        if self.state == DeviceState::Sleeping {
            self.wake();
        } else {
            self.arm();
        }
        self.clock.delay_ms(self.config.timing.button_pause_ms);
        Some(Event::ShortPress)
    }

    /// Confirmation clip, then Armed with a fresh animation
    ///
    /// A press while already armed replays the clip.
    fn arm(&mut self) {
        self.play_arm_clip();
        self.state = self.state.transition(Event::ShortPress);
        let now = self.clock.now_ms();
        self.renderer.reset_animation(now);
        self.show_idle(now);
    }

    fn play_arm_clip(&mut self) {
        while self.inputs.button_pressed() {
            self.clock.delay_ms(RELEASE_POLL_MS);
        }
        self.clock.delay_ms(ARM_GAP_MS);
        self.last_activity_ms = self.clock.now_ms();
        let path = self.config.arm_path();
        let request = PlayRequest {
            path: &path,
            label: &self.config.sounds.arm_label,
            expression: None,
            cancellable: false,
        };
        let outcome = self
            .playback
            .play(&request, &mut self.renderer, &mut self.inputs, &mut self.clock);
        if outcome == PlayOutcome::Missing {
            self.note(Fault::ClipMissing { pad: None });
        }
    }

    fn wake(&mut self) {
        let _ = self.renderer.set_backlight(true);
        let _ = self.renderer.reset();
        let now = self.clock.now_ms();
        self.last_activity_ms = now;
        self.chatter.reset(now);
        self.show_boot_screen();
        let boot = self.config.boot_path();
        self.playback.play_if_present(&boot, &mut self.clock);
        self.play_arm_clip();
        self.state = self.state.transition(Event::ShortPress);
        let now = self.clock.now_ms();
        self.renderer.reset_animation(now);
        self.show_idle(now);
    }

    fn go_to_sleep(&mut self) {
        self.state = self.state.transition(Event::InactivityTimeout);
        self.playback.disable_output();
        self.flush_counter();
        let _ = self.renderer.show_sleeping_face("Zzz", DISARMED_PROMPT);
        self.clock.delay_ms(self.config.timing.sleep_message_ms);
        let now = self.clock.now_ms();
        self.sleep_start_ms = now;
        self.last_activity_ms = now;
    }

    fn pulse_backlight(&mut self, now: u64) {
        let period = u64::from(self.config.timing.sleep_pulse_ms.max(1));
        let on_for = period * u64::from(self.config.timing.sleep_pulse_on_pct) / 100;
        let phase = now.saturating_sub(self.sleep_start_ms) % period;
        let _ = self.renderer.set_backlight(phase < on_for);
    }

    /// Shut everything down and halt
    ///
    /// The count is persisted before the amplifier is cut.
    fn power_off(&mut self, cause: Event) {
        self.flush_counter();
        self.playback.shutdown();
        self.state = self.state.transition(cause);
        self.phase = Phase::Ready;

        let _ = self.renderer.show_status("Powering off...", "", true);
        self.clock.delay_ms(self.config.timing.message_ms);
        let _ = self.renderer.clear();
        let _ = self.renderer.set_backlight(false);

        while self.inputs.button_pressed() {
            self.clock.delay_ms(RELEASE_POLL_MS);
        }
        self.clock.delay_ms(POWER_OFF_GAP_MS);
        self.power.deep_power_off();
    }

    fn scan_pads(&mut self, now: u64) -> Option<Event> {
        let Some(fire) = self.debouncer.poll_first(now, &mut self.inputs) else {
            self.show_idle(now);
            return None;
        };
        let event = Event::PadFired(fire.channel);
        self.state = self.state.transition(event);
        self.handle_press(fire);
        Some(event)
    }

    fn handle_press(&mut self, fire: FireEvent) {
        let now = self.clock.now_ms();
        self.last_activity_ms = now;
        self.chatter.reset(now);
        if let Err(e) = self.counter.increment() {
            self.note(Fault::CounterWrite(e));
        }
        let count = self.counter.count();

        if self.egg.record(fire.channel) {
            let message = self.config.egg.message.clone();
            self.celebrate(&message);
        } else if let Some(pad) = self.config.pads.get(usize::from(fire.channel)) {
            let path = self.config.asset_path(&pad.file);
            let label: String<MAX_MESSAGE_LEN> = truncated(self.chatter.random_message(&mut self.rng));
            let request = PlayRequest {
                path: &path,
                label: &label,
                expression: pad.expression,
                cancellable: true,
            };
            let outcome = self
                .playback
                .play(&request, &mut self.renderer, &mut self.inputs, &mut self.clock);
            if outcome == PlayOutcome::Missing {
                self.note(Fault::ClipMissing {
                    pad: Some(fire.channel),
                });
            }
        }

        if self.counter.is_milestone(count) {
            let mut line: String<MAX_MESSAGE_LEN> = String::new();
            let _ = write!(line, "Poked {} times!", count);
            self.celebrate(&line);
        }

        let now = self.clock.now_ms();
        self.phase = if self.config.timing.release_required {
            Phase::AwaitingPadRelease {
                channel: fire.channel,
                since: now,
            }
        } else {
            Phase::Cooldown {
                until: now + u64::from(self.config.timing.cooldown_ms),
            }
        };
    }

    /// Happy face with `message`; text wider than the panel scrolls once
    fn celebrate(&mut self, message: &str) {
        let timing = ScrollTiming {
            hold_ms: self.config.timing.celebration_ms,
            loops: 1,
            ..ScrollTiming::default()
        };
        let view = FaceView {
            text: message,
            expression: Expression::Symmetric(Eye::Happy),
            battery: None,
            mouth: None,
        };
        let _ = self.renderer.show_face_message(&view, timing, &mut self.clock);
    }

    fn note(&mut self, fault: Fault) {
        if self.faults.is_full() {
            self.faults.pop_front();
        }
        let _ = self.faults.push_back(fault);
    }

    fn flush_counter(&mut self) {
        if let Err(e) = self.counter.flush() {
            self.note(Fault::CounterWrite(e));
        }
    }

    /// Report a sensor fault once when it starts
    fn note_battery_fault(&mut self) {
        let fault = self.battery.last_fault();
        if let (Some(e), false) = (fault, self.battery_faulted) {
            self.note(Fault::Battery(e));
        }
        self.battery_faulted = fault.is_some();
    }

    fn show_boot_screen(&mut self) {
        let _ = self.renderer.show_status("Booting...", "please wait", true);
        self.clock.delay_ms(self.config.timing.message_ms);
    }

    /// Milliseconds left before the inactivity timeout
    fn remaining_ms(&self, now: u64) -> u64 {
        let idle = now.saturating_sub(self.last_activity_ms);
        u64::from(self.config.timing.sleep_after_ms).saturating_sub(idle)
    }

    /// Armed or disarmed idle face with battery and either chatter or the
    /// sleep countdown
    fn show_idle(&mut self, now: u64) {
        let prompt = if self.state == DeviceState::Armed {
            ARMED_PROMPT
        } else {
            DISARMED_PROMPT
        };
        let battery = self.battery.read_percent(&mut self.clock);
        let remaining = self.remaining_ms(now);

        let animated = self.renderer.animated_expression(now);
        let countdown;
        let (label, expression) = if remaining <= u64::from(self.config.timing.countdown_show_ms) {
            countdown = text::countdown(prompt, (remaining / 1000) as u32);
            (countdown.as_str(), Expression::Symmetric(Eye::Sleepy))
        } else {
            (self.chatter.text(now, prompt), animated)
        };

        let _ = self.renderer.show_face(&FaceView {
            text: label,
            expression,
            battery,
            mouth: None,
        });
    }

    fn flash_low_battery(&mut self, now: u64) {
        let period = u64::from(self.config.timing.low_battery_flash_ms);
        let due = self
            .low_flash
            .toggled_at
            .map_or(true, |at| now.saturating_sub(at) >= period);
        if !due {
            return;
        }
        self.low_flash.on = !self.low_flash.on;
        self.low_flash.toggled_at = Some(now);
        let row = self.renderer.last_row();
        let line = if self.low_flash.on { "!! Low Battery !!" } else { "" };
        let _ = self.renderer.overwrite_row(row, line, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{
        FirstPick, Journal, MockAmp, MockAudio, MockBattery, MockClock, MockInputs, MockPanel, MockPower,
        MockStore, SimTime, TestBoard,
    };
    use std::cell::Cell;
    use std::rc::Rc;
    use std::vec::Vec;

    const BOOT: &str = "SOUNDS/BOOT.WAV";
    const ARM: &str = "SOUNDS/STARTBTN.WAV";

    /// Raw ADC count for 10 % charge with the stock divider
    const RAW_TEN_PERCENT: u16 = 1365;

    struct Harness {
        device: Device<TestBoard>,
        time: SimTime,
        panel: MockPanel,
        audio: MockAudio,
        inputs: MockInputs,
        power: MockPower,
        store: MockStore,
        amp: MockAmp,
        battery: Rc<Cell<u16>>,
        battery_failing: Rc<Cell<bool>>,
        journal: Journal,
    }

    fn harness(stored: Option<u32>) -> Harness {
        let (clock, time) = MockClock::new();
        let journal = Journal::default();
        let config = DeviceConfig::default();

        let panel = MockPanel::new(20, 4);
        let audio = MockAudio::new(time.clone(), journal.clone());
        audio.add_clip(BOOT, 800);
        audio.add_clip(ARM, 400);
        for pad in &config.pads {
            audio.add_clip(&config.asset_path(&pad.file), 1_000);
        }
        let battery = MockBattery::new(4095);
        let level = battery.level();
        let failing = battery.failing();
        let amp = MockAmp::new(journal.clone());
        let store = MockStore::new(stored, journal.clone());
        let inputs = MockInputs::new(time.clone(), 5);
        let power = MockPower::new(journal.clone());

        let device = Device::new(
            config,
            Peripherals {
                display: panel.clone(),
                audio: audio.clone(),
                amp: amp.clone(),
                battery,
                store: store.clone(),
                inputs: inputs.clone(),
                power: power.clone(),
                clock,
                rng: FirstPick,
            },
        );

        Harness {
            device,
            time,
            panel,
            audio,
            inputs,
            power,
            store,
            amp,
            battery: level,
            battery_failing: failing,
            journal,
        }
    }

    impl Harness {
        fn now(&self) -> u64 {
            self.time.now_ms()
        }

        fn run_for(&mut self, ms: u64) -> Vec<Event> {
            let end = self.now() + ms;
            let mut events = Vec::new();
            while self.now() < end && self.device.state() != DeviceState::PoweringOff {
                if let Some(event) = self.device.run_once() {
                    events.push(event);
                }
            }
            events
        }

        fn run_until(&mut self, limit_ms: u64, done: impl Fn(&Device<TestBoard>) -> bool) -> bool {
            let end = self.now() + limit_ms;
            while self.now() < end {
                if done(&self.device) {
                    return true;
                }
                self.device.run_once();
            }
            done(&self.device)
        }

        fn press_button(&mut self, hold_ms: u64) -> Vec<Event> {
            let start = self.now();
            self.inputs.press_button(start, start + hold_ms);
            self.run_for(hold_ms + 100)
        }

        fn touch(&mut self, pad: usize, hold_ms: u64) -> Vec<Event> {
            let start = self.now();
            self.inputs.touch_pad(pad, start, start + hold_ms);
            // Clip, release wait and cooldown
            self.run_for(hold_ms + 2_500)
        }

        fn armed(stored: Option<u32>) -> Self {
            let mut h = harness(stored);
            h.device.boot();
            h.press_button(100);
            assert_eq!(h.device.state(), DeviceState::Armed);
            h
        }

        fn played_pads(&self) -> Vec<std::string::String> {
            self.audio
                .played()
                .into_iter()
                .filter(|p| p != BOOT && p != ARM)
                .collect()
        }
    }

    #[test]
    fn test_boot_sequence() {
        let mut h = harness(None);
        assert_eq!(h.device.boot(), 0);
        assert!(h.panel.log_contains("Booting..."));
        assert!(h.panel.log_contains("please wait"));
        assert!(!h.panel.log_contains("Poked"));
        assert_eq!(h.audio.played(), [BOOT]);
        assert_eq!(h.device.state(), DeviceState::Disarmed);

        let bottom = h.panel.row_text(3);
        assert!(bottom.starts_with("Press I/O "), "{bottom}");
        assert!(bottom.ends_with("100%"), "{bottom}");
    }

    #[test]
    fn test_boot_shows_stored_count() {
        let mut h = harness(Some(49));
        assert_eq!(h.device.boot(), 49);
        assert!(h.panel.log_contains("Poked 49 times!"));
        assert_eq!(h.device.interaction_count(), 49);
    }

    #[test]
    fn test_disarmed_inactivity_sleeps() {
        let mut h = harness(None);
        h.device.boot();

        h.run_for(280_000 - h.now());
        assert!(h.panel.row_text(3).starts_with("Press I/O 0:"));

        let events = h.run_for(30_000);
        assert_eq!(events, [Event::InactivityTimeout]);
        assert_eq!(h.device.state(), DeviceState::Sleeping);
        assert_eq!(h.device.tick_interval_ms(), 50);
        assert!(h.panel.log_contains("Zzz"));
        assert_eq!(h.store.writes(), 1);
    }

    #[test]
    fn test_armed_inactivity_sleeps() {
        let mut h = Harness::armed(None);
        let events = h.run_for(310_000);
        assert_eq!(events, [Event::InactivityTimeout]);
        assert_eq!(h.device.state(), DeviceState::Sleeping);
        assert!(h.panel.log_contains("Zzz"));
        assert_eq!(h.amp.history().last(), Some(&false));
        assert_eq!(h.store.writes(), 1);
    }

    #[test]
    fn test_armed_countdown_shows_sleepy_eyes() {
        let mut h = Harness::armed(None);
        h.run_for(200_000);
        assert!(!h.panel.row_text(3).starts_with("Touch a panel 0:"));
        assert_ne!(h.panel.glyph(0), Some(Eye::Sleepy.cells()[0]));

        h.run_for(50_000);
        let bottom = h.panel.row_text(3);
        assert!(bottom.starts_with("Touch a panel 0:"), "{bottom}");
        assert_eq!(h.device.state(), DeviceState::Armed);
        let [left, right] = *Eye::Sleepy.cells();
        assert_eq!(h.panel.glyph(0), Some(left));
        assert_eq!(h.panel.glyph(1), Some(right));
        assert_eq!(h.panel.glyph(2), Some(left));
        assert_eq!(h.panel.glyph(3), Some(right));
    }

    #[test]
    fn test_sleep_pulses_backlight() {
        let mut h = harness(None);
        h.device.boot();
        assert!(h.run_until(400_000, |d| d.state() == DeviceState::Sleeping));
        h.run_for(5_000);
        let history = h.panel.backlight_history();
        assert!(history.len() >= 3, "{history:?}");
        assert!(history.contains(&false));
        assert!(history.contains(&true));
    }

    #[test]
    fn test_wake_arms_with_fresh_animation() {
        let mut h = harness(None);
        h.device.boot();
        assert!(h.run_until(400_000, |d| d.state() == DeviceState::Sleeping));
        h.run_for(1_500);

        let inits = h.panel.inits();
        let events = h.press_button(100);
        assert_eq!(events, [Event::ShortPress]);
        assert_eq!(h.device.state(), DeviceState::Armed);
        assert_eq!(h.device.renderer().animation_step(), 0);
        assert_eq!(h.panel.inits(), inits + 1);
        assert_eq!(h.audio.played(), [BOOT, BOOT, ARM]);
        assert_eq!(h.panel.backlight_history().last(), Some(&true));
        assert!(h.panel.row_text(3).starts_with("Touch a panel"));
    }

    #[test]
    fn test_rearm_replays_confirmation() {
        let mut h = Harness::armed(None);
        assert_eq!(h.audio.played(), [BOOT, ARM]);
        let events = h.press_button(100);
        assert_eq!(events, [Event::ShortPress]);
        assert_eq!(h.device.state(), DeviceState::Armed);
        assert_eq!(h.audio.played(), [BOOT, ARM, ARM]);
    }

    #[test]
    fn test_pads_ignored_while_disarmed() {
        let mut h = harness(None);
        h.device.boot();
        let events = h.touch(0, 500);
        assert!(events.is_empty());
        assert!(h.played_pads().is_empty());
        assert_eq!(h.device.interaction_count(), 0);
    }

    #[test]
    fn test_pad_press_plays_and_counts() {
        let mut h = Harness::armed(None);
        let events = h.touch(1, 200);
        assert_eq!(events, [Event::PadFired(1)]);
        assert_eq!(h.played_pads(), ["SOUNDS/TIP2.WAV"]);
        assert_eq!(h.device.interaction_count(), 1);
        assert_eq!(h.device.phase(), Phase::Ready);
        // Label is a chatter line, not the file name
        assert!(h.panel.log_contains("Planet B? Nope."));
    }

    #[test]
    fn test_button_cancels_pad_clip() {
        let mut h = Harness::armed(None);
        let start = h.now();
        h.inputs.touch_pad(1, start, start + 200);
        h.inputs.press_button(start + 400, start + 450);

        assert!(h.run_until(5_000, |d| d.interaction_count() == 1));
        // The clip alone would run past start + 1240
        assert!(h.now() < start + 1_000, "{}", h.now() - start);
        assert!(!h.audio.is_playing_now());
        assert_eq!(h.amp.history().last(), Some(&false));
        assert_eq!(h.played_pads(), ["SOUNDS/TIP2.WAV"]);

        // The cancelling press is not taken as an arm press
        let events = h.run_for(2_500);
        assert!(events.is_empty(), "{events:?}");
        assert_eq!(h.audio.played(), [BOOT, ARM, "SOUNDS/TIP2.WAV"]);
    }

    #[test]
    fn test_missing_clip_is_reported() {
        let mut h = Harness::armed(None);
        h.audio.remove_clip("SOUNDS/TIP2.WAV");
        let events = h.touch(1, 200);
        assert_eq!(events, [Event::PadFired(1)]);
        assert!(h.panel.log_contains("Missing file"));
        assert_eq!(h.device.interaction_count(), 1);
        assert_eq!(h.device.take_fault(), Some(Fault::ClipMissing { pad: Some(1) }));
        assert_eq!(h.device.take_fault(), None);
    }

    #[test]
    fn test_short_touch_does_not_fire() {
        let mut h = Harness::armed(None);
        let events = h.touch(2, 50);
        assert!(events.is_empty());
        assert_eq!(h.device.interaction_count(), 0);
    }

    #[test]
    fn test_held_pad_fires_once() {
        let mut h = Harness::armed(None);
        // Held past the release timeout and the cooldown
        let events = h.touch(3, 8_000);
        assert_eq!(events, [Event::PadFired(3)]);
        assert_eq!(h.played_pads().len(), 1);
    }

    #[test]
    fn test_milestone_after_boot_with_49() {
        let mut h = Harness::armed(Some(49));
        h.touch(0, 200);
        assert_eq!(h.device.interaction_count(), 50);
        assert!(h.panel.log_contains("Poked 50 times!"));
        assert_eq!(h.played_pads(), ["SOUNDS/STARTUP.WAV"]);
        // Back on the idle face once release and cooldown are over
        h.run_for(1_500);
        assert_eq!(h.device.phase(), Phase::Ready);
        assert!(h.panel.row_text(3).starts_with("Touch a panel"));
    }

    #[test]
    fn test_easter_egg_replaces_playback() {
        let mut h = Harness::armed(None);
        for pad in [0, 2, 4] {
            h.touch(pad, 200);
        }
        // 21 characters on a 20-column row: the text scrolls
        assert!(h.panel.log_contains("You found the secret"));
        assert!(h.panel.log_contains("ou found the secret!"));
        assert_eq!(h.played_pads(), ["SOUNDS/STARTUP.WAV", "SOUNDS/TIP3.WAV"]);
        assert_eq!(h.device.interaction_count(), 3);
    }

    #[test]
    fn test_long_hold_powers_off_after_flush() {
        let mut h = Harness::armed(Some(3));
        let events = h.press_button(6_000);
        assert_eq!(events, [Event::PowerOffHold]);
        assert_eq!(h.device.state(), DeviceState::PoweringOff);
        assert_eq!(h.power.calls(), 1);
        assert!(h.panel.log_contains("Powering off..."));
        assert_eq!(h.panel.backlight_history().last(), Some(&false));

        let entries = h.journal.entries();
        let write = entries.iter().rposition(|e| *e == "store write");
        let amp_off = entries.iter().rposition(|e| *e == "amp off");
        assert!(write < amp_off, "{entries:?}");
        assert_eq!(entries.last(), Some(&"power off"));
        assert_eq!(h.store.value(), Some(3));

        // Halted: nothing else happens
        assert_eq!(h.device.tick(), None);
    }

    #[test]
    fn test_failed_flush_is_reported() {
        let mut h = Harness::armed(Some(3));
        h.store.fail_writes(true);
        let events = h.press_button(6_000);
        assert_eq!(events, [Event::PowerOffHold]);
        assert_eq!(h.power.calls(), 1);
        assert_eq!(h.device.take_fault(), Some(Fault::CounterWrite(StoreError::Io)));
    }

    #[test]
    fn test_battery_fault_reported_once() {
        let mut h = harness(None);
        h.device.boot();
        h.battery_failing.set(true);
        h.run_for(31_000);
        assert_eq!(
            h.device.take_fault(),
            Some(Fault::Battery(SensorError::ConversionError))
        );
        h.run_for(31_000);
        assert_eq!(h.device.take_fault(), None);
        // Last good reading stays on screen
        assert!(h.panel.row_text(3).ends_with("100%"));

        h.battery_failing.set(false);
        h.run_for(31_000);
        h.battery_failing.set(true);
        h.run_for(31_000);
        assert!(matches!(h.device.take_fault(), Some(Fault::Battery(_))));
    }

    #[test]
    fn test_critical_battery_powers_off() {
        let mut h = harness(Some(12));
        h.battery.set(0);
        h.device.boot();
        let events = h.run_for(100);
        assert_eq!(events, [Event::BatteryCritical]);
        assert_eq!(h.power.calls(), 1);
        assert!(h.journal.position("store write").is_some());
    }

    #[test]
    fn test_low_battery_flashes_in_place() {
        let mut h = harness(None);
        h.battery.set(RAW_TEN_PERCENT);
        h.device.boot();
        let clears = h.panel.clears();

        h.run_for(10);
        assert_eq!(h.panel.row_text(3), " !! Low Battery !!  ");
        h.run_for(2_000);
        assert_eq!(h.panel.row_text(3), " ".repeat(20));
        assert_eq!(h.panel.clears(), clears);
        assert_eq!(h.device.battery_percent(), Some(10));
    }
}
