//! Touch pads and the I/O button
//!
//! Capacitive touch modules drive their output high while touched; the I/O
//! button is a switch to ground on a pulled-up pin. Both senses are
//! configurable so the control loop only ever sees "touched" and "pressed".

use heapless::Vec;
use tapface_core::config::MAX_PADS;
use tapface_core::traits::InputSource;
use tapface_hal::{InputPin, Polarity};

/// Error constructing the input set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputsError {
    /// More pads than [`MAX_PADS`]
    TooManyPads,
}

/// Pad lines plus the button, all on GPIOs of one type
pub struct GpioInputs<P, B> {
    pads: Vec<P, MAX_PADS>,
    pad_polarity: Polarity,
    button: B,
    button_polarity: Polarity,
}

impl<P: InputPin, B: InputPin> GpioInputs<P, B> {
    /// Active-high pads and an active-low button
    pub fn new<I>(pads: I, button: B) -> Result<Self, InputsError>
    where
        I: IntoIterator<Item = P>,
    {
        Self::with_polarity(pads, Polarity::ActiveHigh, button, Polarity::ActiveLow)
    }

    pub fn with_polarity<I>(
        pads: I,
        pad_polarity: Polarity,
        button: B,
        button_polarity: Polarity,
    ) -> Result<Self, InputsError>
    where
        I: IntoIterator<Item = P>,
    {
        let mut lines = Vec::new();
        for pad in pads {
            lines.push(pad).map_err(|_| InputsError::TooManyPads)?;
        }
        Ok(Self {
            pads: lines,
            pad_polarity,
            button,
            button_polarity,
        })
    }
}

impl<P: InputPin, B: InputPin> InputSource for GpioInputs<P, B> {
    fn pad_count(&self) -> usize {
        self.pads.len()
    }

    fn pad_high(&mut self, index: usize) -> bool {
        let polarity = self.pad_polarity;
        self.pads
            .get_mut(index)
            .is_some_and(|pad| pad.is_asserted(polarity))
    }

    fn button_pressed(&mut self) -> bool {
        self.button.is_asserted(self.button_polarity)
    }
}
