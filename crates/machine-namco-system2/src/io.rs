//! I/O microcontroller ports and serial-comms control.
//!
//! The HD63705 reads the cabinet controls through its ports and an 8-channel
//! A/D converter. A conversion starts on a control write with bit 6 set;
//! the status bit reports completion once the program has read the control
//! register and then the data register.

use emu_core::{Observable, Value};

/// Input latches visible to the MCU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McuInput {
    PortB,
    PortC,
    PortH,
    Dip,
    Dial(u8),
}

/// Cabinet inputs, active low.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPorts {
    pub port_b: u8,
    pub port_c: u8,
    pub port_h: u8,
    pub dip: u8,
    pub dial: [u8; 4],
    /// Analog channels (steering, pedals), sampled by the converter.
    pub analog: [u8; 8],
}

impl Default for InputPorts {
    fn default() -> Self {
        Self {
            port_b: 0xFF,
            port_c: 0xFF,
            port_h: 0xFF,
            dip: 0xFF,
            dial: [0xFF; 4],
            analog: [0x80; 8],
        }
    }
}

impl InputPorts {
    #[must_use]
    pub fn read(&self, input: McuInput) -> u8 {
        match input {
            McuInput::PortB => self.port_b,
            McuInput::PortC => self.port_c,
            McuInput::PortH => self.port_h,
            McuInput::Dip => self.dip,
            McuInput::Dial(n) => self.dial[usize::from(n & 3)],
        }
    }
}

const ADC_START: u8 = 0x40;
const ADC_IRQ: u8 = 0x20;
const ADC_COMPLETE: u8 = 0x80;

/// MCU-side I/O: inputs, port D latch and the A/D converter.
#[derive(Debug, Clone)]
pub struct McuIo {
    pub inputs: InputPorts,
    port_d: u8,
    adc_control: u8,
    adc_data: u8,
    /// 2 after a start, 1 after the control read, 0 after the data read.
    adc_complete: u8,
}

impl Default for McuIo {
    fn default() -> Self {
        Self::new()
    }
}

impl McuIo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inputs: InputPorts::default(),
            port_d: 0,
            adc_control: 0,
            adc_data: 0xAA,
            adc_complete: 0,
        }
    }

    /// Power-on state; cabinet inputs are kept.
    pub fn reset(&mut self) {
        let inputs = self.inputs.clone();
        *self = Self::new();
        self.inputs = inputs;
    }

    #[must_use]
    pub fn port_d(&self) -> u8 {
        self.port_d
    }

    pub fn write_port_d(&mut self, value: u8) {
        self.port_d = value;
    }

    /// Control register write. Returns true if the converter interrupt
    /// should be pulsed.
    pub fn write_adc_control(&mut self, value: u8) -> bool {
        self.adc_control = value;
        if value & ADC_START != 0 {
            self.adc_complete = 2;
            let channel = usize::from((value >> 2) & 0x07);
            self.adc_data = self.inputs.analog[channel];
        }
        value & ADC_IRQ != 0
    }

    pub fn read_adc_control(&mut self) -> u8 {
        if self.adc_complete == 2 {
            self.adc_complete = 1;
        }
        let status = if self.adc_complete != 0 { ADC_COMPLETE } else { 0 };
        status | (self.adc_control & 0x3F)
    }

    pub fn read_adc_data(&mut self) -> u8 {
        if self.adc_complete == 1 {
            self.adc_complete = 0;
        }
        self.adc_data
    }
}

const SERIAL_READY: u16 = 0x0004;

/// Serial-comms controller registers. There is no link partner, so the
/// transmitter always reports ready.
#[derive(Debug, Clone, Default)]
pub struct SerialControl {
    regs: [u16; 8],
}

impl SerialControl {
    #[must_use]
    pub fn read(&self, offset: u32) -> u16 {
        let index = ((offset >> 1) & 7) as usize;
        if index == 0 {
            self.regs[0] | SERIAL_READY
        } else {
            self.regs[index]
        }
    }

    pub fn write(&mut self, offset: u32, value: u16) {
        self.regs[((offset >> 1) & 7) as usize] = value;
    }
}

impl Observable for McuIo {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "port_d" => Some(self.port_d.into()),
            "adc.control" => Some(self.adc_control.into()),
            "adc.data" => Some(self.adc_data.into()),
            "adc.complete" => Some((self.adc_complete != 0).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["port_d", "adc.control", "adc.data", "adc.complete"]
    }
}
