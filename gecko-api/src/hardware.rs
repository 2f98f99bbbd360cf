//! 硬件边界
//!
//! Driver traits the modules are written against, and in-memory simulations
//! of them for the host build. Real register-level drivers live with the
//! firmware and implement the same traits.

use gecko_config::BusConfig;
use gecko_core::{BusMessage, ModuleError};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("queue is full")]
    QueueFull,

    #[error("peripheral is not started")]
    NotStarted,

    #[error("{what} {value} is out of range")]
    OutOfRange { what: &'static str, value: u32 },
}

impl From<HardwareError> for ModuleError {
    fn from(err: HardwareError) -> Self {
        ModuleError::Transport(err.to_string())
    }
}

/// One PWM channel on its own timer
pub trait PwmDriver {
    /// Program timer and channel; the output starts running
    fn configure(&mut self, frequency: u32, duty: u32) -> Result<(), HardwareError>;

    fn set_frequency(&mut self, frequency: u32) -> Result<(), HardwareError>;

    fn set_duty(&mut self, duty: u32) -> Result<(), HardwareError>;

    fn pause(&mut self) -> Result<(), HardwareError>;

    fn resume(&mut self) -> Result<(), HardwareError>;
}

/// A message bus controller with bounded receive and transmit queues
pub trait BusTransceiver {
    fn start(&mut self, baud_rate: u32, queues: &BusConfig) -> Result<(), HardwareError>;

    /// Next pending inbound frame, without waiting
    fn try_receive(&mut self) -> Option<BusMessage>;

    /// Queue a frame for transmission, without waiting
    fn try_send(&mut self, message: BusMessage) -> Result<(), HardwareError>;
}

// ==================== simulation ====================

/// Simulated PWM channel with 8-bit duty resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimPwm {
    pub frequency: u32,
    pub duty: u32,
    pub configured: bool,
    pub running: bool,
    /// Number of frequency or duty writes since configuration
    pub writes: u64,
}

impl SimPwm {
    pub const MAX_DUTY: u32 = 255;
    pub const MAX_FREQUENCY: u32 = 40_000_000;

    pub fn new() -> Self {
        Self::default()
    }

    fn check(frequency: u32, duty: u32) -> Result<(), HardwareError> {
        if frequency == 0 || frequency > Self::MAX_FREQUENCY {
            return Err(HardwareError::OutOfRange {
                what: "frequency",
                value: frequency,
            });
        }
        if duty > Self::MAX_DUTY {
            return Err(HardwareError::OutOfRange {
                what: "duty",
                value: duty,
            });
        }
        Ok(())
    }
}

impl PwmDriver for SimPwm {
    fn configure(&mut self, frequency: u32, duty: u32) -> Result<(), HardwareError> {
        Self::check(frequency, duty)?;
        self.frequency = frequency;
        self.duty = duty;
        self.configured = true;
        self.running = true;
        Ok(())
    }

    fn set_frequency(&mut self, frequency: u32) -> Result<(), HardwareError> {
        if !self.configured {
            return Err(HardwareError::NotStarted);
        }
        Self::check(frequency, self.duty)?;
        self.frequency = frequency;
        self.writes += 1;
        Ok(())
    }

    fn set_duty(&mut self, duty: u32) -> Result<(), HardwareError> {
        if !self.configured {
            return Err(HardwareError::NotStarted);
        }
        Self::check(self.frequency, duty)?;
        self.duty = duty;
        self.writes += 1;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), HardwareError> {
        if !self.configured {
            return Err(HardwareError::NotStarted);
        }
        self.running = false;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), HardwareError> {
        if !self.configured {
            return Err(HardwareError::NotStarted);
        }
        self.running = true;
        Ok(())
    }
}

/// Simulated bus controller.
///
/// Inbound frames are injected by the host. Outbound frames wait in the
/// transmit queue until [`take_sent`](Self::take_sent) drains it; in loopback
/// mode they are received back instead.
#[derive(Debug, Clone, Default)]
pub struct SimBus {
    baud_rate: Option<u32>,
    queues: BusConfig,
    loopback: bool,
    rx: VecDeque<BusMessage>,
    tx: VecDeque<BusMessage>,
    dropped: usize,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loopback() -> Self {
        Self {
            loopback: true,
            ..Self::default()
        }
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Deliver a frame from the wire; `false` when the receive queue is full
    pub fn inject(&mut self, message: BusMessage) -> bool {
        if self.rx.len() >= self.queues.rx_queue_len {
            self.dropped += 1;
            return false;
        }
        self.rx.push_back(message);
        true
    }

    /// Frames put on the wire since the last call
    pub fn take_sent(&mut self) -> Vec<BusMessage> {
        self.tx.drain(..).collect()
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    /// Inbound frames lost to a full receive queue
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl BusTransceiver for SimBus {
    fn start(&mut self, baud_rate: u32, queues: &BusConfig) -> Result<(), HardwareError> {
        self.baud_rate = Some(baud_rate);
        self.queues = *queues;
        Ok(())
    }

    fn try_receive(&mut self) -> Option<BusMessage> {
        self.rx.pop_front()
    }

    fn try_send(&mut self, message: BusMessage) -> Result<(), HardwareError> {
        if self.baud_rate.is_none() {
            return Err(HardwareError::NotStarted);
        }
        if self.loopback {
            return if self.inject(message) {
                Ok(())
            } else {
                Err(HardwareError::QueueFull)
            };
        }
        if self.tx.len() >= self.queues.tx_queue_len {
            return Err(HardwareError::QueueFull);
        }
        self.tx.push_back(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_pwm_lifecycle() {
        let mut pwm = SimPwm::new();
        assert_eq!(pwm.set_duty(10), Err(HardwareError::NotStarted));

        pwm.configure(1000, 128).unwrap();
        assert!(pwm.running);
        pwm.pause().unwrap();
        assert!(!pwm.running);
        pwm.set_frequency(2000).unwrap();
        assert_eq!(pwm.frequency, 2000);
        assert_eq!(
            pwm.set_duty(256),
            Err(HardwareError::OutOfRange {
                what: "duty",
                value: 256
            })
        );
        assert_eq!(pwm.duty, 128);
    }

    #[test]
    fn test_sim_bus_queues() {
        let mut bus = SimBus::new();
        let queues = BusConfig {
            rx_queue_len: 2,
            tx_queue_len: 1,
        };
        bus.start(500_000, &queues).unwrap();

        assert!(bus.inject(BusMessage::new(1, &[])));
        assert!(bus.inject(BusMessage::new(2, &[])));
        assert!(!bus.inject(BusMessage::new(3, &[])));
        assert_eq!(bus.dropped(), 1);
        assert_eq!(bus.try_receive().map(|m| m.id), Some(1));

        bus.try_send(BusMessage::new(9, &[1])).unwrap();
        assert_eq!(bus.try_send(BusMessage::new(9, &[2])), Err(HardwareError::QueueFull));
        assert_eq!(bus.take_sent().len(), 1);
        assert!(bus.try_send(BusMessage::new(9, &[3])).is_ok());
    }

    #[test]
    fn test_sim_bus_loopback() {
        let mut bus = SimBus::loopback();
        bus.start(125_000, &BusConfig::default()).unwrap();
        bus.try_send(BusMessage::new(0x42, &[7])).unwrap();
        assert_eq!(bus.try_receive(), Some(BusMessage::new(0x42, &[7])));
        assert!(bus.take_sent().is_empty());
    }

    #[test]
    fn test_hardware_error_into_module_error() {
        let err: ModuleError = HardwareError::QueueFull.into();
        assert_eq!(err, ModuleError::Transport("queue is full".into()));
    }
}
