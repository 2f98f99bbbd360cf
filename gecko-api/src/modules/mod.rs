//! Concrete hardware modules

pub mod can;
pub mod pwm_output;

pub use can::Can;
pub use pwm_output::PwmOutput;
