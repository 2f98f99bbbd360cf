use crate::hardware::BusTransceiver;
use gecko_config::{BusConfig, Phase};
use gecko_core::{
    default_call, expect_arguments, ArgumentError, BooleanVar, BusMessage, LookupError, Module,
    ModuleError, ModuleId, ModuleKind, PropertyRegistry, StepContext, Type, Value, VariableId,
};
use gecko_log::info;
use std::any::Any;
use std::collections::HashMap;

/// Largest extended (29-bit) identifier
pub const MAX_ID: u32 = 0x1FFF_FFFF;

/// Supported bit rates
pub const BAUD_RATES: [u32; 8] = [
    1_000_000, 800_000, 500_000, 250_000, 125_000, 100_000, 50_000, 25_000,
];

const SEND_SIGNATURE: [Type; 9] = [Type::Integer; 9];

/// A CAN bus controller.
///
/// Each tick it drains every pending inbound frame and forwards it to the
/// module subscribed to the frame's identifier, if any. With the `output`
/// property set, received frames are also logged.
pub struct Can<T> {
    name: String,
    props: PropertyRegistry,
    output: BooleanVar,
    transceiver: T,
    baud_rate: u32,
    subscribers: HashMap<u32, ModuleId>,
}

impl<T: BusTransceiver + 'static> Can<T> {
    pub fn new(
        name: impl Into<String>,
        mut transceiver: T,
        baud_rate: u32,
        queues: &BusConfig,
    ) -> Result<Self, ModuleError> {
        let name = name.into();
        if !BAUD_RATES.contains(&baud_rate) {
            return Err(ModuleError::Config(format!(
                "{name}: invalid baud rate {baud_rate}"
            )));
        }

        let props = PropertyRegistry::new(name.as_str(), [("output", Value::Boolean(false))])?;
        let VariableId::Boolean(output) = props.resolve("output")?.cell() else {
            return Err(ModuleError::Config(format!("{name}: malformed property table")));
        };

        transceiver.start(baud_rate, queues)?;

        Ok(Self {
            name,
            props,
            output,
            transceiver,
            baud_rate,
            subscribers: HashMap::new(),
        })
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Route frames with identifier `id` to `module`; one subscriber per id
    pub fn subscribe(&mut self, id: u32, module: ModuleId) -> Result<(), LookupError> {
        if self.subscribers.contains_key(&id) {
            return Err(LookupError::DuplicateSubscription { id });
        }
        self.subscribers.insert(id, module);
        Ok(())
    }

    pub fn subscriber(&self, id: u32) -> Option<ModuleId> {
        self.subscribers.get(&id).copied()
    }

    pub fn send(&mut self, message: BusMessage) -> Result<(), ModuleError> {
        self.transceiver
            .try_send(message)
            .map_err(|_| ModuleError::Transport("could not send CAN message".to_string()))
    }

    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    fn send_from_args(&mut self, args: &[Value]) -> Result<(), ModuleError> {
        expect_arguments("send", args, &SEND_SIGNATURE)?;

        let mut ints = [0i64; 9];
        for (slot, arg) in ints.iter_mut().zip(args) {
            *slot = arg.as_integer().unwrap_or_default();
        }

        let id = u32::try_from(ints[0])
            .ok()
            .filter(|id| *id <= MAX_ID)
            .ok_or_else(|| out_of_range(1, ints[0]))?;
        let mut data = [0u8; 8];
        for (i, (byte, value)) in data.iter_mut().zip(&ints[1..]).enumerate() {
            *byte = u8::try_from(*value).map_err(|_| out_of_range(i + 2, *value))?;
        }

        self.send(BusMessage::new(id, &data))
    }
}

fn out_of_range(position: usize, value: i64) -> ArgumentError {
    ArgumentError::Range {
        method: "send".to_string(),
        position,
        value,
    }
}

impl<T: BusTransceiver + 'static> Module for Can<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Can
    }

    fn properties(&self) -> &PropertyRegistry {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.props
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<(), ModuleError> {
        let output = self.props.boolean(self.output);
        while let Some(message) = self.transceiver.try_receive() {
            if let Some(&subscriber) = self.subscribers.get(&message.id) {
                ctx.forward(subscriber, message);
            }
            if output {
                info!(ctx.logger(), target: Phase::Bus.target(), "can {message}");
            }
        }
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<(), ModuleError> {
        match method {
            "send" => self.send_from_args(args),
            _ => default_call(&self.name, method),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimBus;
    use gecko_core::ModuleSet;
    use gecko_log::{Level, LogRingBuffer, Logger};

    fn can() -> Can<SimBus> {
        Can::new("bus", SimBus::new(), 500_000, &BusConfig::default()).unwrap()
    }

    fn send_args(id: i64, data: [i64; 8]) -> Vec<Value> {
        std::iter::once(id).chain(data).map(Value::Integer).collect()
    }

    #[test]
    fn test_baud_rates() {
        for rate in BAUD_RATES {
            let can = Can::new("bus", SimBus::new(), rate, &BusConfig::default()).unwrap();
            assert_eq!(can.transceiver().baud_rate(), Some(rate));
        }
        let err = Can::new("bus", SimBus::new(), 9600, &BusConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, ModuleError::Config("bus: invalid baud rate 9600".into()));
    }

    #[test]
    fn test_duplicate_subscription() {
        let mut modules = ModuleSet::new();
        let a = modules.add(Box::new(can())).unwrap();
        let mut bus = can();
        bus.subscribe(0x100, a).unwrap();
        assert_eq!(
            bus.subscribe(0x100, a),
            Err(LookupError::DuplicateSubscription { id: 0x100 })
        );
        assert_eq!(bus.subscriber(0x100), Some(a));
    }

    #[test]
    fn test_send() {
        let mut bus = can();
        bus.call("send", &send_args(0x1a2, [1, 2, 3, 4, 5, 6, 7, 8]))
            .unwrap();
        let sent = bus.transceiver_mut().take_sent();
        assert_eq!(sent, vec![BusMessage::new(0x1a2, &[1, 2, 3, 4, 5, 6, 7, 8])]);
    }

    #[test]
    fn test_send_argument_errors() {
        let mut bus = can();
        let err = bus.call("send", &[Value::Integer(1)]).unwrap_err();
        assert!(matches!(err, ModuleError::Argument(ArgumentError::Count { expected: 9, .. })));

        let mut args = send_args(1, [0; 8]);
        args[4] = Value::Number(1.0);
        let err = bus.call("send", &args).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Argument(ArgumentError::Type { position: 5, .. })
        ));

        let err = bus.call("send", &send_args(1, [0, 256, 0, 0, 0, 0, 0, 0])).unwrap_err();
        assert_eq!(
            err,
            ModuleError::Argument(ArgumentError::Range {
                method: "send".into(),
                position: 3,
                value: 256
            })
        );

        let err = bus.call("send", &send_args(-1, [0; 8])).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Argument(ArgumentError::Range { position: 1, .. })
        ));
    }

    #[test]
    fn test_send_queue_full() {
        let queues = BusConfig {
            rx_queue_len: 20,
            tx_queue_len: 1,
        };
        let mut bus = Can::new("bus", SimBus::new(), 250_000, &queues).unwrap();
        bus.send(BusMessage::new(1, &[])).unwrap();
        assert_eq!(
            bus.send(BusMessage::new(2, &[])),
            Err(ModuleError::Transport("could not send CAN message".into()))
        );
    }

    #[test]
    fn test_step_forwards_and_logs() {
        let mut modules = ModuleSet::new();
        let sink = modules.add(Box::new(can())).unwrap();

        let mut bus = can();
        bus.subscribe(0x10, sink).unwrap();
        bus.properties_mut()
            .set_by_name("output", &Value::Boolean(true))
            .unwrap();
        bus.transceiver_mut().inject(BusMessage::new(0x10, &[0xab]));
        bus.transceiver_mut().inject(BusMessage::remote(0x2));

        let ring = LogRingBuffer::new(16);
        let logger = Logger::new(Level::Info).with_sink(ring.clone());
        let mut outbox = Vec::new();
        bus.step(&mut StepContext::new(&logger, 4, &mut outbox)).unwrap();

        assert_eq!(outbox, vec![(sink, BusMessage::new(0x10, &[0xab]))]);
        assert_eq!(bus.transceiver().pending_rx(), 0);

        let lines: Vec<_> = ring.dump_records().into_iter().map(|r| r.message).collect();
        assert_eq!(lines, vec!["can 010,ab", "can 002"]);
    }

    #[test]
    fn test_step_is_quiet_by_default() {
        let mut bus = can();
        bus.transceiver_mut().inject(BusMessage::new(0x10, &[1]));

        let ring = LogRingBuffer::new(16);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());
        let mut outbox = Vec::new();
        bus.step(&mut StepContext::new(&logger, 0, &mut outbox)).unwrap();

        assert!(ring.is_empty());
        assert!(outbox.is_empty());
    }
}
