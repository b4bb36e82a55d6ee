//! ---
//! vsim_section: "11-simulation"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Telemetry generator runtime helpers."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};

/// Device classes that can be attached to an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    AreaPeopleCounter,
    LinePeopleCounter,
    GarbageBinMonitor,
    HandwashMonitor,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::AreaPeopleCounter => "area_people_counter",
            DeviceType::LinePeopleCounter => "line_people_counter",
            DeviceType::GarbageBinMonitor => "garbage_bin_monitor",
            DeviceType::HandwashMonitor => "handwash_monitor",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    SendData,
}

/// Sensor reading. Serialized without a tag; the id key tells the kinds apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Congestion {
        area: String,
        count: u32,
        period: u64,
    },
    Sanitization {
        #[serde(rename = "handwashStand")]
        handwash_stand: String,
        distance: u32,
        max_depth: u32,
        amount_rate: u32,
    },
    Disinfection {
        #[serde(rename = "garbageBin")]
        garbage_bin: String,
        count: u32,
        period: u64,
    },
}

impl Payload {
    pub fn subject(&self) -> &str {
        match self {
            Payload::Congestion { area, .. } => area,
            Payload::Sanitization { handwash_stand, .. } => handwash_stand,
            Payload::Disinfection { garbage_bin, .. } => garbage_bin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub payload: Payload,
    /// Epoch milliseconds.
    pub time: i64,
}

/// One message published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub device_type: DeviceType,
    pub device_id: String,
    pub event_type: EventType,
    pub data: EventData,
}

impl Event {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_wire_shape() {
        let event = Event {
            device_type: DeviceType::AreaPeopleCounter,
            device_id: "area_people_counter-congestion-0-0".into(),
            event_type: EventType::SendData,
            data: EventData {
                payload: Payload::Congestion {
                    area: "congestion-0-0".into(),
                    count: 12,
                    period: 30_000,
                },
                time: 1_600_000_000_000,
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "deviceType": "area_people_counter",
                "deviceId": "area_people_counter-congestion-0-0",
                "eventType": "send_data",
                "data": {
                    "payload": {"area": "congestion-0-0", "count": 12, "period": 30000},
                    "time": 1_600_000_000_000i64
                }
            })
        );
    }

    #[test]
    fn payload_keys_name_the_device() {
        let stand = Payload::Sanitization {
            handwash_stand: "sanitization-270-60".into(),
            distance: 40,
            max_depth: 100,
            amount_rate: 60,
        };
        let value = serde_json::to_value(&stand).unwrap();
        assert_eq!(value["handwashStand"], "sanitization-270-60");
        assert_eq!(value["max_depth"], 100);

        let bin = Payload::Disinfection {
            garbage_bin: "disinfection-270-120".into(),
            count: 3,
            period: 30_000,
        };
        let value = serde_json::to_value(&bin).unwrap();
        assert_eq!(value["garbageBin"], "disinfection-270-120");
        let back: Payload = serde_json::from_value(value).unwrap();
        assert_eq!(back.subject(), "disinfection-270-120");
    }
}
