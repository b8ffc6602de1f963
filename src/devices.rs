// src/devices.rs
//! Cloud device records, the online-device menu, and lookup of the full record.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FanPadError, Result};

// --- Data Structures ---

/// A device as the cloud account reports it.
///
/// Only the fields needed to connect are typed; everything else the cloud
/// sends is kept in `extra` so the full record can be shown on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
    #[serde(rename = "localip", default)]
    pub local_ip: String,
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The trimmed projection shown in the selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub name: String,
    pub local_ip: String,
    pub token: String,
}

// --- Filtering and Lookup ---

pub fn online_devices(records: &[DeviceRecord]) -> Vec<DeviceSummary> {
    records
        .iter()
        .filter(|record| record.is_online)
        .map(|record| DeviceSummary {
            name: record.name.clone(),
            local_ip: record.local_ip.clone(),
            token: record.token.clone(),
        })
        .collect()
}

pub fn find_by_token<'a>(records: &'a [DeviceRecord], token: &str) -> Option<&'a DeviceRecord> {
    records.iter().find(|record| record.token == token)
}

/// Pretty JSON of the whole record with keys sorted.
pub fn full_record_json(record: &DeviceRecord) -> Result<String> {
    // serde_json's default map is ordered by key
    let value = serde_json::to_value(record)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

// --- Selection Menu ---

/// Lists `devices` 1-based and reads choices from `input` until one is valid.
///
/// Returns the 0-based index. Running out of input is an error rather than a
/// silent default.
pub fn select_device<R: BufRead, W: Write>(
    devices: &[DeviceSummary],
    input: &mut R,
    output: &mut W,
) -> Result<usize> {
    if devices.is_empty() {
        return Err(FanPadError::NoOnlineDevices);
    }

    loop {
        writeln!(output, "\nCurrently online devices:\n")?;
        for (index, device) in devices.iter().enumerate() {
            writeln!(output, "{}. {}", index + 1, device.name)?;
        }
        write!(output, "\nSelect a device by entering the index number: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(FanPadError::InvalidInput(
                "no device selected before end of input".to_string(),
            ));
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=devices.len()).contains(&choice) => return Ok(choice - 1),
            Ok(_) => writeln!(
                output,
                "\nIndex out of range. Please select a valid index number."
            )?,
            Err(_) => writeln!(
                output,
                "\nInvalid index number. Please select a valid index number."
            )?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> DeviceRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn unknown_cloud_fields_are_kept() {
        let device = record(
            r#"{"name":"Fan","isOnline":true,"localip":"10.0.0.5","token":"abc","did":"123","rssi":-40}"#,
        );
        assert_eq!(device.extra.get("did"), Some(&Value::from("123")));
        assert_eq!(device.extra.get("rssi"), Some(&Value::from(-40)));
    }

    #[test]
    fn missing_optional_fields_default() {
        let device = record(r#"{"name":"Lamp"}"#);
        assert!(!device.is_online);
        assert!(device.local_ip.is_empty());
        assert_eq!(device.model, None);
    }

    #[test]
    fn full_record_is_sorted_and_complete() {
        let device = record(
            r#"{"token":"abc","name":"Fan","isOnline":true,"localip":"10.0.0.5","zeta":1,"alpha":2}"#,
        );
        let json = full_record_json(&device).unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        let zeta = json.find("\"zeta\"").unwrap();
        let name = json.find("\"name\"").unwrap();
        assert!(alpha < name && name < zeta);
        assert!(json.contains("\"isOnline\": true"));
    }

    #[test]
    fn zero_is_out_of_range() {
        let devices = vec![DeviceSummary {
            name: "Fan".into(),
            local_ip: "10.0.0.5".into(),
            token: "abc".into(),
        }];
        let mut input = "0\n1\n".as_bytes();
        let mut output = Vec::new();
        assert_eq!(select_device(&devices, &mut input, &mut output).unwrap(), 0);
        assert!(String::from_utf8(output).unwrap().contains("Index out of range"));
    }

    #[test]
    fn menu_reprompts_until_valid() {
        let devices: Vec<DeviceSummary> = ["Fan A", "Fan B"]
            .iter()
            .map(|name| DeviceSummary {
                name: name.to_string(),
                local_ip: "10.0.0.5".into(),
                token: name.to_lowercase(),
            })
            .collect();
        let mut input = "two\n3\n2\n".as_bytes();
        let mut output = Vec::new();

        assert_eq!(select_device(&devices, &mut input, &mut output).unwrap(), 1);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("1. Fan A\n2. Fan B"));
        assert!(shown.contains("Invalid index number"));
        assert!(shown.contains("Index out of range"));
        assert_eq!(shown.matches("Currently online devices:").count(), 3);
    }

    #[test]
    fn end_of_input_is_an_error() {
        let devices = vec![DeviceSummary {
            name: "Fan".into(),
            local_ip: "10.0.0.5".into(),
            token: "abc".into(),
        }];
        let mut input = "".as_bytes();
        let result = select_device(&devices, &mut input, &mut Vec::new());
        assert!(matches!(result, Err(FanPadError::InvalidInput(_))));
    }

    #[test]
    fn empty_menu_is_reported() {
        let result = select_device(&[], &mut "1\n".as_bytes(), &mut Vec::new());
        assert!(matches!(result, Err(FanPadError::NoOnlineDevices)));
    }

    #[test]
    fn offline_devices_are_hidden_and_lookup_uses_token() {
        let records = vec![
            record(r#"{"name":"Den","isOnline":false,"localip":"10.0.0.4","token":"t1"}"#),
            record(r#"{"name":"Hall","isOnline":true,"localip":"10.0.0.5","token":"t2","did":"9"}"#),
        ];

        let online = online_devices(&records);
        assert_eq!(
            online,
            vec![DeviceSummary {
                name: "Hall".into(),
                local_ip: "10.0.0.5".into(),
                token: "t2".into(),
            }]
        );

        let full = find_by_token(&records, &online[0].token).unwrap();
        assert_eq!(full.extra.get("did"), Some(&Value::from("9")));
        assert!(find_by_token(&records, "missing").is_none());
    }
}
