use anyhow::{bail, Result};
use serde_json::{json, Map, Value};

use crate::domain::{Entry, Ledger, Store};

/// Ledger field holding entries that could not be read back.
pub const REJECTED_ENTRIES_KEY: &str = "tx_rejected";

/// Top-level field holding user ledgers that could not be read back, as
/// `{"user": <id>, "data": <raw ledger>}` objects.
pub const REJECTED_USERS_KEY: &str = "users_rejected";

const LEDGER_FIELDS: [&str; 3] = ["authorized", "saldo", "tx"];

/// How much of a document had to be set aside while reading it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetAside {
    pub users: usize,
    pub entries: usize,
}

impl SetAside {
    pub fn is_empty(&self) -> bool {
        self.users == 0 && self.entries == 0
    }
}

/// Build a [`Store`] from a parsed JSON document.
///
/// A user or entry that does not fit the ledger schema, or an entry that
/// breaks the entry rules (positive amount, non-blank note), is moved under
/// [`REJECTED_USERS_KEY`] or [`REJECTED_ENTRIES_KEY`] with a warning.
/// Everything else is kept as is. Only a document whose outer shape is not
/// a store at all is an error.
pub fn decode_store(document: Value) -> Result<(Store, SetAside)> {
    let mut root = match document {
        Value::Object(root) => root,
        other => bail!("expected a JSON object, found {}", type_name(&other)),
    };

    let users = match root.remove("users") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(users)) => users,
        Some(other) => bail!("\"users\" must be an object, found {}", type_name(&other)),
    };

    let mut store = Store {
        users: Default::default(),
        extra: root,
    };
    let mut set_aside = SetAside::default();

    for (user, raw) in users {
        match decode_ledger(&user, &raw, &mut set_aside) {
            Ok(ledger) => {
                store.users.insert(user, ledger);
            }
            Err(reason) => {
                tracing::warn!(user = %user, %reason, "Setting aside unreadable ledger");
                set_aside.users += 1;
                append(
                    &mut store.extra,
                    REJECTED_USERS_KEY,
                    vec![json!({ "user": user, "data": raw })],
                );
            }
        }
    }

    Ok((store, set_aside))
}

fn decode_ledger(user: &str, raw: &Value, set_aside: &mut SetAside) -> Result<Ledger, String> {
    let fields = raw
        .as_object()
        .ok_or_else(|| format!("expected an object, found {}", type_name(raw)))?;

    let authorized = match fields.get("authorized") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(authorized)) => *authorized,
        Some(other) => return Err(format!("\"authorized\" is {}", type_name(other))),
    };

    let balance = match fields.get("saldo") {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_i64()
            .ok_or_else(|| format!("\"saldo\" {} is not a whole Rupiah amount", value))?,
    };

    let raw_entries: &[Value] = match fields.get("tx") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => return Err(format!("\"tx\" is {}", type_name(other))),
    };

    let mut extra: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| !LEDGER_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut entries = Vec::with_capacity(raw_entries.len());
    let mut rejected = Vec::new();
    for (index, raw_entry) in raw_entries.iter().enumerate() {
        match decode_entry(raw_entry) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                tracing::warn!(user, index, %reason, "Setting aside unreadable entry");
                rejected.push(raw_entry.clone());
            }
        }
    }

    if !rejected.is_empty() {
        set_aside.entries += rejected.len();
        append(&mut extra, REJECTED_ENTRIES_KEY, rejected);
    }

    Ok(Ledger::from_parts(authorized, balance, entries, extra))
}

fn decode_entry(raw: &Value) -> Result<Entry, String> {
    let entry: Entry = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
    entry.validate().map_err(|e| e.to_string())?;
    Ok(entry)
}

/// Push `values` onto the array at `key`, wrapping whatever was there before
/// so nothing already set aside is lost.
fn append(fields: &mut Map<String, Value>, key: &str, values: Vec<Value>) {
    match fields.get_mut(key) {
        Some(Value::Array(existing)) => existing.extend(values),
        Some(existing) => {
            let mut all = vec![existing.take()];
            all.extend(values);
            *existing = Value::Array(all);
        }
        None => {
            fields.insert(key.to_string(), Value::Array(values));
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryKind;

    #[test]
    fn test_clean_document_sets_nothing_aside() {
        let document = json!({
            "users": {
                "7": {
                    "authorized": true,
                    "saldo": 1500,
                    "tx": [{"type": "masuk", "nominal": 1500, "ket": "a", "ts": 0}],
                    "nickname": "sari"
                }
            },
            "schema": 2
        });

        let (store, set_aside) = decode_store(document).unwrap();

        assert!(set_aside.is_empty());
        let ledger = store.get("7").unwrap();
        assert!(ledger.authorized);
        assert_eq!(ledger.balance(), 1500);
        assert_eq!(ledger.entries()[0].kind, EntryKind::Credit);
        assert_eq!(ledger.extra["nickname"], "sari");
        assert!(!ledger.extra.contains_key(REJECTED_ENTRIES_KEY));
        assert_eq!(store.extra["schema"], 2);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let (store, set_aside) = decode_store(json!({ "users": { "1": {} } })).unwrap();
        assert!(set_aside.is_empty());
        assert_eq!(store.get("1"), Some(&Ledger::new()));

        let (store, _) = decode_store(json!({})).unwrap();
        assert!(store.users.is_empty());
    }

    #[test]
    fn test_entries_breaking_rules_are_set_aside() {
        let document = json!({
            "users": {
                "1": {
                    "saldo": 100,
                    "tx": [
                        {"type": "masuk", "nominal": 100, "ket": "ok", "ts": 0},
                        {"type": "keluar", "nominal": -5, "ket": "minus", "ts": 1},
                        {"type": "keluar", "nominal": 5, "ket": "  ", "ts": 2},
                        {"type": "transfer", "nominal": 5, "ket": "x", "ts": 3},
                        {"type": "masuk", "nominal": 1e20, "ket": "big", "ts": 4}
                    ]
                }
            }
        });

        let (store, set_aside) = decode_store(document).unwrap();

        assert_eq!(set_aside, SetAside { users: 0, entries: 4 });
        let ledger = store.get("1").unwrap();
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].note, "ok");
        assert_eq!(ledger.extra[REJECTED_ENTRIES_KEY].as_array().map(Vec::len), Some(4));
        assert_eq!(ledger.extra[REJECTED_ENTRIES_KEY][0]["nominal"], -5);
    }

    #[test]
    fn test_unreadable_ledger_is_set_aside_alone() {
        let document = json!({
            "users": {
                "a": {"saldo": 1e20, "tx": []},
                "b": {
                    "saldo": 5000,
                    "tx": [{"type": "masuk", "nominal": 5000, "ket": "b", "ts": 0}]
                },
                "c": "not a ledger"
            }
        });

        let (store, set_aside) = decode_store(document).unwrap();

        assert_eq!(set_aside, SetAside { users: 2, entries: 0 });
        assert_eq!(store.users.len(), 1);
        assert_eq!(store.get("b").unwrap().balance(), 5000);

        let rejected = store.extra[REJECTED_USERS_KEY].as_array().unwrap();
        let ids: Vec<&str> = rejected.iter().filter_map(|r| r["user"].as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(rejected[1]["data"], "not a ledger");
    }

    #[test]
    fn test_earlier_rejections_are_kept() {
        let mut fields = Map::new();
        fields.insert(REJECTED_ENTRIES_KEY.to_string(), json!("older"));

        append(&mut fields, REJECTED_ENTRIES_KEY, vec![json!(1)]);
        append(&mut fields, REJECTED_ENTRIES_KEY, vec![json!(2)]);

        assert_eq!(fields[REJECTED_ENTRIES_KEY], json!(["older", 1, 2]));
    }

    #[test]
    fn test_wrong_outer_shape_is_an_error() {
        assert!(decode_store(json!([])).is_err());
        assert!(decode_store(json!(null)).is_err());
        assert!(decode_store(json!({ "users": [] })).is_err());
    }
}
