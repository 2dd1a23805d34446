mod common;

use anyhow::Result;
use common::{parse_date, test_service};
use fingo::domain::EntryKind;
use fingo::io::Exporter;

#[test]
fn test_export_entries_csv() -> Result<()> {
    let (mut service, _temp) = test_service();
    service.record("42", EntryKind::Credit, "50000", "gajian", parse_date("2026-01-10"))?;
    service.record("42", EntryKind::Debit, "10000", "ngopi, sore", parse_date("2026-01-11"))?;

    let mut out = Vec::new();
    let count = Exporter::new(&service).export_entries_csv("42", &mut out)?;
    let csv = String::from_utf8(out)?;

    assert_eq!(count, 2);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "timestamp,type,amount,note");
    assert_eq!(lines[1], "2026-01-10T12:00:00+00:00,masuk,50000,gajian");
    assert_eq!(lines[2], "2026-01-11T12:00:00+00:00,keluar,10000,\"ngopi, sore\"");
    Ok(())
}

#[test]
fn test_export_ledger_json() -> Result<()> {
    let (mut service, _temp) = test_service();
    service.record("42", EntryKind::Credit, "50000", "gajian", parse_date("2026-01-10"))?;

    let mut out = Vec::new();
    let snapshot = Exporter::new(&service).export_ledger_json("42", &mut out)?;

    assert_eq!(snapshot.balance, 50000);
    let json: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(json["user"], "42");
    assert_eq!(json["entries"][0]["type"], "masuk");
    assert_eq!(json["entries"][0]["nominal"], 50000);
    Ok(())
}

#[test]
fn test_export_unknown_user_is_empty() -> Result<()> {
    let (service, _temp) = test_service();

    let mut out = Vec::new();
    let count = Exporter::new(&service).export_entries_csv("nobody", &mut out)?;

    assert_eq!(count, 0);
    assert_eq!(String::from_utf8(out)?, "timestamp,type,amount,note\n");
    Ok(())
}
