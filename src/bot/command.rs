use crate::domain::{EntryKind, HistoryCount};

/// A chat command with its arguments picked apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Help,
    /// `/saldo`
    Balance,
    /// `/masuk {nominal} {keterangan}` or `/keluar {nominal} {keterangan}`.
    /// The amount stays raw text; validation happens in the ledger.
    Record {
        kind: EntryKind,
        amount: String,
        note: String,
    },
    /// `/riwayat [jumlah]`
    History(HistoryCount),
    /// `/rekap [YYYY-MM]`; the month is resolved against the current date
    /// when the command runs
    Summary(Option<String>),
    /// `/hapus_terakhir`
    UndoLast,
    /// `/reset`
    Reset,
    /// `/cek`
    Check,
    /// Anything else, including plain text without a leading slash
    Unknown(String),
}

impl Command {
    /// Build a command from its name (without the slash) and the raw
    /// remainder of the message.
    pub fn parse(name: &str, args: &str) -> Self {
        let mut tokens = args.split_whitespace();

        match name.to_lowercase().as_str() {
            "start" | "help" => Command::Help,
            "saldo" => Command::Balance,
            "masuk" | "keluar" => {
                let kind = if name.eq_ignore_ascii_case("masuk") {
                    EntryKind::Credit
                } else {
                    EntryKind::Debit
                };
                let amount = tokens.next().unwrap_or_default().to_string();
                let note = tokens.collect::<Vec<_>>().join(" ");
                Command::Record { kind, amount, note }
            }
            "riwayat" => Command::History(HistoryCount::parse(tokens.next())),
            "rekap" => Command::Summary(tokens.next().map(str::to_string)),
            "hapus_terakhir" => Command::UndoLast,
            "reset" => Command::Reset,
            "cek" => Command::Check,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Parse a whole chat message such as `/masuk 50000 gajian`.
    /// A `@botname` suffix on the command is ignored.
    pub fn parse_message(text: &str) -> Self {
        let text = text.trim();
        let Some(body) = text.strip_prefix('/') else {
            return Command::Unknown(text.to_string());
        };

        let (head, args) = match body.find(char::is_whitespace) {
            Some(pos) => (&body[..pos], &body[pos..]),
            None => (body, ""),
        };
        let name = head.split('@').next().unwrap_or(head);

        Self::parse(name, args)
    }

    /// True for commands that change the stored ledger.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Record { .. } | Command::UndoLast | Command::Reset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_commands() {
        assert_eq!(
            Command::parse_message("/masuk 50000 gajian bulan ini"),
            Command::Record {
                kind: EntryKind::Credit,
                amount: "50000".into(),
                note: "gajian bulan ini".into(),
            }
        );
        assert_eq!(
            Command::parse_message("/keluar   10.000    ngopi  "),
            Command::Record {
                kind: EntryKind::Debit,
                amount: "10.000".into(),
                note: "ngopi".into(),
            }
        );
    }

    #[test]
    fn test_parse_record_without_arguments() {
        assert_eq!(
            Command::parse_message("/masuk"),
            Command::Record {
                kind: EntryKind::Credit,
                amount: String::new(),
                note: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_history_count() {
        assert_eq!(
            Command::parse_message("/riwayat"),
            Command::History(HistoryCount::default())
        );
        assert_eq!(
            Command::parse_message("/riwayat 5"),
            Command::History(HistoryCount::new(5))
        );
        assert_eq!(
            Command::parse_message("/riwayat 100"),
            Command::History(HistoryCount::new(50))
        );
    }

    #[test]
    fn test_parse_strips_bot_mention() {
        assert_eq!(Command::parse_message("/saldo@fingo_bot"), Command::Balance);
        assert_eq!(
            Command::parse_message("/rekap@fingo_bot 2026-02"),
            Command::Summary(Some("2026-02".into()))
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse_message("/start"), Command::Help);
        assert_eq!(Command::parse_message("/help"), Command::Help);
        assert_eq!(Command::parse_message("/hapus_terakhir"), Command::UndoLast);
        assert_eq!(Command::parse_message("/reset"), Command::Reset);
        assert_eq!(Command::parse_message("/cek"), Command::Check);
        assert_eq!(Command::parse_message("/rekap"), Command::Summary(None));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse_message("halo"),
            Command::Unknown("halo".into())
        );
        assert_eq!(
            Command::parse_message("/transfer 10"),
            Command::Unknown("transfer".into())
        );
    }

    #[test]
    fn test_is_mutation() {
        assert!(Command::Reset.is_mutation());
        assert!(Command::UndoLast.is_mutation());
        assert!(!Command::Balance.is_mutation());
        assert!(!Command::Summary(None).is_mutation());
    }
}
