use chrono::{DateTime, Local, TimeZone, Utc};

use crate::application::{AppError, LedgerService};
use crate::domain::{format_rupiah, Entry, EntryKind, MonthPeriod};

use super::Command;

const HEADER: &str = "FINGO-LITE";

const COMMAND_LIST: &str = "/masuk {nominal} {keterangan}\n\
/keluar {nominal} {keterangan}\n\
/saldo\n\
/riwayat [jumlah]\n\
/rekap [YYYY-MM]\n\
/hapus_terakhir\n\
/reset";

/// Turns chat commands into ledger operations and renders the replies.
///
/// Month boundaries and history timestamps use `tz`; a running bot uses the
/// host's local zone.
pub struct Dispatcher<Tz: TimeZone = Local> {
    service: LedgerService,
    tz: Tz,
}

impl Dispatcher<Local> {
    pub fn new(service: LedgerService) -> Self {
        Self::with_time_zone(service, Local)
    }
}

impl<Tz: TimeZone> Dispatcher<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn with_time_zone(service: LedgerService, tz: Tz) -> Self {
        Self { service, tz }
    }

    /// Handle a raw chat message from `user_id`.
    pub fn handle_message(&mut self, user_id: &str, text: &str) -> Result<String, AppError> {
        self.handle(user_id, Command::parse_message(text))
    }

    /// Handle a parsed command at the current time.
    pub fn handle(&mut self, user_id: &str, command: Command) -> Result<String, AppError> {
        self.handle_at(user_id, command, Utc::now())
    }

    /// Handle a parsed command as if it arrived at `now`.
    ///
    /// Bad input is answered with a usage message; only storage failures
    /// come back as errors.
    pub fn handle_at(
        &mut self,
        user_id: &str,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        tracing::debug!(user = user_id, ?command, mutation = command.is_mutation(), "Dispatching");

        match command {
            Command::Help => Ok(help_text()),

            Command::Balance => {
                let balance = self.service.balance(user_id)?;
                Ok(format!(
                    "{}\n\nSaldo kamu sekarang: {}",
                    HEADER,
                    format_rupiah(balance)
                ))
            }

            Command::Record { kind, amount, note } => {
                match self.service.record(user_id, kind, &amount, &note, now) {
                    Ok(result) => Ok(format!(
                        "{}\nDicatat ({})\nNominal: {}\nKet: {}\nSaldo sekarang: {}",
                        HEADER,
                        kind.as_str().to_uppercase(),
                        format_rupiah(result.entry.amount),
                        result.entry.note,
                        format_rupiah(result.balance)
                    )),
                    Err(e) if e.is_usage_error() => Ok(record_usage(kind)),
                    Err(e) => Err(e),
                }
            }

            Command::History(count) => {
                let entries = self.service.history(user_id, count)?;
                if entries.is_empty() {
                    return Ok("📭 Belum ada transaksi.".to_string());
                }

                let lines: Vec<String> = entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| self.history_line(i + 1, entry))
                    .collect();
                Ok(format!(
                    "{}\n\nRiwayat terakhir:\n\n{}",
                    HEADER,
                    lines.join("\n")
                ))
            }

            Command::Summary(arg) => {
                let today = now.with_timezone(&self.tz).date_naive();
                let period = MonthPeriod::parse_or_current(arg.as_deref(), today);
                let summary = self.service.monthly_summary(user_id, period, &self.tz)?;

                Ok(format!(
                    "Rekap bulan {}\n\n\
                     • Masuk ({}x): {}\n\
                     • Keluar ({}x): {}\n\
                     • Net: {}\n\n\
                     Saldo saat ini: {}\n\n\
                     Tip: /rekap {}",
                    summary.period,
                    summary.credit_count,
                    format_rupiah(summary.total_credit),
                    summary.debit_count,
                    format_rupiah(summary.total_debit),
                    format_rupiah(summary.net),
                    format_rupiah(summary.current_balance),
                    summary.period
                ))
            }

            Command::UndoLast => match self.service.undo_last(user_id)? {
                Some(result) => Ok(format!(
                    "{}\nTransaksi terakhir dihapus:\n{} {} - {}\nSaldo sekarang: {}",
                    HEADER,
                    result.removed.kind.as_str().to_uppercase(),
                    format_rupiah(result.removed.amount),
                    result.removed.note,
                    format_rupiah(result.balance)
                )),
                None => Ok("📭 Tidak ada transaksi untuk dihapus.".to_string()),
            },

            Command::Reset => {
                self.service.reset(user_id)?;
                Ok(format!(
                    "{}\nData kamu sudah di-reset. Saldo = {}, riwayat dikosongkan.",
                    HEADER,
                    format_rupiah(0)
                ))
            }

            Command::Check => {
                let report = self.service.check(user_id)?;
                let status = if report.is_consistent() {
                    "✅ Saldo cocok dengan riwayat."
                } else {
                    "⚠️ Saldo TIDAK cocok dengan riwayat."
                };
                let computed = report
                    .computed_balance
                    .map(format_rupiah)
                    .unwrap_or_else(|| "(terlalu besar)".to_string());
                Ok(format!(
                    "{}\n\nTransaksi: {}\nSaldo tercatat: {}\nSaldo dihitung: {}\n{}",
                    HEADER,
                    report.entry_count,
                    format_rupiah(report.balance),
                    computed,
                    status
                ))
            }

            Command::Unknown(_) => Ok(format!(
                "{}\n\nPerintah yang tersedia:\n{}",
                HEADER, COMMAND_LIST
            )),
        }
    }

    fn history_line(&self, position: usize, entry: &Entry) -> String {
        let date = entry
            .recorded_at()
            .map(|dt| {
                dt.with_timezone(&self.tz)
                    .format("%d/%m/%Y, %H.%M.%S")
                    .to_string()
            })
            .unwrap_or_else(|| "?".to_string());

        format!(
            "{}. [{}] {} {}{}\n   • {}",
            position,
            date,
            entry.kind.as_str().to_uppercase(),
            entry.kind.sign(),
            format_rupiah(entry.amount),
            entry.note
        )
    }
}

fn help_text() -> String {
    format!(
        "{}\n\nFitur:\n\
         • /masuk {{nominal}} {{keterangan}}\n\
         • /keluar {{nominal}} {{keterangan}}\n\
         • /saldo\n\
         • /riwayat [jumlah]\n\
         • /rekap [bulan] (format: YYYY-MM)\n\
         • /hapus_terakhir\n\
         • /reset\n\
         • /cek\n\n\
         Contoh:\n\
         /masuk 50000 gajian\n\
         /keluar 10000 ngopi",
        HEADER
    )
}

fn record_usage(kind: EntryKind) -> String {
    let example = match kind {
        EntryKind::Credit => "50000 gajian",
        EntryKind::Debit => "10000 ngopi",
    };
    format!(
        "Format: /{} {{nominal}} {{keterangan}}\nContoh: /{} {}",
        kind.as_str(),
        kind.as_str(),
        example
    )
}
