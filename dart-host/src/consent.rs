//! Console consent prompt.

use crate::config::ConsentMode;
use dart_i18n::{ConsentPrompt, ConsentRequest, StaticConsent};
use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

const RULE: &str = "======================================================================";

/// Asks on a terminal-like stream pair and waits for `y` or `n`.
///
/// End of input gives no answer, so the question is asked again next time.
pub struct ConsoleConsent<R, W> {
    io: Mutex<(R, W)>,
}

impl ConsoleConsent<BufReader<io::Stdin>, io::Stdout> {
    /// Prompt on standard input and output.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> ConsoleConsent<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    /// Give back the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn converse(&self, request: &ConsentRequest<'_>) -> io::Result<Option<bool>> {
        let mut io = self.io.lock().unwrap_or_else(PoisonError::into_inner);
        let (reader, writer) = &mut *io;

        writeln!(writer)?;
        writeln!(writer, "{}", RULE)?;
        writeln!(writer, "[Permission Request] {}", request.extension)?;
        writeln!(writer, "{}", RULE)?;
        writeln!(writer, "Permission: {}", request.description())?;
        if !request.reason.is_empty() {
            writeln!(writer, "Reason: {}", request.reason)?;
        }
        writeln!(writer)?;

        loop {
            write!(writer, "Allow this permission? (y/n): ")?;
            writer.flush()?;

            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                writeln!(writer)?;
                return Ok(None);
            }

            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => {
                    writeln!(writer, "Permission granted.")?;
                    writeln!(writer, "{}", RULE)?;
                    return Ok(Some(true));
                }
                "n" | "no" => {
                    writeln!(writer, "Permission denied.")?;
                    writeln!(writer, "{}", RULE)?;
                    return Ok(Some(false));
                }
                _ => writeln!(writer, "Please answer y or n.")?,
            }
        }
    }
}

impl<R, W> ConsentPrompt for ConsoleConsent<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn ask(&self, request: &ConsentRequest<'_>) -> Option<bool> {
        self.converse(request).unwrap_or_else(|e| {
            warn!("Consent prompt failed for {}: {}", request.permission, e);
            None
        })
    }
}

/// Build the consent prompt for a configured mode.
pub fn prompt_for(mode: ConsentMode) -> Box<dyn ConsentPrompt> {
    match mode {
        ConsentMode::Prompt => Box::new(ConsoleConsent::stdio()),
        ConsentMode::Grant => Box::new(StaticConsent::Grant),
        ConsentMode::Deny => Box::new(StaticConsent::Deny),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_i18n::{Decision, PermissionGate, PermissionStore};
    use dart_plugin_runtime::Permission;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn request() -> ConsentRequest<'static> {
        ConsentRequest {
            extension: "sample_permission_request",
            permission: Permission::ReadMainLocales,
            reason: "Shows the application title",
        }
    }

    fn ask(input: &str) -> (Option<bool>, String) {
        let consent = ConsoleConsent::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let answer = consent.ask(&request());
        let (_, output) = consent.into_inner();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_grants() {
        let (answer, output) = ask("y\n");
        assert_eq!(answer, Some(true));
        assert!(output.contains("[Permission Request] sample_permission_request"));
        assert!(output.contains("Reason: Shows the application title"));
        assert!(output.contains(Permission::ReadMainLocales.description()));
    }

    #[test]
    fn test_reasks_until_valid_answer() {
        let (answer, output) = ask("maybe\n\nNO\n");
        assert_eq!(answer, Some(false));
        assert_eq!(output.matches("Please answer y or n.").count(), 2);
    }

    #[test]
    fn test_end_of_input_gives_no_answer() {
        let (answer, _) = ask("");
        assert_eq!(answer, None);
    }

    #[test]
    fn test_end_of_input_is_asked_again_after_restart() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("permissions.json");

        let silent = ConsoleConsent::new(Cursor::new(Vec::new()), Vec::new());
        let gate = PermissionGate::new(PermissionStore::open(&path).unwrap(), Box::new(silent));
        assert_eq!(
            gate.request_one("sample", Permission::ReadMainLocales, "reason"),
            Decision::Denied
        );
        drop(gate);

        let store = PermissionStore::open(&path).unwrap();
        assert!(store.get("sample", Permission::ReadMainLocales).is_none());

        let willing = ConsoleConsent::new(Cursor::new(b"y\n".to_vec()), Vec::new());
        let gate = PermissionGate::new(store, Box::new(willing));
        assert_eq!(
            gate.request_one("sample", Permission::ReadMainLocales, "reason"),
            Decision::Granted
        );
    }
}
