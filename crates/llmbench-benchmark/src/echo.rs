use std::io::Write;

use tracing::warn;

/// Best-effort display sink for verbose output.
///
/// The first write or flush error is logged and disables the sink for the
/// rest of the benchmark. Errors never reach the caller.
pub struct Echo<W> {
    out: W,
    enabled: bool,
}

impl<W: Write> Echo<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn write(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Verbose output failed; disabling it for the rest of the benchmark");
            self.enabled = false;
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BrokenAfter;

    #[test]
    fn test_writes_when_enabled() {
        let mut echo = Echo::new(Vec::new(), true);
        echo.write("The sky ");
        echo.write("is blue");
        assert_eq!(echo.into_inner(), b"The sky is blue");
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let mut echo = Echo::new(Vec::new(), false);
        echo.write("hidden");
        assert!(echo.into_inner().is_empty());
    }

    #[test]
    fn test_error_disables_sink() {
        let mut echo = Echo::new(BrokenAfter::new(1), true);
        echo.write("first");
        assert!(echo.is_enabled());
        echo.write("second");
        assert!(!echo.is_enabled());
        echo.write("third");

        let sink = echo.into_inner();
        assert_eq!(sink.written, b"first");
        assert_eq!(sink.attempts, 2);
    }
}
