use logrelay_core::{LogEvent, Severity, Sink};
use logrelay_sinks::ConsoleSink;
use std::mem;

/// The single active output handler every log event goes through
pub struct LogOutput {
    handler: Box<dyn Sink>,
    threshold: Severity,
}

impl LogOutput {
    /// Create an output slot holding `handler`, passing every severity
    pub fn new(handler: Box<dyn Sink>) -> Self {
        Self {
            handler,
            threshold: Severity::Unset,
        }
    }

    /// Swap in a new handler, returning the previous one
    pub fn install(&mut self, handler: Box<dyn Sink>) -> Box<dyn Sink> {
        mem::replace(&mut self.handler, handler)
    }

    pub fn handler_name(&self) -> &'static str {
        self.handler.name()
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Severity) {
        self.threshold = threshold;
    }

    pub fn is_enabled_for(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// Hand `event` to the installed handler unless it falls below the threshold
    pub fn log(&self, event: &LogEvent<'_>) {
        if self.is_enabled_for(event.severity) {
            self.handler.handle(event);
        }
    }
}

impl Default for LogOutput {
    fn default() -> Self {
        Self::new(Box::new(ConsoleSink::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counting {
        name: &'static str,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Sink for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, event: &LogEvent<'_>) {
            self.seen.borrow_mut().push(event.message.to_string());
        }
    }

    #[test]
    fn test_default_is_console() {
        let output = LogOutput::default();
        assert_eq!(output.handler_name(), "console");
        assert_eq!(output.threshold(), Severity::Unset);
    }

    #[test]
    fn test_threshold_filters_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut output = LogOutput::new(Box::new(Counting {
            name: "counting",
            seen: Rc::clone(&seen),
        }));
        output.set_threshold(Severity::Warn);

        output.log(&LogEvent::new(Severity::Info, "robot.nav", 0, "quiet"));
        output.log(&LogEvent::new(Severity::Warn, "robot.nav", 0, "loud"));
        output.log(&LogEvent::new(Severity::Fatal, "robot.nav", 0, "louder"));

        assert_eq!(*seen.borrow(), vec!["loud", "louder"]);
    }

    #[test]
    fn test_install_returns_previous() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut output = LogOutput::default();

        let previous = output.install(Box::new(Counting {
            name: "counting",
            seen: Rc::clone(&seen),
        }));

        assert_eq!(previous.name(), "console");
        assert_eq!(output.handler_name(), "counting");
    }
}
