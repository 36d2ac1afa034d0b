#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{Mode, RunOutcome, Session};

/// Output sink the tests keep a handle to after the interpreter takes its copy.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session(mode: Mode) -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let session = Session::with_output(mode, Box::new(buffer.clone()));
    (session, buffer)
}

/// Runs `source` as a script, returning what it printed and how it ended.
pub fn run(source: &str) -> (String, RunOutcome) {
    let (mut session, buffer) = session(Mode::Script);
    let outcome = session.run(source);
    (buffer.contents(), outcome)
}

/// Runs `source` and asserts it completed, returning the printed output.
pub fn run_ok(source: &str) -> String {
    let (output, outcome) = run(source);
    assert!(
        outcome.is_success(),
        "expected success, got {:?} after output {:?}",
        outcome,
        output
    );
    output
}

/// Runs `source` and returns the message of the runtime error it ended with.
pub fn run_err(source: &str) -> (String, String) {
    let (output, outcome) = run(source);
    match outcome {
        RunOutcome::RuntimeFailure(e) => (output, e.to_string()),
        other => panic!("expected a runtime failure, got {:?}", other),
    }
}

/// Runs `source` and returns the rendered static errors it was rejected with.
pub fn static_errors(source: &str) -> Vec<String> {
    let (output, outcome) = run(source);
    assert!(output.is_empty(), "nothing should run, got {:?}", output);
    match outcome {
        RunOutcome::StaticErrors(errors) => errors.iter().map(ToString::to_string).collect(),
        other => panic!("expected static errors, got {:?}", other),
    }
}
