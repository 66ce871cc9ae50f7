#![allow(dead_code)]

use circ::ast::NodeRef;
use circ::{Interpreter, InterpreterError, Node, Value};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Output sink that tests can read back after the interpreter wrote to it.
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

/// An interpreter whose console output goes to the returned buffer.
pub fn capturing() -> (Interpreter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let interp = Interpreter::new().with_output(Box::new(buffer.clone()));
    (interp, buffer)
}

pub fn run(program: NodeRef) -> Value {
    let (mut interp, _) = capturing();
    interp
        .run(&program)
        .expect("program failed")
        .expect("program did not finish")
}

pub fn run_err(program: NodeRef) -> InterpreterError {
    let (mut interp, _) = capturing();
    interp.run(&program).expect_err("program should fail")
}

pub fn from_json(tree: serde_json::Value) -> NodeRef {
    Node::from_json_value(tree).expect("malformed test tree")
}

pub fn num(n: f64) -> Value {
    Value::Number(n)
}

pub fn numbers(values: &[f64]) -> Value {
    Value::array(values.iter().map(|n| Value::Number(*n)).collect())
}

pub fn strings(values: &[&str]) -> Value {
    Value::array(values.iter().map(|s| Value::string(s)).collect())
}
