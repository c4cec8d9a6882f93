//! Quill: a small class‑based scripting language.
//!
//! The pipeline is scanner → parser → resolver → interpreter. Each stage is
//! usable on its own; [`run`] chains them.
//!
//! ```
//! use std::cell::RefCell;
//! use std::io::Write;
//! use std::rc::Rc;
//!
//! #[derive(Clone, Default)]
//! struct Sink(Rc<RefCell<Vec<u8>>>);
//!
//! impl Write for Sink {
//!     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
//!         self.0.borrow_mut().write(buf)
//!     }
//!     fn flush(&mut self) -> std::io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let sink = Sink::default();
//! let mut interpreter = quill::interpreter::Interpreter::with_output(Box::new(sink.clone()));
//!
//! quill::run("print(1 + 2);", &mut interpreter).unwrap();
//! assert_eq!(String::from_utf8(sink.0.borrow().clone()).unwrap(), "3\n");
//! ```

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod config;
pub mod environment;
pub mod error;
pub mod instance;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::info;

use crate::ast::Program;
use crate::error::QuillError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;

/// Scan, parse and resolve `source` into a runnable program plus its
/// binding table. Stops at the first stage that reports errors.
pub fn compile(source: &str) -> Result<(Program, resolver::Locals), Vec<QuillError>> {
    let tokens = scanner::scan(source).map_err(|e| vec![e])?;

    let mut parser = Parser::new(source, &tokens);
    let statements = parser.parse();

    let errors = parser.take_errors();
    if !errors.is_empty() {
        return Err(errors);
    }

    let locals = Resolver::new(source).resolve(&statements)?;

    Ok((Program::new(source, statements), locals))
}

/// Run `source` to completion on `interpreter`.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<(), Vec<QuillError>> {
    info!("Running program of {} byte(s)", source.len());

    let (program, locals) = compile(source)?;

    interpreter
        .interpret(&program, &locals)
        .map_err(|e| vec![e])
}
