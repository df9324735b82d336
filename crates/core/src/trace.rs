//! Trace input boundary.
//!
//! The simulator pulls decoded instruction records from a [`TraceSource`].
//! This module provides:
//! 1. **Record type:** the five-field decoded instruction as it appears on the wire.
//! 2. **Text reader:** [`TraceReader`] parsing whitespace-separated records from any `BufRead`.
//! 3. **Errors:** strict per-line parse failures, reported as [`TraceError`].
//!
//! A malformed record ends the trace: the pipeline drains cleanly and no
//! distinction is made between true end-of-input and a bad line. The reader
//! logs the offending line at debug level before going quiet.

use crate::config::NUM_REGS;
use crate::pipeline::instruction::FuClass;
use log::debug;
use std::fmt;
use std::io::BufRead;

/// The "no register" / "no class" sentinel used by the trace format.
pub const NONE_SENTINEL: i32 = -1;

/// One decoded instruction as read from the trace.
///
/// Register operands are signed: `-1` means "none", any other value is an
/// architectural register index in `[0, NUM_REGS)`. The opcode doubles as
/// the function-unit class, with `-1` remapped to class 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Originating instruction address. Opaque; carried for reporting only.
    pub address: u32,
    /// Opcode / FU class selector, in `{-1, 0, 1, 2}`.
    pub op_code: i32,
    /// Destination register, `-1` or `[0, NUM_REGS)`.
    pub dest_reg: i32,
    /// Source registers, each `-1` or `[0, NUM_REGS)`.
    pub src_reg: [i32; 2],
}

impl TraceRecord {
    /// Function-unit class this record executes on.
    ///
    /// Opcode `-1` (and opcode `1`) map to class 1.
    pub fn fu_class(&self) -> FuClass {
        match self.op_code {
            0 => FuClass::K0,
            2 => FuClass::K2,
            _ => FuClass::K1,
        }
    }
}

/// Pull interface for instruction records.
///
/// `next_record` yields the next decoded instruction, or `None` once the
/// trace is exhausted (or unreadable; the two are deliberately
/// indistinguishable at this boundary). After the first `None`, every
/// subsequent call must also return `None`.
pub trait TraceSource {
    /// Pulls the next record, or `None` at end-of-trace.
    fn next_record(&mut self) -> Option<TraceRecord>;
}

/// Error describing why a trace line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// The line did not contain exactly five fields.
    FieldCount(usize),
    /// A field failed to parse or was outside its domain.
    InvalidField {
        /// Which field was bad.
        field: &'static str,
        /// The offending token.
        value: String,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::FieldCount(n) => {
                write!(f, "expected 5 fields per trace record, found {}", n)
            }
            TraceError::InvalidField { field, value } => {
                write!(f, "invalid {} in trace record: `{}`", field, value)
            }
        }
    }
}

impl std::error::Error for TraceError {}

/// Parses one trace line: `<address:hex> <op> <dest> <src0> <src1>`.
///
/// The four register/opcode fields are signed decimal. The opcode must be in
/// `{-1, 0, 1, 2}` and each register in `{-1} ∪ [0, NUM_REGS)`.
pub fn parse_record(line: &str) -> Result<TraceRecord, TraceError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(TraceError::FieldCount(fields.len()));
    }

    let address = u32::from_str_radix(fields[0].trim_start_matches("0x"), 16).map_err(|_| {
        TraceError::InvalidField {
            field: "address",
            value: fields[0].to_string(),
        }
    })?;

    let int_field = |field: &'static str, token: &str| -> Result<i32, TraceError> {
        token.parse::<i32>().map_err(|_| TraceError::InvalidField {
            field,
            value: token.to_string(),
        })
    };

    let op_code = int_field("op_code", fields[1])?;
    if !matches!(op_code, -1..=2) {
        return Err(TraceError::InvalidField {
            field: "op_code",
            value: fields[1].to_string(),
        });
    }

    let reg_field = |field: &'static str, token: &str| -> Result<i32, TraceError> {
        let value = int_field(field, token)?;
        if value != NONE_SENTINEL && !(0..NUM_REGS as i32).contains(&value) {
            return Err(TraceError::InvalidField {
                field,
                value: token.to_string(),
            });
        }
        Ok(value)
    };

    let dest_reg = reg_field("dest_reg", fields[2])?;
    let src0 = reg_field("src_reg", fields[3])?;
    let src1 = reg_field("src_reg", fields[4])?;

    Ok(TraceRecord {
        address,
        op_code,
        dest_reg,
        src_reg: [src0, src1],
    })
}

/// Text trace reader over any buffered input.
///
/// Blank lines are skipped; the first unparsable line ends the trace.
pub struct TraceReader<R: BufRead> {
    input: R,
    exhausted: bool,
}

impl<R: BufRead> TraceReader<R> {
    /// Creates a reader over `input`.
    pub fn new(input: R) -> Self {
        Self {
            input,
            exhausted: false,
        }
    }
}

impl<R: BufRead> TraceSource for TraceReader<R> {
    fn next_record(&mut self) -> Option<TraceRecord> {
        if self.exhausted {
            return None;
        }
        let mut line = String::new();
        loop {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    self.exhausted = true;
                    return None;
                }
                Ok(_) => {}
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(&line) {
                Ok(record) => return Some(record),
                Err(err) => {
                    debug!("trace input ends at malformed line ({}): {}", err, line.trim());
                    self.exhausted = true;
                    return None;
                }
            }
        }
    }
}
