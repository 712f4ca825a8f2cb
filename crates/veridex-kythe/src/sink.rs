//! Record shapes and the sink abstraction.
//!
//! The emitter produces two record shapes: a *fact* attaches a named,
//! base64-encoded attribute to a VName; an *edge* connects two VNames with
//! a named kind. Records are appended to a [`FactSink`] in emission order;
//! the sink makes no flush or durability claims.
//!
//! [`JsonLineSink`] is the production sink (one JSON object per line, UTF-8,
//! serialized through serde so arbitrary source text is escaped correctly).
//! [`MemorySink`] retains records in memory for assertions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use std::io::Write;

use crate::error::SinkError;
use crate::vname::VName;

// ============================================================================
// Records
// ============================================================================

/// One emitted record: a vertex fact or an edge fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// A named attribute of a vertex; `fact_value` is base64-encoded.
    Fact {
        source: VName,
        fact_name: String,
        fact_value: String,
    },
    /// A directed edge between two vertices; `fact_name` is always `"/"`.
    Edge {
        source: VName,
        edge_kind: String,
        target: VName,
        fact_name: String,
    },
}

impl Record {
    /// Create a vertex fact, base64-encoding the raw value.
    pub fn fact(source: VName, fact_name: &str, fact_value: &str) -> Self {
        Record::Fact {
            source,
            fact_name: fact_name.to_string(),
            fact_value: STANDARD.encode(fact_value),
        }
    }

    /// Create an edge fact.
    pub fn edge(source: VName, edge_kind: &str, target: VName) -> Self {
        Record::Edge {
            source,
            edge_kind: edge_kind.to_string(),
            target,
            fact_name: "/".to_string(),
        }
    }

    /// The source VName of either record shape.
    pub fn source(&self) -> &VName {
        match self {
            Record::Fact { source, .. } => source,
            Record::Edge { source, .. } => source,
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Append-only receiver of emitted records.
pub trait FactSink {
    /// Append one record. Ordering is the caller's emission order.
    fn append(&mut self, record: Record) -> Result<(), SinkError>;
}

/// Sink writing one JSON object per line to an [`std::io::Write`].
#[derive(Debug)]
pub struct JsonLineSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    /// Create a sink over the given writer.
    pub fn new(writer: W) -> Self {
        JsonLineSink { writer }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FactSink for JsonLineSink<W> {
    fn append(&mut self, record: Record) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Sink retaining records in memory, for tests and tooling.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<Record>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// The records appended so far, in order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consume the sink and return its records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FactSink for MemorySink {
    fn append(&mut self, record: Record) -> Result<(), SinkError> {
        self.records.push(record);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
