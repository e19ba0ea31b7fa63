use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Report;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Chunk, Fetch, Scan, Lookup, Summarize, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Chunk => "chunk",
        Phase::Fetch => "fetch",
        Phase::Scan => "scan",
        Phase::Lookup => "lookup",
        Phase::Summarize => "summarize",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::Chunk => info_span!("chunk"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Scan => info_span!("scan"),
        Phase::Lookup => info_span!("lookup"),
        Phase::Summarize => info_span!("summarize"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for Report {
    const NAME: &'static str = "report";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("report") }
}
