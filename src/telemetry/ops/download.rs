use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Download;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, Resolve, Fetch, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::Resolve => "resolve",
        Phase::Fetch => "fetch",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::Resolve => info_span!("resolve"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Download {
    const NAME: &'static str = "download";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("download") }
}
