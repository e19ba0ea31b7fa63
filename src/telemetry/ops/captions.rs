use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Captions;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, List, Fetch, Convert, Update, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::List => "list",
        Phase::Fetch => "fetch",
        Phase::Convert => "convert",
        Phase::Update => "update",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::List => info_span!("list"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Convert => info_span!("convert"),
        Phase::Update => info_span!("update"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Captions {
    const NAME: &'static str = "captions";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("captions") }
}
