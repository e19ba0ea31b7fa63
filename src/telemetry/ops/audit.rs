use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Audit;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, Trail, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::Trail => "trail",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::Trail => info_span!("trail"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Audit {
    const NAME: &'static str = "audit";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("audit") }
}
