use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Delete;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Collect, Preview, Confirm, Apply, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Collect => "collect",
        Phase::Preview => "preview",
        Phase::Confirm => "confirm",
        Phase::Apply => "apply",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Collect => info_span!("collect"),
        Phase::Preview => info_span!("preview"),
        Phase::Confirm => info_span!("confirm"),
        Phase::Apply => info_span!("apply"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Delete {
    const NAME: &'static str = "delete";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("delete") }
}
