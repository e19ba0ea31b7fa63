use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct CuePoints;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Validate, List, Confirm, Add, Delete, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Validate => "validate",
        Phase::List => "list",
        Phase::Confirm => "confirm",
        Phase::Add => "add",
        Phase::Delete => "delete",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Validate => info_span!("validate"),
        Phase::List => info_span!("list"),
        Phase::Confirm => info_span!("confirm"),
        Phase::Add => info_span!("add"),
        Phase::Delete => info_span!("delete"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for CuePoints {
    const NAME: &'static str = "cuepoints";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("cuepoints") }
}
