use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Flavors;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, Plan, Preview, Confirm, Delete, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::Plan => "plan",
        Phase::Preview => "preview",
        Phase::Confirm => "confirm",
        Phase::Delete => "delete",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::Plan => info_span!("plan"),
        Phase::Preview => info_span!("preview"),
        Phase::Confirm => info_span!("confirm"),
        Phase::Delete => info_span!("delete"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Flavors {
    const NAME: &'static str = "flavors";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("flavors") }
}
