use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Rename;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, Confirm, Update, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::Confirm => "confirm",
        Phase::Update => "update",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::Confirm => info_span!("confirm"),
        Phase::Update => info_span!("update"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Rename {
    const NAME: &'static str = "rename";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("rename") }
}
