use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Channels;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Validate, Dedup, Create, AddMembers, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Validate => "validate",
        Phase::Dedup => "dedup",
        Phase::Create => "create",
        Phase::AddMembers => "add_members",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Validate => info_span!("validate"),
        Phase::Dedup => info_span!("dedup"),
        Phase::Create => info_span!("create"),
        Phase::AddMembers => info_span!("add_members"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Channels {
    const NAME: &'static str = "channels";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("channels") }
}
