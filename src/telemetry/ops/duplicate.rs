use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Duplicate;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, Create, Content, Captions, CuePoints, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::Create => "create",
        Phase::Content => "content",
        Phase::Captions => "captions",
        Phase::CuePoints => "cuepoints",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::Create => info_span!("create"),
        Phase::Content => info_span!("content"),
        Phase::Captions => info_span!("captions"),
        Phase::CuePoints => info_span!("cuepoints"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Duplicate {
    const NAME: &'static str = "duplicate";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("duplicate") }
}
