use tracing::info_span;
use tracing::Span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Playlists;

#[derive(Copy, Clone, Debug)]
pub enum Phase { ReadMetadata, Clone, UpdateMetadata, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::ReadMetadata => "read_metadata",
        Phase::Clone => "clone",
        Phase::UpdateMetadata => "update_metadata",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::ReadMetadata => info_span!("read_metadata"),
        Phase::Clone => info_span!("clone"),
        Phase::UpdateMetadata => info_span!("update_metadata"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Playlists {
    const NAME: &'static str = "playlists";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("playlists") }
}
