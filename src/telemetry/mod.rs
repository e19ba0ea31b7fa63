pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// Factory helpers: one typed log context per operation.
pub fn channels() -> LogCtx<ops::channels::Channels> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn rename() -> LogCtx<ops::rename::Rename> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn delete() -> LogCtx<ops::delete::Delete> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn download() -> LogCtx<ops::download::Download> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn captions() -> LogCtx<ops::captions::Captions> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn flavors() -> LogCtx<ops::flavors::Flavors> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn cuepoints() -> LogCtx<ops::cuepoints::CuePoints> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn playlists() -> LogCtx<ops::playlists::Playlists> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn audit() -> LogCtx<ops::audit::Audit> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn report() -> LogCtx<ops::report::Report> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn duplicate() -> LogCtx<ops::duplicate::Duplicate> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
