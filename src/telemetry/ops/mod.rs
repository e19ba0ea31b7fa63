pub mod audit;
pub mod captions;
pub mod channels;
pub mod cuepoints;
pub mod delete;
pub mod download;
pub mod duplicate;
pub mod flavors;
pub mod playlists;
pub mod rename;
pub mod report;
