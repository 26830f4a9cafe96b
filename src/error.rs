// error.rs
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::flag::AllianceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("tile ({x}, {y}) belongs to alliance {owner}")]
    NotYours { x: i32, y: i32, owner: AllianceId },
    #[error("tile ({x}, {y}) is already a flag anchor")]
    Occupied { x: i32, y: i32 },
    #[error("no territory of alliance {alliance_id} is reachable from ({x}, {y})")]
    Unreachable { x: i32, y: i32, alliance_id: AllianceId },
    #[error("a flag at ({x}, {y}) would reach past the edge of the map")]
    OutOfBounds { x: i32, y: i32 },
    #[error("alliance id 0 is reserved for unclaimed tiles")]
    ReservedAlliance,
}

#[derive(Debug, Error)]
pub enum MapConfigError {
    #[error("failed to parse map preset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read map preset from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
