#![forbid(unsafe_code)]

mod gateway;
mod queries;
mod schema;
mod time;

pub(super) use gateway::*;
pub(super) use queries::*;
pub(super) use schema::*;
