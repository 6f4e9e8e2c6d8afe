//! Liveness/readiness endpoint (spec §6 "ambient" server surface),
//! grounded on the teacher's `engine/src/metrics.rs` pattern of a bare
//! `warp::serve` over one path with no other routing machinery.

use std::convert::Infallible;

use warp::Filter;

/// `GET /health` -> `200 OK` with a tiny JSON body once the server has
/// bound its listener; there is nothing else to report readiness on
/// (store connectivity is checked at startup, before this route is ever
/// reachable).
pub fn route() -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("health").and(warp::path::end()).map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })))
}
