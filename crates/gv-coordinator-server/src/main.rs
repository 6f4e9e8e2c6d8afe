//! Reference signing-plane server binary (spec §6, SPEC_FULL.md §4.5,
//! §6 "[AMBIENT]"): wires a [`gv_coordinator::CoordinatorContext`] to an
//! in-memory or MongoDB-backed [`gv_coordinator::Store`], a `warp`
//! WebSocket endpoint carrying [`gv_coordinator::events::SigningRequest`]/
//! [`SigningResponse`] traffic, and a liveness route. The REST admin
//! surface (vault/guardian/transaction CRUD) stays external per spec §1 —
//! this binary only ever speaks the signing plane.

mod cli;
mod health;

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use futures::{SinkExt, StreamExt};
use gv_coordinator::events::{
    FinalSignatureResponse, Round1Ack, Round2DataResponse, Round3Ack, SigningRequest, SigningResponse,
};
use gv_coordinator::{CoordinatorConfig, CoordinatorContext, CoordinatorError, InMemoryStore, PubSub, Rooms, Store};
use gv_primitives::{GuardianId, VaultId};
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let opts = cli::CommandLineOptions::parse();

    let mut config = CoordinatorConfig::load()?;
    opts.apply(&mut config);

    let filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .json()
        .try_init()
        .ok();

    let store = build_store(&config).await?;
    let pubsub = Arc::new(Rooms::new());
    let context = Arc::new(CoordinatorContext::new(store, pubsub.clone(), config.clone()));

    tokio::spawn(gv_coordinator::run_sweeper(context.clone()));

    let signing_route = signing_route(context.clone(), pubsub);
    let routes = signing_route.or(health::route());

    let host: IpAddr = config.host.parse()?;
    info!(host = %config.host, port = config.port, "gv-coordinator-server listening");
    warp::serve(routes).run((host, config.port)).await;
    Ok(())
}

#[cfg(feature = "mongodb")]
async fn build_store(config: &CoordinatorConfig) -> anyhow::Result<Arc<dyn Store>> {
    match (&config.mongodb_url, &config.mongodb_db_name) {
        (Some(url), Some(db_name)) => {
            info!(db_name, "connecting to MongoDB store");
            Ok(gv_coordinator::MongoStore::connect(url, db_name).await?)
        }
        _ => {
            warn!("no mongodb_url/mongodb_db_name configured; falling back to the in-memory store");
            Ok(InMemoryStore::new())
        }
    }
}

#[cfg(not(feature = "mongodb"))]
async fn build_store(_config: &CoordinatorConfig) -> anyhow::Result<Arc<dyn Store>> {
    Ok(InMemoryStore::new())
}

/// `GET /signing/{vault_id}/{guardian_id}` upgrades to a WebSocket: the
/// URL path is this deployment's stand-in for session authentication
/// (spec §1 names administrator auth out of scope; the signing plane
/// itself authenticates a session by `(vault_id, guardian_id)` per spec
/// §4.5). Every [`SigningRequest`] whose embedded `guardian_id` doesn't
/// match the session's is rejected with `IdentityMismatch` without
/// reaching [`CoordinatorContext`].
fn signing_route(
    context: Arc<CoordinatorContext>,
    pubsub: Arc<Rooms>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("signing" / VaultId / GuardianId)
        .and(warp::ws())
        .map(move |vault_id: VaultId, guardian_id: GuardianId, ws: warp::ws::Ws| {
            let context = context.clone();
            let pubsub = pubsub.clone();
            ws.on_upgrade(move |socket| handle_session(socket, context, pubsub, vault_id, guardian_id))
        })
}

async fn handle_session(
    socket: WebSocket,
    context: Arc<CoordinatorContext>,
    pubsub: Arc<Rooms>,
    vault_id: VaultId,
    guardian_id: GuardianId,
) {
    let (mut outbound, mut inbound) = socket.split();
    let mut room = pubsub.subscribe(vault_id);

    let _ = pubsub
        .publish(vault_id, gv_coordinator::events::SigningEvent::GuardianConnected { vault_id, guardian_id })
        .await;

    loop {
        tokio::select! {
            event = room.recv() => {
                match event {
                    Ok(event) => {
                        let Ok(payload) = serde_json::to_string(&event) else { continue };
                        if outbound.send(Message::text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%vault_id, %guardian_id, skipped, "signing session missed broadcast events");
                    }
                }
            }
            message = inbound.next() => {
                match message {
                    Some(Ok(message)) if message.is_text() => {
                        let response = dispatch(&context, guardian_id, message.to_str().unwrap_or_default()).await;
                        let Ok(payload) = serde_json::to_string(&response) else { continue };
                        if outbound.send(Message::text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(message)) if message.is_close() => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        error!(%vault_id, %guardian_id, %error, "signing session read error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    let _ = pubsub
        .publish(vault_id, gv_coordinator::events::SigningEvent::GuardianDisconnected { vault_id, guardian_id })
        .await;
}

/// Deserializes one [`SigningRequest`], enforces the session's identity
/// (spec §7 `IdentityMismatch`), dispatches to [`CoordinatorContext`],
/// and always returns a [`SigningResponse`] — domain errors are surfaced
/// as `SigningResponse::Error` rather than closing the socket, so one bad
/// request doesn't tear down an otherwise-healthy session.
async fn dispatch(context: &CoordinatorContext, session_guardian_id: GuardianId, raw: &str) -> SigningResponse {
    let request: SigningRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(error) => return SigningResponse::Error { message: format!("malformed request: {error}") },
    };

    let result = match &request {
        SigningRequest::SubmitRound1 { tx_id, guardian_id, r_i_hex_compressed } => {
            if *guardian_id != session_guardian_id {
                Err(CoordinatorError::IdentityMismatch)
            } else {
                context
                    .submit_round1(*tx_id, *guardian_id, *r_i_hex_compressed)
                    .await
                    .map(|accepted| SigningResponse::Round1Ack(Round1Ack { tx_id: *tx_id, accepted }))
            }
        }
        SigningRequest::GetRound2Data { tx_id, guardian_id } => {
            if *guardian_id != session_guardian_id {
                Err(CoordinatorError::IdentityMismatch)
            } else {
                context.get_round2_data(*tx_id).await.map(|(r, message_hash)| {
                    SigningResponse::Round2Data(Round2DataResponse { tx_id: *tx_id, r, message_hash })
                })
            }
        }
        SigningRequest::SubmitRound3 { tx_id, guardian_id, s_i_decimal } => {
            if *guardian_id != session_guardian_id {
                Err(CoordinatorError::IdentityMismatch)
            } else {
                context
                    .submit_round3(*tx_id, *guardian_id, s_i_decimal.clone())
                    .await
                    .map(|accepted| SigningResponse::Round3Ack(Round3Ack { tx_id: *tx_id, accepted }))
            }
        }
        SigningRequest::GetFinalSignature { tx_id, guardian_id } => {
            if *guardian_id != session_guardian_id {
                Err(CoordinatorError::IdentityMismatch)
            } else {
                context.get_final_signature(*tx_id).await.map(|signature| {
                    SigningResponse::FinalSignature(FinalSignatureResponse {
                        tx_id: *tx_id,
                        r: signature.r,
                        s: signature.s,
                        recovery_id: signature.recovery_id,
                    })
                })
            }
        }
    };

    match result {
        Ok(response) => response,
        Err(error) => SigningResponse::Error { message: error.to_string() },
    }
}
