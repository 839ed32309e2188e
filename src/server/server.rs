//! WebSocket server implementation.
//!
//! One task per connection reads client commands; a companion egress task
//! pushes direct replies plus the session and leaderboard streams. All quiz
//! state lives in the shared core; connections hold only their own name and,
//! for the admin, the capability key.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::core::{AdminKey, JoinOutcome, SharedCore};
use crate::protocol::{ClientMessage, LeaderboardEntry, ServerMessage, SessionView};

/// Run the quiz server until Ctrl-C.
pub async fn run(port: u16, core: SharedCore) -> io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "server listening");

    let (shutdown_tx, _) = broadcast::channel(1);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let core = Arc::clone(&core);
                    tokio::spawn(handle_connection(stream, peer, core, shutdown_tx.subscribe()));
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            },
            _ = signal::ctrl_c() => {
                info!("shutdown requested");
                let _ = shutdown_tx.send(());
                break;
            }
        }
    }

    // Let in-flight ServerClosing frames drain before the process exits.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}

/// Per-connection identity, established by a Join message.
#[derive(Default)]
struct ConnState {
    name: Option<String>,
    admin_key: Option<AdminKey>,
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    core: SharedCore,
    shutdown_rx: broadcast::Receiver<()>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake failed: {}", e);
            return;
        }
    };
    debug!(%peer, "connection established");

    let (ws_sender, mut ws_receiver) = ws_stream.split();

    // Channel for direct replies to this client, plus the two broadcast
    // subscriptions any caller is entitled to.
    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();
    let (session_rx, leaderboard_rx) = {
        let core = core.lock().await;
        (core.subscribe_session(), core.subscribe_leaderboard())
    };

    let egress = tokio::spawn(run_egress(
        ws_sender,
        rx,
        session_rx,
        leaderboard_rx,
        shutdown_rx,
    ));

    let _ = tx.send(ServerMessage::ConnectionAck);

    let mut conn = ConnState::default();
    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => continue,
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(_) => continue,
        };

        handle_client_message(&mut conn, client_msg, &core, &tx).await;
    }

    // A dropped connection is not a leave: the name stays registered and a
    // rejoin under it resumes the same score.
    if let Some(name) = &conn.name {
        debug!(%peer, name, "connection closed");
    } else {
        debug!(%peer, "connection closed");
    }

    egress.abort();
}

/// Forward direct replies and both subscription streams to the socket.
async fn run_egress(
    mut ws_sender: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    mut session_rx: watch::Receiver<SessionView>,
    mut leaderboard_rx: watch::Receiver<Vec<LeaderboardEntry>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    // Initial snapshots, so a late joiner immediately observes the shared
    // question-start instant instead of seeding a local countdown.
    let view = session_rx.borrow_and_update().clone();
    if !send(&mut ws_sender, ServerMessage::Session { view }).await {
        return;
    }
    let entries = leaderboard_rx.borrow_and_update().clone();
    if !send(&mut ws_sender, ServerMessage::Leaderboard { entries }).await {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                if !send(&mut ws_sender, msg).await {
                    break;
                }
            }
            changed = session_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = session_rx.borrow_and_update().clone();
                if !send(&mut ws_sender, ServerMessage::Session { view }).await {
                    break;
                }
            }
            changed = leaderboard_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let entries = leaderboard_rx.borrow_and_update().clone();
                if !send(&mut ws_sender, ServerMessage::Leaderboard { entries }).await {
                    break;
                }
            }
            _ = shutdown_rx.recv() => {
                let _ = send(&mut ws_sender, ServerMessage::ServerClosing).await;
                break;
            }
        }
    }
}

/// Serialize and send one message. Returns false once the socket is gone.
async fn send(
    ws_sender: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    msg: ServerMessage,
) -> bool {
    let json = match serde_json::to_string(&msg) {
        Ok(json) => json,
        Err(e) => {
            error!("failed to serialize message: {}", e);
            return true;
        }
    };
    ws_sender.send(Message::Text(json.into())).await.is_ok()
}

/// Handle a single client message.
async fn handle_client_message(
    conn: &mut ConnState,
    msg: ClientMessage,
    core: &SharedCore,
    tx: &mpsc::UnboundedSender<ServerMessage>,
) {
    match msg {
        ClientMessage::Join { name } => {
            let mut core = core.lock().await;
            match core.join(&name) {
                Ok(JoinOutcome::Admin(key)) => {
                    conn.name = Some(name.trim().to_string());
                    conn.admin_key = Some(key);
                    let _ = tx.send(ServerMessage::JoinAccepted {
                        name: name.trim().to_string(),
                        is_admin: true,
                    });
                }
                Ok(JoinOutcome::Participant { .. }) => {
                    conn.name = Some(name.trim().to_string());
                    let _ = tx.send(ServerMessage::JoinAccepted {
                        name: name.trim().to_string(),
                        is_admin: false,
                    });
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::JoinRejected {
                        reason: e.to_string(),
                    });
                }
            }
        }

        ClientMessage::Leave => {
            if let Some(name) = conn.name.take() {
                core.lock().await.leave(&name);
            }
            conn.admin_key = None;
            let _ = tx.send(ServerMessage::LeaveAck);
        }

        ClientMessage::Start { expected_version } => {
            // Privileged commands without the capability are silently
            // ignored; a non-admin UI simply never offers them. The admin
            // gets an ack either way, so a no-op is distinguishable from a
            // lost command.
            if let Some(key) = &conn.admin_key {
                let outcome = core.lock().await.start(key, expected_version, Utc::now());
                let _ = tx.send(ServerMessage::CommandAck {
                    applied: outcome.applied(),
                });
            } else {
                debug!("ignoring Start from non-admin connection");
            }
        }

        ClientMessage::Advance { expected_version } => {
            if let Some(key) = &conn.admin_key {
                let outcome = core.lock().await.advance(key, expected_version, Utc::now());
                let _ = tx.send(ServerMessage::CommandAck {
                    applied: outcome.applied(),
                });
            } else {
                debug!("ignoring Advance from non-admin connection");
            }
        }

        ClientMessage::Reset { expected_version } => {
            if let Some(key) = &conn.admin_key {
                let outcome = core.lock().await.reset(key, expected_version);
                let _ = tx.send(ServerMessage::CommandAck {
                    applied: outcome.applied(),
                });
            } else {
                debug!("ignoring Reset from non-admin connection");
            }
        }

        ClientMessage::SubmitAnswer {
            question_index,
            option,
        } => {
            let outcome = match &conn.name {
                Some(name) => {
                    core.lock()
                        .await
                        .submit_answer(name, question_index, &option, Utc::now())
                }
                None => {
                    debug!("ignoring SubmitAnswer before Join");
                    let _ = tx.send(ServerMessage::AnswerAck {
                        accepted: false,
                        correct: false,
                    });
                    return;
                }
            };
            let _ = tx.send(ServerMessage::AnswerAck {
                accepted: outcome.accepted(),
                correct: outcome.correct(),
            });
        }
    }
}
