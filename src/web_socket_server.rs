use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

use crate::app_state::AppState;
use crate::board_server::{BoardChanged, BoardServer, Connect, Disconnect};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// One browser board listening for store changes.
pub struct BoardSocket {
    pub session_id: Option<usize>,
    pub hb: Instant,
    pub server: Addr<BoardServer>,
}

impl BoardSocket {
    pub fn new(server: Addr<BoardServer>) -> Self {
        BoardSocket {
            session_id: None,
            hb: Instant::now(),
            server,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                warn!("Board socket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for BoardSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);

        let addr = ctx.address();
        self.server
            .send(Connect {
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(id) => act.session_id = Some(id),
                    Err(e) => {
                        error!("Failed to register with board server: {}", e);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        if let Some(session_id) = self.session_id {
            self.server.do_send(Disconnect { session_id });
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for BoardSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                // the feed is one-way; gestures go through the REST routes
                debug!("ignoring client text on board socket: {}", text);
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                error!("Board socket error: {}", e);
                ctx.stop();
            }
            _ => {}
        }
    }
}

impl Handler<BoardChanged> for BoardSocket {
    type Result = ();

    fn handle(&mut self, msg: BoardChanged, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg.event) {
            Ok(json) => ctx.text(json),
            Err(e) => error!("Failed to encode board event: {}", e),
        }
    }
}

/// GET /ws
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    info!("Board socket requested from {:?}", req.peer_addr());
    ws::start(BoardSocket::new(data.board_server.clone()), &req, stream)
}
