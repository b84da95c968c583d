use crate::board_server::BoardServer;
use crate::board_service::BoardService;
use crate::config::Config;
use actix::Addr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardService>,
    pub board_server: Addr<BoardServer>,
    pub config: Config,
}
